//! Typed, bounds-checked views over contiguous memory.

#![allow(unsafe_code)]

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};
use std::rc::Rc;

use crate::element::Element;
use crate::pool::{Pool, PoolId, PoolKind, POOL_ALIGN};

/// A typed view of `count` elements starting at a base address, tagged with
/// the pool that owns the memory.
///
/// Views behave like `&'a [Cell<T>]`: they can be cloned freely and elements
/// are read and written by value, never by reference. They are neither
/// `Send` nor `Sync`.
///
/// # Example
///
/// ```
/// use callspy_pool::Slice;
///
/// let mut app_buffer = [1u32, 2, 3];
/// let view = Slice::application(&mut app_buffer);
/// assert!(view.is_application_pool());
/// assert_eq!(view.get(1), 2);
///
/// let copy = Slice::<u32>::make(3);
/// view.copy_to(&copy, 0, 3, 0);
/// assert_eq!(copy.to_vec(), vec![1, 2, 3]);
/// assert!(!copy.is_application_pool());
/// ```
pub struct Slice<'a, T: Element> {
    base: NonNull<T>,
    count: usize,
    kind: PoolKind,
    /// Keeps a tool pool alive for views that own their storage.
    owner: Option<Rc<Pool>>,
    _marker: PhantomData<&'a [Cell<T>]>,
}

impl<'a, T: Element> Slice<'a, T> {
    /// View application-owned memory.
    pub fn application(data: &'a mut [T]) -> Self {
        Self::borrowed(data, PoolKind::Application)
    }

    /// View tool-owned memory that is not backed by a [`Pool`], such as a
    /// local buffer of the interception layer. A fresh [`PoolId`] tags it.
    pub fn tool(data: &'a mut [T]) -> Self {
        Self::borrowed(data, PoolKind::Tool(PoolId::next()))
    }

    fn borrowed(data: &'a mut [T], kind: PoolKind) -> Self {
        let count = data.len();
        // A `&mut [T]` is never null, even when empty.
        let base = NonNull::from(data).cast::<T>();
        Self {
            base,
            count,
            kind,
            owner: None,
            _marker: PhantomData,
        }
    }

    /// View `count` elements at `base`, as handed over by an intercepted
    /// call.
    ///
    /// # Safety
    ///
    /// `base` must be non-null, aligned for `T`, and valid for reads and
    /// writes of `count` elements for `'a`. No Rust reference to that memory
    /// may be live while the view is used.
    pub unsafe fn from_raw_parts(base: *mut T, count: usize, kind: PoolKind) -> Self {
        Self {
            // SAFETY: non-null per the caller's contract.
            base: unsafe { NonNull::new_unchecked(base) },
            count,
            kind,
            owner: None,
            _marker: PhantomData,
        }
    }

    /// Number of elements in the view.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Whether the view has no elements.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Address of the first element.
    pub fn base_address(&self) -> u64 {
        self.base.as_ptr() as usize as u64
    }

    /// Size of the view in bytes.
    pub fn byte_len(&self) -> u64 {
        (self.count * mem::size_of::<T>()) as u64
    }

    /// Address of element `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= count`.
    pub fn element_address(&self, index: usize) -> u64 {
        self.check(index);
        self.base_address() + (index * mem::size_of::<T>()) as u64
    }

    /// The pool that owns the viewed memory.
    pub fn pool_kind(&self) -> PoolKind {
        self.kind
    }

    /// Whether the viewed memory belongs to the intercepted application.
    pub fn is_application_pool(&self) -> bool {
        self.kind.is_application()
    }

    /// The pool this view owns a share of, for views created by
    /// [`Slice::make`] or [`Slice::from_pool`].
    pub fn pool(&self) -> Option<&Rc<Pool>> {
        self.owner.as_ref()
    }

    /// Read element `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= count`.
    pub fn get(&self, index: usize) -> T {
        self.check(index);
        // SAFETY: in bounds; the view's memory is valid for `'a` and no
        // reference into it is live.
        unsafe { self.base.as_ptr().add(index).read() }
    }

    /// Overwrite element `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= count`.
    pub fn set(&self, index: usize, value: T) {
        self.check(index);
        // SAFETY: as in `get`.
        unsafe { self.base.as_ptr().add(index).write(value) }
    }

    /// Copy `count` elements from this view starting at `src_start` into
    /// `dst` starting at `dst_start`. Overlapping views are handled.
    ///
    /// # Panics
    ///
    /// Panics if either range is out of bounds.
    pub fn copy_to(&self, dst: &Slice<'_, T>, src_start: usize, count: usize, dst_start: usize) {
        assert_range(src_start, count, self.count, "source");
        assert_range(dst_start, count, dst.count, "destination");
        if count == 0 {
            return;
        }
        // SAFETY: both ranges are in bounds of views valid for their
        // lifetimes; `ptr::copy` tolerates overlap.
        unsafe {
            ptr::copy(
                self.base.as_ptr().add(src_start),
                dst.base.as_ptr().add(dst_start),
                count,
            )
        }
    }

    /// Copy every element out into a `Vec`.
    pub fn to_vec(&self) -> Vec<T> {
        (0..self.count).map(|i| self.get(i)).collect()
    }

    fn check(&self, index: usize) {
        assert!(
            index < self.count,
            "index {index} out of bounds for slice of {} elements",
            self.count
        );
    }
}

impl<T: Element> Slice<'static, T> {
    /// Allocate a fresh tool-owned pool holding `count` zeroed elements.
    ///
    /// # Panics
    ///
    /// Panics if `count * size_of::<T>()` overflows, or if `T` needs a
    /// stricter alignment than pools provide.
    pub fn make(count: usize) -> Self {
        let bytes = match count.checked_mul(mem::size_of::<T>()) {
            Some(bytes) => bytes,
            None => panic!("slice of {count} elements overflows"),
        };
        Self::over_pool(Pool::create(bytes), count)
    }

    /// View an entire pool as elements of `T`. Trailing bytes that do not
    /// fill a whole element are not part of the view.
    pub fn from_pool(pool: Rc<Pool>) -> Self {
        let count = match mem::size_of::<T>() {
            0 => 0,
            size => pool.size() / size,
        };
        Self::over_pool(pool, count)
    }

    fn over_pool(pool: Rc<Pool>, count: usize) -> Self {
        assert!(
            mem::align_of::<T>() <= POOL_ALIGN,
            "element alignment {} exceeds pool alignment {POOL_ALIGN}",
            mem::align_of::<T>()
        );
        Self {
            base: pool.base_ptr().cast::<T>(),
            count,
            kind: PoolKind::Tool(pool.id()),
            owner: Some(pool),
            _marker: PhantomData,
        }
    }
}

impl<T: Element> Clone for Slice<'_, T> {
    fn clone(&self) -> Self {
        Self {
            base: self.base,
            count: self.count,
            kind: self.kind,
            owner: self.owner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Element> fmt::Debug for Slice<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slice")
            .field("base", &format_args!("{:#x}", self.base_address()))
            .field("count", &self.count)
            .field("kind", &self.kind)
            .finish()
    }
}

fn assert_range(start: usize, count: usize, len: usize, which: &str) {
    let in_bounds = start.checked_add(count).is_some_and(|end| end <= len);
    assert!(
        in_bounds,
        "{which} range {start}+{count} out of bounds for slice of {len} elements"
    );
}
