//! Low-level primitives for arena memory operations.
//!
//! Every `unsafe` block in this crate lives here, each with a `// SAFETY:`
//! comment. The safe wrappers in `scratch.rs` uphold the documented
//! preconditions.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::cell::Cell;
use std::ptr::{self, NonNull};

/// Alignment of every chunk's base address.
pub(crate) const CHUNK_ALIGN: usize = 16;

/// One heap block with a bump cursor.
///
/// The block never moves once allocated, so pointers handed out from it stay
/// valid until the chunk is dropped.
pub(crate) struct RawChunk {
    base: NonNull<u8>,
    layout: Layout,
    /// Next free byte offset from `base`.
    cursor: Cell<usize>,
}

impl RawChunk {
    /// Allocate a chunk of `size` bytes. Returns `None` if the allocator fails
    /// or the size is not representable as a layout.
    pub(crate) fn new(size: usize) -> Option<Self> {
        let layout = Layout::from_size_align(size.max(1), CHUNK_ALIGN).ok()?;
        // SAFETY: `layout` has non-zero size.
        let raw = unsafe { alloc::alloc(layout) };
        let base = NonNull::new(raw)?;
        Some(Self {
            base,
            layout,
            cursor: Cell::new(0),
        })
    }

    /// Total size of the block in bytes.
    pub(crate) fn size(&self) -> usize {
        self.layout.size()
    }

    /// Bytes consumed so far, including alignment padding.
    pub(crate) fn used(&self) -> usize {
        self.cursor.get()
    }

    /// Reserve space for `layout`, or `None` if it does not fit.
    pub(crate) fn try_bump(&self, layout: Layout) -> Option<NonNull<u8>> {
        let base = self.base.as_ptr() as usize;
        let start = base.checked_add(self.cursor.get())?;
        let mask = layout.align() - 1;
        let aligned = start.checked_add(mask)? & !mask;
        let offset = aligned - base;
        let end = offset.checked_add(layout.size())?;
        if end > self.layout.size() {
            return None;
        }
        self.cursor.set(end);
        // SAFETY: `offset <= end <= size`, so the result stays inside (or one
        // past) the block and derives from `base`'s provenance.
        Some(unsafe { NonNull::new_unchecked(self.base.as_ptr().add(offset)) })
    }

    /// Rewind the cursor. Requires exclusive access, so no outstanding
    /// reference into the chunk can exist.
    pub(crate) fn reset(&mut self) {
        self.cursor.set(0);
    }
}

impl Drop for RawChunk {
    fn drop(&mut self) {
        // SAFETY: `base` was returned by `alloc::alloc(self.layout)` and has
        // not been freed.
        unsafe { alloc::dealloc(self.base.as_ptr(), self.layout) }
    }
}

/// A well-aligned non-null pointer for zero-sized requests.
pub(crate) fn dangling_for(layout: Layout) -> NonNull<u8> {
    // `align` is never zero, so the pointer is never null.
    NonNull::new(ptr::without_provenance_mut(layout.align())).unwrap_or(NonNull::dangling())
}

/// Move `value` into `dst` and return a reference to it.
///
/// # Safety
///
/// `dst` must be valid for writes of `T`, aligned for `T`, and not aliased by
/// any other live reference for `'a`.
pub(crate) unsafe fn write_value<'a, T>(dst: NonNull<u8>, value: T) -> &'a mut T {
    let dst = dst.cast::<T>().as_ptr();
    // SAFETY: guaranteed by the caller.
    unsafe {
        dst.write(value);
        &mut *dst
    }
}

/// Fill `count` elements at `dst` with `value` and return them as a slice.
///
/// # Safety
///
/// `dst` must be valid for writes of `count` elements of `T`, aligned for
/// `T`, and not aliased by any other live reference for `'a`.
pub(crate) unsafe fn fill_slice<'a, T: Copy>(dst: NonNull<u8>, count: usize, value: T) -> &'a mut [T] {
    let dst = dst.cast::<T>().as_ptr();
    // SAFETY: guaranteed by the caller; every element is initialised before
    // the slice is formed.
    unsafe {
        for i in 0..count {
            dst.add(i).write(value);
        }
        std::slice::from_raw_parts_mut(dst, count)
    }
}

/// Copy `src` to `dst` and return the copy as a slice.
///
/// # Safety
///
/// Same as [`fill_slice`] with `count = src.len()`; `dst` must not overlap
/// `src`.
pub(crate) unsafe fn copy_slice<'a, T: Copy>(dst: NonNull<u8>, src: &[T]) -> &'a mut [T] {
    let dst = dst.cast::<T>().as_ptr();
    // SAFETY: guaranteed by the caller.
    unsafe {
        ptr::copy_nonoverlapping(src.as_ptr(), dst, src.len());
        std::slice::from_raw_parts_mut(dst, src.len())
    }
}
