//! Pool identity, ownership tags, and tool-owned backing storage.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::fmt;
use std::ptr::{self, NonNull};
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::trace;

/// Counter for unique [`PoolId`] allocation. Zero is never handed out.
static POOL_COUNTER: AtomicU32 = AtomicU32::new(1);

/// Unique per-process identifier for a tool-owned pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId(u32);

impl PoolId {
    /// Allocate a fresh, never-before-returned identifier. Thread-safe.
    pub fn next() -> Self {
        Self(POOL_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw identifier value.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool#{}", self.0)
    }
}

/// Who owns the memory behind a view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolKind {
    /// Memory owned by the intercepted application.
    Application,
    /// Memory owned by the interception tool, identified by its pool.
    Tool(PoolId),
}

impl PoolKind {
    /// Whether this is [`PoolKind::Application`].
    pub fn is_application(self) -> bool {
        matches!(self, Self::Application)
    }
}

/// Base alignment of every pool allocation.
pub const POOL_ALIGN: usize = 16;

/// Zero-filled, tool-owned backing storage.
///
/// Pools are shared through `Rc`: every [`Slice`](crate::Slice) created over
/// a pool keeps it alive, and the storage is freed when the last one drops.
pub struct Pool {
    id: PoolId,
    base: NonNull<u8>,
    /// `None` for zero-sized pools, which own no allocation.
    layout: Option<Layout>,
}

impl Pool {
    /// Allocate a new pool of `size` zeroed bytes.
    ///
    /// # Panics
    ///
    /// Panics if `size` overflows a valid layout. Aborts through
    /// [`alloc::handle_alloc_error`] if the allocator fails.
    pub fn create(size: usize) -> Rc<Self> {
        let id = PoolId::next();
        if size == 0 {
            return Rc::new(Self {
                id,
                base: dangling(),
                layout: None,
            });
        }
        let layout = match Layout::from_size_align(size, POOL_ALIGN) {
            Ok(layout) => layout,
            Err(_) => panic!("pool size {size} overflows a valid layout"),
        };
        // SAFETY: `layout` has non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let Some(base) = NonNull::new(raw) else {
            alloc::handle_alloc_error(layout)
        };
        trace!(%id, size, "tool pool created");
        Rc::new(Self {
            id,
            base,
            layout: Some(layout),
        })
    }

    /// This pool's identifier.
    pub fn id(&self) -> PoolId {
        self.id
    }

    /// Size of the pool in bytes.
    pub fn size(&self) -> usize {
        self.layout.map_or(0, |l| l.size())
    }

    /// Address of the first byte of the pool.
    pub fn base_address(&self) -> u64 {
        self.base.as_ptr() as usize as u64
    }

    pub(crate) fn base_ptr(&self) -> NonNull<u8> {
        self.base
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        if let Some(layout) = self.layout {
            // SAFETY: `base` came from `alloc_zeroed(layout)` and is freed
            // only here.
            unsafe { alloc::dealloc(self.base.as_ptr(), layout) }
        }
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("id", &self.id)
            .field("base", &format_args!("{:#x}", self.base_address()))
            .field("size", &self.size())
            .finish()
    }
}

fn dangling() -> NonNull<u8> {
    NonNull::new(ptr::without_provenance_mut(POOL_ALIGN)).unwrap_or(NonNull::dangling())
}
