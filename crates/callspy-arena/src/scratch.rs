//! Call-scoped scratch space.
//!
//! [`ScratchArena`] is a chunked bump allocator. It is owned by a single
//! call observer and dropped with it, so nothing allocated here may be kept
//! past the end of the call; the borrow checker enforces this because every
//! allocation borrows the arena.

use std::alloc::Layout;
use std::cell::RefCell;
use std::ptr::NonNull;

use tracing::trace;

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::raw::{self, RawChunk};

/// Bump-allocated scratch space for temporary per-call data.
///
/// Values placed in the arena are never dropped individually; destructors
/// of arena values do not run. Backing storage is released exactly once,
/// when the arena itself is dropped.
///
/// # Example
///
/// ```
/// use callspy_arena::ScratchArena;
///
/// let scratch = ScratchArena::default();
/// let ids = scratch.alloc_slice::<u32>(4);
/// ids[0] = 7;
/// let name = scratch.alloc_slice_copy(b"glDrawArrays".as_slice());
/// assert_eq!(ids, &[7, 0, 0, 0]);
/// assert_eq!(name.len(), 12);
/// ```
pub struct ScratchArena {
    chunks: RefCell<Vec<RawChunk>>,
    config: ArenaConfig,
}

impl ScratchArena {
    /// Create an empty arena. No memory is reserved until the first
    /// allocation.
    pub fn new(config: ArenaConfig) -> Self {
        Self {
            chunks: RefCell::new(Vec::new()),
            config,
        }
    }

    /// The configuration this arena was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Reserve uninitialised memory for `layout`.
    ///
    /// Zero-sized layouts return a dangling, well-aligned pointer without
    /// touching any chunk.
    pub fn try_alloc_layout(&self, layout: Layout) -> Result<NonNull<u8>, ArenaError> {
        if layout.size() == 0 {
            return Ok(raw::dangling_for(layout));
        }

        let mut chunks = self.chunks.borrow_mut();
        if let Some(ptr) = chunks.last().and_then(|c| c.try_bump(layout)) {
            return Ok(ptr);
        }

        // Chunk bases are only CHUNK_ALIGN-aligned; stricter layouts need padding.
        let needed = layout
            .size()
            .checked_add(layout.align().saturating_sub(raw::CHUNK_ALIGN))
            .ok_or(ArenaError::LayoutOverflow {
                count: 1,
                element_size: layout.size(),
            })?;
        let mut size = self
            .config
            .next_chunk_size(chunks.last().map(RawChunk::size), needed);

        if let Some(max) = self.config.max_bytes {
            let held: usize = chunks.iter().map(RawChunk::size).sum();
            let remaining = max.saturating_sub(held);
            if needed > remaining {
                return Err(ArenaError::CapacityExceeded {
                    requested: layout.size(),
                    capacity: max,
                });
            }
            size = size.min(remaining);
        }

        let chunk = RawChunk::new(size).ok_or(ArenaError::OutOfMemory { bytes: size })?;
        let ptr = chunk.try_bump(layout).ok_or(ArenaError::CapacityExceeded {
            requested: layout.size(),
            capacity: size,
        })?;
        chunks.push(chunk);
        trace!(
            chunk_bytes = size,
            chunk_count = chunks.len(),
            "scratch arena grew"
        );
        Ok(ptr)
    }

    /// Move `value` into the arena.
    #[allow(clippy::mut_from_ref, unsafe_code)]
    pub fn try_alloc<T>(&self, value: T) -> Result<&mut T, ArenaError> {
        let ptr = self.try_alloc_layout(Layout::new::<T>())?;
        // SAFETY: `ptr` is a fresh, exclusive reservation sized and aligned
        // for `T` that lives as long as `self`'s chunks.
        Ok(unsafe { raw::write_value(ptr, value) })
    }

    /// Move `value` into the arena.
    ///
    /// # Panics
    ///
    /// Panics if the arena's byte limit is exhausted or the allocator fails.
    /// Use [`ScratchArena::try_alloc`] to handle that case.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc<T>(&self, value: T) -> &mut T {
        match self.try_alloc(value) {
            Ok(v) => v,
            Err(e) => panic!("scratch allocation failed: {e}"),
        }
    }

    /// Allocate `count` default-initialised elements.
    #[allow(clippy::mut_from_ref, unsafe_code)]
    pub fn try_alloc_slice<T: Copy + Default>(&self, count: usize) -> Result<&mut [T], ArenaError> {
        let layout = array_layout::<T>(count)?;
        let ptr = self.try_alloc_layout(layout)?;
        // SAFETY: exclusive reservation for `count` elements of `T`.
        Ok(unsafe { raw::fill_slice(ptr, count, T::default()) })
    }

    /// Allocate `count` default-initialised elements.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`ScratchArena::alloc`].
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_slice<T: Copy + Default>(&self, count: usize) -> &mut [T] {
        match self.try_alloc_slice(count) {
            Ok(v) => v,
            Err(e) => panic!("scratch allocation failed: {e}"),
        }
    }

    /// Copy `src` into the arena.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`ScratchArena::alloc`].
    #[allow(clippy::mut_from_ref, unsafe_code)]
    pub fn alloc_slice_copy<T: Copy>(&self, src: &[T]) -> &mut [T] {
        let ptr = array_layout::<T>(src.len()).and_then(|l| self.try_alloc_layout(l));
        match ptr {
            // SAFETY: exclusive reservation for `src.len()` elements of `T`,
            // disjoint from `src` which the arena does not own.
            Ok(ptr) => unsafe { raw::copy_slice(ptr, src) },
            Err(e) => panic!("scratch allocation failed: {e}"),
        }
    }

    /// Release every allocation while keeping the largest chunk for reuse.
    ///
    /// Requires exclusive access, so no reference into the arena can be
    /// outstanding.
    pub fn reset(&mut self) {
        let chunks = self.chunks.get_mut();
        if let Some(keep) = chunks.pop() {
            chunks.clear();
            chunks.push(keep);
        }
        for chunk in chunks.iter_mut() {
            chunk.reset();
        }
    }

    /// Bytes consumed across all chunks, including alignment padding.
    pub fn used(&self) -> usize {
        self.chunks.borrow().iter().map(RawChunk::used).sum()
    }

    /// Bytes of chunk storage currently held.
    pub fn capacity(&self) -> usize {
        self.chunks.borrow().iter().map(RawChunk::size).sum()
    }

    /// Number of chunks currently held.
    pub fn chunk_count(&self) -> usize {
        self.chunks.borrow().len()
    }
}

impl Default for ScratchArena {
    fn default() -> Self {
        Self::new(ArenaConfig::default())
    }
}

fn array_layout<T>(count: usize) -> Result<Layout, ArenaError> {
    Layout::array::<T>(count).map_err(|_| ArenaError::LayoutOverflow {
        count,
        element_size: std::mem::size_of::<T>(),
    })
}
