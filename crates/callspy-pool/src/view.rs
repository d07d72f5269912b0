//! The pool-classification capability consumed by call observers.

use std::rc::Rc;

use crate::element::Element;
use crate::pool::{Pool, PoolKind};
use crate::slice::Slice;

/// A contiguous byte range whose backing memory stays valid for `'a` and
/// whose owning pool can be queried.
///
/// The classification is authoritative and read-only: observers only ask
/// [`MemoryView::is_application_pool`], they never change it.
///
/// # Safety
///
/// Observers copy `[base_address, base_address + byte_len)` out of process
/// memory after registration. Implementors guarantee that this range is
/// readable for the whole of `'a`, or until the pool returned by
/// [`MemoryView::backing_pool`] is dropped when that outlives `'a`. Both
/// methods must keep returning the same values.
///
/// A view that makes no such promise cannot be implemented in safe code:
///
/// ```compile_fail,E0200
/// use callspy_pool::{MemoryView, PoolKind};
///
/// struct Anywhere;
///
/// impl<'a> MemoryView<'a> for Anywhere {
///     fn base_address(&self) -> u64 { 0x10 }
///     fn byte_len(&self) -> u64 { 64 }
///     fn pool_kind(&self) -> PoolKind { PoolKind::Application }
/// }
/// ```
#[allow(unsafe_code)]
pub unsafe trait MemoryView<'a> {
    /// Address of the first byte.
    fn base_address(&self) -> u64;

    /// Length of the range in bytes.
    fn byte_len(&self) -> u64;

    /// The pool that owns the memory.
    fn pool_kind(&self) -> PoolKind;

    /// Whether the memory belongs to the intercepted application.
    fn is_application_pool(&self) -> bool {
        self.pool_kind().is_application()
    }

    /// The tool pool this view keeps alive, if it owns one. Observers hold
    /// on to it until the view's bytes have been captured.
    fn backing_pool(&self) -> Option<Rc<Pool>> {
        None
    }
}

// SAFETY: a `Slice` is constructed from a live `&'a mut [T]`, from a pool
// it co-owns, or through `Slice::from_raw_parts`, whose caller promises
// validity for `'a`. Base and count never change after construction.
#[allow(unsafe_code)]
unsafe impl<'a: 'b, 'b, T: Element> MemoryView<'b> for Slice<'a, T> {
    fn base_address(&self) -> u64 {
        Slice::base_address(self)
    }

    fn byte_len(&self) -> u64 {
        Slice::byte_len(self)
    }

    fn pool_kind(&self) -> PoolKind {
        Slice::pool_kind(self)
    }

    fn backing_pool(&self) -> Option<Rc<Pool>> {
        self.pool().cloned()
    }
}
