//! Reading the bytes behind pending ranges.

#![allow(unsafe_code)]

use std::ptr;

/// Copies bytes out of an address space at materialization time.
pub trait MemoryReader {
    /// Fill `out` with the `out.len()` bytes starting at `address`.
    ///
    /// # Safety
    ///
    /// For readers backed by real memory, the whole range must be readable
    /// for the duration of the call.
    unsafe fn read(&self, address: u64, out: &mut [u8]);
}

impl<R: MemoryReader + ?Sized> MemoryReader for &R {
    unsafe fn read(&self, address: u64, out: &mut [u8]) {
        // SAFETY: forwarded contract.
        unsafe { (**self).read(address, out) }
    }
}

/// Reads the current process's own address space.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessMemory;

impl MemoryReader for ProcessMemory {
    unsafe fn read(&self, address: u64, out: &mut [u8]) {
        if out.is_empty() {
            return;
        }
        let src = address as usize as *const u8;
        // SAFETY: the caller guarantees `[address, address + out.len())` is
        // readable; `out` is a distinct Rust buffer so the ranges cannot
        // overlap.
        unsafe { ptr::copy_nonoverlapping(src, out.as_mut_ptr(), out.len()) }
    }
}
