//! Test utilities and mock types for callspy development.
//!
//! Provides a scripted address space ([`FakeMemory`]) that stands in for
//! process memory, a minimal caller-owned extra ([`TagExtra`]), and
//! observer constructors in [`fixtures`].

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::Write;

use callspy_core::{CodecError, Encodable};
use callspy_observer::MemoryReader;

/// A sparse fake address space.
///
/// Bytes never poked read back as zero, so arbitrary addresses such as
/// `100..120` can be registered and materialized without touching real
/// memory. Interior mutability lets a test change contents while an
/// observer holds the reader by reference, which is how "the real call
/// writes its outputs" is simulated.
#[derive(Debug, Default)]
pub struct FakeMemory {
    bytes: RefCell<BTreeMap<u64, u8>>,
}

impl FakeMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` starting at `address`.
    pub fn poke(&self, address: u64, data: &[u8]) {
        let mut bytes = self.bytes.borrow_mut();
        for (offset, &b) in data.iter().enumerate() {
            bytes.insert(address + offset as u64, b);
        }
    }

    /// Read `len` bytes starting at `address`.
    pub fn peek(&self, address: u64, len: usize) -> Vec<u8> {
        let bytes = self.bytes.borrow();
        (0..len as u64)
            .map(|offset| bytes.get(&(address + offset)).copied().unwrap_or(0))
            .collect()
    }

    /// Fill `[address, address + len)` with `address as u8` per byte.
    pub fn fill_pattern(&self, address: u64, len: usize) {
        let data: Vec<u8> = (0..len as u64).map(|i| (address + i) as u8).collect();
        self.poke(address, &data);
    }
}

// Reads are bounds-free lookups in the map, so the contract holds for any
// address.
#[allow(unsafe_code)]
impl MemoryReader for FakeMemory {
    unsafe fn read(&self, address: u64, out: &mut [u8]) {
        let bytes = self.bytes.borrow();
        for (offset, b) in out.iter_mut().enumerate() {
            *b = bytes
                .get(&address.wrapping_add(offset as u64))
                .copied()
                .unwrap_or(0);
        }
    }
}

/// A caller-owned extra that encodes a fixed payload under a fixed tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagExtra {
    pub tag: u8,
    pub payload: Vec<u8>,
}

impl TagExtra {
    pub fn new(tag: u8, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            tag,
            payload: payload.into(),
        }
    }
}

impl Encodable for TagExtra {
    fn type_tag(&self) -> u8 {
        self.tag
    }

    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        w.write_all(&self.payload)?;
        Ok(())
    }
}
