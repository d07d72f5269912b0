//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during arena allocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// Growing the arena would exceed [`ArenaConfig::max_bytes`](crate::ArenaConfig).
    CapacityExceeded {
        /// Number of bytes requested.
        requested: usize,
        /// Configured byte limit.
        capacity: usize,
    },
    /// The requested element count overflows the address space.
    LayoutOverflow {
        /// Number of elements requested.
        count: usize,
        /// Size of one element in bytes.
        element_size: usize,
    },
    /// The global allocator refused to provide a chunk.
    OutOfMemory {
        /// Chunk size in bytes.
        bytes: usize,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "arena capacity exceeded: requested {requested} bytes, capacity {capacity} bytes"
                )
            }
            Self::LayoutOverflow {
                count,
                element_size,
            } => {
                write!(
                    f,
                    "allocation of {count} elements of {element_size} bytes overflows"
                )
            }
            Self::OutOfMemory { bytes } => {
                write!(f, "allocator failed to provide a {bytes}-byte chunk")
            }
        }
    }
}

impl Error for ArenaError {}
