//! Captured memory observations and the per-call observations record.

use std::io::Write;

use crate::codec;
use crate::error::CodecError;
use crate::extra::Encodable;

/// A captured `{address, length, bytes}` triple.
///
/// The address is an erased integer rather than a typed pointer so that
/// ranges from differently-typed views compare and merge uniformly.
/// Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    address: u64,
    bytes: Vec<u8>,
}

impl Observation {
    /// Build an observation of `bytes` captured at `address`.
    pub fn new(address: u64, bytes: Vec<u8>) -> Self {
        Self { address, bytes }
    }

    /// Start address of the captured range.
    pub fn address(&self) -> u64 {
        self.address
    }

    /// Length of the captured range in bytes.
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Whether the observation captured zero bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// One-past-the-end address of the captured range.
    pub fn end(&self) -> u64 {
        self.address.saturating_add(self.len())
    }

    /// The bytes captured at materialization time.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// The observations extra attached to a call.
///
/// Holds the read-phase and write-phase observation lists. Each list is
/// sorted by ascending address with no overlapping coverage within a single
/// materialization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Observations {
    /// Memory observed before the call executed.
    pub reads: Vec<Observation>,
    /// Memory observed after the call executed.
    pub writes: Vec<Observation>,
}

impl Observations {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether neither list holds an observation.
    pub fn is_empty(&self) -> bool {
        self.reads.is_empty() && self.writes.is_empty()
    }

    /// Total number of captured bytes across both lists.
    pub fn total_bytes(&self) -> u64 {
        self.reads
            .iter()
            .chain(&self.writes)
            .map(Observation::len)
            .sum()
    }
}

impl Encodable for Observations {
    fn type_tag(&self) -> u8 {
        codec::EXTRA_OBSERVATIONS
    }

    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError> {
        codec::encode_observations(w, self)
    }
}
