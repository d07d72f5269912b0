//! Per-call memory observation with deferred, coalesced capture.
//!
//! A [`CallObserver`] is created at the start of every intercepted call and
//! dropped at its end. Input buffers are registered as pending reads, copied
//! out by [`CallObserver::observe_reads`] before the real call runs; output
//! buffers are registered as pending writes and copied out by
//! [`CallObserver::observe_writes`] afterwards. Registration never copies:
//! touched ranges accumulate in a [`PendingRanges`] set that merges
//! overlapping and adjacent intervals, and bytes are captured only at
//! materialization.
//!
//! # Architecture
//!
//! ```text
//! CallObserver<'call, R: MemoryReader>
//! ├── PendingRanges        (BTreeMap start → end, merged on insert)
//! ├── ScratchArena         (call-scoped bump allocator)
//! ├── Observations         (reads / writes, created on first capture)
//! └── Extra list           (ordered, append-only)
//! ```
//!
//! # Pool gating
//!
//! Typed-view entry points only observe memory when the observer's
//! `observe_application_pool` policy is on **and** the view is backed by the
//! application pool. Raw address registration and the string helpers are
//! never gated.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod extra;
pub mod memory;
pub mod observer;
pub mod pending;

pub use config::ObserverConfig;
pub use extra::{ExtraRef, Extras};
pub use memory::{MemoryReader, ProcessMemory};
pub use observer::CallObserver;
pub use pending::PendingRanges;
