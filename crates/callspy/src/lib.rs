//! callspy: per-call memory observation for API interception layers.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! callspy sub-crates. For most users, adding `callspy` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use callspy::prelude::*;
//!
//! let mut indices = [0u16, 1, 2, 2, 3, 0];
//! let mut query_result = [0u64; 1];
//!
//! let config = ObserverConfig::full_fidelity();
//! let mut observer = CallObserver::new(&config);
//! observer.set_command_name("glDrawElements");
//!
//! // Inputs are registered, then captured before the real call runs.
//! let input = Slice::application(&mut indices);
//! observer.read_view(&input);
//! observer.observe_reads();
//!
//! // The real call fills the output; capture it afterwards.
//! let output = Slice::application(&mut query_result);
//! output.set(0, 6);
//! observer.write_view(&output);
//! observer.observe_writes();
//!
//! let record = observer.observations().unwrap();
//! assert_eq!(record.reads[0].len(), 12);
//! assert_eq!(record.writes[0].bytes(), &6u64.to_ne_bytes());
//!
//! let mut wire = Vec::new();
//! observer.encode_extras(&mut wire).unwrap();
//! assert_eq!(wire[0], callspy::types::EXTRA_OBSERVATIONS);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `callspy-core` | Observations, error codes, extras, codec |
//! | [`arena`] | `callspy-arena` | Call-scoped scratch arena |
//! | [`pool`] | `callspy-pool` | Pools, typed slices, pool classification |
//! | [`observer`] | `callspy-observer` | Call observer and pending-range tracker |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Observation records, error codes, and the extra codec (`callspy-core`).
pub use callspy_core as types;

/// Call-scoped scratch allocation (`callspy-arena`).
///
/// Every [`observer::CallObserver`] owns an [`arena::ScratchArena`] that is
/// released when the call ends.
pub use callspy_arena as arena;

/// Memory pools and typed views (`callspy-pool`).
///
/// [`pool::Slice`] is the typed view the observer's element helpers take;
/// [`pool::MemoryView`] is the classification capability it consults.
pub use callspy_pool as pool;

/// The per-call observer (`callspy-observer`).
pub use callspy_observer as observer;

/// Common imports for interception layers.
///
/// ```rust
/// use callspy::prelude::*;
/// ```
pub mod prelude {
    pub use callspy_core::{
        AbortError, CodecError, Encodable, ErrorCode, Observation, Observations,
    };
    pub use callspy_observer::{CallObserver, ExtraRef, MemoryReader, ObserverConfig, ProcessMemory};
    pub use callspy_pool::{Element, MemoryView, PoolKind, Slice};
}
