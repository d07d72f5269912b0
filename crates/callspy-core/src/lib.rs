//! Core types for the callspy memory-observation layer.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! record shapes produced for every intercepted call and consumed by the
//! transport layer: [`Observation`] triples, the [`Observations`] extra, the
//! [`Encodable`] capability all extras share, the call's [`ErrorCode`], and
//! the error types used across the workspace.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod extra;
pub mod id;
pub mod observation;

pub use codec::{decode_observations, EXTRA_OBSERVATIONS};
pub use error::{AbortError, CodecError};
pub use extra::Encodable;
pub use id::ErrorCode;
pub use observation::{Observation, Observations};
