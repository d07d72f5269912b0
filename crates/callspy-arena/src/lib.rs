//! Call-scoped bump allocation for callspy observers.
//!
//! A [`ScratchArena`] hands out memory for transient per-call data. There is
//! no per-object free: the whole allocation set is released together when the
//! arena is dropped at the end of the call.
//!
//! # Architecture
//!
//! ```text
//! ScratchArena
//! └── RawChunk[] (heap blocks, bump-allocated, never moved)
//! ```
//!
//! Chunks grow geometrically from [`ArenaConfig::chunk_size`]. Allocations
//! that do not fit the current chunk go to a fresh chunk; earlier chunks stay
//! alive so references handed out before the growth remain valid.
//!
//! All raw pointer work lives in `raw.rs`; `scratch.rs` only calls its
//! helpers and hands the results out as references.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
mod raw;
pub mod scratch;

pub use config::ArenaConfig;
pub use error::ArenaError;
pub use scratch::ScratchArena;
