//! Pool-tagged memory views for callspy.
//!
//! Every view handed to a call observer carries a tag saying who owns its
//! backing memory:
//!
//! - **Application pool:** memory owned by the intercepted program. The
//!   interception layer must not mutate it and may need to copy it
//!   defensively.
//! - **Tool pool:** memory owned by the interception layer itself, freely
//!   mutable without observation.
//!
//! [`Slice`] is the concrete typed view; [`MemoryView`] is the
//! classification capability the observer gates on. [`Pool`] provides fresh
//! tool-owned storage.
//!
//! `unsafe` code is confined to `pool.rs` (raw allocation) and `slice.rs`
//! (element access through a raw base pointer).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod element;
pub mod pool;
pub mod slice;
pub mod view;

pub use element::Element;
pub use pool::{Pool, PoolId, PoolKind};
pub use slice::Slice;
pub use view::MemoryView;
