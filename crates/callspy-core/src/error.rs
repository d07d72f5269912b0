//! Error types for the callspy workspace.
//!
//! Two families are kept apart on purpose: [`AbortError`] marks a contract
//! violation by the interception layer and is never recovered from, while
//! [`CodecError`] covers data conditions in the reference encoding.

use std::error::Error;
use std::fmt;
use std::io;

/// A fatal precondition violation that aborts the current call.
///
/// No partial result accompanies this error. The observer that raised it is
/// still dropped normally, releasing its scratch arena.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbortError {
    /// A null pointer was passed where a string pointer is required.
    NullPointer {
        /// The observer operation that received the null pointer.
        operation: &'static str,
    },
}

impl fmt::Display for AbortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NullPointer { operation } => {
                write!(f, "null pointer passed to {operation}")
            }
        }
    }
}

impl Error for AbortError {}

/// Errors from encoding or decoding extras.
#[derive(Debug)]
pub enum CodecError {
    /// An I/O error occurred on the underlying sink or source.
    Io(io::Error),
    /// An extra's type tag is not recognized.
    UnknownTag {
        /// The unrecognized tag.
        tag: u8,
    },
    /// The encoded data is truncated or inconsistent.
    Malformed {
        /// Human-readable description of what went wrong.
        detail: String,
    },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::UnknownTag { tag } => write!(f, "unknown extra tag {tag}"),
            Self::Malformed { detail } => write!(f, "malformed extra: {detail}"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CodecError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
