//! Strongly-typed scalar identifiers carried by a call.

use std::fmt;

/// GL-style error code recorded for an intercepted call.
///
/// Opaque to the observer: it is stored and returned verbatim, never
/// interpreted or validated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorCode(pub u32);

impl ErrorCode {
    /// No error has been raised for the call (`GL_NO_ERROR`).
    pub const NO_ERROR: Self = Self(0);

    /// Whether this code is [`ErrorCode::NO_ERROR`].
    pub fn is_no_error(self) -> bool {
        self == Self::NO_ERROR
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

impl From<u32> for ErrorCode {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
