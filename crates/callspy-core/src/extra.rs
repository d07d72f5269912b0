//! The encodable-extra capability.

use std::io::Write;

use crate::error::CodecError;

/// An auxiliary record attached to an intercepted call.
///
/// Extras are appended to a call in order and consumed later by the
/// transport layer, which writes them in the same order. The core only
/// needs to hold them by reference and ask them to encode themselves.
pub trait Encodable {
    /// Discriminant identifying the kind of extra on the wire.
    fn type_tag(&self) -> u8;

    /// Write this extra's payload (without the tag) to `w`.
    fn encode(&self, w: &mut dyn Write) -> Result<(), CodecError>;
}
