//! Reference binary encoding for call extras.
//!
//! All integers are little-endian. Each extra is framed as a tag byte
//! followed by a `u32` payload length and the payload, so a reader can skip
//! tags it does not understand. This is the shape the transport layer
//! expects; it is not a versioned file format.
//!
//! ```text
//! extra        := [tag u8] [payload_len u32] [payload]
//! observations := [reads: list] [writes: list]
//! list         := [count u32] ([address u64] [len u64] [bytes; len])*
//! ```

use std::io::{Read, Write};

use crate::error::CodecError;
use crate::extra::Encodable;
use crate::observation::{Observation, Observations};

/// Tag byte identifying an [`Observations`] extra.
pub const EXTRA_OBSERVATIONS: u8 = 1;

// ── Primitive writers ───────────────────────────────────────────

fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), CodecError> {
    w.write_all(&[v])?;
    Ok(())
}

fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), CodecError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), CodecError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn checked_u32(len: usize, what: &str) -> Result<u32, CodecError> {
    u32::try_from(len).map_err(|_| CodecError::Malformed {
        detail: format!("{what} length {len} exceeds u32::MAX"),
    })
}

// ── Primitive readers ───────────────────────────────────────────

fn read_u8(r: &mut dyn Read) -> Result<u8, CodecError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u32_le(r: &mut dyn Read) -> Result<u32, CodecError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64_le(r: &mut dyn Read) -> Result<u64, CodecError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

// ── Extra framing ───────────────────────────────────────────────

/// Write one extra as `[tag][payload_len][payload]`.
pub fn encode_extra(w: &mut dyn Write, extra: &dyn Encodable) -> Result<(), CodecError> {
    let mut payload = Vec::new();
    extra.encode(&mut payload)?;
    write_u8(w, extra.type_tag())?;
    write_u32_le(w, checked_u32(payload.len(), "extra payload")?)?;
    w.write_all(&payload)?;
    Ok(())
}

/// Read one framed extra, returning its tag and raw payload.
///
/// Returns `Ok(None)` on a clean end of stream before the tag byte.
pub fn read_extra(r: &mut dyn Read) -> Result<Option<(u8, Vec<u8>)>, CodecError> {
    let mut tag = [0u8; 1];
    if r.read(&mut tag)? == 0 {
        return Ok(None);
    }
    let len = read_u32_le(r)?;
    let payload = read_bytes(r, u64::from(len), "extra payload")?;
    Ok(Some((tag[0], payload)))
}

// ── Observations ────────────────────────────────────────────────

fn encode_list(w: &mut dyn Write, list: &[Observation]) -> Result<(), CodecError> {
    write_u32_le(w, checked_u32(list.len(), "observation list")?)?;
    for obs in list {
        write_u64_le(w, obs.address())?;
        write_u64_le(w, obs.len())?;
        w.write_all(obs.bytes())?;
    }
    Ok(())
}

/// Read exactly `len` bytes without trusting `len` for the allocation size.
fn read_bytes(r: &mut dyn Read, len: u64, what: &str) -> Result<Vec<u8>, CodecError> {
    let mut bytes = Vec::new();
    (&mut *r).take(len).read_to_end(&mut bytes)?;
    if bytes.len() as u64 != len {
        return Err(CodecError::Malformed {
            detail: format!("{what} declares {len} bytes but only {} follow", bytes.len()),
        });
    }
    Ok(bytes)
}

fn decode_list(r: &mut dyn Read) -> Result<Vec<Observation>, CodecError> {
    let count = read_u32_le(r)? as usize;
    let mut list = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        let address = read_u64_le(r)?;
        let len = read_u64_le(r)?;
        let bytes = read_bytes(r, len, "observation")?;
        list.push(Observation::new(address, bytes));
    }
    Ok(list)
}

/// Encode the payload of an [`Observations`] extra.
pub fn encode_observations(w: &mut dyn Write, record: &Observations) -> Result<(), CodecError> {
    encode_list(w, &record.reads)?;
    encode_list(w, &record.writes)?;
    Ok(())
}

/// Decode the payload of an [`Observations`] extra.
pub fn decode_observations(r: &mut dyn Read) -> Result<Observations, CodecError> {
    let reads = decode_list(r)?;
    let writes = decode_list(r)?;
    Ok(Observations { reads, writes })
}

/// Decode a framed extra that must be an [`Observations`] record.
pub fn decode_observations_extra(r: &mut dyn Read) -> Result<Observations, CodecError> {
    let tag = read_u8(r)?;
    if tag != EXTRA_OBSERVATIONS {
        return Err(CodecError::UnknownTag { tag });
    }
    let len = read_u32_le(r)?;
    let payload = read_bytes(r, u64::from(len), "extra payload")?;
    let mut cursor = payload.as_slice();
    let record = decode_observations(&mut cursor)?;
    if !cursor.is_empty() {
        return Err(CodecError::Malformed {
            detail: format!("{} trailing bytes after observations", cursor.len()),
        });
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Observations {
        Observations {
            reads: vec![
                Observation::new(0x100, vec![1, 2, 3]),
                Observation::new(0x200, vec![4]),
            ],
            writes: vec![Observation::new(0x300, vec![5, 6])],
        }
    }

    #[test]
    fn payload_layout() {
        let mut buf = Vec::new();
        encode_observations(&mut buf, &sample()).unwrap();
        // reads: 4 + (16 + 3) + (16 + 1); writes: 4 + (16 + 2)
        assert_eq!(buf.len(), 4 + 19 + 17 + 4 + 18);
        assert_eq!(&buf[..4], &2u32.to_le_bytes());
        assert_eq!(&buf[4..12], &0x100u64.to_le_bytes());
    }

    #[test]
    fn framed_extra_decodes_back() {
        let record = sample();
        let mut buf = Vec::new();
        encode_extra(&mut buf, &record).unwrap();
        assert_eq!(buf[0], EXTRA_OBSERVATIONS);
        let decoded = decode_observations_extra(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn read_extra_stops_at_end_of_stream() {
        let mut buf = Vec::new();
        encode_extra(&mut buf, &Observations::new()).unwrap();
        let mut r = buf.as_slice();
        let (tag, payload) = read_extra(&mut r).unwrap().unwrap();
        assert_eq!(tag, EXTRA_OBSERVATIONS);
        assert_eq!(payload.len(), 8);
        assert!(read_extra(&mut r).unwrap().is_none());
    }

    #[test]
    fn truncated_bytes_are_malformed() {
        let mut buf = Vec::new();
        encode_observations(&mut buf, &sample()).unwrap();
        buf.truncate(buf.len() - 1);
        let result = decode_observations(&mut buf.as_slice());
        assert!(matches!(result, Err(CodecError::Malformed { .. })));
    }

    #[test]
    fn truncated_header_is_io_error() {
        let buf = [1u8, 0, 0, 0, 0xAA];
        let result = decode_observations(&mut buf.as_slice());
        assert!(matches!(result, Err(CodecError::Io(_))));
    }

    #[test]
    fn huge_declared_length_is_rejected_without_allocating() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&0u64.to_le_bytes());
        buf.extend_from_slice(&(1u64 << 62).to_le_bytes());
        let result = decode_observations(&mut buf.as_slice());
        assert!(matches!(result, Err(CodecError::Malformed { .. })));
    }

    #[test]
    fn huge_frame_length_is_rejected() {
        let mut buf = vec![EXTRA_OBSERVATIONS];
        buf.extend_from_slice(&u32::MAX.to_le_bytes());
        buf.extend_from_slice(&[0; 8]);
        let result = decode_observations_extra(&mut buf.as_slice());
        assert!(matches!(result, Err(CodecError::Malformed { .. })));
        assert!(matches!(
            read_extra(&mut buf.as_slice()),
            Err(CodecError::Malformed { .. })
        ));
    }

    #[test]
    fn wrong_tag_is_rejected() {
        let buf = [7u8, 0, 0, 0, 0];
        let result = decode_observations_extra(&mut buf.as_slice());
        assert!(matches!(result, Err(CodecError::UnknownTag { tag: 7 })));
    }
}
