//! Primitive encoders and decoders for the GazeFlow wire format.
//!
//! Every string on the wire is prefixed with its UTF-8 byte length encoded
//! as an unsigned base-128 varint: least-significant 7-bit group first, high
//! bit set on every byte except the last. The peer is not under our control,
//! so these must stay bit-exact.

use crate::error::ProtocolError;
use std::io::{ErrorKind, Read};

/// Longest varint that still fits in a `u64`.
const MAX_VARINT_BYTES: usize = 10;

/// Upper bound on the buffer reserved before payload bytes arrive.
const INITIAL_PAYLOAD_CAPACITY: usize = 64 * 1024;

/// Read a single byte, retrying on `Interrupted`.
fn read_byte<R: Read>(source: &mut R) -> Result<u8, ProtocolError> {
    let mut buf = [0u8; 1];
    loop {
        match source.read(&mut buf) {
            Ok(0) => return Err(ProtocolError::StreamClosed),
            Ok(_) => return Ok(buf[0]),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(ProtocolError::Io(e)),
        }
    }
}

/// Decode an unsigned varint from `source`, one byte at a time.
pub fn decode_varint<R: Read>(source: &mut R) -> Result<u64, ProtocolError> {
    let mut value: u64 = 0;

    for index in 0..MAX_VARINT_BYTES {
        let byte = read_byte(source)?;
        let group = u64::from(byte & 0x7F);
        let shift = 7 * index as u32;

        // The tenth byte may only contribute the single remaining bit.
        if index == MAX_VARINT_BYTES - 1 && group > 1 {
            return Err(ProtocolError::VarintOverflow);
        }

        value |= group << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }

    Err(ProtocolError::VarintOverflow)
}

/// Encode `value` as an unsigned varint.
pub fn encode_varint(mut value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_VARINT_BYTES);
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if value == 0 {
            return out;
        }
    }
}

/// Read exactly `len` bytes, looping over short reads.
///
/// The buffer grows with the bytes that actually arrive; the length prefix
/// comes from the peer and only bounds the read.
fn read_exact_bytes<R: Read>(source: &mut R, len: usize) -> Result<Vec<u8>, ProtocolError> {
    let mut data = Vec::with_capacity(len.min(INITIAL_PAYLOAD_CAPACITY));
    source.take(len as u64).read_to_end(&mut data)?;

    if data.len() < len {
        return Err(ProtocolError::StreamClosed);
    }
    Ok(data)
}

/// Read a length-prefixed payload without decoding it.
pub fn decode_length_prefixed_bytes<R: Read>(source: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let len = decode_varint(source)?;
    if len == 0 {
        return Ok(Vec::new());
    }
    let len = usize::try_from(len).map_err(|_| ProtocolError::VarintOverflow)?;
    read_exact_bytes(source, len)
}

/// Read a length-prefixed UTF-8 string.
pub fn decode_length_prefixed_string<R: Read>(source: &mut R) -> Result<String, ProtocolError> {
    let bytes = decode_length_prefixed_bytes(source)?;
    Ok(String::from_utf8(bytes)?)
}

/// Encode `text` as length prefix followed by its UTF-8 bytes, ready for a
/// single contiguous write.
pub fn encode_length_prefixed_string(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut out = encode_varint(bytes.len() as u64);
    out.extend_from_slice(bytes);
    out
}
