//! Shared test utilities for whiprust integration tests.
//!
//! Stream builders for the three record encodings, so tests assemble
//! byte streams without hand-writing framing in every case.

#![allow(dead_code)]

/// Frame an extended-binary record: `{` + size + code + payload + `}`.
pub fn binary_record(code: u16, payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![b'{'];
    bytes.extend_from_slice(&((payload.len() as u32) + 3).to_le_bytes());
    bytes.extend_from_slice(&code.to_le_bytes());
    bytes.extend_from_slice(payload);
    bytes.push(b'}');
    bytes
}

/// Two little-endian i32 values.
pub fn point32(x: i32, y: i32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(8);
    bytes.extend_from_slice(&x.to_le_bytes());
    bytes.extend_from_slice(&y.to_le_bytes());
    bytes
}

/// Two little-endian i16 values.
pub fn point16(x: i16, y: i16) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(4);
    bytes.extend_from_slice(&x.to_le_bytes());
    bytes.extend_from_slice(&y.to_le_bytes());
    bytes
}

/// A binary absolute line record (code 0x0100).
pub fn binary_line(a: (i32, i32), b: (i32, i32)) -> Vec<u8> {
    let mut payload = point32(a.0, a.1);
    payload.extend(point32(b.0, b.1));
    binary_record(0x0100, &payload)
}

/// A single-byte relative line record (`l` + two 16-bit delta points).
pub fn single_byte_rel_line(d0: (i16, i16), d1: (i16, i16)) -> Vec<u8> {
    let mut bytes = vec![b'l'];
    bytes.extend(point16(d0.0, d0.1));
    bytes.extend(point16(d1.0, d1.1));
    bytes
}

/// A single-byte relative polyline record (`p` + count + delta points).
pub fn single_byte_rel_polyline(deltas: &[(i16, i16)]) -> Vec<u8> {
    let mut bytes = vec![b'p', deltas.len() as u8];
    for &(dx, dy) in deltas {
        bytes.extend(point16(dx, dy));
    }
    bytes
}

/// A binary relative polyline record (code 0x0103, u16 count).
pub fn binary_rel_polyline(deltas: &[(i16, i16)]) -> Vec<u8> {
    let mut payload = (deltas.len() as u16).to_le_bytes().to_vec();
    for &(dx, dy) in deltas {
        payload.extend(point16(dx, dy));
    }
    binary_record(0x0103, &payload)
}
