//! Record classification and decoding.
//!
//! A stream is a sequence of heterogeneous records in three encodings:
//!
//! - **single-byte**: one opcode byte, payload bounded by the opcode
//!   table's extent hint (these records carry no length field);
//! - **extended ASCII**: `(Name payload)` with nesting-tracked scanning
//!   for the matching close paren;
//! - **extended binary**: `{` + u32-LE size + u16-LE code + payload + `}`,
//!   where `size == 2 (code) + payload.len() + 1 (closing delimiter)`.
//!
//! The decoder is opcode-agnostic: it always returns a syntactically valid
//! record if the bytes are well-formed, whether or not the identity is
//! recognized. Skipping unknown records is the dispatcher's job.

use crate::error::{Result, W2dError};
use crate::opcodes::table::{OpcodeTable, PayloadExtent};
use byteorder::{LittleEndian, ReadBytesExt};
use std::fmt;

use super::ByteCursor;

/// Maximum length of an extended-ASCII record name.
const MAX_NAME_LEN: usize = 64;

/// How a record was encoded in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordFormat {
    /// One opcode byte
    SingleByte,
    /// Parenthesized textual record
    ExtendedAscii,
    /// Length-prefixed binary record
    ExtendedBinary,
}

impl fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleByte => write!(f, "single-byte"),
            Self::ExtendedAscii => write!(f, "extended-ascii"),
            Self::ExtendedBinary => write!(f, "extended-binary"),
        }
    }
}

/// The identity of an opcode in one of the three disjoint key spaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OpcodeIdentity {
    /// Single opcode byte
    SingleByte(u8),
    /// Extended-ASCII record name
    Named(String),
    /// Extended-binary 16-bit code
    BinaryCode(u16),
}

impl fmt::Display for OpcodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleByte(b) if b.is_ascii_graphic() => write!(f, "'{}'", *b as char),
            Self::SingleByte(b) => write!(f, "{:#04X}", b),
            Self::Named(name) => write!(f, "({})", name),
            Self::BinaryCode(code) => write!(f, "{{{:#06X}}}", code),
        }
    }
}

/// A decoded record: identity, encoding, and the payload bytes bounded by
/// the decoder. Not yet opcode-specific parsed; constructed per iteration
/// and consumed immediately by the dispatch step.
#[derive(Debug, Clone)]
pub struct OpcodeRecord {
    /// Which opcode this record carries
    pub identity: OpcodeIdentity,
    /// The encoding it arrived in
    pub format: RecordFormat,
    /// Payload bytes, bounded but unparsed
    pub payload: Vec<u8>,
    /// Byte offset of the record start, for diagnostics
    pub offset: u64,
}

/// Classifies and decodes the next record from a [`ByteCursor`].
pub struct RecordDecoder {
    table: &'static OpcodeTable,
}

impl RecordDecoder {
    /// Create a decoder over the given opcode table.
    ///
    /// The table is only consulted for single-byte payload extents; the
    /// decoder never interprets payloads.
    pub fn new(table: &'static OpcodeTable) -> Self {
        Self { table }
    }

    /// Decode the next record. Returns `None` at clean end-of-stream.
    pub fn decode_next(&self, cursor: &mut ByteCursor) -> Result<Option<OpcodeRecord>> {
        cursor.skip_whitespace();
        let offset = cursor.offset();
        let Some(first) = cursor.peek() else {
            return Ok(None);
        };

        let record = match first {
            b'(' => self.decode_extended_ascii(cursor, offset)?,
            b'{' => self.decode_extended_binary(cursor, offset)?,
            _ => self.decode_single_byte(cursor, offset)?,
        };
        Ok(Some(record))
    }

    fn decode_single_byte(&self, cursor: &mut ByteCursor, offset: u64) -> Result<OpcodeRecord> {
        let opcode = cursor.read_byte()?;
        let payload = match self.table.single_byte_extent(opcode) {
            PayloadExtent::None => Vec::new(),
            PayloadExtent::Fixed(n) => cursor.read_bytes(n)?,
            PayloadExtent::CountPrefixed { bytes_per_point } => {
                let count = cursor.read_byte()?;
                let mut payload = Vec::with_capacity(1 + count as usize * bytes_per_point);
                payload.push(count);
                payload.extend(cursor.read_bytes(count as usize * bytes_per_point)?);
                payload
            }
        };
        Ok(OpcodeRecord {
            identity: OpcodeIdentity::SingleByte(opcode),
            format: RecordFormat::SingleByte,
            payload,
            offset,
        })
    }

    fn decode_extended_ascii(&self, cursor: &mut ByteCursor, offset: u64) -> Result<OpcodeRecord> {
        cursor.read_byte()?; // the '('

        let mut name = String::new();
        loop {
            match cursor.peek() {
                None => return Err(W2dError::UnexpectedEof { offset: cursor.offset() }),
                Some(b) if is_name_byte(b) => {
                    if name.len() >= MAX_NAME_LEN {
                        return Err(W2dError::Corrupt {
                            offset,
                            detail: "record name exceeds maximum length".to_string(),
                        });
                    }
                    cursor.read_byte()?;
                    name.push(b as char);
                }
                // Legal terminators: whitespace or either paren.
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') | Some(b'(') | Some(b')') => {
                    break
                }
                Some(b) => {
                    return Err(W2dError::Corrupt {
                        offset,
                        detail: format!("illegal byte {:#04X} in record name", b),
                    });
                }
            }
        }
        if name.is_empty() {
            return Err(W2dError::Corrupt {
                offset,
                detail: "empty record name".to_string(),
            });
        }

        let mut payload = Vec::new();
        self.scan_ascii_group(cursor, 1, &mut payload)?;

        // A geometry record's point list may continue in immediately
        // following parenthesized groups: `(Line 0,0)(100,200)` is one
        // record. A following `(` opens a new record only if it starts a
        // name; anything else is a continuation group.
        loop {
            let mark = cursor.offset();
            cursor.skip_whitespace();
            let starts_group = cursor.peek() == Some(b'(')
                && cursor.peek_at(1).is_some_and(|b| !b.is_ascii_alphabetic() && b != b'_');
            if !starts_group {
                cursor.rewind_to(mark);
                break;
            }
            cursor.read_byte()?; // the continuation '('
            payload.push(b' ');
            self.scan_ascii_group(cursor, 1, &mut payload)?;
        }

        Ok(OpcodeRecord {
            identity: OpcodeIdentity::Named(name),
            format: RecordFormat::ExtendedAscii,
            payload,
            offset,
        })
    }

    /// Accumulate bytes into `payload` until the paren depth returns to
    /// zero, honoring nested `(`...`)` inside the group.
    fn scan_ascii_group(
        &self,
        cursor: &mut ByteCursor,
        mut depth: u32,
        payload: &mut Vec<u8>,
    ) -> Result<()> {
        loop {
            let b = cursor.read_byte()?;
            match b {
                b'(' => {
                    depth += 1;
                    payload.push(b);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                    payload.push(b);
                }
                _ => payload.push(b),
            }
        }
    }

    fn decode_extended_binary(&self, cursor: &mut ByteCursor, offset: u64) -> Result<OpcodeRecord> {
        cursor.read_byte()?; // the '{'

        // The in-memory cursor only fails on exhaustion.
        let eof = |c: &ByteCursor| W2dError::UnexpectedEof { offset: c.len() };
        let declared_size = cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| eof(cursor))?;
        // size must cover the 2-byte code and the closing delimiter
        if declared_size < 3 {
            return Err(W2dError::Corrupt {
                offset,
                detail: format!("declared size {} too small", declared_size),
            });
        }
        let code = cursor
            .read_u16::<LittleEndian>()
            .map_err(|_| eof(cursor))?;

        let payload = cursor.read_bytes(declared_size as usize - 3)?;

        let terminator = cursor.read_byte()?;
        if terminator != b'}' {
            return Err(W2dError::Corrupt {
                offset,
                detail: format!(
                    "size field mismatch: expected '}}' after {} payload bytes, found {:#04X}",
                    payload.len(),
                    terminator
                ),
            });
        }

        Ok(OpcodeRecord {
            identity: OpcodeIdentity::BinaryCode(code),
            format: RecordFormat::ExtendedBinary,
            payload,
            offset,
        })
    }
}

/// Name bytes are printable ASCII excluding the two parens; whitespace and
/// control characters terminate or reject.
fn is_name_byte(b: u8) -> bool {
    b.is_ascii_graphic() && b != b'(' && b != b')'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcodes::table::standard_table;

    fn decode_one(bytes: &[u8]) -> Result<Option<OpcodeRecord>> {
        let mut cursor = ByteCursor::new(bytes.to_vec());
        RecordDecoder::new(standard_table()).decode_next(&mut cursor)
    }

    #[test]
    fn test_clean_eof() {
        assert!(decode_one(b"").unwrap().is_none());
        assert!(decode_one(b"  \r\n\t ").unwrap().is_none());
    }

    #[test]
    fn test_ascii_record() {
        let record = decode_one(b"(Color 255,0,0,255)").unwrap().unwrap();
        assert_eq!(record.identity, OpcodeIdentity::Named("Color".to_string()));
        assert_eq!(record.format, RecordFormat::ExtendedAscii);
        assert_eq!(record.payload, b" 255,0,0,255");
    }

    #[test]
    fn test_ascii_nested_parens() {
        let record = decode_one(b"(Font 2 (simplex (bold)))").unwrap().unwrap();
        assert_eq!(record.identity, OpcodeIdentity::Named("Font".to_string()));
        assert_eq!(record.payload, b" 2 (simplex (bold))");
    }

    #[test]
    fn test_ascii_continuation_groups() {
        let record = decode_one(b"(Line 0,0)(100,200)").unwrap().unwrap();
        assert_eq!(record.identity, OpcodeIdentity::Named("Line".to_string()));
        assert_eq!(record.payload, b" 0,0 100,200");
    }

    #[test]
    fn test_ascii_followed_by_new_record() {
        let mut cursor = ByteCursor::new(b"(Fill 1)(Line 0,0)(5,5)".to_vec());
        let decoder = RecordDecoder::new(standard_table());
        let first = decoder.decode_next(&mut cursor).unwrap().unwrap();
        assert_eq!(first.identity, OpcodeIdentity::Named("Fill".to_string()));
        let second = decoder.decode_next(&mut cursor).unwrap().unwrap();
        assert_eq!(second.identity, OpcodeIdentity::Named("Line".to_string()));
        assert_eq!(second.payload, b" 0,0 5,5");
        assert!(decoder.decode_next(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn test_ascii_illegal_name_byte() {
        let err = decode_one(b"(Li\x01ne 0,0)").unwrap_err();
        assert!(matches!(err, W2dError::Corrupt { .. }));
    }

    #[test]
    fn test_ascii_unterminated() {
        let err = decode_one(b"(Line 0,0").unwrap_err();
        assert!(matches!(err, W2dError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_binary_record() {
        // size 7 = 2 (code) + 4 (payload) + 1 ('}')
        let mut bytes = vec![b'{'];
        bytes.extend_from_slice(&7u32.to_le_bytes());
        bytes.extend_from_slice(&0x0201u16.to_le_bytes());
        bytes.extend_from_slice(&[255, 0, 0, 255]);
        bytes.push(b'}');

        let record = decode_one(&bytes).unwrap().unwrap();
        assert_eq!(record.identity, OpcodeIdentity::BinaryCode(0x0201));
        assert_eq!(record.format, RecordFormat::ExtendedBinary);
        assert_eq!(record.payload, vec![255, 0, 0, 255]);
    }

    #[test]
    fn test_binary_size_round_trip() {
        // declared_size - 3 payload bytes, always.
        for payload_len in [0usize, 1, 8, 100] {
            let mut bytes = vec![b'{'];
            bytes.extend_from_slice(&((payload_len as u32) + 3).to_le_bytes());
            bytes.extend_from_slice(&0x0100u16.to_le_bytes());
            bytes.extend(std::iter::repeat(0xAB).take(payload_len));
            bytes.push(b'}');
            let record = decode_one(&bytes).unwrap().unwrap();
            assert_eq!(record.payload.len(), payload_len);
        }
    }

    #[test]
    fn test_binary_size_too_small_is_corrupt() {
        let mut bytes = vec![b'{'];
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&0x0100u16.to_le_bytes());
        bytes.push(b'}');
        let err = decode_one(&bytes).unwrap_err();
        assert!(matches!(err, W2dError::Corrupt { .. }));
    }

    #[test]
    fn test_binary_size_off_by_one_is_corrupt() {
        // Declared one byte larger than reality: the '}' lands inside the
        // payload and the terminator check fails on the next byte.
        let mut bytes = vec![b'{'];
        bytes.extend_from_slice(&8u32.to_le_bytes());
        bytes.extend_from_slice(&0x0201u16.to_le_bytes());
        bytes.extend_from_slice(&[255, 0, 0, 255]);
        bytes.push(b'}');
        bytes.push(b'V'); // next record, mis-consumed as terminator
        let err = decode_one(&bytes).unwrap_err();
        assert!(matches!(err, W2dError::Corrupt { .. }));

        // Declared one byte smaller: terminator check sees a payload byte.
        let mut bytes = vec![b'{'];
        bytes.extend_from_slice(&6u32.to_le_bytes());
        bytes.extend_from_slice(&0x0201u16.to_le_bytes());
        bytes.extend_from_slice(&[255, 0, 0, 255]);
        bytes.push(b'}');
        let err = decode_one(&bytes).unwrap_err();
        assert!(matches!(err, W2dError::Corrupt { .. }));
    }

    #[test]
    fn test_binary_truncated_is_eof() {
        // Declared size 10 but only 6 payload bytes before stream end.
        let mut bytes = vec![b'{'];
        bytes.extend_from_slice(&10u32.to_le_bytes());
        bytes.extend_from_slice(&0x0100u16.to_le_bytes());
        bytes.extend_from_slice(&[1, 2, 3, 4, 5, 6]);
        let err = decode_one(&bytes).unwrap_err();
        assert!(matches!(err, W2dError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_single_byte_fixed_payload() {
        // 'l': 16-bit relative line, fixed 8-byte payload.
        let mut bytes = vec![b'l'];
        bytes.extend_from_slice(&1i16.to_le_bytes());
        bytes.extend_from_slice(&2i16.to_le_bytes());
        bytes.extend_from_slice(&3i16.to_le_bytes());
        bytes.extend_from_slice(&4i16.to_le_bytes());
        let record = decode_one(&bytes).unwrap().unwrap();
        assert_eq!(record.identity, OpcodeIdentity::SingleByte(b'l'));
        assert_eq!(record.payload.len(), 8);
    }

    #[test]
    fn test_single_byte_count_prefixed_payload() {
        // 'p': 16-bit relative polyline, u8 count then count 4-byte points.
        let mut bytes = vec![b'p', 3];
        for d in [(1i16, 1i16), (2, 2), (3, 3)] {
            bytes.extend_from_slice(&d.0.to_le_bytes());
            bytes.extend_from_slice(&d.1.to_le_bytes());
        }
        let record = decode_one(&bytes).unwrap().unwrap();
        assert_eq!(record.payload.len(), 1 + 3 * 4);
        assert_eq!(record.payload[0], 3);
    }

    #[test]
    fn test_single_byte_unknown_has_empty_payload() {
        let record = decode_one(&[0x7F, 0xAA]).unwrap().unwrap();
        assert_eq!(record.identity, OpcodeIdentity::SingleByte(0x7F));
        assert!(record.payload.is_empty());
    }

    #[test]
    fn test_record_offset_reported() {
        let mut cursor = ByteCursor::new(b"  (Fill 1)".to_vec());
        let decoder = RecordDecoder::new(standard_table());
        let record = decoder.decode_next(&mut cursor).unwrap().unwrap();
        assert_eq!(record.offset, 2);
    }
}
