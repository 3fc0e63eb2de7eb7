//! Seekable, peekable cursor over a fully buffered opcode stream.
//!
//! Decoding never observes partial reads: the byte source is buffered in
//! full before the decode loop starts, so the only I/O latency is up front.
//! The cursor supports look-ahead with put-back, which record
//! classification needs (a `(` may open a new record or continue the
//! previous one, and that is only decidable after peeking past it).

use crate::error::{Result, W2dError};
use std::io::{self, Cursor, Read, Seek, SeekFrom};

/// Cursor over the in-memory opcode stream.
pub struct ByteCursor {
    stream: Cursor<Vec<u8>>,
}

impl ByteCursor {
    /// Wrap an in-memory stream.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            stream: Cursor::new(data),
        }
    }

    /// Buffer an arbitrary reader in full, then wrap it.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self::new(data))
    }

    /// Current byte offset from the start of the stream.
    pub fn offset(&self) -> u64 {
        self.stream.position()
    }

    /// Total stream length in bytes.
    pub fn len(&self) -> u64 {
        self.stream.get_ref().len() as u64
    }

    /// Whether the cursor has consumed the whole stream.
    pub fn is_empty(&self) -> bool {
        self.offset() >= self.len()
    }

    /// Look at the next byte without consuming it. `None` at end of stream.
    pub fn peek(&self) -> Option<u8> {
        self.stream
            .get_ref()
            .get(self.stream.position() as usize)
            .copied()
    }

    /// Look `ahead` bytes past the cursor without consuming anything.
    pub fn peek_at(&self, ahead: u64) -> Option<u8> {
        self.stream
            .get_ref()
            .get((self.stream.position() + ahead) as usize)
            .copied()
    }

    /// Consume and return one byte, or `UnexpectedEof`.
    pub fn read_byte(&mut self) -> Result<u8> {
        let offset = self.offset();
        self.peek()
            .map(|b| {
                self.stream.set_position(offset + 1);
                b
            })
            .ok_or(W2dError::UnexpectedEof { offset })
    }

    /// Consume exactly `n` bytes, or `UnexpectedEof` if the stream is short.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let offset = self.offset();
        let start = offset as usize;
        let data = self.stream.get_ref();
        if start + n > data.len() {
            return Err(W2dError::UnexpectedEof { offset: self.len() });
        }
        let out = data[start..start + n].to_vec();
        self.stream.set_position(offset + n as u64);
        Ok(out)
    }

    /// Put the cursor back to an earlier offset (look-ahead retraction).
    pub fn rewind_to(&mut self, offset: u64) {
        self.stream.set_position(offset);
    }

    /// Rewind to the start of the stream.
    pub fn rewind(&mut self) {
        self.stream.set_position(0);
    }

    /// Consume insignificant whitespace (space, tab, CR, LF).
    ///
    /// Only legal between records; inside an opened text record the bytes
    /// are payload and this must not be called.
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b == b' ' || b == b'\t' || b == b'\r' || b == b'\n' {
                self.stream.set_position(self.offset() + 1);
            } else {
                break;
            }
        }
    }
}

impl Read for ByteCursor {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Seek for ByteCursor {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.stream.seek(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{LittleEndian, ReadBytesExt};

    #[test]
    fn test_peek_does_not_advance() {
        let mut cursor = ByteCursor::new(vec![1, 2, 3]);
        assert_eq!(cursor.peek(), Some(1));
        assert_eq!(cursor.peek(), Some(1));
        assert_eq!(cursor.read_byte().unwrap(), 1);
        assert_eq!(cursor.offset(), 1);
    }

    #[test]
    fn test_peek_at() {
        let cursor = ByteCursor::new(vec![b'(', b'L', b'i']);
        assert_eq!(cursor.peek_at(0), Some(b'('));
        assert_eq!(cursor.peek_at(1), Some(b'L'));
        assert_eq!(cursor.peek_at(5), None);
    }

    #[test]
    fn test_read_bytes_eof() {
        let mut cursor = ByteCursor::new(vec![1, 2]);
        let err = cursor.read_bytes(3).unwrap_err();
        assert!(matches!(err, W2dError::UnexpectedEof { .. }));
        // Cursor untouched on failure.
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn test_rewind_to() {
        let mut cursor = ByteCursor::new(vec![10, 20, 30]);
        cursor.read_byte().unwrap();
        cursor.read_byte().unwrap();
        cursor.rewind_to(1);
        assert_eq!(cursor.read_byte().unwrap(), 20);
    }

    #[test]
    fn test_skip_whitespace() {
        let mut cursor = ByteCursor::new(b" \t\r\nX Y".to_vec());
        cursor.skip_whitespace();
        assert_eq!(cursor.read_byte().unwrap(), b'X');
        cursor.skip_whitespace();
        assert_eq!(cursor.read_byte().unwrap(), b'Y');
    }

    #[test]
    fn test_byteorder_reads() {
        let mut cursor = ByteCursor::new(vec![0x0D, 0x00, 0x00, 0x00, 0x34, 0x12]);
        assert_eq!(cursor.read_u32::<LittleEndian>().unwrap(), 13);
        assert_eq!(cursor.read_u16::<LittleEndian>().unwrap(), 0x1234);
    }
}
