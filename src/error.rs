//! Error types for the whiprust library

use std::io;
use thiserror::Error;

/// Machine-readable classification of a decode failure.
///
/// Structural kinds ([`Corrupt`](ErrorKind::Corrupt),
/// [`UnexpectedEof`](ErrorKind::UnexpectedEof)) abort the decode loop;
/// semantic kinds are recovered locally and surfaced as notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// I/O failure on the underlying byte source.
    Io,
    /// Malformed record structure; the stream's byte alignment is no
    /// longer trustworthy.
    Corrupt,
    /// Stream ended in the middle of a record.
    UnexpectedEof,
    /// Structurally valid record with an unrecognized identity.
    UnknownOpcode,
    /// A restore with no matching save.
    StackUnderflow,
    /// A resolved coordinate exceeded the representable/sane bound.
    CoordinateOverflow,
}

/// Main error type for whiprust operations.
///
/// Every stream-derived variant carries the byte offset of the record
/// that produced it, for structured diagnostics.
#[derive(Debug, Error)]
pub enum W2dError {
    /// IO error occurred while reading the byte source
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Malformed record structure
    #[error("Corrupt record at offset {offset:#X}: {detail}")]
    Corrupt {
        /// Byte offset of the record start
        offset: u64,
        /// What was malformed
        detail: String,
    },

    /// Stream ended mid-record
    #[error("Unexpected end of stream at offset {offset:#X}")]
    UnexpectedEof {
        /// Byte offset where the stream ran out
        offset: u64,
    },

    /// Structurally well-formed record with an unrecognized identity
    #[error("Unknown opcode {identity} at offset {offset:#X}")]
    UnknownOpcode {
        /// Byte offset of the record start
        offset: u64,
        /// Display form of the opcode identity
        identity: String,
    },

    /// A state restore with no matching save
    #[error("State stack underflow at offset {offset:#X}")]
    StackUnderflow {
        /// Byte offset of the restore record
        offset: u64,
    },

    /// A resolved coordinate exceeded the configured bound
    #[error("Coordinate overflow at offset {offset:#X}: resolved value {value}")]
    CoordinateOverflow {
        /// Byte offset of the record whose resolution overflowed
        offset: u64,
        /// The offending widened value
        value: i64,
    },
}

impl W2dError {
    /// The machine-readable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            W2dError::Io(_) => ErrorKind::Io,
            W2dError::Corrupt { .. } => ErrorKind::Corrupt,
            W2dError::UnexpectedEof { .. } => ErrorKind::UnexpectedEof,
            W2dError::UnknownOpcode { .. } => ErrorKind::UnknownOpcode,
            W2dError::StackUnderflow { .. } => ErrorKind::StackUnderflow,
            W2dError::CoordinateOverflow { .. } => ErrorKind::CoordinateOverflow,
        }
    }

    /// Byte offset of the failing record, when the error is stream-derived.
    pub fn offset(&self) -> Option<u64> {
        match self {
            W2dError::Io(_) => None,
            W2dError::Corrupt { offset, .. }
            | W2dError::UnexpectedEof { offset }
            | W2dError::UnknownOpcode { offset, .. }
            | W2dError::StackUnderflow { offset }
            | W2dError::CoordinateOverflow { offset, .. } => Some(*offset),
        }
    }

    /// Whether this error terminates the decode loop.
    ///
    /// `Corrupt` and `UnexpectedEof` mean the stream's framing can no
    /// longer be trusted; everything else is recoverable per record.
    pub fn is_structural(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Io | ErrorKind::Corrupt | ErrorKind::UnexpectedEof
        )
    }
}

/// Result type alias for whiprust operations
pub type Result<T> = std::result::Result<T, W2dError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = W2dError::Corrupt {
            offset: 0x2A,
            detail: "size field mismatch".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Corrupt record at offset 0x2A: size field mismatch"
        );
    }

    #[test]
    fn test_error_kind_and_offset() {
        let err = W2dError::CoordinateOverflow {
            offset: 100,
            value: i64::from(i32::MAX) + 1,
        };
        assert_eq!(err.kind(), ErrorKind::CoordinateOverflow);
        assert_eq!(err.offset(), Some(100));
        assert!(!err.is_structural());
    }

    #[test]
    fn test_structural_classification() {
        assert!(W2dError::UnexpectedEof { offset: 0 }.is_structural());
        assert!(!W2dError::StackUnderflow { offset: 0 }.is_structural());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: W2dError = io_err.into();
        assert!(matches!(err, W2dError::Io(_)));
        assert_eq!(err.offset(), None);
    }
}
