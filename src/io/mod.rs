//! Stream I/O: the byte cursor and the record decoder

pub mod byte_cursor;
pub mod record;

pub use byte_cursor::ByteCursor;
pub use record::{OpcodeIdentity, OpcodeRecord, RecordDecoder, RecordFormat};
