//! # whiprust
//!
//! A pure Rust library for decoding legacy vector drawing opcode streams
//! into a page-fitted scene document.
//!
//! The stream format interleaves three record encodings: single-byte
//! opcodes with table-bounded payloads, parenthesized ASCII records, and
//! length-prefixed binary records. Decoding resolves relative coordinates
//! against a chaining origin, tracks the ambient graphics state through a
//! save/restore stack, and accumulates resolved primitives in stream
//! order.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use whiprust::{W2dReader, PageRegion};
//!
//! // Decode a stream and fit it to a US Letter page
//! let doc = W2dReader::from_file("plan.w2d")?
//!     .read_fitted(&PageRegion::LETTER)?;
//!
//! for primitive in &doc.primitives {
//!     println!("{:?}", primitive.shape);
//! }
//!
//! // Non-fatal issues encountered while decoding
//! for note in doc.notifications.iter() {
//!     eprintln!("{}", note);
//! }
//! # Ok::<(), whiprust::error::W2dError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`io::RecordDecoder`] - classifies and frames records, encoding-agnostic
//! - [`opcodes::OpcodeTable`] - maps record identities to payload parsers
//! - [`state::GraphicsStateMachine`] - ambient attributes and the save stack
//! - [`coords::CoordinateCursor`] - delta resolution with overflow rejection
//! - [`scene::SceneDocument`] - the decoded drawing, fit via [`fit::BoundingBoxFitter`]
//! - [`W2dReader`] - the pipeline tying the above together

#![allow(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod coords;
pub mod error;
pub mod fit;
pub mod io;
pub mod notification;
pub mod opcodes;
pub mod reader;
pub mod scene;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use error::{ErrorKind, Result, W2dError};
pub use types::{BoundingBox, IntPoint, LineWeight, Rgba, Transform2D, Vector2};

// Re-export scene and state types
pub use scene::{Primitive, SceneBuilder, SceneDocument, Shape};
pub use state::{AttributeChange, GraphicsState, GraphicsStateMachine};

// Re-export decode machinery
pub use coords::{CoordMode, CoordinateCursor, Width};
pub use fit::{BoundingBoxFitter, PageRegion};
pub use io::{ByteCursor, OpcodeIdentity, OpcodeRecord, RecordDecoder, RecordFormat};
pub use notification::{Notification, NotificationCollection, NotificationKind};
pub use opcodes::{standard_table, BlockRef, OpcodeTable};

// Re-export the reader
pub use reader::{read_many, W2dReader, W2dReaderConfiguration};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_empty_stream_decodes_to_empty_document() {
        let doc = W2dReader::from_bytes(Vec::new()).read().unwrap();
        assert!(doc.is_empty());
        assert!(doc.notifications.is_empty());
        assert!(doc.compute_bounds().is_none());
    }
}
