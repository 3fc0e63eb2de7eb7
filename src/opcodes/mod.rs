//! The versioned opcode library: payload parsers and the dispatch table.
//!
//! Each table entry is a pure function `(payload, format_hint) ->
//! ParsedPayload` plus a static declaration of its coordinate width and
//! mode. Parsers never touch the graphics state or the coordinate cursor;
//! the dispatcher owns those side effects.

pub mod attributes;
pub mod block_ref;
pub mod geometry;
pub mod table;

use crate::state::AttributeChange;
use crate::types::Rgba;
use std::fmt;

pub use block_ref::BlockRef;
pub use table::{standard_table, OpcodeDecl, OpcodeTable, PayloadExtent};

/// Payload parse failure; the dispatcher wraps it with the record's byte
/// offset as a `Corrupt` error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadError(pub String);

impl PayloadError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        PayloadError(message.into())
    }
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result type for payload parsers.
pub type ParseResult<T> = std::result::Result<T, PayloadError>;

/// What kind of primitive a geometry record produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Line,
    Polyline,
    Polygon,
    Circle,
    Ellipse,
    Arc,
    TriangleFan,
    Bezier,
    TextRun,
}

/// Non-coordinate fields of a geometry record.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryDetail {
    /// Nothing beyond the point list
    None,
    /// Circle radius in source units
    Circle { radius: i64 },
    /// Ellipse radii and rotation
    Ellipse {
        rx: i64,
        ry: i64,
        rotation_deg: f64,
    },
    /// Elliptical arc sweep
    Arc {
        rx: i64,
        ry: i64,
        rotation_deg: f64,
        start_deg: f64,
        end_deg: f64,
    },
    /// Per-vertex shading colors, one per point
    Shaded { colors: Vec<Rgba> },
    /// Text content
    Text { content: String },
}

/// A parsed geometry record: raw coordinates (deltas or absolute values,
/// per the table declaration) plus non-coordinate detail.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryRequest {
    pub kind: GeometryKind,
    /// Coordinate list, pre-resolution
    pub coords: Vec<(i64, i64)>,
    pub detail: GeometryDetail,
}

impl GeometryRequest {
    pub(crate) fn new(kind: GeometryKind, coords: Vec<(i64, i64)>) -> Self {
        Self {
            kind,
            coords,
            detail: GeometryDetail::None,
        }
    }

    pub(crate) fn with_detail(
        kind: GeometryKind,
        coords: Vec<(i64, i64)>,
        detail: GeometryDetail,
    ) -> Self {
        Self {
            kind,
            coords,
            detail,
        }
    }
}

/// Save/restore/reset control decoded from a state opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateControl {
    Save,
    Restore,
    Reset,
}

/// The uniform output of every payload parser.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedPayload {
    /// A geometry record to resolve and append
    Geometry(GeometryRequest),
    /// An attribute mutation for the state machine
    Attribute(AttributeChange),
    /// A save/restore/reset control
    Control(StateControl),
    /// Explicit origin override
    SetOrigin((i64, i64)),
    /// Declared source units (units per millimetre)
    Units(f64),
    /// Explicit sheet size hint
    SheetSize(f64, f64),
    /// A block-reference marker
    BlockRef(BlockRef),
}

/// Decode payload text: UTF-8 first, WINDOWS_1252 fallback for legacy
/// streams.
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Whitespace-separated field scanner over an ASCII payload.
pub(crate) struct AsciiFields {
    tokens: Vec<String>,
    index: usize,
}

impl AsciiFields {
    pub(crate) fn new(payload: &[u8]) -> Self {
        let text = decode_text(payload);
        Self {
            tokens: text.split_whitespace().map(str::to_string).collect(),
            index: 0,
        }
    }

    fn next_token(&mut self) -> ParseResult<&str> {
        let token = self
            .tokens
            .get(self.index)
            .ok_or_else(|| PayloadError::new("missing field"))?;
        self.index += 1;
        Ok(token)
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.index >= self.tokens.len()
    }

    pub(crate) fn next_i64(&mut self) -> ParseResult<i64> {
        let token = self.next_token()?.to_string();
        token
            .parse::<i64>()
            .map_err(|_| PayloadError::new(format!("invalid integer '{}'", token)))
    }

    pub(crate) fn next_f64(&mut self) -> ParseResult<f64> {
        let token = self.next_token()?.to_string();
        token
            .parse::<f64>()
            .map_err(|_| PayloadError::new(format!("invalid number '{}'", token)))
    }

    /// A point field: `x,y`.
    pub(crate) fn next_point(&mut self) -> ParseResult<(i64, i64)> {
        let token = self.next_token()?.to_string();
        parse_point_token(&token)
    }

    /// All remaining fields as points.
    pub(crate) fn remaining_points(&mut self) -> ParseResult<Vec<(i64, i64)>> {
        let mut points = Vec::new();
        while !self.is_exhausted() {
            points.push(self.next_point()?);
        }
        Ok(points)
    }

    /// A color field: `r,g,b` or `r,g,b,a`.
    pub(crate) fn next_color(&mut self) -> ParseResult<Rgba> {
        let token = self.next_token()?.to_string();
        let parts: Vec<&str> = token.split(',').collect();
        if parts.len() != 3 && parts.len() != 4 {
            return Err(PayloadError::new(format!("invalid color '{}'", token)));
        }
        let mut channels = [0u8; 4];
        channels[3] = 255;
        for (i, part) in parts.iter().enumerate() {
            channels[i] = part
                .parse::<u8>()
                .map_err(|_| PayloadError::new(format!("invalid color channel '{}'", part)))?;
        }
        Ok(Rgba::new(channels[0], channels[1], channels[2], channels[3]))
    }

    /// Everything not yet consumed, joined back with single spaces.
    pub(crate) fn rest_text(&mut self) -> String {
        let rest = self.tokens[self.index.min(self.tokens.len())..].join(" ");
        self.index = self.tokens.len();
        rest
    }
}

pub(crate) fn parse_point_token(token: &str) -> ParseResult<(i64, i64)> {
    let (x, y) = token
        .split_once(',')
        .ok_or_else(|| PayloadError::new(format!("invalid point '{}'", token)))?;
    let x = x
        .parse::<i64>()
        .map_err(|_| PayloadError::new(format!("invalid coordinate '{}'", x)))?;
    let y = y
        .parse::<i64>()
        .map_err(|_| PayloadError::new(format!("invalid coordinate '{}'", y)))?;
    Ok((x, y))
}

/// Little-endian field scanner over a binary payload.
pub(crate) struct BinaryFields<'a> {
    rest: &'a [u8],
}

impl<'a> BinaryFields<'a> {
    pub(crate) fn new(payload: &'a [u8]) -> Self {
        Self { rest: payload }
    }

    fn take(&mut self, n: usize) -> ParseResult<&'a [u8]> {
        if self.rest.len() < n {
            return Err(PayloadError::new("truncated payload"));
        }
        let (head, tail) = self.rest.split_at(n);
        self.rest = tail;
        Ok(head)
    }

    pub(crate) fn remaining(&self) -> usize {
        self.rest.len()
    }

    pub(crate) fn rest_bytes(&mut self) -> &'a [u8] {
        std::mem::take(&mut self.rest)
    }

    pub(crate) fn u8(&mut self) -> ParseResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u16(&mut self) -> ParseResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub(crate) fn i16(&mut self) -> ParseResult<i16> {
        let b = self.take(2)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    pub(crate) fn i32(&mut self) -> ParseResult<i32> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn u32(&mut self) -> ParseResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn f64(&mut self) -> ParseResult<f64> {
        let b = self.take(8)?;
        Ok(f64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub(crate) fn rgba(&mut self) -> ParseResult<Rgba> {
        let b = self.take(4)?;
        Ok(Rgba::new(b[0], b[1], b[2], b[3]))
    }

    pub(crate) fn point16(&mut self) -> ParseResult<(i64, i64)> {
        let x = self.i16()?;
        let y = self.i16()?;
        Ok((i64::from(x), i64::from(y)))
    }

    pub(crate) fn point32(&mut self) -> ParseResult<(i64, i64)> {
        let x = self.i32()?;
        let y = self.i32()?;
        Ok((i64::from(x), i64::from(y)))
    }

    pub(crate) fn expect_empty(&self) -> ParseResult<()> {
        if self.rest.is_empty() {
            Ok(())
        } else {
            Err(PayloadError::new(format!(
                "{} trailing payload bytes",
                self.rest.len()
            )))
        }
    }
}

/// Stream angles are encoded in 1/65536 of a degree.
pub(crate) fn angle_units_to_degrees(raw: u32) -> f64 {
    f64::from(raw) / 65_536.0
}
