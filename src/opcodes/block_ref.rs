//! Block-reference records.
//!
//! A block reference is the legacy record family whose large optional
//! field set depends on a subtype discriminator. Instead of dozens of
//! independently guessed optionals, each subtype declares a field-presence
//! mask consulted once, and the parser reads the present fields in one
//! canonical order. References are recorded as scene markers; expanding
//! them needs the external block library and is out of scope.

use super::{angle_units_to_degrees, BinaryFields, ParseResult, ParsedPayload, PayloadError};
use crate::io::RecordFormat;
use crate::types::Rgba;
use bitflags::bitflags;

bitflags! {
    /// Which optional field groups a block-reference subtype carries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BlockRefFields: u16 {
        /// Per-axis scale factors (two f64)
        const SCALE = 1 << 0;
        /// Rotation angle
        const ROTATION = 1 << 1;
        /// Clip rectangle corners
        const CLIP = 1 << 2;
        /// Length-prefixed block name
        const NAME = 1 << 3;
        /// Stroke color / line weight overrides
        const OVERRIDES = 1 << 4;
        /// Array layout: counts and spacing
        const ARRAY = 1 << 5;
    }
}

/// Block-reference subtype discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRefSubtype {
    /// Insertion point only
    Plain,
    /// Adds scale and rotation
    Placed,
    /// Adds a clip rectangle
    Clipped,
    /// Adds array layout
    Array,
    /// Everything, including name and attribute overrides
    Full,
}

impl BlockRefSubtype {
    /// Decode the discriminator byte.
    pub fn from_raw(raw: u8) -> ParseResult<Self> {
        match raw {
            0 => Ok(Self::Plain),
            1 => Ok(Self::Placed),
            2 => Ok(Self::Clipped),
            3 => Ok(Self::Array),
            4 => Ok(Self::Full),
            other => Err(PayloadError::new(format!(
                "unknown block-reference subtype {}",
                other
            ))),
        }
    }

    /// The field-presence table: which optional groups this subtype
    /// carries, consulted once per record.
    pub fn present_fields(&self) -> BlockRefFields {
        match self {
            Self::Plain => BlockRefFields::empty(),
            Self::Placed => BlockRefFields::SCALE | BlockRefFields::ROTATION,
            Self::Clipped => {
                BlockRefFields::SCALE | BlockRefFields::ROTATION | BlockRefFields::CLIP
            }
            Self::Array => BlockRefFields::SCALE | BlockRefFields::ARRAY,
            Self::Full => BlockRefFields::all(),
        }
    }
}

/// A parsed block-reference marker.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockRef {
    pub subtype: BlockRefSubtype,
    /// Referenced block id
    pub block_id: u16,
    /// Raw insertion point (resolved by the dispatcher, without
    /// disturbing the geometry chain)
    pub insertion: (i64, i64),
    pub scale: Option<(f64, f64)>,
    pub rotation_deg: Option<f64>,
    pub clip: Option<((i64, i64), (i64, i64))>,
    pub name: Option<String>,
    pub stroke_override: Option<Rgba>,
    pub weight_override: Option<i32>,
    /// Columns, rows, column spacing, row spacing
    pub array: Option<(u16, u16, i64, i64)>,
}

/// Parse a block-reference record (extended-binary only).
pub(crate) fn parse_block_ref(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    if format != RecordFormat::ExtendedBinary {
        return Err(PayloadError::new("block reference is extended-binary only"));
    }
    let mut fields = BinaryFields::new(payload);
    let subtype = BlockRefSubtype::from_raw(fields.u8()?)?;
    let present = subtype.present_fields();

    let block_id = fields.u16()?;
    let insertion = fields.point32()?;

    let scale = present
        .contains(BlockRefFields::SCALE)
        .then(|| -> ParseResult<_> { Ok((fields.f64()?, fields.f64()?)) })
        .transpose()?;
    let rotation_deg = present
        .contains(BlockRefFields::ROTATION)
        .then(|| -> ParseResult<_> { Ok(angle_units_to_degrees(fields.u32()?)) })
        .transpose()?;
    let clip = present
        .contains(BlockRefFields::CLIP)
        .then(|| -> ParseResult<_> { Ok((fields.point32()?, fields.point32()?)) })
        .transpose()?;
    let name = present
        .contains(BlockRefFields::NAME)
        .then(|| -> ParseResult<_> {
            let len = usize::from(fields.u16()?);
            if fields.remaining() < len {
                return Err(PayloadError::new("truncated block name"));
            }
            let mut bytes = Vec::with_capacity(len);
            for _ in 0..len {
                bytes.push(fields.u8()?);
            }
            Ok(super::decode_text(&bytes))
        })
        .transpose()?;
    let (stroke_override, weight_override) = if present.contains(BlockRefFields::OVERRIDES) {
        (Some(fields.rgba()?), Some(fields.i32()?))
    } else {
        (None, None)
    };
    let array = present
        .contains(BlockRefFields::ARRAY)
        .then(|| -> ParseResult<_> {
            Ok((
                fields.u16()?,
                fields.u16()?,
                i64::from(fields.i32()?),
                i64::from(fields.i32()?),
            ))
        })
        .transpose()?;

    fields.expect_empty()?;

    Ok(ParsedPayload::BlockRef(BlockRef {
        subtype,
        block_id,
        insertion,
        scale,
        rotation_deg,
        clip,
        name,
        stroke_override,
        weight_override,
        array,
    }))
}
