//! Payload parsers for attribute and control opcodes.
//!
//! These produce [`AttributeChange`]s for the state machine, stack
//! controls, origin overrides, and stream metadata. Like the geometry
//! parsers they are pure functions over the payload bytes.

use super::{AsciiFields, BinaryFields, ParseResult, ParsedPayload, PayloadError, StateControl};
use crate::io::RecordFormat;
use crate::state::{AttributeChange, ClipRect, FontRef};
use crate::types::{LineWeight, Rgba};

fn attribute(change: AttributeChange) -> ParsedPayload {
    ParsedPayload::Attribute(change)
}

fn parse_rgba(payload: &[u8], format: RecordFormat) -> ParseResult<Rgba> {
    match format {
        RecordFormat::ExtendedAscii => AsciiFields::new(payload).next_color(),
        _ => {
            let mut fields = BinaryFields::new(payload);
            let color = fields.rgba()?;
            fields.expect_empty()?;
            Ok(color)
        }
    }
}

pub(crate) fn parse_stroke_color(
    payload: &[u8],
    format: RecordFormat,
) -> ParseResult<ParsedPayload> {
    Ok(attribute(AttributeChange::StrokeColor(parse_rgba(
        payload, format,
    )?)))
}

pub(crate) fn parse_fill_color(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    Ok(attribute(AttributeChange::FillColor(parse_rgba(
        payload, format,
    )?)))
}

pub(crate) fn parse_line_weight(
    payload: &[u8],
    format: RecordFormat,
) -> ParseResult<ParsedPayload> {
    let value = match format {
        RecordFormat::ExtendedAscii => {
            let raw = AsciiFields::new(payload).next_i64()?;
            i32::try_from(raw)
                .map_err(|_| PayloadError::new(format!("line weight {} out of range", raw)))?
        }
        _ => {
            let mut fields = BinaryFields::new(payload);
            let value = fields.i32()?;
            fields.expect_empty()?;
            value
        }
    };
    Ok(attribute(AttributeChange::LineWeight(
        LineWeight::from_value(value),
    )))
}

pub(crate) fn parse_line_pattern(
    payload: &[u8],
    format: RecordFormat,
) -> ParseResult<ParsedPayload> {
    let id = match format {
        RecordFormat::ExtendedAscii => {
            let raw = AsciiFields::new(payload).next_i64()?;
            u16::try_from(raw)
                .map_err(|_| PayloadError::new(format!("pattern id {} out of range", raw)))?
        }
        _ => {
            let mut fields = BinaryFields::new(payload);
            let id = fields.u16()?;
            fields.expect_empty()?;
            id
        }
    };
    Ok(attribute(AttributeChange::LinePattern(id)))
}

fn parse_toggle(payload: &[u8], format: RecordFormat) -> ParseResult<bool> {
    match format {
        RecordFormat::ExtendedAscii => Ok(AsciiFields::new(payload).next_i64()? != 0),
        _ => {
            let mut fields = BinaryFields::new(payload);
            let flag = fields.u8()?;
            fields.expect_empty()?;
            Ok(flag != 0)
        }
    }
}

/// `(Fill n)` / binary fill-mode toggle.
pub(crate) fn parse_fill_mode(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    Ok(attribute(AttributeChange::FillMode(parse_toggle(
        payload, format,
    )?)))
}

/// Payload-less single-byte fill-on.
pub(crate) fn parse_fill_on(_payload: &[u8], _format: RecordFormat) -> ParseResult<ParsedPayload> {
    Ok(attribute(AttributeChange::FillMode(true)))
}

/// Payload-less single-byte fill-off.
pub(crate) fn parse_fill_off(_payload: &[u8], _format: RecordFormat) -> ParseResult<ParsedPayload> {
    Ok(attribute(AttributeChange::FillMode(false)))
}

/// `(Visibility n)` / binary visibility toggle.
pub(crate) fn parse_visibility(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    Ok(attribute(AttributeChange::Visibility(parse_toggle(
        payload, format,
    )?)))
}

pub(crate) fn parse_visibility_on(
    _payload: &[u8],
    _format: RecordFormat,
) -> ParseResult<ParsedPayload> {
    Ok(attribute(AttributeChange::Visibility(true)))
}

pub(crate) fn parse_visibility_off(
    _payload: &[u8],
    _format: RecordFormat,
) -> ParseResult<ParsedPayload> {
    Ok(attribute(AttributeChange::Visibility(false)))
}

pub(crate) fn parse_layer(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    let (id, name) = match format {
        RecordFormat::ExtendedAscii => {
            let mut fields = AsciiFields::new(payload);
            let raw = fields.next_i64()?;
            let id = u16::try_from(raw)
                .map_err(|_| PayloadError::new(format!("layer id {} out of range", raw)))?;
            let name = fields.rest_text();
            (id, (!name.is_empty()).then_some(name))
        }
        _ => {
            let mut fields = BinaryFields::new(payload);
            let id = fields.u16()?;
            let rest = fields.rest_bytes();
            let name = (!rest.is_empty()).then(|| super::decode_text(rest));
            (id, name)
        }
    };
    Ok(attribute(AttributeChange::Layer { id, name }))
}

pub(crate) fn parse_font(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    let font = match format {
        RecordFormat::ExtendedAscii => {
            let mut fields = AsciiFields::new(payload);
            let raw = fields.next_i64()?;
            let id = u16::try_from(raw)
                .map_err(|_| PayloadError::new(format!("font id {} out of range", raw)))?;
            let name = fields.rest_text();
            FontRef {
                id,
                name: (!name.is_empty()).then_some(name),
            }
        }
        _ => {
            let mut fields = BinaryFields::new(payload);
            let id = fields.u16()?;
            let rest = fields.rest_bytes();
            FontRef {
                id,
                name: (!rest.is_empty()).then(|| super::decode_text(rest)),
            }
        }
    };
    Ok(attribute(AttributeChange::Font(font)))
}

/// Clip region: an empty payload clears, otherwise two absolute corners.
pub(crate) fn parse_clip(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    let corners = match format {
        RecordFormat::ExtendedAscii => {
            let mut fields = AsciiFields::new(payload);
            if fields.is_exhausted() {
                None
            } else {
                Some((fields.next_point()?, fields.next_point()?))
            }
        }
        _ => {
            if payload.is_empty() {
                None
            } else {
                let mut fields = BinaryFields::new(payload);
                let a = fields.point32()?;
                let b = fields.point32()?;
                fields.expect_empty()?;
                Some((a, b))
            }
        }
    };
    let clip = corners.map(|(a, b)| ClipRect {
        min: (a.0.min(b.0), a.1.min(b.1)),
        max: (a.0.max(b.0), a.1.max(b.1)),
    });
    Ok(attribute(AttributeChange::Clip(clip)))
}

pub(crate) fn parse_origin(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    let point = match format {
        RecordFormat::ExtendedAscii => AsciiFields::new(payload).next_point()?,
        _ => {
            let mut fields = BinaryFields::new(payload);
            let point = fields.point32()?;
            fields.expect_empty()?;
            point
        }
    };
    Ok(ParsedPayload::SetOrigin(point))
}

pub(crate) fn parse_units(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    let units = match format {
        RecordFormat::ExtendedAscii => AsciiFields::new(payload).next_f64()?,
        _ => {
            let mut fields = BinaryFields::new(payload);
            let units = fields.f64()?;
            fields.expect_empty()?;
            units
        }
    };
    if !(units.is_finite() && units > 0.0) {
        return Err(PayloadError::new(format!("invalid units scale {}", units)));
    }
    Ok(ParsedPayload::Units(units))
}

pub(crate) fn parse_sheet_size(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    let (w, h) = match format {
        RecordFormat::ExtendedAscii => {
            let mut fields = AsciiFields::new(payload);
            (fields.next_f64()?, fields.next_f64()?)
        }
        _ => {
            let mut fields = BinaryFields::new(payload);
            let w = fields.f64()?;
            let h = fields.f64()?;
            fields.expect_empty()?;
            (w, h)
        }
    };
    if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
        return Err(PayloadError::new(format!("invalid sheet size {}x{}", w, h)));
    }
    Ok(ParsedPayload::SheetSize(w, h))
}

pub(crate) fn parse_save(_payload: &[u8], _format: RecordFormat) -> ParseResult<ParsedPayload> {
    Ok(ParsedPayload::Control(StateControl::Save))
}

pub(crate) fn parse_restore(_payload: &[u8], _format: RecordFormat) -> ParseResult<ParsedPayload> {
    Ok(ParsedPayload::Control(StateControl::Restore))
}

pub(crate) fn parse_reset(_payload: &[u8], _format: RecordFormat) -> ParseResult<ParsedPayload> {
    Ok(ParsedPayload::Control(StateControl::Reset))
}
