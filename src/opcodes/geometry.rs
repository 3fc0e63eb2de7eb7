//! Payload parsers for geometry opcodes.
//!
//! Every parser is pure: payload bytes and a format hint in, a
//! [`GeometryRequest`] with raw (pre-resolution) coordinates out. The
//! coordinate width/mode lives in the table declaration, not here; a
//! 16-bit parser only differs in how it reads its binary fields.

use super::{
    angle_units_to_degrees, AsciiFields, BinaryFields, GeometryDetail, GeometryKind,
    GeometryRequest, ParseResult, ParsedPayload, PayloadError,
};
use crate::coords::Width;
use crate::io::RecordFormat;

fn geometry(kind: GeometryKind, coords: Vec<(i64, i64)>) -> ParsedPayload {
    ParsedPayload::Geometry(GeometryRequest::new(kind, coords))
}

/// Read a binary point at the given width.
fn read_point(fields: &mut BinaryFields<'_>, width: Width) -> ParseResult<(i64, i64)> {
    match width {
        Width::Bit16 => fields.point16(),
        Width::Bit32 => fields.point32(),
    }
}

/// Read a count-prefixed binary point list. Single-byte records carry a
/// u8 count (mirrored into the payload by the decoder); extended-binary
/// records carry a u16 count.
fn read_counted_points(
    payload: &[u8],
    format: RecordFormat,
    width: Width,
) -> ParseResult<Vec<(i64, i64)>> {
    let mut fields = BinaryFields::new(payload);
    let count = match format {
        RecordFormat::SingleByte => usize::from(fields.u8()?),
        RecordFormat::ExtendedBinary => usize::from(fields.u16()?),
        RecordFormat::ExtendedAscii => {
            return Err(PayloadError::new("counted binary points in ascii record"))
        }
    };
    let mut points = Vec::with_capacity(count);
    for _ in 0..count {
        points.push(read_point(&mut fields, width)?);
    }
    fields.expect_empty()?;
    Ok(points)
}

fn point_list(
    payload: &[u8],
    format: RecordFormat,
    width: Width,
    kind: GeometryKind,
    min_points: usize,
) -> ParseResult<ParsedPayload> {
    let points = match format {
        RecordFormat::ExtendedAscii => AsciiFields::new(payload).remaining_points()?,
        _ => read_counted_points(payload, format, width)?,
    };
    if points.len() < min_points {
        return Err(PayloadError::new(format!(
            "{:?} needs at least {} points, found {}",
            kind,
            min_points,
            points.len()
        )));
    }
    Ok(geometry(kind, points))
}

fn line(payload: &[u8], format: RecordFormat, width: Width) -> ParseResult<ParsedPayload> {
    let points = match format {
        RecordFormat::ExtendedAscii => {
            let points = AsciiFields::new(payload).remaining_points()?;
            if points.len() != 2 {
                return Err(PayloadError::new(format!(
                    "line needs exactly 2 points, found {}",
                    points.len()
                )));
            }
            points
        }
        _ => {
            let mut fields = BinaryFields::new(payload);
            let points = vec![read_point(&mut fields, width)?, read_point(&mut fields, width)?];
            fields.expect_empty()?;
            points
        }
    };
    Ok(geometry(GeometryKind::Line, points))
}

pub(crate) fn parse_line16(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    line(payload, format, Width::Bit16)
}

pub(crate) fn parse_line32(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    line(payload, format, Width::Bit32)
}

pub(crate) fn parse_polyline16(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    point_list(payload, format, Width::Bit16, GeometryKind::Polyline, 2)
}

pub(crate) fn parse_polyline32(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    point_list(payload, format, Width::Bit32, GeometryKind::Polyline, 2)
}

pub(crate) fn parse_polygon16(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    point_list(payload, format, Width::Bit16, GeometryKind::Polygon, 3)
}

pub(crate) fn parse_polygon32(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    point_list(payload, format, Width::Bit32, GeometryKind::Polygon, 3)
}

pub(crate) fn parse_fan16(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    point_list(payload, format, Width::Bit16, GeometryKind::TriangleFan, 3)
}

pub(crate) fn parse_fan32(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    point_list(payload, format, Width::Bit32, GeometryKind::TriangleFan, 3)
}

/// Shaded fan: one RGBA per vertex, interleaved after each point.
pub(crate) fn parse_fan_shaded(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    if format != RecordFormat::ExtendedBinary {
        return Err(PayloadError::new("shaded fan is extended-binary only"));
    }
    let mut fields = BinaryFields::new(payload);
    let count = usize::from(fields.u16()?);
    if count < 3 {
        return Err(PayloadError::new(format!(
            "shaded fan needs at least 3 vertices, found {}",
            count
        )));
    }
    let mut points = Vec::with_capacity(count);
    let mut colors = Vec::with_capacity(count);
    for _ in 0..count {
        points.push(fields.point32()?);
        colors.push(fields.rgba()?);
    }
    fields.expect_empty()?;
    Ok(ParsedPayload::Geometry(GeometryRequest::with_detail(
        GeometryKind::TriangleFan,
        points,
        GeometryDetail::Shaded { colors },
    )))
}

fn bezier(payload: &[u8], format: RecordFormat, width: Width) -> ParseResult<ParsedPayload> {
    let parsed = point_list(payload, format, width, GeometryKind::Bezier, 4)?;
    if let ParsedPayload::Geometry(request) = &parsed {
        // Cubic chain: a start point plus whole control triples.
        if request.coords.len() % 3 != 1 {
            return Err(PayloadError::new(format!(
                "bezier chain needs 3n+1 points, found {}",
                request.coords.len()
            )));
        }
    }
    Ok(parsed)
}

pub(crate) fn parse_bezier16(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    bezier(payload, format, Width::Bit16)
}

pub(crate) fn parse_bezier32(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    bezier(payload, format, Width::Bit32)
}

fn circle(payload: &[u8], format: RecordFormat, width: Width) -> ParseResult<ParsedPayload> {
    let (center, radius) = match format {
        RecordFormat::ExtendedAscii => {
            let mut fields = AsciiFields::new(payload);
            let center = fields.next_point()?;
            let radius = fields.next_i64()?;
            (center, radius)
        }
        _ => {
            let mut fields = BinaryFields::new(payload);
            let center = read_point(&mut fields, width)?;
            let radius = match width {
                Width::Bit16 => i64::from(fields.u16()?),
                Width::Bit32 => i64::from(fields.i32()?),
            };
            fields.expect_empty()?;
            (center, radius)
        }
    };
    if radius < 0 {
        return Err(PayloadError::new(format!("negative radius {}", radius)));
    }
    Ok(ParsedPayload::Geometry(GeometryRequest::with_detail(
        GeometryKind::Circle,
        vec![center],
        GeometryDetail::Circle { radius },
    )))
}

pub(crate) fn parse_circle16(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    circle(payload, format, Width::Bit16)
}

pub(crate) fn parse_circle32(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    circle(payload, format, Width::Bit32)
}

struct EllipseFields {
    center: (i64, i64),
    rx: i64,
    ry: i64,
    rotation_deg: f64,
}

fn ellipse_fields(
    fields_bin: &mut BinaryFields<'_>,
    fields_ascii: &mut Option<AsciiFields>,
) -> ParseResult<EllipseFields> {
    match fields_ascii {
        Some(fields) => Ok(EllipseFields {
            center: fields.next_point()?,
            rx: fields.next_i64()?,
            ry: fields.next_i64()?,
            rotation_deg: fields.next_f64()?,
        }),
        None => Ok(EllipseFields {
            center: fields_bin.point32()?,
            rx: i64::from(fields_bin.i32()?),
            ry: i64::from(fields_bin.i32()?),
            rotation_deg: angle_units_to_degrees(fields_bin.u32()?),
        }),
    }
}

fn ascii_scanner(payload: &[u8], format: RecordFormat) -> Option<AsciiFields> {
    (format == RecordFormat::ExtendedAscii).then(|| AsciiFields::new(payload))
}

pub(crate) fn parse_ellipse(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    let mut ascii = ascii_scanner(payload, format);
    let mut bin = BinaryFields::new(payload);
    let e = ellipse_fields(&mut bin, &mut ascii)?;
    if ascii.is_none() {
        bin.expect_empty()?;
    }
    if e.rx < 0 || e.ry < 0 {
        return Err(PayloadError::new("negative ellipse radius"));
    }
    Ok(ParsedPayload::Geometry(GeometryRequest::with_detail(
        GeometryKind::Ellipse,
        vec![e.center],
        GeometryDetail::Ellipse {
            rx: e.rx,
            ry: e.ry,
            rotation_deg: e.rotation_deg,
        },
    )))
}

pub(crate) fn parse_arc(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    let mut ascii = ascii_scanner(payload, format);
    let mut bin = BinaryFields::new(payload);
    let e = ellipse_fields(&mut bin, &mut ascii)?;
    let (start_deg, end_deg) = match &mut ascii {
        Some(fields) => (fields.next_f64()?, fields.next_f64()?),
        None => {
            let start = angle_units_to_degrees(bin.u32()?);
            let end = angle_units_to_degrees(bin.u32()?);
            bin.expect_empty()?;
            (start, end)
        }
    };
    if e.rx < 0 || e.ry < 0 {
        return Err(PayloadError::new("negative arc radius"));
    }
    Ok(ParsedPayload::Geometry(GeometryRequest::with_detail(
        GeometryKind::Arc,
        vec![e.center],
        GeometryDetail::Arc {
            rx: e.rx,
            ry: e.ry,
            rotation_deg: e.rotation_deg,
            start_deg,
            end_deg,
        },
    )))
}

pub(crate) fn parse_text(payload: &[u8], format: RecordFormat) -> ParseResult<ParsedPayload> {
    let (position, content) = match format {
        RecordFormat::ExtendedAscii => {
            let mut fields = AsciiFields::new(payload);
            let position = fields.next_point()?;
            let mut content = fields.rest_text();
            // Quoted content keeps internal spacing authoritative.
            if content.len() >= 2 && content.starts_with('"') && content.ends_with('"') {
                content = content[1..content.len() - 1].to_string();
            }
            (position, content)
        }
        _ => {
            let mut fields = BinaryFields::new(payload);
            let position = fields.point32()?;
            let len = usize::from(fields.u16()?);
            if fields.remaining() != len {
                return Err(PayloadError::new(format!(
                    "text length {} disagrees with {} payload bytes",
                    len,
                    fields.remaining()
                )));
            }
            let content = super::decode_text(fields.rest_bytes());
            (position, content)
        }
    };
    Ok(ParsedPayload::Geometry(GeometryRequest::with_detail(
        GeometryKind::TextRun,
        vec![position],
        GeometryDetail::Text { content },
    )))
}
