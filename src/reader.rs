//! Stream reader: the full decode pipeline.
//!
//! Drives the record decoder over a byte cursor and dispatches each
//! record through the opcode table: geometry records flow through the
//! coordinate cursor into the scene builder, attribute records mutate the
//! graphics state machine, control records drive the save/restore stack.
//!
//! Recovery policy is configuration-driven. In failsafe mode (the
//! default) a structural stream error ends decoding but the primitives
//! accumulated so far are still returned, with the error attached; a
//! malformed drawing that renders mostly right beats no drawing at all.

use crate::coords::{CoordMode, CoordinateCursor, CoordinateError, Width};
use crate::error::{Result, W2dError};
use crate::fit::PageRegion;
use crate::io::{ByteCursor, OpcodeRecord, RecordDecoder, RecordFormat};
use crate::notification::NotificationKind;
use crate::opcodes::{
    standard_table, GeometryDetail, GeometryKind, GeometryRequest, ParsedPayload, StateControl,
};
use crate::scene::{Primitive, SceneBuilder, SceneDocument, Shape};
use crate::state::{AttributeChange, GraphicsStateMachine};
use crate::types::Vector2;
use rayon::prelude::*;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Configuration for the stream reader.
#[derive(Debug, Clone)]
pub struct W2dReaderConfiguration {
    /// When true, structural errors end decoding but the partial document
    /// is still returned. When false, `read` fails outright.
    pub failsafe: bool,
    /// When true, a restore with no matching save aborts the decode
    /// instead of being recorded as a notification.
    pub underflow_is_fatal: bool,
    /// Magnitude bound for resolved coordinates.
    pub coordinate_bound: i64,
    /// Cooperative cancellation flag, checked once per record.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for W2dReaderConfiguration {
    fn default() -> Self {
        Self {
            failsafe: true,
            underflow_is_fatal: false,
            coordinate_bound: i64::from(i32::MAX),
            cancel: None,
        }
    }
}

impl W2dReaderConfiguration {
    /// The default failsafe configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict configuration: structural errors and stack underflow fail
    /// the read.
    pub fn strict() -> Self {
        Self {
            failsafe: false,
            underflow_is_fatal: true,
            ..Self::default()
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Decodes a complete opcode stream into a [`SceneDocument`].
pub struct W2dReader {
    cursor: ByteCursor,
    config: W2dReaderConfiguration,
}

impl W2dReader {
    /// Reader over an in-memory stream with the default configuration.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            cursor: ByteCursor::new(data),
            config: W2dReaderConfiguration::default(),
        }
    }

    /// Reader over any `Read` source; the stream is buffered fully.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(Self {
            cursor: ByteCursor::from_reader(reader)?,
            config: W2dReaderConfiguration::default(),
        })
    }

    /// Reader over a file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Ok(Self::from_bytes(data))
    }

    /// Replace the configuration.
    pub fn with_configuration(mut self, config: W2dReaderConfiguration) -> Self {
        self.config = config;
        self
    }

    /// Decode the whole stream.
    ///
    /// In failsafe mode structural errors are absorbed: decoding stops,
    /// the error is recorded as a `StreamError` notification, and the
    /// partial document is returned. In strict mode the error propagates.
    pub fn read(self) -> Result<SceneDocument> {
        let failsafe = self.config.failsafe;
        let (document, error) = self.read_partial();
        match error {
            Some(err) if !failsafe => Err(err),
            _ => Ok(document),
        }
    }

    /// Decode the whole stream, fit the result to a page, and return it.
    pub fn read_fitted(self, page: &PageRegion) -> Result<SceneDocument> {
        let mut document = self.read()?;
        document.fit_to_page(page);
        Ok(document)
    }

    /// Decode the whole stream, always returning whatever was
    /// accumulated. The second element is the structural error that ended
    /// decoding early, if any.
    pub fn read_partial(self) -> (SceneDocument, Option<W2dError>) {
        Pipeline::new(self.config).run(self.cursor)
    }
}

/// Decode many independent streams in parallel. Each stream gets its own
/// pipeline state; the configuration is shared (a shared cancel flag
/// cancels the whole batch). Results are in input order.
pub fn read_many(
    streams: Vec<Vec<u8>>,
    config: &W2dReaderConfiguration,
) -> Vec<(SceneDocument, Option<W2dError>)> {
    streams
        .into_par_iter()
        .map(|data| {
            W2dReader::from_bytes(data)
                .with_configuration(config.clone())
                .read_partial()
        })
        .collect()
}

/// Per-invocation decode state: one builder, one state machine, one
/// coordinate cursor. Never shared across streams.
struct Pipeline {
    config: W2dReaderConfiguration,
    builder: SceneBuilder,
    state: GraphicsStateMachine,
    coords: CoordinateCursor,
}

impl Pipeline {
    fn new(config: W2dReaderConfiguration) -> Self {
        let coords = CoordinateCursor::with_bound(config.coordinate_bound);
        Self {
            config,
            builder: SceneBuilder::new(),
            state: GraphicsStateMachine::new(),
            coords,
        }
    }

    fn run(mut self, mut cursor: ByteCursor) -> (SceneDocument, Option<W2dError>) {
        let decoder = RecordDecoder::new(standard_table());
        let mut fatal = None;

        loop {
            if self.config.is_cancelled() {
                let offset = cursor.offset();
                self.builder.notifications_mut().notify_at(
                    NotificationKind::Cancelled,
                    offset,
                    "decoding cancelled by caller",
                );
                break;
            }

            let record = match decoder.decode_next(&mut cursor) {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(err) => {
                    self.builder.notifications_mut().notify_at(
                        NotificationKind::StreamError,
                        err.offset().unwrap_or_else(|| cursor.offset()),
                        err.to_string(),
                    );
                    fatal = Some(err);
                    break;
                }
            };

            if let Err(err) = self.dispatch(&record) {
                fatal = Some(err);
                break;
            }
        }

        (self.builder.finalize(), fatal)
    }

    fn dispatch(&mut self, record: &OpcodeRecord) -> Result<()> {
        let Some(decl) = standard_table().lookup(&record.identity) else {
            self.builder.notifications_mut().notify_at(
                NotificationKind::UnknownOpcode,
                record.offset,
                format!("skipped unrecognized opcode {}", record.identity),
            );
            return Ok(());
        };

        let payload = match (decl.parser)(&record.payload, record.format) {
            Ok(payload) => payload,
            Err(err) => {
                // Extended records are self-delimiting, so a bad payload
                // leaves the stream aligned; a single-byte record's extent
                // can no longer be trusted once its payload fails.
                if record.format == RecordFormat::SingleByte {
                    return Err(W2dError::Corrupt {
                        offset: record.offset,
                        detail: err.to_string(),
                    });
                }
                self.builder.notifications_mut().notify_at(
                    NotificationKind::DroppedPrimitive,
                    record.offset,
                    format!("unparseable {} payload: {}", record.identity, err),
                );
                return Ok(());
            }
        };

        match payload {
            ParsedPayload::Geometry(request) => {
                self.emit_geometry(record, decl.width, decl.mode, request)
            }
            ParsedPayload::Attribute(change) => {
                if let AttributeChange::Layer {
                    id,
                    name: Some(ref name),
                } = change
                {
                    self.builder.register_layer(id, name.clone());
                }
                self.state.apply(change);
                Ok(())
            }
            ParsedPayload::Control(control) => self.apply_control(record, control),
            ParsedPayload::SetOrigin(point) => {
                self.coords.set_origin(point);
                Ok(())
            }
            ParsedPayload::Units(units_per_mm) => {
                self.builder.set_units(units_per_mm);
                Ok(())
            }
            ParsedPayload::SheetSize(width, height) => {
                self.builder.set_sheet_hint(width, height);
                Ok(())
            }
            ParsedPayload::BlockRef(block_ref) => self.emit_block_ref(record, block_ref),
        }
    }

    fn emit_geometry(
        &mut self,
        record: &OpcodeRecord,
        width: Width,
        mode: CoordMode,
        request: GeometryRequest,
    ) -> Result<()> {
        let points = match self.coords.resolve_points(&request.coords, width, mode) {
            Ok(points) => points,
            Err(err) => return self.drop_primitive(record, err),
        };

        // Resolution has already advanced the origin; invisible geometry
        // still participates in chaining but emits nothing.
        if !self.state.current().visible {
            return Ok(());
        }

        let Some(shape) = build_shape(request.kind, &points, request.detail) else {
            self.builder.notifications_mut().notify_at(
                NotificationKind::Warning,
                record.offset,
                format!("malformed {} geometry dropped", record.identity),
            );
            return Ok(());
        };

        self.builder.push(Primitive {
            shape,
            state: self.state.snapshot(),
            provenance: record.format,
        });
        Ok(())
    }

    fn emit_block_ref(
        &mut self,
        record: &OpcodeRecord,
        mut block_ref: crate::opcodes::BlockRef,
    ) -> Result<()> {
        // Insertion points are metadata: resolve them against the ambient
        // origin without disturbing the geometry chain.
        self.coords.set_chaining(false);
        let resolved =
            self.coords
                .resolve_points(&[block_ref.insertion], Width::Bit32, CoordMode::Absolute);
        self.coords.set_chaining(true);

        match resolved {
            Ok(points) => {
                block_ref.insertion = points[0];
                self.builder.push_block_ref(block_ref);
                Ok(())
            }
            Err(err) => self.drop_primitive(record, err),
        }
    }

    fn drop_primitive(&mut self, record: &OpcodeRecord, err: CoordinateError) -> Result<()> {
        if !self.config.failsafe {
            let value = match err {
                CoordinateError::Overflow { value } => value,
                CoordinateError::OutOfRange { value, .. } => value,
            };
            return Err(W2dError::CoordinateOverflow {
                offset: record.offset,
                value,
            });
        }
        self.builder.notifications_mut().notify_at(
            NotificationKind::DroppedPrimitive,
            record.offset,
            format!("{} dropped: {}", record.identity, err),
        );
        Ok(())
    }

    fn apply_control(&mut self, record: &OpcodeRecord, control: StateControl) -> Result<()> {
        match control {
            StateControl::Save => {
                self.state.save();
                Ok(())
            }
            StateControl::Restore => match self.state.restore() {
                Ok(()) => Ok(()),
                Err(_) if self.config.underflow_is_fatal => Err(W2dError::StackUnderflow {
                    offset: record.offset,
                }),
                Err(_) => {
                    self.builder.notifications_mut().notify_at(
                        NotificationKind::StackUnderflow,
                        record.offset,
                        "restore with empty state stack ignored",
                    );
                    Ok(())
                }
            },
            StateControl::Reset => {
                self.state.reset();
                self.coords.set_origin((0, 0));
                Ok(())
            }
        }
    }
}

/// Assemble a resolved shape from a geometry request. `None` when the
/// point list and detail disagree with the kind (parser bugs, never
/// well-formed streams).
fn build_shape(kind: GeometryKind, points: &[(i64, i64)], detail: GeometryDetail) -> Option<Shape> {
    let vectors = || points.iter().map(|&p| Vector2::from_int(p)).collect::<Vec<_>>();
    match (kind, detail) {
        (GeometryKind::Line, GeometryDetail::None) => Some(Shape::Line { points: vectors() }),
        (GeometryKind::Polyline, GeometryDetail::None) => {
            Some(Shape::Polyline { points: vectors() })
        }
        (GeometryKind::Polygon, GeometryDetail::None) => Some(Shape::Polygon { points: vectors() }),
        (GeometryKind::Bezier, GeometryDetail::None) => Some(Shape::Bezier { points: vectors() }),
        (GeometryKind::TriangleFan, GeometryDetail::None) => Some(Shape::TriangleFan {
            points: vectors(),
            vertex_colors: None,
        }),
        (GeometryKind::TriangleFan, GeometryDetail::Shaded { colors }) => {
            if colors.len() != points.len() {
                return None;
            }
            Some(Shape::TriangleFan {
                points: vectors(),
                vertex_colors: Some(colors),
            })
        }
        (GeometryKind::Circle, GeometryDetail::Circle { radius }) => Some(Shape::Circle {
            center: Vector2::from_int(*points.first()?),
            radius: radius as f64,
        }),
        (
            GeometryKind::Ellipse,
            GeometryDetail::Ellipse {
                rx,
                ry,
                rotation_deg,
            },
        ) => Some(Shape::Ellipse {
            center: Vector2::from_int(*points.first()?),
            rx: rx as f64,
            ry: ry as f64,
            rotation_deg,
        }),
        (
            GeometryKind::Arc,
            GeometryDetail::Arc {
                rx,
                ry,
                rotation_deg,
                start_deg,
                end_deg,
            },
        ) => Some(Shape::Arc {
            center: Vector2::from_int(*points.first()?),
            rx: rx as f64,
            ry: ry as f64,
            rotation_deg,
            start_deg,
            end_deg,
        }),
        (GeometryKind::TextRun, GeometryDetail::Text { content }) => Some(Shape::TextRun {
            position: Vector2::from_int(*points.first()?),
            content,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rgba;

    fn binary_record(code: u16, payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![b'{'];
        bytes.extend_from_slice(&((payload.len() as u32) + 3).to_le_bytes());
        bytes.extend_from_slice(&code.to_le_bytes());
        bytes.extend_from_slice(payload);
        bytes.push(b'}');
        bytes
    }

    fn point32(x: i32, y: i32) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(8);
        bytes.extend_from_slice(&x.to_le_bytes());
        bytes.extend_from_slice(&y.to_le_bytes());
        bytes
    }

    #[test]
    fn test_ascii_line_record() {
        let doc = W2dReader::from_bytes(b"(Line 0,0 100,200)".to_vec())
            .read()
            .unwrap();
        assert_eq!(doc.len(), 1);
        match &doc.primitives[0].shape {
            Shape::Line { points } => {
                assert_eq!(points[0], Vector2::new(0.0, 0.0));
                assert_eq!(points[1], Vector2::new(100.0, 200.0));
            }
            other => panic!("unexpected shape {:?}", other),
        }
        assert_eq!(doc.primitives[0].provenance, RecordFormat::ExtendedAscii);
    }

    #[test]
    fn test_ascii_continuation_groups_form_one_record() {
        let doc = W2dReader::from_bytes(b"(Line 0,0)(100,200)".to_vec())
            .read()
            .unwrap();
        assert_eq!(doc.len(), 1);
        match &doc.primitives[0].shape {
            Shape::Line { points } => assert_eq!(points[1], Vector2::new(100.0, 200.0)),
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_relative_records_chain() {
        // Two single-byte relative lines: the second chains off the
        // first's endpoint.
        let mut stream = vec![b'l'];
        for v in [0i16, 0, 10, 10] {
            stream.extend_from_slice(&v.to_le_bytes());
        }
        stream.push(b'l');
        for v in [5i16, 5, 5, 5] {
            stream.extend_from_slice(&v.to_le_bytes());
        }
        let doc = W2dReader::from_bytes(stream).read().unwrap();
        assert_eq!(doc.len(), 2);
        match &doc.primitives[1].shape {
            Shape::Line { points } => {
                assert_eq!(points[0], Vector2::new(15.0, 15.0));
                assert_eq!(points[1], Vector2::new(20.0, 20.0));
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_origin_record_overrides_chain() {
        let doc = W2dReader::from_bytes(b"(Origin 50,60)(RelLine 1,2 3,4)".to_vec())
            .read()
            .unwrap();
        match &doc.primitives[0].shape {
            Shape::Line { points } => {
                assert_eq!(points[0], Vector2::new(51.0, 62.0));
                assert_eq!(points[1], Vector2::new(54.0, 66.0));
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_attributes_snapshot_into_primitives() {
        let stream = b"(Color 255,0,0)(LineWeight 35)(Line 0,0 1,1)(Color 0,0,255)(Line 2,2 3,3)";
        let doc = W2dReader::from_bytes(stream.to_vec()).read().unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.primitives[0].state.stroke_color, Rgba::opaque(255, 0, 0));
        assert_eq!(doc.primitives[0].state.line_weight.value(), 35);
        assert_eq!(doc.primitives[1].state.stroke_color, Rgba::opaque(0, 0, 255));
    }

    #[test]
    fn test_save_restore_scopes_attributes() {
        let stream = b"(Color 255,0,0)(Save)(Color 0,255,0)(Line 0,0 1,1)(Restore)(Line 2,2 3,3)";
        let doc = W2dReader::from_bytes(stream.to_vec()).read().unwrap();
        assert_eq!(doc.primitives[0].state.stroke_color, Rgba::opaque(0, 255, 0));
        assert_eq!(doc.primitives[1].state.stroke_color, Rgba::opaque(255, 0, 0));
    }

    #[test]
    fn test_underflow_default_is_notification() {
        let doc = W2dReader::from_bytes(b"(Restore)(Line 0,0 1,1)".to_vec())
            .read()
            .unwrap();
        assert_eq!(doc.len(), 1);
        assert!(doc.notifications.has_kind(NotificationKind::StackUnderflow));
    }

    #[test]
    fn test_underflow_fatal_when_configured() {
        let err = W2dReader::from_bytes(b"(Restore)".to_vec())
            .with_configuration(W2dReaderConfiguration::strict())
            .read()
            .unwrap_err();
        assert!(matches!(err, W2dError::StackUnderflow { .. }));
    }

    #[test]
    fn test_unknown_ascii_opcode_skipped() {
        let doc = W2dReader::from_bytes(b"(FrobnicateWidget 1 2 3)(Line 0,0 1,1)".to_vec())
            .read()
            .unwrap();
        assert_eq!(doc.len(), 1);
        let notes = doc.notifications.of_kind(NotificationKind::UnknownOpcode);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].offset, Some(0));
    }

    #[test]
    fn test_invisible_geometry_still_chains() {
        // Geometry emitted while invisible is dropped but its endpoint
        // still advances the origin for the next relative record.
        let stream = b"(Visibility 0)(RelLine 0,0 10,10)(Visibility 1)(RelLine 1,1 2,2)";
        let doc = W2dReader::from_bytes(stream.to_vec()).read().unwrap();
        assert_eq!(doc.len(), 1);
        match &doc.primitives[0].shape {
            Shape::Line { points } => assert_eq!(points[0], Vector2::new(11.0, 11.0)),
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_overflow_drops_primitive_and_continues() {
        let near_max = i32::MAX - 5;
        let stream = format!("(Origin {},0)(RelLine 0,0 100,0)(Line 1,1 2,2)", near_max);
        let doc = W2dReader::from_bytes(stream.into_bytes()).read().unwrap();
        assert_eq!(doc.len(), 1);
        assert!(doc
            .notifications
            .has_kind(NotificationKind::DroppedPrimitive));
    }

    #[test]
    fn test_i64_min_coordinate_dropped_not_panicked() {
        // The ASCII scanner accepts any i64, including the one value with
        // no positive counterpart. Both modes must drop the record with a
        // diagnostic and keep decoding.
        for stream in [
            "(Line -9223372036854775808,0 1,1)(Line 0,0 2,2)",
            "(RelLine -9223372036854775808,0 1,1)(Line 0,0 2,2)",
        ] {
            let doc = W2dReader::from_bytes(stream.as_bytes().to_vec())
                .read()
                .unwrap();
            assert_eq!(doc.len(), 1);
            assert!(doc
                .notifications
                .has_kind(NotificationKind::DroppedPrimitive));
        }
    }

    #[test]
    fn test_overflow_fatal_in_strict_mode() {
        let near_max = i32::MAX - 5;
        let stream = format!("(Origin {},0)(RelLine 0,0 100,0)", near_max);
        let err = W2dReader::from_bytes(stream.into_bytes())
            .with_configuration(W2dReaderConfiguration::strict())
            .read()
            .unwrap_err();
        assert!(matches!(err, W2dError::CoordinateOverflow { .. }));
    }

    #[test]
    fn test_failsafe_returns_partial_on_corrupt_stream() {
        let mut stream = b"(Line 0,0 10,10)".to_vec();
        // Binary record with a size one byte too small.
        stream.push(b'{');
        stream.extend_from_slice(&6u32.to_le_bytes());
        stream.extend_from_slice(&0x0201u16.to_le_bytes());
        stream.extend_from_slice(&[255, 0, 0, 255]);
        stream.push(b'}');

        let (doc, err) = W2dReader::from_bytes(stream.clone()).read_partial();
        assert_eq!(doc.len(), 1);
        assert!(matches!(err, Some(W2dError::Corrupt { .. })));
        assert!(doc.notifications.has_kind(NotificationKind::StreamError));

        // Strict mode surfaces the same error from read().
        let err = W2dReader::from_bytes(stream)
            .with_configuration(W2dReaderConfiguration::strict())
            .read()
            .unwrap_err();
        assert!(matches!(err, W2dError::Corrupt { .. }));
    }

    #[test]
    fn test_mixed_encodings_in_one_stream() {
        let mut stream = Vec::new();
        // Binary absolute line.
        let mut payload = point32(0, 0);
        payload.extend(point32(100, 100));
        stream.extend(binary_record(0x0100, &payload));
        // ASCII color change.
        stream.extend_from_slice(b"(Color 0,255,0)");
        // Single-byte relative line chaining off the binary endpoint.
        stream.push(b'l');
        for v in [1i16, 1, 2, 2] {
            stream.extend_from_slice(&v.to_le_bytes());
        }

        let doc = W2dReader::from_bytes(stream).read().unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.primitives[0].provenance, RecordFormat::ExtendedBinary);
        assert_eq!(doc.primitives[1].provenance, RecordFormat::SingleByte);
        assert_eq!(doc.primitives[1].state.stroke_color, Rgba::opaque(0, 255, 0));
        match &doc.primitives[1].shape {
            Shape::Line { points } => {
                assert_eq!(points[0], Vector2::new(101.0, 101.0));
                assert_eq!(points[1], Vector2::new(103.0, 103.0));
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_layer_registration() {
        let doc = W2dReader::from_bytes(b"(Layer 3 walls)(Line 0,0 1,1)".to_vec())
            .read()
            .unwrap();
        assert_eq!(doc.layers.get(&3).map(String::as_str), Some("walls"));
        assert_eq!(doc.primitives[0].state.layer, 3);
    }

    #[test]
    fn test_units_and_sheet_metadata() {
        let doc = W2dReader::from_bytes(b"(Units 40)(SheetSize 210 297)".to_vec())
            .read()
            .unwrap();
        assert_eq!(doc.source_units_per_mm, Some(40.0));
        assert_eq!(doc.sheet_hint, Some((210.0, 297.0)));
    }

    #[test]
    fn test_block_ref_does_not_disturb_chain() {
        let mut stream = b"(Origin 10,10)".to_vec();
        // Minimal block ref: subtype 0, block id 7, insertion point.
        let mut payload = vec![0u8];
        payload.extend_from_slice(&7u16.to_le_bytes());
        payload.extend(point32(500, 600));
        stream.extend(binary_record(0x0401, &payload));
        stream.extend_from_slice(b"(RelLine 1,1 2,2)");

        let doc = W2dReader::from_bytes(stream).read().unwrap();
        assert_eq!(doc.block_refs.len(), 1);
        assert_eq!(doc.block_refs[0].insertion, (500, 600));
        // The relative line still chains from (10,10), not (500,600).
        match &doc.primitives[0].shape {
            Shape::Line { points } => assert_eq!(points[0], Vector2::new(11.0, 11.0)),
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_reset_restores_defaults_and_origin() {
        let stream = b"(Color 255,0,0)(Origin 100,100)(Reset)(RelLine 1,1 2,2)";
        let doc = W2dReader::from_bytes(stream.to_vec()).read().unwrap();
        assert_eq!(doc.primitives[0].state.stroke_color, Rgba::BLACK);
        match &doc.primitives[0].shape {
            Shape::Line { points } => assert_eq!(points[0], Vector2::new(1.0, 1.0)),
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_cancellation_stops_decoding() {
        let flag = Arc::new(AtomicBool::new(true));
        let config = W2dReaderConfiguration {
            cancel: Some(Arc::clone(&flag)),
            ..Default::default()
        };
        let doc = W2dReader::from_bytes(b"(Line 0,0 1,1)(Line 2,2 3,3)".to_vec())
            .with_configuration(config)
            .read()
            .unwrap();
        assert!(doc.is_empty());
        assert!(doc.notifications.has_kind(NotificationKind::Cancelled));
    }

    #[test]
    fn test_read_many_preserves_order() {
        let streams = vec![
            b"(Line 0,0 1,1)".to_vec(),
            b"(Line 0,0 1,1)(Line 2,2 3,3)".to_vec(),
            Vec::new(),
        ];
        let results = read_many(streams, &W2dReaderConfiguration::default());
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0.len(), 1);
        assert_eq!(results[1].0.len(), 2);
        assert_eq!(results[2].0.len(), 0);
        assert!(results.iter().all(|(_, err)| err.is_none()));
    }

    #[test]
    fn test_read_fitted_applies_page_transform() {
        let doc = W2dReader::from_bytes(b"(Line 0,0 1000,2000)".to_vec())
            .read_fitted(&PageRegion::LETTER)
            .unwrap();
        assert!(doc.page_transform.is_some());
        let bounds = doc.compute_bounds().unwrap();
        assert!(bounds.width() <= PageRegion::LETTER.avail_width() + 1e-9);
        assert!(bounds.height() <= PageRegion::LETTER.avail_height() + 1e-9);
    }
}
