//! Scene model: resolved primitives accumulated into an ordered document.
//!
//! The builder is append-only. Primitives carry absolute source-space
//! coordinates (post-resolution, pre-page-transform) and a copy of the
//! graphics state active at emission time. After the stream is exhausted
//! the document can compute its global extent and be fitted to a page.

use crate::fit::{BoundingBoxFitter, PageRegion};
use crate::io::RecordFormat;
use crate::notification::NotificationCollection;
use crate::opcodes::block_ref::BlockRef;
use crate::state::GraphicsState;
use crate::types::{BoundingBox, Rgba, Transform2D, Vector2};
use indexmap::IndexMap;

/// A resolved geometry shape in absolute coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Two-point segment
    Line { points: Vec<Vector2> },
    /// Open vertex chain
    Polyline { points: Vec<Vector2> },
    /// Closed vertex chain
    Polygon { points: Vec<Vector2> },
    /// Circle by center and radius
    Circle { center: Vector2, radius: f64 },
    /// Axis pair ellipse
    Ellipse {
        center: Vector2,
        rx: f64,
        ry: f64,
        rotation_deg: f64,
    },
    /// Elliptical arc; angles in degrees, counter-clockwise
    Arc {
        center: Vector2,
        rx: f64,
        ry: f64,
        rotation_deg: f64,
        start_deg: f64,
        end_deg: f64,
    },
    /// Triangle fan, optionally with per-vertex shading colors
    TriangleFan {
        points: Vec<Vector2>,
        vertex_colors: Option<Vec<Rgba>>,
    },
    /// Cubic bezier chain: first point then triples of control points
    Bezier { points: Vec<Vector2> },
    /// Positioned text; shaping is the renderer's concern
    TextRun { position: Vector2, content: String },
}

impl Shape {
    /// Visit every coordinate of the shape.
    pub fn for_each_point(&self, mut f: impl FnMut(Vector2)) {
        match self {
            Shape::Line { points }
            | Shape::Polyline { points }
            | Shape::Polygon { points }
            | Shape::Bezier { points } => points.iter().copied().for_each(&mut f),
            Shape::TriangleFan { points, .. } => points.iter().copied().for_each(&mut f),
            Shape::Circle { center, radius } => {
                f(Vector2::new(center.x - radius, center.y - radius));
                f(Vector2::new(center.x + radius, center.y + radius));
            }
            Shape::Ellipse { center, rx, ry, .. } | Shape::Arc { center, rx, ry, .. } => {
                // Conservative extent for rotated ellipses.
                let r = rx.abs().max(ry.abs());
                f(Vector2::new(center.x - r, center.y - r));
                f(Vector2::new(center.x + r, center.y + r));
            }
            Shape::TextRun { position, .. } => f(*position),
        }
    }

    /// Apply the page transform in place: all coordinates, plus scalar
    /// magnitudes that live in coordinate units.
    pub fn apply_transform(&mut self, transform: &Transform2D) {
        match self {
            Shape::Line { points }
            | Shape::Polyline { points }
            | Shape::Polygon { points }
            | Shape::Bezier { points } => {
                for p in points.iter_mut() {
                    *p = transform.apply(*p);
                }
            }
            Shape::TriangleFan { points, .. } => {
                for p in points.iter_mut() {
                    *p = transform.apply(*p);
                }
            }
            Shape::Circle { center, radius } => {
                *center = transform.apply(*center);
                *radius = transform.apply_scalar(*radius);
            }
            Shape::Ellipse { center, rx, ry, .. } => {
                *center = transform.apply(*center);
                *rx = transform.apply_scalar(*rx);
                *ry = transform.apply_scalar(*ry);
            }
            Shape::Arc { center, rx, ry, .. } => {
                *center = transform.apply(*center);
                *rx = transform.apply_scalar(*rx);
                *ry = transform.apply_scalar(*ry);
            }
            Shape::TextRun { position, .. } => {
                *position = transform.apply(*position);
            }
        }
    }
}

/// A shape plus the attribute snapshot active when it was emitted.
#[derive(Debug, Clone)]
pub struct Primitive {
    /// The resolved geometry
    pub shape: Shape,
    /// Copy of the ambient attributes at emission time
    pub state: GraphicsState,
    /// Which encoding produced this primitive (diagnostics only)
    pub provenance: RecordFormat,
}

/// The decoded drawing: ordered primitives plus stream metadata.
#[derive(Debug, Clone, Default)]
pub struct SceneDocument {
    /// Primitives in stream order
    pub primitives: Vec<Primitive>,
    /// Layer ids to declared names, in declaration order
    pub layers: IndexMap<u16, String>,
    /// Block references encountered (markers; expansion is external)
    pub block_refs: Vec<BlockRef>,
    /// Declared source units, as units per millimetre
    pub source_units_per_mm: Option<f64>,
    /// Explicit sheet size hint from stream metadata, if any
    pub sheet_hint: Option<(f64, f64)>,
    /// Non-fatal issues collected while decoding
    pub notifications: NotificationCollection,
    /// The page transform applied by `fit_to_page`, once fitted
    pub page_transform: Option<Transform2D>,
}

impl SceneDocument {
    /// Number of primitives.
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Whether the document holds no primitives.
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Global extent over every point of every primitive, in source
    /// units. `None` for an empty document.
    pub fn compute_bounds(&self) -> Option<BoundingBox> {
        let mut bounds: Option<BoundingBox> = None;
        for primitive in &self.primitives {
            primitive.shape.for_each_point(|p| match &mut bounds {
                Some(b) => b.expand_to_include(p),
                None => bounds = Some(BoundingBox::from_point(p)),
            });
        }
        bounds
    }

    /// Apply a transform to every point of every primitive in one pass.
    pub fn apply_transform(&mut self, transform: &Transform2D) {
        for primitive in &mut self.primitives {
            primitive.shape.apply_transform(transform);
        }
    }

    /// Compute the global extent, derive the uniform page fit, and apply
    /// it. Returns the transform used, or `None` for an empty document
    /// (nothing to fit).
    pub fn fit_to_page(&mut self, page: &PageRegion) -> Option<Transform2D> {
        let bounds = self.compute_bounds()?;
        let transform = BoundingBoxFitter::fit(&bounds, page);
        self.apply_transform(&transform);
        self.page_transform = Some(transform);
        Some(transform)
    }
}

/// Append-only accumulator for resolved primitives.
#[derive(Debug, Default)]
pub struct SceneBuilder {
    document: SceneDocument,
}

impl SceneBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a primitive in stream order.
    pub fn push(&mut self, primitive: Primitive) {
        self.document.primitives.push(primitive);
    }

    /// Register a layer name from a layer record.
    pub fn register_layer(&mut self, id: u16, name: String) {
        self.document.layers.insert(id, name);
    }

    /// Record a block-reference marker.
    pub fn push_block_ref(&mut self, block_ref: BlockRef) {
        self.document.block_refs.push(block_ref);
    }

    /// Record the stream's declared source units.
    pub fn set_units(&mut self, units_per_mm: f64) {
        self.document.source_units_per_mm = Some(units_per_mm);
    }

    /// Record an explicit sheet size hint.
    pub fn set_sheet_hint(&mut self, width: f64, height: f64) {
        self.document.sheet_hint = Some((width, height));
    }

    /// The diagnostics collection for this decode.
    pub fn notifications_mut(&mut self) -> &mut NotificationCollection {
        &mut self.document.notifications
    }

    /// Number of primitives accumulated so far.
    pub fn len(&self) -> usize {
        self.document.len()
    }

    /// Whether nothing has been accumulated yet.
    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }

    /// Current global extent of the accumulated geometry.
    pub fn compute_bounds(&self) -> Option<BoundingBox> {
        self.document.compute_bounds()
    }

    /// Hand the accumulated document to the caller.
    pub fn finalize(self) -> SceneDocument {
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(a: (f64, f64), b: (f64, f64)) -> Primitive {
        Primitive {
            shape: Shape::Line {
                points: vec![Vector2::new(a.0, a.1), Vector2::new(b.0, b.1)],
            },
            state: GraphicsState::default(),
            provenance: RecordFormat::SingleByte,
        }
    }

    #[test]
    fn test_builder_preserves_order() {
        let mut builder = SceneBuilder::new();
        builder.push(line((0.0, 0.0), (1.0, 1.0)));
        builder.push(line((2.0, 2.0), (3.0, 3.0)));
        let doc = builder.finalize();
        assert_eq!(doc.len(), 2);
        match &doc.primitives[1].shape {
            Shape::Line { points } => assert_eq!(points[0], Vector2::new(2.0, 2.0)),
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_compute_bounds_over_all_primitives() {
        let mut builder = SceneBuilder::new();
        builder.push(line((0.0, 0.0), (10.0, 5.0)));
        builder.push(Primitive {
            shape: Shape::Circle {
                center: Vector2::new(20.0, 0.0),
                radius: 4.0,
            },
            state: GraphicsState::default(),
            provenance: RecordFormat::ExtendedBinary,
        });
        let bounds = builder.compute_bounds().unwrap();
        assert_eq!(bounds.min, Vector2::new(0.0, -4.0));
        assert_eq!(bounds.max, Vector2::new(24.0, 5.0));
    }

    #[test]
    fn test_empty_document_has_no_bounds() {
        assert!(SceneBuilder::new().compute_bounds().is_none());
    }

    #[test]
    fn test_apply_transform_scales_radii() {
        let mut doc = SceneDocument::default();
        doc.primitives.push(Primitive {
            shape: Shape::Circle {
                center: Vector2::new(10.0, 10.0),
                radius: 4.0,
            },
            state: GraphicsState::default(),
            provenance: RecordFormat::SingleByte,
        });
        doc.apply_transform(&Transform2D::new(0.5, 1.0, 2.0));
        match &doc.primitives[0].shape {
            Shape::Circle { center, radius } => {
                assert_eq!(*center, Vector2::new(6.0, 7.0));
                assert_eq!(*radius, 2.0);
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_layer_registration_order() {
        let mut builder = SceneBuilder::new();
        builder.register_layer(3, "walls".to_string());
        builder.register_layer(1, "dims".to_string());
        let doc = builder.finalize();
        let ids: Vec<u16> = doc.layers.keys().copied().collect();
        assert_eq!(ids, vec![3, 1]);
    }
}
