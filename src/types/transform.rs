//! Page transform derived from the bounding-box fit

use super::Vector2;
use std::fmt;

/// A uniform scale plus translation mapping source-space geometry into
/// page space.
///
/// The scale factor is shared by both axes. Independent per-axis scaling
/// distorts proportions and is deliberately not representable here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    /// Uniform scale factor applied to both axes
    pub scale: f64,
    /// Translation along X, applied after scaling
    pub tx: f64,
    /// Translation along Y, applied after scaling
    pub ty: f64,
}

impl Transform2D {
    /// Identity transform
    pub const IDENTITY: Transform2D = Transform2D {
        scale: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// Create a transform from a uniform scale and translation
    pub const fn new(scale: f64, tx: f64, ty: f64) -> Self {
        Transform2D { scale, tx, ty }
    }

    /// Apply the transform to a point
    pub fn apply(&self, point: Vector2) -> Vector2 {
        Vector2::new(
            point.x * self.scale + self.tx,
            point.y * self.scale + self.ty,
        )
    }

    /// Apply only the scale (for scalar magnitudes such as radii and
    /// line weights)
    pub fn apply_scalar(&self, value: f64) -> f64 {
        value * self.scale
    }

    /// Compose with another transform (`self` first, then `after`)
    pub fn then(&self, after: &Transform2D) -> Transform2D {
        Transform2D {
            scale: self.scale * after.scale,
            tx: self.tx * after.scale + after.tx,
            ty: self.ty * after.scale + after.ty,
        }
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Transform2D::IDENTITY
    }
}

impl fmt::Display for Transform2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scale {} translate ({}, {})", self.scale, self.tx, self.ty)
    }
}
