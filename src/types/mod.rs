//! Core value types shared across the decoding pipeline

pub mod bounds;
pub mod color;
pub mod line_weight;
pub mod transform;
pub mod vector;

pub use bounds::BoundingBox;
pub use color::Rgba;
pub use line_weight::LineWeight;
pub use transform::Transform2D;
pub use vector::Vector2;

/// An absolute point in the source integer coordinate space.
///
/// Kept as 64-bit to absorb legacy values accumulated near the 32-bit
/// boundary without wrapping; the coordinate cursor rejects anything whose
/// magnitude exceeds the configured bound before it reaches the scene.
pub type IntPoint = (i64, i64);
