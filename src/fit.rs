//! Bounding-box fit: maps source-space extent into a page region.
//!
//! The scale factor is uniform across both axes, always. Independent
//! per-axis scaling distorts proportions; it is a hard invariant of this
//! fitter that `scaled_width / width == scaled_height / height` for every
//! non-degenerate box.

use crate::types::{BoundingBox, Transform2D};

/// Target page region with symmetric margins, in output units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRegion {
    /// Page width
    pub width: f64,
    /// Page height
    pub height: f64,
    /// Margin applied on all four sides
    pub margin: f64,
}

impl PageRegion {
    /// Create a page region.
    pub const fn new(width: f64, height: f64, margin: f64) -> Self {
        PageRegion {
            width,
            height,
            margin,
        }
    }

    /// US Letter portrait in points, with half-inch margins.
    pub const LETTER: PageRegion = PageRegion::new(612.0, 792.0, 36.0);

    /// ISO A4 portrait in points, with half-inch margins.
    pub const A4: PageRegion = PageRegion::new(595.0, 842.0, 36.0);

    /// Width available inside the margins.
    pub fn avail_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }

    /// Height available inside the margins.
    pub fn avail_height(&self) -> f64 {
        self.height - 2.0 * self.margin
    }
}

/// Derives the uniform scale + translation fitting a bounding box into a
/// page region.
pub struct BoundingBoxFitter;

impl BoundingBoxFitter {
    /// Compute the page transform for `bounds`.
    ///
    /// A degenerate axis (zero extent) contributes no scale constraint;
    /// its translation centers the content instead. With both axes
    /// degenerate (a single point) the scale defaults to 1.0 and the
    /// point is centered. There is no divide by zero on either path.
    pub fn fit(bounds: &BoundingBox, page: &PageRegion) -> Transform2D {
        let avail_w = page.avail_width();
        let avail_h = page.avail_height();

        let x_ratio = (!bounds.is_degenerate_x()).then(|| avail_w / bounds.width());
        let y_ratio = (!bounds.is_degenerate_y()).then(|| avail_h / bounds.height());

        // Uniform: the tighter axis wins; never scaled independently.
        let scale = match (x_ratio, y_ratio) {
            (Some(x), Some(y)) => x.min(y),
            (Some(x), None) => x,
            (None, Some(y)) => y,
            (None, None) => 1.0,
        };

        let tx = if bounds.is_degenerate_x() {
            page.width / 2.0 - bounds.min.x * scale
        } else {
            -bounds.min.x * scale + page.margin
        };
        let ty = if bounds.is_degenerate_y() {
            page.height / 2.0 - bounds.min.y * scale
        } else {
            -bounds.min.y * scale + page.margin
        };

        Transform2D::new(scale, tx, ty)
    }
}
