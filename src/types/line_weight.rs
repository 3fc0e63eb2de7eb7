//! Line weight representation for drawing attributes

use std::fmt;

/// Stroke line weight in source drawing units.
///
/// Negative values mean a hairline stroke: always one device unit wide
/// regardless of the page transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LineWeight(pub i32);

impl LineWeight {
    /// Device hairline, unaffected by scaling.
    pub const HAIRLINE: LineWeight = LineWeight(-1);

    /// Zero-width stroke (thinnest visible line).
    pub const ZERO: LineWeight = LineWeight(0);

    /// Create a line weight from a raw stream value
    pub const fn from_value(value: i32) -> Self {
        LineWeight(value)
    }

    /// Get the raw value
    pub const fn value(&self) -> i32 {
        self.0
    }

    /// Whether this weight is a hairline (negative raw value).
    pub const fn is_hairline(&self) -> bool {
        self.0 < 0
    }

    /// Weight in source units, after hairline normalization.
    pub fn units(&self) -> i32 {
        if self.is_hairline() {
            0
        } else {
            self.0
        }
    }
}

impl Default for LineWeight {
    fn default() -> Self {
        LineWeight::HAIRLINE
    }
}

impl fmt::Display for LineWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_hairline() {
            write!(f, "hairline")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
