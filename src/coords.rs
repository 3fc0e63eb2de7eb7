//! Coordinate cursor: resolves relative deltas into absolute positions.
//!
//! The stream expresses most geometry as deltas from an ambient origin.
//! The origin is updated explicitly by origin-setting opcodes and
//! implicitly by geometry opcodes that chain: after a run of relative
//! records, the origin equals the last emitted absolute point.
//!
//! Accumulation happens in i64 so values near the 32-bit boundary cannot
//! wrap; anything whose magnitude leaves the configured bound is rejected
//! rather than silently producing an absurd coordinate (the legacy
//! implementations wrapped here, which is a documented defect class, not
//! behavior to preserve).

use crate::types::IntPoint;
use std::fmt;

/// Integer width of a record's coordinate encoding.
///
/// Set per record from the opcode table's declaration; not persistent
/// cursor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    /// 16-bit signed deltas/values
    Bit16,
    /// 32-bit signed deltas/values
    Bit32,
}

impl Width {
    /// Largest magnitude representable at this width.
    pub fn max_magnitude(&self) -> i64 {
        match self {
            Width::Bit16 => i64::from(i16::MAX),
            Width::Bit32 => i64::from(i32::MAX),
        }
    }
}

/// Whether a record's coordinates are deltas or already absolute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordMode {
    /// Deltas from the ambient origin, chaining point to point
    Relative,
    /// Absolute positions, validated against the width's range
    Absolute,
}

/// Failure from coordinate resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateError {
    /// A resolved value's magnitude exceeded the configured bound.
    Overflow {
        /// The offending widened value
        value: i64,
    },
    /// An absolute value lay outside its declared width's range.
    OutOfRange {
        /// The out-of-range value
        value: i64,
        /// The width it was declared at
        width: Width,
    },
}

impl fmt::Display for CoordinateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overflow { value } => write!(f, "resolved coordinate {} overflows", value),
            Self::OutOfRange { value, width } => {
                write!(f, "absolute coordinate {} out of range for {:?}", value, width)
            }
        }
    }
}

/// Tracks the ambient origin and resolves record coordinates.
#[derive(Debug, Clone)]
pub struct CoordinateCursor {
    origin: IntPoint,
    chaining_enabled: bool,
    bound: i64,
}

impl Default for CoordinateCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinateCursor {
    /// Cursor at the implicit origin `(0, 0)` with the default bound.
    pub fn new() -> Self {
        Self {
            origin: (0, 0),
            chaining_enabled: true,
            bound: i64::from(i32::MAX),
        }
    }

    /// Cursor with a caller-configured sane bound on resolved magnitudes.
    pub fn with_bound(bound: i64) -> Self {
        Self {
            bound,
            ..Self::new()
        }
    }

    /// The current ambient origin.
    pub fn origin(&self) -> IntPoint {
        self.origin
    }

    /// Unconditionally overwrite the origin, regardless of chaining state.
    pub fn set_origin(&mut self, point: IntPoint) {
        self.origin = point;
    }

    /// Enable or disable chaining. With chaining disabled, resolution
    /// leaves the origin untouched (used for metadata coordinates such as
    /// clip rectangles and block-reference insertion points, which must
    /// not disturb the geometry chain).
    pub fn set_chaining(&mut self, enabled: bool) {
        self.chaining_enabled = enabled;
    }

    /// Whether geometry resolution updates the origin.
    pub fn chaining_enabled(&self) -> bool {
        self.chaining_enabled
    }

    /// Resolve a record's coordinate list into absolute positions.
    ///
    /// `Relative`: each successive point is `origin + delta`, and the
    /// origin advances to each resolved point as it is produced, so a
    /// polyline's vertices chain against each other rather than only
    /// against the initial origin.
    ///
    /// `Absolute`: values pass through validated against the declared
    /// width's representable range; the origin moves to the last point
    /// for subsequent chaining.
    ///
    /// On error the cursor's origin is left as it was before the call:
    /// a dropped primitive must not corrupt the chain for its successors.
    pub fn resolve_points(
        &mut self,
        deltas: &[IntPoint],
        width: Width,
        mode: CoordMode,
    ) -> Result<Vec<IntPoint>, CoordinateError> {
        let saved_origin = self.origin;
        let mut resolved = Vec::with_capacity(deltas.len());

        let result = (|| {
            for &(dx, dy) in deltas {
                let point = match mode {
                    CoordMode::Relative => {
                        let x = self.checked_accumulate(self.origin.0, dx)?;
                        let y = self.checked_accumulate(self.origin.1, dy)?;
                        (x, y)
                    }
                    CoordMode::Absolute => {
                        self.check_absolute(dx, width)?;
                        self.check_absolute(dy, width)?;
                        (dx, dy)
                    }
                };
                self.origin = point;
                resolved.push(point);
            }
            Ok(())
        })();

        match result {
            Ok(()) => {
                if !self.chaining_enabled {
                    self.origin = saved_origin;
                }
                Ok(resolved)
            }
            Err(err) => {
                self.origin = saved_origin;
                Err(err)
            }
        }
    }

    // unsigned_abs: i64::MIN has no positive counterpart, so a signed
    // abs() would panic (debug) or wrap negative (release) here.
    fn checked_accumulate(&self, base: i64, delta: i64) -> Result<i64, CoordinateError> {
        let value = base
            .checked_add(delta)
            .ok_or(CoordinateError::Overflow { value: i64::MAX })?;
        if value.unsigned_abs() > self.bound.unsigned_abs() {
            return Err(CoordinateError::Overflow { value });
        }
        Ok(value)
    }

    fn check_absolute(&self, value: i64, width: Width) -> Result<(), CoordinateError> {
        if value.unsigned_abs() > width.max_magnitude() as u64 {
            return Err(CoordinateError::OutOfRange { value, width });
        }
        if value.unsigned_abs() > self.bound.unsigned_abs() {
            return Err(CoordinateError::Overflow { value });
        }
        Ok(())
    }
}
