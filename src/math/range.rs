//! Scalar-or-range values and their algebra.
//!
//! Every quantity the impact formulas produce is a `Range`: a closed
//! interval `[min, max]`. A scalar is the degenerate range `min == max`,
//! so formula code never has to branch on "is this uncertain or not".
//!
//! The algebra assumes the formulas it feeds are monotonic in their
//! range-valued inputs over the evaluated domain; under that assumption
//! endpoint arithmetic is exact.

use serde::{Deserialize, Serialize};

/// A closed interval `[min, max]` with `min <= max`.
///
/// Immutable value: every operation returns a fresh range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    /// Build a range from two bounds, ordering them if floating-point
    /// error produced `min > max`.
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Lift a scalar to the degenerate range `[v, v]`.
    pub fn scalar(v: f64) -> Self {
        Self { min: v, max: v }
    }

    /// Whether the range is degenerate (a plain scalar).
    pub fn is_scalar(&self) -> bool {
        self.min == self.max
    }

    /// Sum of two ranges (mins and maxes add independently).
    pub fn add(self, other: Self) -> Self {
        Self::new(self.min + other.min, self.max + other.max)
    }

    /// Scale both bounds by a non-negative constant.
    pub fn scale(self, k: f64) -> Self {
        debug_assert!(k >= 0.0, "Range::scale requires a non-negative factor");
        Self::new(self.min * k, self.max * k)
    }

    /// Elementwise product of two ranges with non-negative bounds.
    ///
    /// Used to apply range-valued multipliers (PUE, water intensity) to
    /// range-valued energy. Only valid when both operands are >= 0, which
    /// holds for every physical quantity in the impact formulas.
    pub fn mul(self, other: Self) -> Self {
        debug_assert!(self.min >= 0.0 && other.min >= 0.0);
        Self::new(self.min * other.min, self.max * other.max)
    }

    /// Whether the entire range lies strictly below `threshold`.
    pub fn less_than(self, threshold: f64) -> bool {
        self.max < threshold
    }

    /// Envelope of two ranges.
    pub fn merge(self, other: Self) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Clamp the lower bound at `floor` (upper bound untouched).
    pub fn clamp_min(self, floor: f64) -> Self {
        Self::new(self.min.max(floor), self.max.max(floor))
    }

    /// Midpoint, the single representative value used for ranking/display.
    pub fn midpoint(self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

impl From<f64> for Range {
    fn from(v: f64) -> Self {
        Self::scalar(v)
    }
}
