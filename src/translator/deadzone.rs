//! # Dead Zone Module
//!
//! Suppresses thumbstick noise near center.
//!
//! ## Joint Dead Zone
//!
//! Unlike a per-axis dead zone, both components are tested together: a stick
//! is only snapped to `(0, 0)` when *both* `|x|` and `|y|` are strictly below
//! the threshold. As soon as either axis reaches the threshold the vector is
//! passed through untouched, including the small component on the other
//! axis. No rescaling is applied, the sector classifier only cares about
//! direction.
//!
//! ## Usage
//!
//! ```
//! use rover_pad::translator::deadzone::{DeadzoneFilter, StickVector};
//!
//! let filter = DeadzoneFilter::new(7864);
//!
//! // Both axes inside the dead zone
//! assert_eq!(filter.apply(StickVector::new(5000, 5000)), StickVector::ZERO);
//!
//! // One axis outside, the other one is kept as is
//! assert_eq!(filter.apply(StickVector::new(8000, 10)), StickVector::new(8000, 10));
//! ```

use serde::Serialize;

/// Default dead zone: 24% of the `i16` positive range (0.24 × 32767).
pub const DEFAULT_DEADZONE_THRESHOLD: i32 = 7864;

/// A thumbstick reading in XInput convention.
///
/// `x` grows to the right, `y` grows upwards. Each component covers the full
/// `i16` range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct StickVector {
    /// Horizontal deflection, negative = left.
    pub x: i16,
    /// Vertical deflection, negative = down.
    pub y: i16,
}

impl StickVector {
    /// The centered stick.
    pub const ZERO: StickVector = StickVector { x: 0, y: 0 };

    /// Creates a vector from raw components.
    #[must_use]
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    /// Returns `true` for the null vector.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.x == 0 && self.y == 0
    }
}

/// Joint dead zone applied to a [`StickVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadzoneFilter {
    /// Threshold in raw stick units. `0` disables the filter.
    threshold: i32,
}

impl Default for DeadzoneFilter {
    fn default() -> Self {
        Self::new(DEFAULT_DEADZONE_THRESHOLD)
    }
}

impl DeadzoneFilter {
    /// Creates a filter with the given threshold.
    ///
    /// Negative thresholds are treated as `0` (pass-through).
    #[must_use]
    pub fn new(threshold: i32) -> Self {
        Self {
            threshold: threshold.max(0),
        }
    }

    /// A filter that never zeroes anything.
    ///
    /// ```
    /// use rover_pad::translator::deadzone::{DeadzoneFilter, StickVector};
    ///
    /// let filter = DeadzoneFilter::disabled();
    /// assert_eq!(filter.apply(StickVector::new(1, -1)), StickVector::new(1, -1));
    /// ```
    #[must_use]
    pub fn disabled() -> Self {
        Self { threshold: 0 }
    }

    /// Returns the configured threshold.
    #[must_use]
    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    /// Applies the joint dead zone.
    ///
    /// The comparison is strict: a component equal to the threshold counts as
    /// outside the dead zone.
    #[must_use]
    pub fn apply(&self, stick: StickVector) -> StickVector {
        let x = i32::from(stick.x).abs();
        let y = i32::from(stick.y).abs();

        if x < self.threshold && y < self.threshold {
            StickVector::ZERO
        } else {
            stick
        }
    }
}
