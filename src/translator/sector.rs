//! # Sector Classifier
//!
//! Buckets a filtered stick vector into one of twelve angular sectors.
//!
//! Instead of `atan2`, the classifier computes `cos θ = x / |v|` once and
//! compares it against two thresholds inside the quadrant selected by the
//! signs of `x` and `y`:
//!
//! | Constant           | Value          | Angle in Q1 |
//! |--------------------|----------------|-------------|
//! | [`HIGH_THRESHOLD`] | 1.732 / 2      | ≈ 30°       |
//! | [`LOW_THRESHOLD`]  | 1.05 / 2       | ≈ 58°       |
//!
//! Each quadrant is split into `Low`, `Mid` and `High` bands, `Low` being the
//! band at the quadrant's starting angle (counter-clockwise from +X).
//!
//! ## Boundaries
//!
//! Every sector is inclusive at its lower-angle edge. Quadrants are tested in
//! the fixed order Q1, Q2, Q3, Q4; the axis rays fall into the quadrant that
//! starts there:
//!
//! | Ray            | Sector   |
//! |----------------|----------|
//! | +X (`y == 0`)  | `Q1Low`  |
//! | +Y (`x == 0`)  | `Q2Low`  |
//! | -X (`y == 0`)  | `Q3Low`  |
//! | -Y (`x == 0`)  | `Q4Low`  |
//!
//! The null vector maps to [`Sector::None`] and never reaches the division.
//!
//! ```
//! use rover_pad::translator::deadzone::StickVector;
//! use rover_pad::translator::sector::{classify, Sector};
//!
//! assert_eq!(classify(StickVector::new(0, 0)), Sector::None);
//! assert_eq!(classify(StickVector::new(30000, 0)), Sector::Q1Low);
//! assert_eq!(classify(StickVector::new(-30000, 30000)), Sector::Q2Mid);
//! ```

use super::deadzone::StickVector;

/// cos(30°) as used for the outer bands.
pub const HIGH_THRESHOLD: f64 = 1.732 / 2.0;

/// Inner band threshold, slightly above cos(60°).
pub const LOW_THRESHOLD: f64 = 1.05 / 2.0;

/// Number of directional sectors.
pub const SECTOR_COUNT: usize = 12;

/// Angular bucket of a stick vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sector {
    /// Centered stick.
    None,
    /// [0°, 30°)
    Q1Low,
    /// [30°, 58°)
    Q1Mid,
    /// [58°, 90°)
    Q1High,
    /// [90°, 122°)
    Q2Low,
    /// [122°, 150°)
    Q2Mid,
    /// [150°, 180°)
    Q2High,
    /// [180°, 210°)
    Q3Low,
    /// [210°, 238°)
    Q3Mid,
    /// [238°, 270°)
    Q3High,
    /// [270°, 302°)
    Q4Low,
    /// [302°, 330°)
    Q4Mid,
    /// [330°, 360°)
    Q4High,
}

impl Sector {
    /// The twelve directional sectors in counter-clockwise order.
    pub const DIRECTIONAL: [Sector; SECTOR_COUNT] = [
        Sector::Q1Low,
        Sector::Q1Mid,
        Sector::Q1High,
        Sector::Q2Low,
        Sector::Q2Mid,
        Sector::Q2High,
        Sector::Q3Low,
        Sector::Q3Mid,
        Sector::Q3High,
        Sector::Q4Low,
        Sector::Q4Mid,
        Sector::Q4High,
    ];

    /// Position in [`Sector::DIRECTIONAL`], `None` for the centered stick.
    #[must_use]
    pub fn index(self) -> Option<usize> {
        Self::DIRECTIONAL.iter().position(|&s| s == self)
    }

    /// Quadrant number (1-4), `None` for the centered stick.
    #[must_use]
    pub fn quadrant(self) -> Option<u8> {
        self.index().map(|i| (i / 3) as u8 + 1)
    }
}

/// Classifies a (dead-zone filtered) stick vector.
///
/// Total over the whole `i16 × i16` domain.
#[must_use]
pub fn classify(stick: StickVector) -> Sector {
    if stick.is_zero() {
        return Sector::None;
    }

    let x = f64::from(stick.x);
    let y = f64::from(stick.y);
    let cosine = x / x.hypot(y);

    if y >= 0.0 && x > 0.0 {
        if cosine > HIGH_THRESHOLD {
            Sector::Q1Low
        } else if cosine > LOW_THRESHOLD {
            Sector::Q1Mid
        } else {
            Sector::Q1High
        }
    } else if y > 0.0 && x <= 0.0 {
        if cosine > -LOW_THRESHOLD {
            Sector::Q2Low
        } else if cosine > -HIGH_THRESHOLD {
            Sector::Q2Mid
        } else {
            Sector::Q2High
        }
    } else if y <= 0.0 && x < 0.0 {
        if cosine < -HIGH_THRESHOLD {
            Sector::Q3Low
        } else if cosine < -LOW_THRESHOLD {
            Sector::Q3Mid
        } else {
            Sector::Q3High
        }
    } else if cosine < LOW_THRESHOLD {
        // Remaining half-plane: x >= 0 && y < 0
        Sector::Q4Low
    } else if cosine < HIGH_THRESHOLD {
        Sector::Q4Mid
    } else {
        Sector::Q4High
    }
}
