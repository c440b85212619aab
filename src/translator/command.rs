//! # Command Mapper
//!
//! Turns classified stick sectors, d-pad presses, triggers and the start
//! button into [`MotionCommand`]s.
//!
//! ## Drive Stick
//!
//! Every sector maps to a fixed velocity pulse. Bands next to the X axis are
//! turn-dominant, bands next to the Y axis are pure forward/reverse.
//! Positive angular velocity is counter-clockwise.
//!
//! | Sector | Linear | Angular | Hold |
//! |--------|-------:|--------:|-----:|
//! | Q1Low  |   30 | -250 | 18 ms |
//! | Q1Mid  |  230 | -100 | 18 ms |
//! | Q1High |  250 |    0 | 30 ms |
//! | Q2Low  |  250 |    0 | 30 ms |
//! | Q2Mid  |  230 |  100 | 18 ms |
//! | Q2High |   30 |  250 | 18 ms |
//! | Q3Low  |  -30 | -250 | 18 ms |
//! | Q3Mid  | -230 | -100 | 18 ms |
//! | Q3High | -250 |    0 | 30 ms |
//! | Q4Low  | -250 |    0 | 30 ms |
//! | Q4Mid  | -230 |  100 | 18 ms |
//! | Q4High |  -30 |  250 | 18 ms |
//!
//! ## Heading Stick
//!
//! The heading stick is quantized more coarsely than the drive stick: the two
//! sectors that meet at a quadrant boundary share a delta, giving eight
//! compass headings (0°, ±45°, ±90°, ±135°, 180°/-180°) relative to the
//! current heading. Stick up means "keep heading".
//!
//! ## Usage
//!
//! ```
//! use rover_pad::translator::command::{command_for, MotionCommand, StickRole};
//! use rover_pad::translator::sector::Sector;
//!
//! assert_eq!(
//!     command_for(Sector::Q1Low, StickRole::Drive),
//!     Some(MotionCommand::Drive { linear: 30, angular: -250, hold_ms: 18 })
//! );
//! assert_eq!(
//!     command_for(Sector::Q2Mid, StickRole::Heading),
//!     Some(MotionCommand::HeadingAdjust { delta_degrees: 45 })
//! );
//! assert_eq!(command_for(Sector::None, StickRole::Drive), None);
//! ```

use serde::Serialize;
use std::time::Duration;

use super::sector::{Sector, SECTOR_COUNT};
use crate::controller::state::Buttons;

/// Hold for turn-bearing stick pulses and trigger rotation.
pub const ROTATE_HOLD_MS: u32 = 18;

/// Hold for straight stick pulses.
pub const STRAIGHT_HOLD_MS: u32 = 30;

/// Hold for d-pad pulses.
pub const DPAD_HOLD_MS: u32 = 12;

/// Angular velocity of a trigger spin.
pub const TRIGGER_ROTATION: i32 = 550;

/// Linear velocity of a d-pad up/down pulse.
pub const DPAD_LINEAR: i32 = 250;

/// Angular velocity of a d-pad left/right pulse.
pub const DPAD_ROTATION: i32 = 210;

/// Which stick a sector came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StickRole {
    /// Left stick, velocity pulses.
    Drive,
    /// Right stick, relative heading adjustments.
    Heading,
}

/// A single instruction for the actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MotionCommand {
    /// Velocity pulse, reverted to neutral after `hold_ms`.
    Drive {
        linear: i32,
        angular: i32,
        hold_ms: u32,
    },
    /// Turn by `delta_degrees` relative to the current heading. The actuator
    /// integrates it, nothing is reverted.
    HeadingAdjust { delta_degrees: i32 },
    /// Zero both velocities immediately.
    Stop,
}

impl MotionCommand {
    /// How long the command must be held before reverting.
    ///
    /// `None` for commands that are not pulses.
    #[must_use]
    pub fn hold(&self) -> Option<Duration> {
        match self {
            MotionCommand::Drive { hold_ms, .. } => Some(Duration::from_millis(u64::from(*hold_ms))),
            MotionCommand::HeadingAdjust { .. } | MotionCommand::Stop => None,
        }
    }
}

const fn drive(linear: i32, angular: i32, hold_ms: u32) -> MotionCommand {
    MotionCommand::Drive {
        linear,
        angular,
        hold_ms,
    }
}

const fn heading(delta_degrees: i32) -> MotionCommand {
    MotionCommand::HeadingAdjust { delta_degrees }
}

/// Drive stick table, indexed like [`Sector::DIRECTIONAL`].
const DRIVE_TABLE: [MotionCommand; SECTOR_COUNT] = [
    drive(30, -250, ROTATE_HOLD_MS),
    drive(230, -100, ROTATE_HOLD_MS),
    drive(250, 0, STRAIGHT_HOLD_MS),
    drive(250, 0, STRAIGHT_HOLD_MS),
    drive(230, 100, ROTATE_HOLD_MS),
    drive(30, 250, ROTATE_HOLD_MS),
    drive(-30, -250, ROTATE_HOLD_MS),
    drive(-230, -100, ROTATE_HOLD_MS),
    drive(-250, 0, STRAIGHT_HOLD_MS),
    drive(-250, 0, STRAIGHT_HOLD_MS),
    drive(-230, 100, ROTATE_HOLD_MS),
    drive(-30, 250, ROTATE_HOLD_MS),
];

/// Heading stick table, indexed like [`Sector::DIRECTIONAL`].
const HEADING_TABLE: [MotionCommand; SECTOR_COUNT] = [
    heading(-90),
    heading(-45),
    heading(0),
    heading(0),
    heading(45),
    heading(90),
    heading(90),
    heading(135),
    heading(180),
    heading(-180),
    heading(-135),
    heading(-90),
];

/// Looks up the command for a sector.
///
/// Returns `None` for [`Sector::None`] (no-op tick).
#[must_use]
pub fn command_for(sector: Sector, role: StickRole) -> Option<MotionCommand> {
    let index = sector.index()?;
    let table = match role {
        StickRole::Drive => &DRIVE_TABLE,
        StickRole::Heading => &HEADING_TABLE,
    };
    Some(table[index])
}

/// D-pad pulse, first match of up, down, left, right.
#[must_use]
pub fn dpad_command(buttons: Buttons) -> Option<MotionCommand> {
    if buttons.contains(Buttons::DPAD_UP) {
        Some(drive(DPAD_LINEAR, 0, DPAD_HOLD_MS))
    } else if buttons.contains(Buttons::DPAD_DOWN) {
        Some(drive(-DPAD_LINEAR, 0, DPAD_HOLD_MS))
    } else if buttons.contains(Buttons::DPAD_LEFT) {
        Some(drive(0, DPAD_ROTATION, DPAD_HOLD_MS))
    } else if buttons.contains(Buttons::DPAD_RIGHT) {
        Some(drive(0, -DPAD_ROTATION, DPAD_HOLD_MS))
    } else {
        None
    }
}

/// Spin-in-place pulse from the triggers.
///
/// Any nonzero magnitude counts; the left trigger (counter-clockwise) wins
/// when both are pulled.
#[must_use]
pub fn trigger_command(left_trigger: u8, right_trigger: u8) -> Option<MotionCommand> {
    if left_trigger > 0 {
        Some(drive(0, TRIGGER_ROTATION, ROTATE_HOLD_MS))
    } else if right_trigger > 0 {
        Some(drive(0, -TRIGGER_ROTATION, ROTATE_HOLD_MS))
    } else {
        None
    }
}

/// Panic stop for the start button.
#[must_use]
pub fn start_command(buttons: Buttons) -> Option<MotionCommand> {
    buttons
        .contains(Buttons::START)
        .then_some(MotionCommand::Stop)
}
