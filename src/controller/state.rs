//! # Device Snapshot
//!
//! The per-tick view of one gamepad, in XInput conventions.
//!
//! Whatever backend polls the hardware, it hands the translator a
//! [`DeviceSnapshot`]: two thumbsticks in the full `i16` range (up positive),
//! two 8-bit triggers and the XInput `wButtons` bit mask.

use crate::translator::deadzone::StickVector;

/// XInput digital button bit mask.
///
/// # Examples
///
/// ```
/// use rover_pad::controller::state::Buttons;
///
/// let buttons = Buttons::DPAD_UP | Buttons::A;
/// assert!(buttons.contains(Buttons::DPAD_UP));
/// assert!(!buttons.contains(Buttons::START));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Buttons(pub u16);

impl Buttons {
    pub const NONE: Buttons = Buttons(0);
    pub const DPAD_UP: Buttons = Buttons(0x0001);
    pub const DPAD_DOWN: Buttons = Buttons(0x0002);
    pub const DPAD_LEFT: Buttons = Buttons(0x0004);
    pub const DPAD_RIGHT: Buttons = Buttons(0x0008);
    pub const START: Buttons = Buttons(0x0010);
    pub const BACK: Buttons = Buttons(0x0020);
    pub const LEFT_THUMB: Buttons = Buttons(0x0040);
    pub const RIGHT_THUMB: Buttons = Buttons(0x0080);
    pub const LEFT_SHOULDER: Buttons = Buttons(0x0100);
    pub const RIGHT_SHOULDER: Buttons = Buttons(0x0200);
    pub const A: Buttons = Buttons(0x1000);
    pub const B: Buttons = Buttons(0x2000);
    pub const X: Buttons = Buttons(0x4000);
    pub const Y: Buttons = Buttons(0x8000);

    /// Buttons with their display names, in status-line order.
    pub const NAMED: [(Buttons, &'static str); 14] = [
        (Buttons::DPAD_UP, "DPAD_UP"),
        (Buttons::DPAD_DOWN, "DPAD_DOWN"),
        (Buttons::DPAD_LEFT, "DPAD_LEFT"),
        (Buttons::DPAD_RIGHT, "DPAD_RIGHT"),
        (Buttons::START, "START"),
        (Buttons::BACK, "BACK"),
        (Buttons::LEFT_THUMB, "LEFT_THUMB"),
        (Buttons::RIGHT_THUMB, "RIGHT_THUMB"),
        (Buttons::LEFT_SHOULDER, "LEFT_SHOULDER"),
        (Buttons::RIGHT_SHOULDER, "RIGHT_SHOULDER"),
        (Buttons::A, "A"),
        (Buttons::B, "B"),
        (Buttons::X, "X"),
        (Buttons::Y, "Y"),
    ];

    /// Returns `true` if every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Buttons) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    /// Sets or clears the bits of `other`.
    pub fn set(&mut self, other: Buttons, pressed: bool) {
        if pressed {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }

    /// Returns `true` if no button is held.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates over the names of the held buttons.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMED
            .into_iter()
            .filter(move |(button, _)| self.contains(*button))
            .map(|(_, name)| name)
    }
}

impl std::ops::BitOr for Buttons {
    type Output = Buttons;

    fn bitor(self, rhs: Buttons) -> Buttons {
        Buttons(self.0 | rhs.0)
    }
}

/// One sample of a gamepad.
///
/// `Default` is a disconnected pad with everything centered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceSnapshot {
    /// Whether the pad answered this sample.
    pub connected: bool,
    /// Left thumbstick, drives the rover.
    pub drive_stick: StickVector,
    /// Right thumbstick, used by heading assist.
    pub heading_stick: StickVector,
    /// Left trigger, 0 = released.
    pub left_trigger: u8,
    /// Right trigger, 0 = released.
    pub right_trigger: u8,
    /// Digital buttons.
    pub buttons: Buttons,
}

impl DeviceSnapshot {
    /// A connected pad at rest.
    #[must_use]
    pub fn connected() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }
}
