//! # Controller Input Mapper Module
//!
//! Folds raw evdev events from an XInput-class pad (Linux `xpad` driver)
//! into a [`DeviceSnapshot`].
//!
//! ## Axis Codes (EV_ABS)
//!
//! | Axis | evdev Code | Raw Range | Snapshot |
//! |------|------------|-----------|----------|
//! | Left Stick X | ABS_X | -32768..32767 | `drive_stick.x` |
//! | Left Stick Y | ABS_Y | -32768..32767, down positive | `drive_stick.y` (inverted) |
//! | Right Stick X | ABS_RX | -32768..32767 | `heading_stick.x` |
//! | Right Stick Y | ABS_RY | -32768..32767, down positive | `heading_stick.y` (inverted) |
//! | Left Trigger | ABS_Z | 0..trigger_max | `left_trigger` 0..255 |
//! | Right Trigger | ABS_RZ | 0..trigger_max | `right_trigger` 0..255 |
//! | D-Pad X | ABS_HAT0X | -1/0/1 | `DPAD_LEFT` / `DPAD_RIGHT` |
//! | D-Pad Y | ABS_HAT0Y | -1/0/1 | `DPAD_UP` / `DPAD_DOWN` |
//!
//! ## Button Codes (EV_KEY)
//!
//! | evdev Code | Button |
//! |------------|--------|
//! | BTN_SOUTH | A |
//! | BTN_EAST | B |
//! | BTN_NORTH | X |
//! | BTN_WEST | Y |
//! | BTN_TL / BTN_TR | LEFT_SHOULDER / RIGHT_SHOULDER |
//! | BTN_SELECT / BTN_START | BACK / START |
//! | BTN_THUMBL / BTN_THUMBR | LEFT_THUMB / RIGHT_THUMB |
//! | BTN_DPAD_* | DPAD_* (pads that report the d-pad as keys) |
//!
//! `xpad` follows the historical `BTN_X`/`BTN_Y` codes, which alias
//! `BTN_NORTH`/`BTN_WEST`.

use evdev::{AbsoluteAxisType, InputEvent, InputEventKind, Key};

use super::state::{Buttons, DeviceSnapshot};

/// Raw trigger value of a fully pulled trigger on `xpad`.
pub const DEFAULT_TRIGGER_MAX: i32 = 255;

/// Accumulates evdev events into the current pad state.
///
/// # Examples
///
/// ```
/// use evdev::{AbsoluteAxisType, EventType, InputEvent};
/// use rover_pad::controller::mapper::EventMapper;
///
/// let mut mapper = EventMapper::new(255);
/// mapper.process_event(&InputEvent::new(EventType::ABSOLUTE, AbsoluteAxisType::ABS_Y.0, -32768));
///
/// // Stick pushed up reads as positive Y
/// assert_eq!(mapper.snapshot().drive_stick.y, 32767);
/// ```
#[derive(Debug)]
pub struct EventMapper {
    snapshot: DeviceSnapshot,
    trigger_max: i32,
}

impl EventMapper {
    /// Creates a mapper for a pad whose triggers report up to `trigger_max`.
    #[must_use]
    pub fn new(trigger_max: i32) -> Self {
        Self {
            snapshot: DeviceSnapshot::connected(),
            trigger_max: trigger_max.max(1),
        }
    }

    /// Current state, always marked as connected.
    #[must_use]
    pub fn snapshot(&self) -> DeviceSnapshot {
        self.snapshot
    }

    /// Processes a single evdev input event.
    ///
    /// Sync and unknown events are ignored.
    pub fn process_event(&mut self, event: &InputEvent) {
        match event.kind() {
            InputEventKind::AbsAxis(axis) => self.process_axis_event(axis, event.value()),
            InputEventKind::Key(key) => self.process_key_event(key, event.value() != 0),
            _ => {}
        }
    }

    fn process_axis_event(&mut self, axis: AbsoluteAxisType, value: i32) {
        let snapshot = &mut self.snapshot;
        match axis {
            AbsoluteAxisType::ABS_X => snapshot.drive_stick.x = to_stick(value),
            AbsoluteAxisType::ABS_Y => snapshot.drive_stick.y = to_stick(value).saturating_neg(),
            AbsoluteAxisType::ABS_RX => snapshot.heading_stick.x = to_stick(value),
            AbsoluteAxisType::ABS_RY => snapshot.heading_stick.y = to_stick(value).saturating_neg(),

            AbsoluteAxisType::ABS_Z => snapshot.left_trigger = scale_trigger(value, self.trigger_max),
            AbsoluteAxisType::ABS_RZ => snapshot.right_trigger = scale_trigger(value, self.trigger_max),

            AbsoluteAxisType::ABS_HAT0X => {
                snapshot.buttons.set(Buttons::DPAD_LEFT, value < 0);
                snapshot.buttons.set(Buttons::DPAD_RIGHT, value > 0);
            }
            AbsoluteAxisType::ABS_HAT0Y => {
                snapshot.buttons.set(Buttons::DPAD_UP, value < 0);
                snapshot.buttons.set(Buttons::DPAD_DOWN, value > 0);
            }

            _ => {}
        }
    }

    fn process_key_event(&mut self, key: Key, pressed: bool) {
        let button = match key {
            Key::BTN_SOUTH => Buttons::A,
            Key::BTN_EAST => Buttons::B,
            Key::BTN_NORTH => Buttons::X,
            Key::BTN_WEST => Buttons::Y,

            Key::BTN_TL => Buttons::LEFT_SHOULDER,
            Key::BTN_TR => Buttons::RIGHT_SHOULDER,

            Key::BTN_SELECT => Buttons::BACK,
            Key::BTN_START => Buttons::START,

            Key::BTN_THUMBL => Buttons::LEFT_THUMB,
            Key::BTN_THUMBR => Buttons::RIGHT_THUMB,

            Key::BTN_DPAD_UP => Buttons::DPAD_UP,
            Key::BTN_DPAD_DOWN => Buttons::DPAD_DOWN,
            Key::BTN_DPAD_LEFT => Buttons::DPAD_LEFT,
            Key::BTN_DPAD_RIGHT => Buttons::DPAD_RIGHT,

            _ => return,
        };
        self.snapshot.buttons.set(button, pressed);
    }

    /// Releases everything and centers both sticks.
    pub fn reset(&mut self) {
        self.snapshot = DeviceSnapshot::connected();
    }
}

fn to_stick(value: i32) -> i16 {
    value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

fn scale_trigger(value: i32, max: i32) -> u8 {
    (value.clamp(0, max) * 255 / max) as u8
}
