//! # Input State Tracker
//!
//! Keeps the last rendered status text of every source and decides when the
//! display has to be refreshed.
//!
//! The comparison is plain string equality: any change in the rendered text,
//! even a trigger moving from 12 to 13, requests a refresh. Identical text
//! never does, so the display only redraws on observable change no matter how
//! fast the translator ticks.

use crate::controller::state::DeviceSnapshot;

/// Maximum number of gamepads handled at once.
pub const MAX_SOURCES: usize = 4;

/// Last rendered status text per source.
#[derive(Debug, Default, Clone)]
pub struct InputStateTracker {
    messages: [String; MAX_SOURCES],
}

impl InputStateTracker {
    /// Creates a tracker with empty messages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `text` for `source` if it differs from the previous text.
    ///
    /// Returns `true` when the display needs a refresh. Out-of-range sources
    /// are ignored.
    ///
    /// ```
    /// use rover_pad::translator::tracker::InputStateTracker;
    ///
    /// let mut tracker = InputStateTracker::new();
    /// assert!(tracker.update(0, "Controller 0: Not connected".to_string()));
    /// assert!(!tracker.update(0, "Controller 0: Not connected".to_string()));
    /// ```
    pub fn update(&mut self, source: usize, text: String) -> bool {
        match self.messages.get_mut(source) {
            Some(current) if *current != text => {
                *current = text;
                true
            }
            _ => false,
        }
    }

    /// Last stored text for `source`.
    #[must_use]
    pub fn message(&self, source: usize) -> Option<&str> {
        self.messages.get(source).map(String::as_str)
    }

    /// All stored texts, indexed by source.
    #[must_use]
    pub fn messages(&self) -> &[String; MAX_SOURCES] {
        &self.messages
    }
}

/// Renders the status block of one source.
///
/// Stick values are shown after the dead zone has been applied.
#[must_use]
pub fn format_status(source: usize, snapshot: &DeviceSnapshot) -> String {
    if !snapshot.connected {
        return format!("Controller {}: Not connected", source);
    }

    let pressed: String = snapshot.buttons.names().map(|name| format!("{} ", name)).collect();

    format!(
        "Controller {}: Connected\n  Pressed Buttons: {}\n  Left Trigger: {}\n  Right Trigger: {}\n  Left Thumbstick: {}/{}\n  Right Thumbstick: {}/{}",
        source,
        pressed,
        snapshot.left_trigger,
        snapshot.right_trigger,
        snapshot.drive_stick.x,
        snapshot.drive_stick.y,
        snapshot.heading_stick.x,
        snapshot.heading_stick.y,
    )
}
