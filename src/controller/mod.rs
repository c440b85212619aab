//! # Controller Module
//!
//! Gamepad input handling.
//!
//! This module handles:
//! - Gamepad detection and connection via evdev ([`gamepad`])
//! - Folding raw events into XInput-style snapshots ([`mapper`])
//! - The snapshot type the translator consumes ([`state`])

pub mod gamepad;
pub mod mapper;
pub mod state;

use tokio::sync::watch;

use state::DeviceSnapshot;

/// Latest snapshot of every polled pad, indexed by source.
pub fn sample(pads: &[watch::Receiver<DeviceSnapshot>]) -> Vec<DeviceSnapshot> {
    pads.iter().map(|pad| *pad.borrow()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_reads_latest_values() {
        let (tx0, rx0) = watch::channel(DeviceSnapshot::connected());
        let (_tx1, rx1) = watch::channel(DeviceSnapshot::default());

        let mut pressed = DeviceSnapshot::connected();
        pressed.left_trigger = 42;
        tx0.send_replace(pressed);

        let snapshots = sample(&[rx0, rx1]);
        assert_eq!(snapshots, vec![pressed, DeviceSnapshot::default()]);
    }

    #[test]
    fn test_sample_after_poller_gone() {
        let (tx, rx) = watch::channel(DeviceSnapshot::connected());
        tx.send_replace(DeviceSnapshot::default());
        drop(tx);

        // The last published value stays readable
        assert!(!sample(&[rx])[0].connected);
    }
}
