//! # Gamepad Module
//!
//! Detection, connection and polling of XInput-class pads through the Linux
//! evdev interface.
//!
//! ## Controller Detection
//!
//! A device counts as a gamepad when it exposes:
//! - `BTN_SOUTH` (A) and `BTN_START`
//! - `ABS_RX` (a second analog stick)
//!
//! Keyboards and mice never have all three, which is enough to tell pads
//! apart without a vendor whitelist.

use evdev::{AbsoluteAxisType, Device, Key};
use std::path::Path;
use std::thread::JoinHandle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::mapper::EventMapper;
use super::state::DeviceSnapshot;
use crate::error::{Result, RoverPadError};

/// Gamepad handle
pub struct Gamepad {
    device: Device,
    device_path: String,
}

impl std::fmt::Debug for Gamepad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gamepad")
            .field("device_path", &self.device_path)
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// Returns `true` if the device looks like an XInput-class pad.
fn is_gamepad(device: &Device) -> bool {
    let keys = device
        .supported_keys()
        .is_some_and(|keys| keys.contains(Key::BTN_SOUTH) && keys.contains(Key::BTN_START));
    let axes = device
        .supported_absolute_axes()
        .is_some_and(|axes| axes.contains(AbsoluteAxisType::ABS_RX));
    keys && axes
}

impl Gamepad {
    /// Open a specific evdev device
    ///
    /// # Errors
    ///
    /// - `Controller`: the device cannot be opened or is not a gamepad
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let device = Device::open(path)
            .map_err(|e| RoverPadError::Controller(format!("Failed to open {}: {}", path.display(), e)))?;

        if !is_gamepad(&device) {
            return Err(RoverPadError::Controller(format!(
                "{} is not a gamepad",
                path.display()
            )));
        }

        let device_path = path.to_string_lossy().to_string();
        info!("Opened gamepad {:?} at {}", device.name().unwrap_or("unknown"), device_path);
        Ok(Self {
            device,
            device_path,
        })
    }

    /// Open every configured path, in order
    ///
    /// # Errors
    ///
    /// Fails on the first path that cannot be opened.
    pub fn open_paths(paths: &[String]) -> Result<Vec<Self>> {
        paths.iter().map(Self::open).collect()
    }

    /// Detect up to `max` gamepads
    ///
    /// Scans all `/dev/input/event*` devices in name order, so the same
    /// hardware gets the same source numbers across runs.
    ///
    /// # Errors
    ///
    /// - `ControllerNotFound`: no gamepad found on the system
    /// - `Controller`: `/dev/input` cannot be read
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rover_pad::controller::gamepad::Gamepad;
    ///
    /// let pads = Gamepad::discover(4)?;
    /// for pad in &pads {
    ///     println!("Found {}", pad.device_path());
    /// }
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn discover(max: usize) -> Result<Vec<Self>> {
        Self::discover_in(Path::new("/dev/input"), max)
    }

    fn discover_in(input_dir: &Path, max: usize) -> Result<Vec<Self>> {
        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| RoverPadError::Controller(format!("Failed to read {}: {}", input_dir.display(), e)))?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| {
                path.file_name()
                    .is_some_and(|name| name.to_string_lossy().starts_with("event"))
            })
            .collect();
        entries.sort();

        let mut pads = Vec::new();
        for path in entries {
            if pads.len() == max {
                break;
            }

            match Device::open(&path) {
                Ok(device) if is_gamepad(&device) => {
                    let device_path = path.to_string_lossy().to_string();
                    info!("Found gamepad {:?} at {}", device.name().unwrap_or("unknown"), device_path);
                    pads.push(Self {
                        device,
                        device_path,
                    });
                }
                Ok(_) => debug!("Skipping {}: not a gamepad", path.display()),
                Err(e) => debug!("Could not open {}: {}", path.display(), e),
            }
        }

        if pads.is_empty() {
            return Err(RoverPadError::ControllerNotFound);
        }
        Ok(pads)
    }

    /// Get the device path of this gamepad
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Human-readable device name
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Fetch events from the gamepad
    ///
    /// Blocks until at least one event is available.
    ///
    /// # Errors
    ///
    /// Returns `Controller` if the read fails (e.g., pad unplugged).
    pub fn fetch_events(&mut self) -> Result<impl Iterator<Item = evdev::InputEvent> + '_> {
        self.device
            .fetch_events()
            .map_err(|e| RoverPadError::Controller(format!("Failed to fetch events: {}", e)))
    }

    /// Move the pad onto a reader thread
    ///
    /// The returned receiver always holds the latest snapshot. When the read
    /// fails the thread publishes a disconnected snapshot and exits; it also
    /// exits once every receiver is gone.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the thread cannot be spawned.
    pub fn spawn_poller(
        mut self,
        source: usize,
        trigger_max: i32,
    ) -> Result<(watch::Receiver<DeviceSnapshot>, JoinHandle<()>)> {
        let mut mapper = EventMapper::new(trigger_max);
        let (tx, rx) = watch::channel(mapper.snapshot());
        let device_path = self.device_path.clone();

        let handle = std::thread::Builder::new()
            .name(format!("pad-{}", source))
            .spawn(move || loop {
                match self.fetch_events() {
                    Ok(events) => {
                        for event in events {
                            mapper.process_event(&event);
                        }
                        if tx.send(mapper.snapshot()).is_err() {
                            debug!("Controller {}: no more readers", source);
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Controller {} ({}): {}", source, device_path, e);
                        tx.send_replace(DeviceSnapshot::default());
                        break;
                    }
                }
            })?;

        Ok((rx, handle))
    }
}
