//! # Error Types
//!
//! Custom error types for Rover Pad using `thiserror`.

use thiserror::Error;

/// Main error type for Rover Pad
#[derive(Debug, Error)]
pub enum RoverPadError {
    /// Input source reported itself as not connected this tick
    #[error("Controller {0} is not connected")]
    DeviceDisconnected(usize),

    /// Actuator rejected a command or could not be reached
    #[error("Actuator unavailable: {0}")]
    ActuatorUnavailable(String),

    /// Gamepad device errors
    #[error("Controller error: {0}")]
    Controller(String),

    /// No usable gamepad was found
    #[error("No gamepad found")]
    ControllerNotFound,

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate serial ports could be opened
    #[error("Serial port not found (tried: {0})")]
    SerialPortNotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Motion journal serialization errors
    #[error("Journal error: {0}")]
    Journal(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Rover Pad
pub type Result<T> = std::result::Result<T, RoverPadError>;
