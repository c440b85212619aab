//! # Serial Actuator
//!
//! Drives an ARCOS controller over a serial link.
//!
//! The controller session (SYNC0..SYNC2 and OPEN) is expected to be
//! established already; this backend only sends motion commands.

use async_trait::async_trait;
use std::io;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use super::arcos::{command, encode_command, encode_int_command};
use super::Actuator;
use crate::error::{Result, RoverPadError};

/// Baud rates accepted by ARCOS controllers.
pub const SUPPORTED_BAUD_RATES: [u32; 5] = [9600, 19200, 38400, 57600, 115_200];

/// Default ARCOS baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Trait for serial port I/O operations
#[async_trait]
pub trait SerialPortIO: Send {
    /// Write all data to the port
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush the output buffer
    async fn flush(&mut self) -> io::Result<()>;
}

/// Wrapper around `tokio_serial::SerialStream` that implements [`SerialPortIO`]
pub struct TokioSerialPort {
    port: tokio_serial::SerialStream,
}

impl TokioSerialPort {
    pub fn new(port: tokio_serial::SerialStream) -> Self {
        Self { port }
    }
}

#[async_trait]
impl SerialPortIO for TokioSerialPort {
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;
        self.port.write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;
        self.port.flush().await
    }
}

/// ARCOS motion backend.
pub struct SerialActuator<P> {
    port: P,
    device_path: String,
}

impl<P> std::fmt::Debug for SerialActuator<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialActuator")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl SerialActuator<TokioSerialPort> {
    /// Opens `path` at `baud_rate`, 8N1, no flow control.
    ///
    /// # Errors
    ///
    /// Returns `Serial` if the port cannot be opened.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rover_pad::actuator::serial::SerialActuator;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let mut actuator = SerialActuator::open("/dev/ttyUSB0", 9600)?;
    ///     actuator.enable_motors().await?;
    ///     Ok(())
    /// }
    /// ```
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| RoverPadError::Serial(format!("Failed to open {}: {}", path, e)))?;

        info!("Opened ARCOS link at {} ({} baud)", path, baud_rate);
        Ok(Self::with_port(TokioSerialPort::new(port), path))
    }

    /// Tries each path in order and keeps the first one that opens.
    ///
    /// # Errors
    ///
    /// Returns `SerialPortNotFound` listing every path tried.
    pub fn open_first(paths: &[String], baud_rate: u32) -> Result<Self> {
        for path in paths {
            match Self::open(path, baud_rate) {
                Ok(actuator) => return Ok(actuator),
                Err(e) => warn!("{}", e),
            }
        }

        Err(RoverPadError::SerialPortNotFound(paths.join(", ")))
    }
}

impl<P: SerialPortIO> SerialActuator<P> {
    /// Wraps an already opened port.
    pub fn with_port(port: P, device_path: impl Into<String>) -> Self {
        Self {
            port,
            device_path: device_path.into(),
        }
    }

    /// Path of the serial device.
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Enables the drive motors.
    ///
    /// # Errors
    ///
    /// Returns `ActuatorUnavailable` if the write fails.
    pub async fn enable_motors(&mut self) -> Result<()> {
        self.send(&encode_int_command(command::ENABLE, 1)).await
    }

    async fn send(&mut self, packet: &[u8]) -> Result<()> {
        self.port
            .write_all(packet)
            .await
            .map_err(|e| RoverPadError::ActuatorUnavailable(format!("write failed: {}", e)))?;

        self.port
            .flush()
            .await
            .map_err(|e| RoverPadError::ActuatorUnavailable(format!("flush failed: {}", e)))?;

        debug!("Sent ARCOS packet {:02X?}", packet);
        Ok(())
    }
}

#[async_trait]
impl<P: SerialPortIO> Actuator for SerialActuator<P> {
    async fn set_linear(&mut self, velocity: i32) -> Result<()> {
        self.send(&encode_int_command(command::VEL, velocity)).await
    }

    async fn set_angular(&mut self, velocity: i32) -> Result<()> {
        self.send(&encode_int_command(command::RVEL, velocity)).await
    }

    async fn set_heading_delta(&mut self, degrees: i32) -> Result<()> {
        self.send(&encode_int_command(command::DHEAD, degrees)).await
    }

    /// One STOP packet instead of two zero velocities.
    async fn halt(&mut self) -> Result<()> {
        self.send(&encode_command(command::STOP)).await
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock serial port for testing
    #[derive(Clone, Default)]
    pub struct MockSerialPort {
        pub written_data: Arc<Mutex<Vec<Vec<u8>>>>,
        pub write_error: Arc<Mutex<Option<io::ErrorKind>>>,
        pub flush_error: Arc<Mutex<Option<io::ErrorKind>>>,
    }

    impl MockSerialPort {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get_written_data(&self) -> Vec<Vec<u8>> {
            self.written_data.lock().unwrap().clone()
        }

        pub fn set_write_error(&self, error: io::ErrorKind) {
            *self.write_error.lock().unwrap() = Some(error);
        }

        pub fn set_flush_error(&self, error: io::ErrorKind) {
            *self.flush_error.lock().unwrap() = Some(error);
        }
    }

    #[async_trait]
    impl SerialPortIO for MockSerialPort {
        async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
            if let Some(error) = *self.write_error.lock().unwrap() {
                return Err(io::Error::new(error, "Mock write error"));
            }
            self.written_data.lock().unwrap().push(data.to_vec());
            Ok(())
        }

        async fn flush(&mut self) -> io::Result<()> {
            if let Some(error) = *self.flush_error.lock().unwrap() {
                return Err(io::Error::new(error, "Mock flush error"));
            }
            Ok(())
        }
    }
}
