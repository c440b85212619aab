//! # Actuator Module
//!
//! Everything that moves the rover.
//!
//! This module handles:
//! - The [`Actuator`] trait implemented by every backend
//! - Exclusive, scoped access through [`ActuatorGateway`]
//! - A dry-run backend that only logs ([`TracingActuator`])
//! - ARCOS command packets over a serial link ([`arcos`], [`serial`])

pub mod arcos;
pub mod serial;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::Result;
use crate::translator::command::MotionCommand;

/// Velocity and heading sink of the rover.
///
/// Calls are assumed to take effect immediately. Exclusive access is provided
/// by the gateway's mutex, implementations need no locking of their own.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Actuator: Send {
    /// Sets the translational velocity (positive = forward).
    async fn set_linear(&mut self, velocity: i32) -> Result<()>;

    /// Sets the rotational velocity (positive = counter-clockwise).
    async fn set_angular(&mut self, velocity: i32) -> Result<()>;

    /// Turns by `degrees` relative to the current heading.
    async fn set_heading_delta(&mut self, degrees: i32) -> Result<()>;

    /// Brings the rover to a standstill.
    ///
    /// Defaults to zeroing both velocities. Backends with a native stop
    /// command override it.
    async fn halt(&mut self) -> Result<()> {
        self.set_linear(0).await?;
        self.set_angular(0).await
    }
}

/// Serializes access to a shared actuator.
///
/// Every call takes the lock for the duration of one command only; the guard
/// is released on every exit path, including errors. Cloning the gateway
/// shares the same actuator.
pub struct ActuatorGateway<A> {
    actuator: Arc<Mutex<A>>,
}

impl<A> Clone for ActuatorGateway<A> {
    fn clone(&self) -> Self {
        Self {
            actuator: Arc::clone(&self.actuator),
        }
    }
}

impl<A: Actuator> ActuatorGateway<A> {
    /// Wraps an actuator.
    pub fn new(actuator: A) -> Self {
        Self {
            actuator: Arc::new(Mutex::new(actuator)),
        }
    }

    /// Applies a command.
    ///
    /// `Drive` sets both velocities, `Stop` zeroes them and `HeadingAdjust`
    /// forwards the delta. Holding and reverting pulses is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns `ActuatorUnavailable` if the backend rejects the command.
    pub async fn issue(&self, command: MotionCommand) -> Result<()> {
        let mut actuator = self.actuator.lock().await;

        match command {
            MotionCommand::Drive {
                linear, angular, ..
            } => {
                actuator.set_linear(linear).await?;
                actuator.set_angular(angular).await?;
            }
            MotionCommand::HeadingAdjust { delta_degrees } => {
                actuator.set_heading_delta(delta_degrees).await?;
            }
            MotionCommand::Stop => actuator.halt().await?,
        }

        debug!("Issued {:?}", command);
        Ok(())
    }

    /// Returns both velocities to neutral.
    ///
    /// # Errors
    ///
    /// Returns `ActuatorUnavailable` if the backend rejects the command.
    pub async fn revert(&self) -> Result<()> {
        let mut actuator = self.actuator.lock().await;
        actuator.set_linear(0).await?;
        actuator.set_angular(0).await?;
        Ok(())
    }

}

/// Dry-run backend that keeps the commanded state and logs every change.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TracingActuator {
    linear: i32,
    angular: i32,
    heading_offset: i32,
}

impl TracingActuator {
    /// Creates a stationary actuator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last commanded translational velocity.
    #[must_use]
    pub fn linear(&self) -> i32 {
        self.linear
    }

    /// Last commanded rotational velocity.
    #[must_use]
    pub fn angular(&self) -> i32 {
        self.angular
    }

    /// Sum of all heading deltas, normalized to (-180, 180].
    #[must_use]
    pub fn heading_offset(&self) -> i32 {
        self.heading_offset
    }
}

#[async_trait]
impl Actuator for TracingActuator {
    async fn set_linear(&mut self, velocity: i32) -> Result<()> {
        if velocity != self.linear {
            info!("[dry-run] linear velocity {} -> {}", self.linear, velocity);
            self.linear = velocity;
        }
        Ok(())
    }

    async fn set_angular(&mut self, velocity: i32) -> Result<()> {
        if velocity != self.angular {
            info!("[dry-run] angular velocity {} -> {}", self.angular, velocity);
            self.angular = velocity;
        }
        Ok(())
    }

    async fn set_heading_delta(&mut self, degrees: i32) -> Result<()> {
        let mut heading = (self.heading_offset + degrees).rem_euclid(360);
        if heading > 180 {
            heading -= 360;
        }
        debug!("[dry-run] heading delta {} (offset now {})", degrees, heading);
        self.heading_offset = heading;
        Ok(())
    }
}
