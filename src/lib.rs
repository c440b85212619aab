//! # Rover Pad Library
//!
//! Drive a differential-drive rover from an XInput-class gamepad.
//!
//! Stick deflection is dead-zone filtered, classified into one of twelve
//! angular sectors and turned into short velocity pulses (or relative heading
//! adjustments for the second stick). Pulses are held by a per-source state
//! machine advanced on every tick, then reverted to neutral.

pub mod actuator;
pub mod config;
pub mod controller;
pub mod error;
pub mod telemetry;
pub mod translator;
