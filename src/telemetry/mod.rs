//! # Telemetry Module
//!
//! Journal of the motion commands sent to the rover.
//!
//! This module handles:
//! - Formatting dispatched steps as JSONL (JSON Lines)
//! - Writing to rotating log files
//! - Managing file rotation (max N records per file)
//! - Retaining only last M files

pub mod logger;

pub use logger::MotionLogger;
