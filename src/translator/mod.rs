//! # Translator Module
//!
//! Turns gamepad snapshots into motion commands.
//!
//! This module handles:
//! - Joint dead zone on both sticks ([`deadzone`])
//! - Classifying a stick vector into one of 12 sectors ([`sector`])
//! - Sector, d-pad, trigger and start button to command lookup ([`command`])
//! - Holding velocity pulses without blocking ([`pulse`])
//! - Status text diffing for the display ([`tracker`])
//! - The per-tick loop over all sources ([`engine`])

pub mod command;
pub mod deadzone;
pub mod engine;
pub mod pulse;
pub mod sector;
pub mod tracker;

pub use engine::{Dispatch, TickReport, Translator, TranslatorConfig, TranslatorState};
