//! # Pulse Scheduler
//!
//! Per-source state machine that holds velocity pulses without blocking.
//!
//! ```text
//!            Issue(Drive)                 now >= deadline
//!   Idle ─────────────────▶ PulseActive ─────────────────▶ Idle
//!     ▲  Issue(HeadingAdjust | Stop)          (Revert)
//!     └──────┘
//! ```
//!
//! The translator loads an ordered plan of commands and then asks the
//! scheduler for the next [`PulseStep`] on every tick. Commands from one
//! source are strictly sequential: nothing new is issued while a pulse is
//! active, and a pulse always reverts before the next one starts. When the
//! actuator rejects a velocity command or a revert, the scheduler is left
//! owing a revert ([`PulseScheduler::owe_revert`]) until one succeeds.
//!
//! ```
//! use std::time::Duration;
//! use tokio::time::Instant;
//! use rover_pad::translator::command::MotionCommand;
//! use rover_pad::translator::pulse::{PulseScheduler, PulseStep};
//!
//! let pulse = MotionCommand::Drive { linear: 250, angular: 0, hold_ms: 30 };
//! let mut scheduler = PulseScheduler::new();
//! let start = Instant::now();
//!
//! scheduler.load([pulse]);
//! assert_eq!(scheduler.next_step(start), Some(PulseStep::Issue(pulse)));
//! assert_eq!(scheduler.next_step(start + Duration::from_millis(10)), None);
//! assert_eq!(scheduler.next_step(start + Duration::from_millis(30)), Some(PulseStep::Revert));
//! assert!(scheduler.is_idle());
//! ```

use serde::Serialize;
use std::collections::VecDeque;
use tokio::time::Instant;

use super::command::MotionCommand;

/// What the translator must do next for a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "command", rename_all = "snake_case")]
pub enum PulseStep {
    /// Apply the command to the actuator.
    Issue(MotionCommand),
    /// The active pulse expired, return to neutral velocity.
    Revert,
}

/// Hold state of a source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PulseState {
    /// No pulse in flight.
    #[default]
    Idle,
    /// A velocity pulse is held until `deadline`.
    PulseActive { deadline: Instant },
}

/// Sequences one source's commands.
#[derive(Debug, Default)]
pub struct PulseScheduler {
    state: PulseState,
    pending: VecDeque<MotionCommand>,
}

impl PulseScheduler {
    /// Creates an idle scheduler with nothing pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current hold state.
    #[must_use]
    pub fn state(&self) -> PulseState {
        self.state
    }

    /// `true` when no pulse is active and nothing is pending.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == PulseState::Idle && self.pending.is_empty()
    }

    /// Number of commands waiting behind the active pulse.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Appends commands to the plan.
    pub fn load(&mut self, plan: impl IntoIterator<Item = MotionCommand>) {
        self.pending.extend(plan);
    }

    /// Produces the next step that is due at `now`.
    ///
    /// Call repeatedly until it returns `None`.
    pub fn next_step(&mut self, now: Instant) -> Option<PulseStep> {
        match self.state {
            PulseState::PulseActive { .. } => self.next_revert(now),
            PulseState::Idle => {
                let command = self.pending.pop_front()?;
                if let Some(hold) = command.hold() {
                    self.state = PulseState::PulseActive {
                        deadline: now + hold,
                    };
                }
                Some(PulseStep::Issue(command))
            }
        }
    }

    /// Like [`PulseScheduler::next_step`], but never issues.
    ///
    /// Used while another source holds the actuator: an expired pulse still
    /// reverts, queued commands stay queued.
    pub fn next_revert(&mut self, now: Instant) -> Option<PulseStep> {
        match self.state {
            PulseState::PulseActive { deadline } if now >= deadline => {
                self.state = PulseState::Idle;
                Some(PulseStep::Revert)
            }
            _ => None,
        }
    }

    /// Drops the pending plan and leaves a revert due at `now`.
    ///
    /// For a velocity command or a revert that failed part way: the actuator
    /// may still be moving, so the source keeps owing a neutral command until
    /// one gets through.
    pub fn owe_revert(&mut self, now: Instant) {
        self.pending.clear();
        self.state = PulseState::PulseActive { deadline: now };
    }

    /// Drops the pending plan but lets an active pulse run out.
    pub fn discard_pending(&mut self) {
        self.pending.clear();
    }

    /// Drops the active pulse and the pending plan.
    ///
    /// Returns `true` if a pulse was in flight.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.state != PulseState::Idle;
        self.state = PulseState::Idle;
        self.pending.clear();
        was_active
    }
}
