//! # Translator Loop
//!
//! One tick over every gamepad: filter, report status, plan commands and
//! advance each source's [`PulseScheduler`].
//!
//! ## Per-source order
//!
//! 1. Dead zone on both sticks, status text through the tracker
//! 2. Disconnected: drop the plan, let an active pulse revert, report it
//! 3. Start held: panic stop, nothing else for this source
//! 4. Otherwise advance the scheduler and, once idle, load the next plan:
//!    trigger, then d-pad or drive stick, then heading stick (assist only)
//!
//! A failure on one source is logged and ends that source's tick. The other
//! sources are still processed.
//!
//! ## One pulse at a time
//!
//! All sources share one actuator. While any source holds a pulse (or owes a
//! revert), the others issue nothing and keep their plan queued. When the
//! actuator frees up, queued sources take turns in round-robin order after the
//! last holder, so a held stick cannot starve the other pads. Panic stop is
//! the only command that bypasses the turn order.

use serde::Serialize;
use tokio::time::Instant;
use tracing::{trace, warn};

use super::command::{command_for, dpad_command, start_command, trigger_command, MotionCommand, StickRole};
use super::deadzone::{DeadzoneFilter, DEFAULT_DEADZONE_THRESHOLD};
use super::pulse::{PulseScheduler, PulseState, PulseStep};
use super::sector::classify;
use super::tracker::{format_status, InputStateTracker, MAX_SOURCES};
use crate::actuator::{Actuator, ActuatorGateway};
use crate::config::TranslatorSettings;
use crate::controller::state::DeviceSnapshot;
use crate::error::{Result, RoverPadError};

/// Runtime switches, read at the start of every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslatorConfig {
    pub deadzone_enabled: bool,
    pub deadzone_threshold: i32,
    pub heading_assist_enabled: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            deadzone_enabled: true,
            deadzone_threshold: DEFAULT_DEADZONE_THRESHOLD,
            heading_assist_enabled: false,
        }
    }
}

impl From<&TranslatorSettings> for TranslatorConfig {
    fn from(settings: &TranslatorSettings) -> Self {
        Self {
            deadzone_enabled: settings.deadzone_enabled,
            deadzone_threshold: settings.deadzone_threshold,
            heading_assist_enabled: settings.heading_assist_enabled,
        }
    }
}

impl TranslatorConfig {
    /// The dead zone currently in effect.
    #[must_use]
    pub fn deadzone(&self) -> DeadzoneFilter {
        if self.deadzone_enabled {
            DeadzoneFilter::new(self.deadzone_threshold)
        } else {
            DeadzoneFilter::disabled()
        }
    }

    /// Applies the dead zone to both sticks of a snapshot.
    #[must_use]
    pub fn filter(&self, snapshot: &DeviceSnapshot) -> DeviceSnapshot {
        let deadzone = self.deadzone();
        DeviceSnapshot {
            drive_stick: deadzone.apply(snapshot.drive_stick),
            heading_stick: deadzone.apply(snapshot.heading_stick),
            ..*snapshot
        }
    }

    /// Flips the dead zone, returns the new setting.
    pub fn toggle_deadzone(&mut self) -> bool {
        self.deadzone_enabled = !self.deadzone_enabled;
        self.deadzone_enabled
    }

    /// Flips heading assist, returns the new setting.
    pub fn toggle_heading_assist(&mut self) -> bool {
        self.heading_assist_enabled = !self.heading_assist_enabled;
        self.heading_assist_enabled
    }
}

/// Everything the translator remembers between ticks.
#[derive(Debug, Default)]
pub struct TranslatorState {
    pub config: TranslatorConfig,
    schedulers: [PulseScheduler; MAX_SOURCES],
    tracker: InputStateTracker,
    last_holder: Option<usize>,
}

impl TranslatorState {
    /// Fresh state: all sources idle, no status text yet.
    #[must_use]
    pub fn new(config: TranslatorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Scheduler of `source`, `None` when out of range.
    #[must_use]
    pub fn scheduler(&self, source: usize) -> Option<&PulseScheduler> {
        self.schedulers.get(source)
    }

    /// Last status text of every source.
    #[must_use]
    pub fn tracker(&self) -> &InputStateTracker {
        &self.tracker
    }

    /// Source whose pulse currently holds the actuator.
    #[must_use]
    pub fn holder(&self) -> Option<usize> {
        (0..MAX_SOURCES).find(|&source| self.is_holding(source))
    }

    fn is_holding(&self, source: usize) -> bool {
        matches!(self.schedulers[source].state(), PulseState::PulseActive { .. })
    }

    fn is_waiting(&self, source: usize) -> bool {
        let scheduler = &self.schedulers[source];
        scheduler.state() == PulseState::Idle && scheduler.pending() > 0
    }

    /// Whether `source` may issue its next command now.
    ///
    /// Nobody else may hold the actuator, and no other queued source may come
    /// earlier in the turn order that starts after the last holder.
    fn may_issue(&self, source: usize) -> bool {
        if (0..MAX_SOURCES).any(|other| other != source && self.is_holding(other)) {
            return false;
        }

        let start = self.last_holder.map_or(0, |holder| holder + 1);
        for offset in 0..MAX_SOURCES {
            let candidate = (start + offset) % MAX_SOURCES;
            if candidate == source {
                return true;
            }
            if self.is_waiting(candidate) {
                return false;
            }
        }
        true
    }
}

/// One step applied to the actuator on behalf of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dispatch {
    pub source: usize,
    #[serde(flatten)]
    pub step: PulseStep,
}

/// Outcome of a tick.
#[derive(Debug, Default)]
pub struct TickReport {
    /// At least one status text changed.
    pub refresh: bool,
    /// Steps applied, in order.
    pub dispatched: Vec<Dispatch>,
    /// Per-source problems (disconnected pads, actuator failures).
    pub failures: Vec<(usize, RoverPadError)>,
}

impl TickReport {
    /// Commands issued (reverts excluded), in order.
    pub fn issued(&self) -> impl Iterator<Item = (usize, MotionCommand)> + '_ {
        self.dispatched.iter().filter_map(|d| match d.step {
            PulseStep::Issue(command) => Some((d.source, command)),
            PulseStep::Revert => None,
        })
    }
}

/// Builds the ordered plan for an idle, connected source.
///
/// The d-pad suppresses the drive stick; the heading stick is only read with
/// heading assist on.
#[must_use]
pub fn plan(snapshot: &DeviceSnapshot, heading_assist: bool) -> Vec<MotionCommand> {
    let trigger = trigger_command(snapshot.left_trigger, snapshot.right_trigger);
    let steer = dpad_command(snapshot.buttons)
        .or_else(|| command_for(classify(snapshot.drive_stick), StickRole::Drive));
    let heading = heading_assist
        .then(|| command_for(classify(snapshot.heading_stick), StickRole::Heading))
        .flatten();

    [trigger, steer, heading].into_iter().flatten().collect()
}

/// Drives the actuator from gamepad snapshots.
pub struct Translator<A> {
    gateway: ActuatorGateway<A>,
}

impl<A: Actuator> Translator<A> {
    pub fn new(gateway: ActuatorGateway<A>) -> Self {
        Self { gateway }
    }

    /// The shared actuator handle.
    pub fn gateway(&self) -> &ActuatorGateway<A> {
        &self.gateway
    }

    /// Processes one tick.
    ///
    /// `snapshots[i]` is source `i`; missing entries count as disconnected.
    /// `now` is the tick time every pulse deadline is measured against.
    pub async fn tick(
        &self,
        state: &mut TranslatorState,
        snapshots: &[DeviceSnapshot],
        now: Instant,
    ) -> TickReport {
        let config = state.config;
        let mut report = TickReport::default();

        for source in 0..MAX_SOURCES {
            let raw = snapshots.get(source).copied().unwrap_or_default();
            let snapshot = config.filter(&raw);

            if state.tracker.update(source, format_status(source, &snapshot)) {
                report.refresh = true;
            }

            if let Err(e) = self.drive_source(source, state, &snapshot, config, now, &mut report).await {
                match e {
                    RoverPadError::DeviceDisconnected(_) => trace!("{}", e),
                    _ => warn!("Controller {}: {}", source, e),
                }
                report.failures.push((source, e));
            }
        }

        report
    }

    async fn drive_source(
        &self,
        source: usize,
        state: &mut TranslatorState,
        snapshot: &DeviceSnapshot,
        config: TranslatorConfig,
        now: Instant,
        report: &mut TickReport,
    ) -> Result<()> {
        if !snapshot.connected {
            state.schedulers[source].discard_pending();
            self.advance(source, state, now, report).await?;
            return Err(RoverPadError::DeviceDisconnected(source));
        }

        if let Some(stop) = start_command(snapshot.buttons) {
            state.schedulers[source].cancel();
            if let Err(e) = self.gateway.issue(stop).await {
                state.schedulers[source].owe_revert(now);
                return Err(e);
            }
            report.dispatched.push(Dispatch {
                source,
                step: PulseStep::Issue(stop),
            });
            return Ok(());
        }

        self.advance(source, state, now, report).await?;
        if state.schedulers[source].is_idle() {
            state.schedulers[source].load(plan(snapshot, config.heading_assist_enabled));
            self.advance(source, state, now, report).await?;
        }

        Ok(())
    }

    /// Applies every step that is due and allowed.
    ///
    /// A failed heading adjustment resets the source. A failed velocity
    /// command or revert leaves a revert owed, retried on the next tick.
    async fn advance(
        &self,
        source: usize,
        state: &mut TranslatorState,
        now: Instant,
        report: &mut TickReport,
    ) -> Result<()> {
        loop {
            let may_issue = state.may_issue(source);
            let scheduler = &mut state.schedulers[source];
            let next = if may_issue {
                scheduler.next_step(now)
            } else {
                scheduler.next_revert(now)
            };
            let Some(step) = next else {
                return Ok(());
            };

            let applied = match step {
                PulseStep::Issue(command) => self.gateway.issue(command).await,
                PulseStep::Revert => self.gateway.revert().await,
            };

            if let Err(e) = applied {
                match step {
                    PulseStep::Issue(MotionCommand::HeadingAdjust { .. }) => {
                        state.schedulers[source].cancel();
                    }
                    _ => state.schedulers[source].owe_revert(now),
                }
                return Err(e);
            }

            if let PulseStep::Issue(command) = step {
                if command.hold().is_some() {
                    state.last_holder = Some(source);
                }
            }
            report.dispatched.push(Dispatch { source, step });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::mocks::{ActuatorCall, RecordingActuator};
    use crate::controller::state::Buttons;
    use crate::actuator::MockActuator;
    use crate::translator::deadzone::StickVector;
    use mockall::predicate::eq;
    use mockall::Sequence;
    use std::time::Duration;

    fn setup(config: TranslatorConfig) -> (Translator<RecordingActuator>, TranslatorState, RecordingActuator) {
        let recorder = RecordingActuator::new();
        let translator = Translator::new(ActuatorGateway::new(recorder.clone()));
        (translator, TranslatorState::new(config), recorder)
    }

    fn pad_with_stick(x: i16, y: i16) -> DeviceSnapshot {
        DeviceSnapshot {
            drive_stick: StickVector::new(x, y),
            ..DeviceSnapshot::connected()
        }
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn issued(report: &TickReport) -> Vec<(usize, MotionCommand)> {
        report.issued().collect()
    }

    const fn drive(linear: i32, angular: i32, hold_ms: u32) -> MotionCommand {
        MotionCommand::Drive {
            linear,
            angular,
            hold_ms,
        }
    }

    #[test]
    fn test_plan_order_and_suppression() {
        let snapshot = DeviceSnapshot {
            left_trigger: 1,
            buttons: Buttons::DPAD_DOWN,
            drive_stick: StickVector::new(30000, 0),
            heading_stick: StickVector::new(0, 30000),
            ..DeviceSnapshot::connected()
        };

        assert_eq!(
            plan(&snapshot, true),
            vec![
                drive(0, 550, 18),
                drive(-250, 0, 12),
                MotionCommand::HeadingAdjust { delta_degrees: 0 },
            ],
            "d-pad should replace the drive stick"
        );
        assert_eq!(plan(&snapshot, false).len(), 2);
        assert!(plan(&DeviceSnapshot::connected(), true).is_empty());
    }

    #[test]
    fn test_config_toggles() {
        let mut config = TranslatorConfig::default();
        assert!(!config.toggle_deadzone());
        assert_eq!(config.deadzone(), DeadzoneFilter::disabled());
        assert!(config.toggle_deadzone());
        assert!(config.toggle_heading_assist());
        assert!(!config.toggle_heading_assist());
    }

    #[test]
    fn test_config_from_settings() {
        let settings = TranslatorSettings {
            deadzone_enabled: false,
            deadzone_threshold: 1000,
            heading_assist_enabled: true,
            tick_interval_ms: 10,
        };
        let config = TranslatorConfig::from(&settings);
        assert!(!config.deadzone_enabled);
        assert_eq!(config.deadzone_threshold, 1000);
        assert!(config.heading_assist_enabled);
    }

    #[tokio::test]
    async fn test_right_edge_is_turn_dominant_pulse() {
        let (translator, mut state, recorder) = setup(TranslatorConfig::default());
        let start = Instant::now();

        let report = translator.tick(&mut state, &[pad_with_stick(30000, 0)], start).await;
        assert_eq!(issued(&report), vec![(0, drive(30, -250, 18))]);
        assert_eq!(
            recorder.take_calls(),
            vec![ActuatorCall::Linear(30), ActuatorCall::Angular(-250)]
        );
        assert_eq!(
            state.scheduler(0).map(PulseScheduler::state),
            Some(PulseState::PulseActive { deadline: start + ms(18) })
        );
    }

    #[tokio::test]
    async fn test_pulse_reverts_on_first_tick_past_hold() {
        let (translator, mut state, recorder) = setup(TranslatorConfig::default());
        let start = Instant::now();
        let stick = [pad_with_stick(0, 30000)];

        // Q2Low, straight ahead, held 30 ms
        translator.tick(&mut state, &stick, start).await;
        recorder.take_calls();

        for t in [10, 20, 29] {
            let report = translator.tick(&mut state, &stick, start + ms(t)).await;
            assert!(report.dispatched.is_empty(), "nothing may happen at {} ms", t);
        }

        let released = [DeviceSnapshot::connected()];
        let report = translator.tick(&mut state, &released, start + ms(30)).await;
        assert_eq!(report.dispatched, vec![Dispatch { source: 0, step: PulseStep::Revert }]);
        assert_eq!(recorder.velocity(), (0, 0));
        assert!(state.scheduler(0).is_some_and(PulseScheduler::is_idle));
    }

    #[tokio::test]
    async fn test_held_stick_repeats_after_revert() {
        let (translator, mut state, _recorder) = setup(TranslatorConfig::default());
        let start = Instant::now();
        let stick = [pad_with_stick(-20000, -20000)];

        translator.tick(&mut state, &stick, start).await;
        let report = translator.tick(&mut state, &stick, start + ms(20)).await;

        assert_eq!(
            report.dispatched,
            vec![
                Dispatch { source: 0, step: PulseStep::Revert },
                Dispatch { source: 0, step: PulseStep::Issue(drive(-230, -100, 18)) },
            ],
            "revert must come before the next pulse"
        );
    }

    #[tokio::test]
    async fn test_deadzone_swallows_small_deflection() {
        let (translator, mut state, recorder) = setup(TranslatorConfig::default());
        let report = translator
            .tick(&mut state, &[pad_with_stick(5000, 5000)], Instant::now())
            .await;

        assert!(report.dispatched.is_empty());
        assert!(recorder.calls().is_empty());
        let status = state.tracker().message(0).unwrap_or_default();
        assert!(status.contains("Left Thumbstick: 0/0"), "status shows filtered stick");
    }

    #[tokio::test]
    async fn test_deadzone_disabled_passes_small_deflection() {
        let mut config = TranslatorConfig::default();
        config.toggle_deadzone();
        let (translator, mut state, _recorder) = setup(config);

        let report = translator
            .tick(&mut state, &[pad_with_stick(5000, 5000)], Instant::now())
            .await;
        assert_eq!(issued(&report), vec![(0, drive(230, -100, 18))]);
    }

    #[tokio::test]
    async fn test_left_trigger_spin_then_revert() {
        let (translator, mut state, recorder) = setup(TranslatorConfig::default());
        let start = Instant::now();
        let pulled = DeviceSnapshot {
            left_trigger: 200,
            ..DeviceSnapshot::connected()
        };

        let report = translator.tick(&mut state, &[pulled], start).await;
        assert_eq!(issued(&report), vec![(0, drive(0, 550, 18))]);
        assert_eq!(recorder.velocity(), (0, 550));

        let report = translator
            .tick(&mut state, &[DeviceSnapshot::connected()], start + ms(18))
            .await;
        assert_eq!(report.dispatched, vec![Dispatch { source: 0, step: PulseStep::Revert }]);
        assert_eq!(recorder.velocity(), (0, 0));
    }

    #[tokio::test]
    async fn test_heading_assist_upper_left() {
        let snapshot = DeviceSnapshot {
            heading_stick: StickVector::new(-30000, 30000),
            ..DeviceSnapshot::connected()
        };

        let (translator, mut state, recorder) = setup(TranslatorConfig::default());
        let report = translator.tick(&mut state, &[snapshot], Instant::now()).await;
        assert!(report.dispatched.is_empty(), "heading stick ignored without assist");

        state.config.toggle_heading_assist();
        let report = translator.tick(&mut state, &[snapshot], Instant::now()).await;
        assert_eq!(
            issued(&report),
            vec![(0, MotionCommand::HeadingAdjust { delta_degrees: 45 })]
        );
        assert_eq!(recorder.calls(), vec![ActuatorCall::HeadingDelta(45)]);
    }

    #[tokio::test]
    async fn test_panic_stop_preempts_pulse() {
        let (translator, mut state, recorder) = setup(TranslatorConfig::default());
        let start = Instant::now();

        let trigger_and_pad = DeviceSnapshot {
            right_trigger: 80,
            buttons: Buttons::DPAD_UP,
            ..DeviceSnapshot::connected()
        };
        translator.tick(&mut state, &[trigger_and_pad], start).await;
        assert_eq!(state.scheduler(0).map(PulseScheduler::pending), Some(1));

        let panic = DeviceSnapshot {
            buttons: Buttons::START | Buttons::DPAD_UP,
            drive_stick: StickVector::new(0, 30000),
            ..DeviceSnapshot::connected()
        };
        let report = translator.tick(&mut state, &[panic], start + ms(5)).await;

        assert_eq!(issued(&report), vec![(0, MotionCommand::Stop)]);
        assert_eq!(report.dispatched.len(), 1, "nothing else for this source");
        assert_eq!(recorder.velocity(), (0, 0));
        assert!(state.scheduler(0).is_some_and(PulseScheduler::is_idle));

        // The cancelled pulse does not revert again later
        let report = translator
            .tick(&mut state, &[DeviceSnapshot::connected()], start + ms(50))
            .await;
        assert!(report.dispatched.is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_reverts_active_pulse() {
        let (translator, mut state, recorder) = setup(TranslatorConfig::default());
        let start = Instant::now();

        let busy = DeviceSnapshot {
            left_trigger: 255,
            buttons: Buttons::DPAD_LEFT,
            ..DeviceSnapshot::connected()
        };
        translator.tick(&mut state, &[busy], start).await;

        let report = translator.tick(&mut state, &[DeviceSnapshot::default()], start + ms(5)).await;
        assert!(report.dispatched.is_empty(), "pulse still running");
        assert!(report
            .failures
            .iter()
            .any(|(source, e)| *source == 0 && matches!(e, RoverPadError::DeviceDisconnected(0))));
        assert_eq!(state.scheduler(0).map(PulseScheduler::pending), Some(0));

        let report = translator.tick(&mut state, &[], start + ms(18)).await;
        assert_eq!(report.dispatched, vec![Dispatch { source: 0, step: PulseStep::Revert }]);
        assert_eq!(recorder.velocity(), (0, 0));
    }

    #[tokio::test]
    async fn test_missing_snapshots_are_disconnected() {
        let (translator, mut state, _recorder) = setup(TranslatorConfig::default());
        let report = translator
            .tick(&mut state, &[DeviceSnapshot::connected()], Instant::now())
            .await;

        let disconnected: Vec<usize> = report.failures.iter().map(|(source, _)| *source).collect();
        assert_eq!(disconnected, vec![1, 2, 3]);
        assert_eq!(state.tracker().message(3), Some("Controller 3: Not connected"));
    }

    #[tokio::test]
    async fn test_actuator_failure_is_per_source() {
        let mut config = TranslatorConfig::default();
        config.toggle_heading_assist();
        let (translator, mut state, recorder) = setup(config);
        let start = Instant::now();
        let upper_left = DeviceSnapshot {
            heading_stick: StickVector::new(-30000, 30000),
            ..DeviceSnapshot::connected()
        };
        let pads = [upper_left, upper_left];

        recorder.set_fail(true);
        let report = translator.tick(&mut state, &pads, start).await;

        assert!(report.dispatched.is_empty());
        let failed: Vec<usize> = report
            .failures
            .iter()
            .filter(|(_, e)| matches!(e, RoverPadError::ActuatorUnavailable(_)))
            .map(|(source, _)| *source)
            .collect();
        assert_eq!(failed, vec![0, 1], "second source still attempted");
        assert!(state.scheduler(0).is_some_and(PulseScheduler::is_idle));

        // No retry of the failed command, the next tick plans afresh
        recorder.set_fail(false);
        let turn = MotionCommand::HeadingAdjust { delta_degrees: 45 };
        let report = translator.tick(&mut state, &pads, start + ms(10)).await;
        assert_eq!(issued(&report), vec![(0, turn), (1, turn)]);
    }

    #[tokio::test]
    async fn test_failed_revert_is_retried() {
        let (translator, mut state, recorder) = setup(TranslatorConfig::default());
        let start = Instant::now();
        let released = [DeviceSnapshot::connected()];

        translator.tick(&mut state, &[pad_with_stick(0, 30000)], start).await;
        assert_eq!(recorder.velocity(), (250, 0));

        recorder.set_fail(true);
        let report = translator.tick(&mut state, &released, start + ms(30)).await;
        assert!(matches!(report.failures[..], [(0, RoverPadError::ActuatorUnavailable(_)), ..]));
        assert_eq!(state.holder(), Some(0), "revert still owed");

        recorder.set_fail(false);
        let report = translator.tick(&mut state, &released, start + ms(40)).await;
        assert_eq!(report.dispatched, vec![Dispatch { source: 0, step: PulseStep::Revert }]);
        assert_eq!(recorder.velocity(), (0, 0));
        assert!(state.scheduler(0).is_some_and(PulseScheduler::is_idle));

        let report = translator.tick(&mut state, &released, start + ms(50)).await;
        assert!(report.dispatched.is_empty());
    }

    #[tokio::test]
    async fn test_partial_drive_failure_is_reverted() {
        let mut mock = MockActuator::new();
        let mut seq = Sequence::new();
        mock.expect_set_linear()
            .with(eq(250))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        mock.expect_set_angular()
            .with(eq(0))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(RoverPadError::ActuatorUnavailable("link down".to_string())));
        mock.expect_set_linear()
            .with(eq(0))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        mock.expect_set_angular()
            .with(eq(0))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let translator = Translator::new(ActuatorGateway::new(mock));
        let mut state = TranslatorState::new(TranslatorConfig::default());
        let start = Instant::now();

        let report = translator.tick(&mut state, &[pad_with_stick(0, 30000)], start).await;
        assert!(report.dispatched.is_empty());
        assert_eq!(report.failures.len(), 4, "actuator failure plus three empty slots");

        // Linear velocity was applied, so neutral is sent before anything new
        let report = translator
            .tick(&mut state, &[DeviceSnapshot::connected()], start + ms(10))
            .await;
        assert_eq!(report.dispatched, vec![Dispatch { source: 0, step: PulseStep::Revert }]);
        assert_eq!(state.holder(), None);
    }

    #[tokio::test]
    async fn test_failed_panic_stop_owes_revert() {
        let (translator, mut state, recorder) = setup(TranslatorConfig::default());
        let start = Instant::now();
        let panic = DeviceSnapshot {
            buttons: Buttons::START,
            ..DeviceSnapshot::connected()
        };

        recorder.set_fail(true);
        translator.tick(&mut state, &[panic], start).await;
        assert_eq!(state.holder(), Some(0));

        recorder.set_fail(false);
        let report = translator
            .tick(&mut state, &[DeviceSnapshot::connected()], start + ms(10))
            .await;
        assert_eq!(report.dispatched, vec![Dispatch { source: 0, step: PulseStep::Revert }]);
        assert_eq!(recorder.velocity(), (0, 0));
    }

    #[tokio::test]
    async fn test_refresh_only_on_change() {
        let (translator, mut state, _recorder) = setup(TranslatorConfig::default());
        let start = Instant::now();
        let pads = [DeviceSnapshot::connected()];

        assert!(translator.tick(&mut state, &pads, start).await.refresh);
        assert!(!translator.tick(&mut state, &pads, start + ms(10)).await.refresh);

        let pressed = [DeviceSnapshot {
            buttons: Buttons::A,
            ..DeviceSnapshot::connected()
        }];
        assert!(translator.tick(&mut state, &pressed, start + ms(20)).await.refresh);
    }

    #[tokio::test]
    async fn test_sources_take_turns() {
        let (translator, mut state, recorder) = setup(TranslatorConfig::default());
        let start = Instant::now();
        let pads = [
            pad_with_stick(0, 30000),
            DeviceSnapshot {
                buttons: Buttons::DPAD_RIGHT,
                ..DeviceSnapshot::connected()
            },
        ];

        let report = translator.tick(&mut state, &pads, start).await;
        assert_eq!(issued(&report), vec![(0, drive(250, 0, 30))]);
        assert_eq!(state.scheduler(1).map(PulseScheduler::pending), Some(1), "source 1 waits");

        let report = translator.tick(&mut state, &pads, start + ms(12)).await;
        assert!(report.dispatched.is_empty(), "source 0 still holds the actuator");
        assert_eq!(recorder.velocity(), (250, 0));

        // Source 0 reverts, then source 1 gets its turn ahead of the repeat
        let report = translator.tick(&mut state, &pads, start + ms(30)).await;
        assert_eq!(
            report.dispatched,
            vec![
                Dispatch { source: 0, step: PulseStep::Revert },
                Dispatch { source: 1, step: PulseStep::Issue(drive(0, -210, 12)) },
            ]
        );
        assert_eq!(state.holder(), Some(1));

        let report = translator.tick(&mut state, &pads, start + ms(42)).await;
        assert_eq!(report.dispatched, vec![Dispatch { source: 1, step: PulseStep::Revert }]);

        let report = translator.tick(&mut state, &pads, start + ms(52)).await;
        assert_eq!(issued(&report), vec![(0, drive(250, 0, 30))]);
    }

    #[tokio::test]
    async fn test_pulses_never_overlap_across_sources() {
        let (translator, mut state, _recorder) = setup(TranslatorConfig::default());
        let start = Instant::now();
        let pads = [
            pad_with_stick(0, 30000),
            DeviceSnapshot {
                left_trigger: 200,
                buttons: Buttons::DPAD_RIGHT,
                ..DeviceSnapshot::connected()
            },
            pad_with_stick(-20000, -20000),
            DeviceSnapshot {
                heading_stick: StickVector::new(30000, 0),
                ..pad_with_stick(30000, 0)
            },
        ];
        state.config.toggle_heading_assist();

        let mut holder: Option<usize> = None;
        let mut pulses = [0usize; MAX_SOURCES];
        for t in 0..400 {
            let report = translator.tick(&mut state, &pads, start + ms(t)).await;
            for dispatch in &report.dispatched {
                match dispatch.step {
                    PulseStep::Issue(command) if command.hold().is_some() => {
                        assert_eq!(holder, None, "pulse from {} overlaps at {} ms", dispatch.source, t);
                        holder = Some(dispatch.source);
                        pulses[dispatch.source] += 1;
                    }
                    PulseStep::Issue(_) => {
                        assert_eq!(holder, None, "command from {} during a pulse at {} ms", dispatch.source, t);
                    }
                    PulseStep::Revert => {
                        assert_eq!(holder, Some(dispatch.source));
                        holder = None;
                    }
                }
            }
        }

        assert!(pulses.iter().all(|&count| count > 0), "every pad got a turn: {:?}", pulses);
    }

    #[test]
    fn test_dispatch_serializes_flat() {
        let dispatch = Dispatch {
            source: 2,
            step: PulseStep::Issue(MotionCommand::Stop),
        };
        let json = serde_json::to_value(dispatch).unwrap();
        assert_eq!(json["source"], 2);
        assert_eq!(json["action"], "issue");
        assert_eq!(json["command"]["kind"], "stop");

        let revert = Dispatch {
            source: 0,
            step: PulseStep::Revert,
        };
        let json = serde_json::to_value(revert).unwrap();
        assert_eq!(json["action"], "revert");
        assert!(json.get("command").is_none());
    }
}
