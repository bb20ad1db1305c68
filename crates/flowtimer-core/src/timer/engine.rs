//! Timer engine implementation.
//!
//! The engine is a wall-clock-based state machine. It has no thread of its
//! own: the host requests frames through the [`TickScheduler`] and calls
//! `frame()` (or `tick()`) while the timer is running. Every displayed value
//! is recomputed from anchor timestamps, so skipped or late frames never
//! cause drift.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Working --stop--> Break --(target reached | skip)--> Idle
//!                    |                 \--(Pomodoro, cycles left)--> Working
//!                    \--stop, breaks off or zero-length break------> Idle
//! reset: Working | Break -> Idle
//! ```
//!
//! Every transition persists the run state before returning.

use uuid::Uuid;

use super::clock::{to_utc, Clock};
use super::persistence::PersistenceBridge;
use super::policy::{PomodoroProgress, TimerKind};
use super::recorder::{record_session, WorkPeriod};
use super::scheduler::{FrameHandle, TickScheduler};
use super::state::{TimerMode, TimerRunState};
use crate::effects::{Effect, Notifier, SoundCue};
use crate::error::ValidationError;
use crate::events::Event;
use crate::history::{SessionHistory, TaskTotal};
use crate::storage::{Config, Store};
use crate::task::{Task, TaskRegistry};

pub struct TimerEngine<S: Store> {
    config: Config,
    state: TimerRunState,
    tasks: TaskRegistry,
    history: SessionHistory,
    bridge: PersistenceBridge<S>,
    clock: Box<dyn Clock>,
    notifier: Notifier,
    scheduler: TickScheduler,
    /// Events produced by the recovery pass at construction.
    recovery: Vec<Event>,
    /// Sessions recorded since the last commit; tasks and history need saving.
    records_dirty: bool,
}

impl<S: Store> TimerEngine<S> {
    /// Load persisted state from `store` and reconcile it against the clock.
    ///
    /// Never fails: unreadable records fall back to defaults. Listeners must
    /// already be subscribed to `notifier`, because recovery can complete an
    /// overdue break and fire its effects.
    pub fn open(store: S, config: Config, clock: Box<dyn Clock>, notifier: Notifier) -> Self {
        let bridge = PersistenceBridge::new(store);
        let state = bridge.load_timer();
        let tasks = bridge.load_tasks();
        let history = bridge.load_history();

        let mut engine = Self {
            config,
            state,
            tasks,
            history,
            bridge,
            clock,
            notifier,
            scheduler: TickScheduler::new(),
            recovery: Vec::new(),
            records_dirty: false,
        };
        engine.recovery = engine.recover();
        engine
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerRunState {
        &self.state
    }

    pub fn mode(&self) -> TimerMode {
        self.state.mode
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn is_break(&self) -> bool {
        self.state.is_break()
    }

    /// Elapsed (Flow work) or remaining (Pomodoro work, break) seconds,
    /// computed from the clock without mutating state.
    pub fn display_seconds(&self) -> u64 {
        self.state.compute_display(self.clock.now_ms())
    }

    /// Projected break length: live in Flow/percentage, static otherwise.
    pub fn estimated_break_time(&self) -> u64 {
        if let Some(p) = self.state.pomodoro {
            return p.break_duration_seconds;
        }
        match self.config.timer_kind() {
            TimerKind::Pomodoro(plan) if !self.is_running() => plan.break_seconds,
            _ => {
                let elapsed = match self.state.mode {
                    TimerMode::Working => self.state.elapsed_secs(self.clock.now_ms()),
                    _ => 0,
                };
                self.config.break_policy().estimate(elapsed)
            }
        }
    }

    pub fn pomodoro(&self) -> Option<PomodoroProgress> {
        self.state.pomodoro
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    pub fn active_task(&self) -> Option<&Task> {
        self.tasks.active()
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    /// Date key of the current day.
    pub fn today_key(&self) -> String {
        self.clock.date_key(self.clock.now_ms())
    }

    /// Per-task totals for today.
    pub fn today_totals(&self) -> Vec<TaskTotal> {
        self.history.day_totals(&self.today_key())
    }

    pub fn recovery_events(&self) -> &[Event] {
        &self.recovery
    }

    /// Pending frame request, `None` while Idle.
    pub fn next_frame(&self) -> Option<FrameHandle> {
        self.scheduler.pending()
    }

    pub fn notifier_mut(&mut self) -> &mut Notifier {
        &mut self.notifier
    }

    /// Change counter of the backing store.
    pub fn store_version(&self) -> Option<u64> {
        self.bridge.version()
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let now = self.clock.now_ms();
        Event::StateSnapshot {
            mode: self.state.mode,
            is_running: self.is_running(),
            is_break: self.is_break(),
            display_seconds: self.state.compute_display(now),
            estimated_break_seconds: self.estimated_break_time(),
            session_id: self.state.session_id.clone(),
            active_task: self.attributed_task_name(),
            pomodoro: self.state.pomodoro,
            at: to_utc(now),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a work period. No-op unless Idle, and when a required task
    /// selection is missing.
    pub fn start(&mut self) -> Vec<Event> {
        if self.state.is_running() {
            tracing::debug!(mode = ?self.state.mode, "start ignored: timer already running");
            return Vec::new();
        }
        if self.config.requires_task() && self.tasks.active().is_none() {
            tracing::debug!("start ignored: no task selected");
            return Vec::new();
        }

        let now = self.clock.now_ms();
        let pomodoro = match self.config.timer_kind() {
            TimerKind::Flow(_) => None,
            TimerKind::Pomodoro(plan) => Some(PomodoroProgress::first(plan)),
        };
        let session_id = Uuid::new_v4().to_string();
        self.state = TimerRunState::working(now, session_id.clone(), pomodoro);
        self.state.display_seconds = self.state.compute_display(now);
        self.commit();

        tracing::debug!(%session_id, pomodoro = pomodoro.is_some(), "timer started");
        vec![Event::TimerStarted {
            session_id,
            task_name: self.attributed_task_name(),
            cycle: pomodoro.map(|p| p.current_cycle),
            at: to_utc(now),
        }]
    }

    /// End the current work period, record it and move to Break or Idle.
    /// No-op unless Working.
    pub fn stop(&mut self) -> Vec<Event> {
        if self.state.mode != TimerMode::Working {
            tracing::debug!(mode = ?self.state.mode, "stop ignored: not working");
            return Vec::new();
        }

        let now = self.clock.now_ms();
        let mut events = Vec::new();
        let period = WorkPeriod::stopped_at(&self.state, now);
        let (end_ms, worked) = (period.end_ms, period.duration_seconds);
        self.finish_work(period, &mut events);
        self.after_work(end_ms, worked, &mut events);
        self.advance_to(now, &mut events);
        self.state.display_seconds = self.state.compute_display(now);
        self.commit();
        events
    }

    /// Discard in-progress time without recording. No-op when Idle.
    pub fn reset(&mut self) -> Vec<Event> {
        if !self.state.is_running() {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        let from = self.state.mode;
        let discarded_secs = match from {
            TimerMode::Working => self.state.elapsed_secs(now),
            _ => self.state.compute_display(now),
        };
        self.state = TimerRunState::idle();
        self.commit();

        tracing::debug!(?from, discarded_secs, "timer reset");
        vec![Event::TimerReset {
            discarded_secs,
            from,
            at: to_utc(now),
        }]
    }

    /// Leave a break early. Pomodoro moves to the next cycle (or Idle when
    /// none remain); Flow goes to Idle. No-op unless on Break.
    pub fn skip_break(&mut self) -> Vec<Event> {
        if self.state.mode != TimerMode::Break {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        let pomodoro = self.state.pomodoro;
        let mut events = vec![Event::BreakSkipped {
            remaining_secs: self.state.compute_display(now),
            cycle: pomodoro.map(|p| p.current_cycle),
            at: to_utc(now),
        }];

        match pomodoro {
            Some(p) => match p.next_cycle() {
                Some(next) => self.begin_cycle(now, next, &mut events),
                None => {
                    self.state = TimerRunState::idle();
                    events.push(Event::PomodoroCompleted {
                        total_cycles: p.total_cycles,
                        at: to_utc(now),
                    });
                }
            },
            None => self.state = TimerRunState::idle(),
        }
        self.state.display_seconds = self.state.compute_display(now);
        self.commit();
        events
    }

    /// Recompute the display from the clock and fire any phase boundaries
    /// that have passed. State is untouched when nothing changed.
    pub fn tick(&mut self) -> Vec<Event> {
        if !self.state.is_running() {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        let mut events = Vec::new();
        self.advance_to(now, &mut events);

        let display = self.state.compute_display(now);
        if events.is_empty() && display == self.state.display_seconds {
            return events;
        }
        self.state.display_seconds = display;
        self.commit();
        events
    }

    /// Run one frame for `handle`. Stale or cancelled handles are ignored.
    pub fn frame(&mut self, handle: FrameHandle) -> Vec<Event> {
        if !self.scheduler.accepts(handle) {
            return Vec::new();
        }
        self.tick()
    }

    /// Reload every record from the store and reconcile, after another
    /// process changed it.
    pub fn resync(&mut self) -> Vec<Event> {
        self.state = self.bridge.load_timer();
        self.tasks = self.bridge.load_tasks();
        self.history = self.bridge.load_history();
        self.recover()
    }

    /// Replace the configuration. Pomodoro counters of a running timer keep
    /// the durations they started with.
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    // ── Task registry ────────────────────────────────────────────────

    pub fn add_task(&mut self, name: &str, estimated_goal: Option<u64>) -> Result<Task, ValidationError> {
        let task = self.tasks.add(name, estimated_goal, self.clock.now_ms())?;
        self.bridge.save_tasks(&self.tasks);
        Ok(task)
    }

    pub fn rename_task(&mut self, id: &str, name: &str) -> Result<Task, ValidationError> {
        let task = self.tasks.rename(id, name)?.clone();
        self.bridge.save_tasks(&self.tasks);
        Ok(task)
    }

    pub fn delete_task(&mut self, id: &str) -> Result<Task, ValidationError> {
        let task = self.tasks.delete(id)?;
        self.bridge.save_tasks(&self.tasks);
        Ok(task)
    }

    pub fn select_task(&mut self, id: Option<&str>) -> Result<(), ValidationError> {
        self.tasks.select(id)?;
        self.bridge.save_tasks(&self.tasks);
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Reconcile the loaded snapshot with the wall clock. Runs once per load.
    fn recover(&mut self) -> Vec<Event> {
        let from = self.state.mode;
        if from == TimerMode::Idle {
            self.sync_scheduler();
            return Vec::new();
        }

        let now = self.clock.now_ms();
        let mut events = Vec::new();
        self.advance_to(now, &mut events);
        self.state.display_seconds = self.state.compute_display(now);
        self.commit();

        tracing::info!(?from, to = ?self.state.mode, transitions = events.len(), "timer state recovered");
        events.push(Event::Recovered {
            from,
            to: self.state.mode,
            at: to_utc(now),
        });
        events
    }

    /// Process every phase boundary at or before `now_ms`, anchoring each
    /// following phase at the boundary itself.
    fn advance_to(&mut self, now_ms: i64, events: &mut Vec<Event>) {
        while let Some(deadline) = self.state.phase_deadline_ms() {
            if now_ms < deadline {
                break;
            }
            match (self.state.mode, self.state.pomodoro) {
                (TimerMode::Working, Some(p)) => {
                    let period = WorkPeriod::completed(&self.state, p.work_duration_seconds, deadline);
                    self.finish_work(period, events);
                    self.after_work(deadline, p.work_duration_seconds, events);
                }
                (TimerMode::Break, pomodoro) => self.complete_break(deadline, pomodoro, events),
                _ => break,
            }
        }
    }

    fn finish_work(&mut self, period: WorkPeriod, events: &mut Vec<Event>) {
        let at = to_utc(period.end_ms);
        let session = record_session(
            period,
            &mut self.tasks,
            &mut self.history,
            self.config.tasks.enabled,
            self.clock.as_ref(),
        );
        self.records_dirty = true;
        events.push(Event::SessionRecorded { session, at });
    }

    /// Decide what follows a recorded work period ending at `end_ms`.
    fn after_work(&mut self, end_ms: i64, worked_secs: u64, events: &mut Vec<Event>) {
        match self.state.pomodoro {
            Some(p) => self.begin_break(end_ms, p.break_duration_seconds, Some(p), events),
            None => match self.config.break_policy().break_seconds(worked_secs) {
                Some(secs) => self.begin_break(end_ms, secs, None, events),
                None => self.state = TimerRunState::idle(),
            },
        }
    }

    fn begin_break(
        &mut self,
        start_ms: i64,
        break_secs: u64,
        pomodoro: Option<PomodoroProgress>,
        events: &mut Vec<Event>,
    ) {
        if break_secs == 0 {
            // Resolve now; the timer is never observable in Break.
            self.complete_break(start_ms, pomodoro, events);
            return;
        }
        self.state = TimerRunState::on_break(start_ms, break_secs, pomodoro);
        events.push(Event::BreakStarted {
            duration_secs: break_secs,
            ends_at: to_utc(self.state.break_target_ms.unwrap_or(start_ms)),
            cycle: pomodoro.map(|p| p.current_cycle),
            at: to_utc(start_ms),
        });
    }

    fn complete_break(
        &mut self,
        at_ms: i64,
        pomodoro: Option<PomodoroProgress>,
        events: &mut Vec<Event>,
    ) {
        events.push(Event::BreakCompleted {
            cycle: pomodoro.map(|p| p.current_cycle),
            at: to_utc(at_ms),
        });

        match pomodoro {
            Some(p) => match p.next_cycle() {
                Some(next) => {
                    self.fire_break_complete(
                        SoundCue::BreakComplete,
                        format!("Cycle {} of {} starts now.", next.current_cycle, next.total_cycles),
                    );
                    self.begin_cycle(at_ms, next, events);
                }
                None => {
                    self.fire_break_complete(
                        SoundCue::CyclesComplete,
                        format!("All {} cycles complete.", p.total_cycles),
                    );
                    self.state = TimerRunState::idle();
                    events.push(Event::PomodoroCompleted {
                        total_cycles: p.total_cycles,
                        at: to_utc(at_ms),
                    });
                }
            },
            None => {
                self.fire_break_complete(SoundCue::BreakComplete, "Time to focus again.".into());
                self.state = TimerRunState::idle();
            }
        }
    }

    fn begin_cycle(&mut self, at_ms: i64, next: PomodoroProgress, events: &mut Vec<Event>) {
        let session_id = Uuid::new_v4().to_string();
        self.state = TimerRunState::working(at_ms, session_id.clone(), Some(next));
        events.push(Event::CycleStarted {
            session_id,
            cycle: next.current_cycle,
            total_cycles: next.total_cycles,
            at: to_utc(at_ms),
        });
    }

    fn fire_break_complete(&mut self, cue: SoundCue, body: String) {
        if self.config.notifications.sound {
            self.notifier.dispatch(&Effect::PlaySound { cue });
        }
        if self.config.notifications.system {
            self.notifier.dispatch(&Effect::Notify {
                title: "Break is over".into(),
                body,
            });
        }
    }

    fn attributed_task_name(&self) -> Option<String> {
        if !self.config.tasks.enabled {
            return None;
        }
        self.tasks.active().map(|t| t.name.clone())
    }

    /// Persist the run state, plus tasks and history when a session was
    /// recorded since the last commit.
    fn commit(&mut self) {
        if std::mem::take(&mut self.records_dirty) {
            self.bridge.save_history(&self.history);
            self.bridge.save_tasks(&self.tasks);
        }
        self.bridge.save_timer(&self.state);
        self.sync_scheduler();
    }

    fn sync_scheduler(&mut self) {
        if self.state.is_running() {
            self.scheduler.arm();
        } else if let Some(handle) = self.scheduler.cancel() {
            tracing::trace!(?handle, "frame loop cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectRecorder;
    use crate::storage::{MemoryStore, TimerModeSetting};
    use crate::timer::clock::ManualClock;

    const NOON: i64 = 1_751_371_200_000;

    fn engine_with(config: Config) -> (TimerEngine<MemoryStore>, ManualClock, EffectRecorder) {
        let clock = ManualClock::at(NOON);
        let recorder = EffectRecorder::new();
        let mut notifier = Notifier::new();
        notifier.subscribe(Box::new(recorder.clone()));
        let engine = TimerEngine::open(
            MemoryStore::new(),
            config,
            Box::new(clock.clone()),
            notifier,
        );
        (engine, clock, recorder)
    }

    #[test]
    fn start_stop_flow_enters_break() {
        let (mut engine, clock, _) = engine_with(Config::default());
        assert_eq!(engine.start().len(), 1);
        assert_eq!(engine.mode(), TimerMode::Working);

        clock.advance_secs(100);
        let events = engine.stop();
        assert!(matches!(events[0], Event::SessionRecorded { .. }));
        assert!(matches!(events[1], Event::BreakStarted { duration_secs: 20, .. }));
        assert!(engine.is_break());
        assert_eq!(engine.display_seconds(), 20);
    }

    #[test]
    fn scheduler_follows_mode() {
        let (mut engine, clock, _) = engine_with(Config::default());
        assert!(engine.next_frame().is_none());

        engine.start();
        let handle = engine.next_frame().unwrap();
        clock.advance_secs(1);
        engine.frame(handle);
        assert_eq!(engine.state().display_seconds, 1);

        engine.reset();
        assert!(engine.next_frame().is_none());
        clock.advance_secs(5);
        assert!(engine.frame(handle).is_empty());
        assert_eq!(engine.mode(), TimerMode::Idle);
    }

    #[test]
    fn estimated_break_tracks_elapsed_in_percentage_mode() {
        let (mut engine, clock, _) = engine_with(Config::default());
        engine.start();
        clock.advance_secs(250);
        assert_eq!(engine.estimated_break_time(), 50);
    }

    #[test]
    fn estimated_break_is_configured_value_in_pomodoro() {
        let mut config = Config::default();
        config.timer.mode = TimerModeSetting::Pomodoro;
        config.pomodoro.break_minutes = 7;
        let (mut engine, clock, _) = engine_with(config);
        assert_eq!(engine.estimated_break_time(), 420);
        engine.start();
        clock.advance_secs(60);
        assert_eq!(engine.estimated_break_time(), 420);
    }

    #[test]
    fn skip_break_in_flow_goes_idle_without_effects() {
        let (mut engine, clock, recorder) = engine_with(Config::default());
        engine.start();
        clock.advance_secs(600);
        engine.stop();
        assert!(engine.is_break());

        let events = engine.skip_break();
        assert!(matches!(events[0], Event::BreakSkipped { remaining_secs: 120, .. }));
        assert_eq!(engine.mode(), TimerMode::Idle);
        assert!(recorder.effects().is_empty());
    }

    #[test]
    fn reset_discards_without_recording() {
        let (mut engine, clock, _) = engine_with(Config::default());
        engine.start();
        clock.advance_secs(42);
        let events = engine.reset();
        assert!(matches!(
            events[0],
            Event::TimerReset {
                discarded_secs: 42,
                from: TimerMode::Working,
                ..
            }
        ));
        assert!(engine.history().is_empty());
        assert_eq!(engine.display_seconds(), 0);
        assert!(engine.reset().is_empty());
    }

    #[test]
    fn disabled_breaks_stop_to_idle() {
        let mut config = Config::default();
        config.timer.breaks_enabled = false;
        let (mut engine, clock, recorder) = engine_with(config);
        engine.start();
        clock.advance_secs(300);
        let events = engine.stop();
        assert_eq!(events.len(), 1);
        assert_eq!(engine.mode(), TimerMode::Idle);
        assert!(recorder.effects().is_empty());
    }

    #[test]
    fn tick_without_change_does_not_persist() {
        let (mut engine, clock, _) = engine_with(Config::default());
        engine.start();
        clock.advance_ms(1_000);
        engine.tick();
        let stored = engine.bridge.store().version().unwrap();

        clock.advance_ms(300);
        assert!(engine.tick().is_empty());
        assert_eq!(engine.bridge.store().version().unwrap(), stored);
    }
}
