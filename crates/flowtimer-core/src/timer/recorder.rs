//! Session recorder: turns a finished work period into a [`Session`].

use super::clock::Clock;
use super::state::TimerRunState;
use crate::history::{Session, SessionHistory};
use crate::task::TaskRegistry;

/// A work period that has ended and is about to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkPeriod {
    pub session_id: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub duration_seconds: u64,
}

impl WorkPeriod {
    /// Work period for a stop at `now_ms`. Pomodoro work is capped at the
    /// configured duration so a late stop cannot over-count.
    pub fn stopped_at(state: &TimerRunState, now_ms: i64) -> Self {
        let elapsed = state.elapsed_secs(now_ms);
        let (duration_seconds, end_ms) = match state.pomodoro {
            Some(p) if elapsed >= p.work_duration_seconds => (
                p.work_duration_seconds,
                state
                    .phase_deadline_ms()
                    .unwrap_or(now_ms)
                    .min(now_ms),
            ),
            _ => (elapsed, now_ms.max(state.anchor_ms)),
        };
        Self {
            session_id: session_id_or_new(state),
            start_ms: state.anchor_ms,
            end_ms,
            duration_seconds,
        }
    }

    /// Pomodoro work that ran its full countdown.
    pub fn completed(state: &TimerRunState, work_seconds: u64, deadline_ms: i64) -> Self {
        Self {
            session_id: session_id_or_new(state),
            start_ms: state.anchor_ms,
            end_ms: deadline_ms,
            duration_seconds: work_seconds,
        }
    }
}

fn session_id_or_new(state: &TimerRunState) -> String {
    state
        .session_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Record `period`, attributing it to the active task when tasks are
/// enabled and one is selected, otherwise naming it `Focus #N`.
pub fn record_session(
    period: WorkPeriod,
    tasks: &mut TaskRegistry,
    history: &mut SessionHistory,
    tasks_enabled: bool,
    clock: &dyn Clock,
) -> Session {
    let date_key = clock.date_key(period.start_ms);

    let active = if tasks_enabled {
        tasks.active().map(|t| (t.id.clone(), t.name.clone()))
    } else {
        None
    };

    let (task_id, task_name) = match active {
        Some((id, name)) => {
            tasks.credit(&id, period.duration_seconds);
            tasks.remember(&name);
            (Some(id), name)
        }
        None => (None, history.next_focus_name(&date_key)),
    };

    let session = Session::new(
        period.session_id,
        task_id,
        task_name,
        period.start_ms,
        period.end_ms,
        period.duration_seconds,
        date_key,
    );
    history.append(session.clone());
    tracing::info!(
        session_id = session.id(),
        task = session.task_name(),
        duration_secs = session.duration_seconds(),
        "session recorded"
    );
    session
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::clock::ManualClock;
    use crate::timer::policy::PomodoroProgress;

    const NOON: i64 = 1_751_371_200_000;

    #[test]
    fn flow_stop_uses_whole_elapsed_seconds() {
        let state = TimerRunState::working(NOON, "s1".into(), None);
        let period = WorkPeriod::stopped_at(&state, NOON + 100_900);
        assert_eq!(period.duration_seconds, 100);
        assert_eq!(period.end_ms, NOON + 100_900);
        assert_eq!(period.session_id, "s1");
    }

    #[test]
    fn late_pomodoro_stop_is_capped() {
        let progress = PomodoroProgress {
            current_cycle: 1,
            total_cycles: 1,
            work_duration_seconds: 60,
            break_duration_seconds: 0,
        };
        let state = TimerRunState::working(NOON, "s1".into(), Some(progress));
        let period = WorkPeriod::stopped_at(&state, NOON + 500_000);
        assert_eq!(period.duration_seconds, 60);
        assert_eq!(period.end_ms, NOON + 60_000);
    }

    #[test]
    fn active_task_gets_credit_and_suggestion() {
        let clock = ManualClock::at(NOON);
        let mut tasks = TaskRegistry::new();
        let task = tasks.add("Deploy", None, NOON).unwrap();
        tasks.select(Some(&task.id)).unwrap();
        let mut history = SessionHistory::new();

        let period = WorkPeriod {
            session_id: "s1".into(),
            start_ms: NOON,
            end_ms: NOON + 90_000,
            duration_seconds: 90,
        };
        let session = record_session(period, &mut tasks, &mut history, true, &clock);

        assert_eq!(session.task_id(), Some(task.id.as_str()));
        assert_eq!(session.task_name(), "Deploy");
        assert_eq!(session.date_key(), "2025-07-01");
        assert_eq!(tasks.get(&task.id).unwrap().time_spent_total, 90);
        assert_eq!(tasks.suggestions(), &["Deploy".to_string()]);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn disabled_tasks_fall_back_to_focus_names() {
        let clock = ManualClock::at(NOON);
        let mut tasks = TaskRegistry::new();
        let task = tasks.add("Deploy", None, NOON).unwrap();
        tasks.select(Some(&task.id)).unwrap();
        let mut history = SessionHistory::new();

        for n in 1..=2 {
            let period = WorkPeriod {
                session_id: format!("s{n}"),
                start_ms: NOON,
                end_ms: NOON + 1_000,
                duration_seconds: 1,
            };
            let session = record_session(period, &mut tasks, &mut history, false, &clock);
            assert_eq!(session.task_name(), format!("Focus #{n}"));
            assert!(session.task_id().is_none());
        }
        assert_eq!(tasks.get(&task.id).unwrap().time_spent_total, 0);
    }
}
