use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::history::Session;
use crate::timer::{PomodoroProgress, TimerMode};

/// Every state change in the engine produces one or more Events.
/// Transitions return them; hosts print or forward them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        session_id: String,
        task_name: Option<String>,
        /// Pomodoro cycle number, absent in Flow mode.
        cycle: Option<u32>,
        at: DateTime<Utc>,
    },
    /// A work period ended and was recorded.
    SessionRecorded {
        session: Session,
        at: DateTime<Utc>,
    },
    BreakStarted {
        duration_secs: u64,
        ends_at: DateTime<Utc>,
        cycle: Option<u32>,
        at: DateTime<Utc>,
    },
    BreakCompleted {
        cycle: Option<u32>,
        at: DateTime<Utc>,
    },
    BreakSkipped {
        remaining_secs: u64,
        cycle: Option<u32>,
        at: DateTime<Utc>,
    },
    /// Next Pomodoro work cycle began.
    CycleStarted {
        session_id: String,
        cycle: u32,
        total_cycles: u32,
        at: DateTime<Utc>,
    },
    PomodoroCompleted {
        total_cycles: u32,
        at: DateTime<Utc>,
    },
    /// Work or break discarded without recording.
    TimerReset {
        discarded_secs: u64,
        from: TimerMode,
        at: DateTime<Utc>,
    },
    /// The persisted snapshot was reconciled against the wall clock.
    Recovered {
        from: TimerMode,
        to: TimerMode,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        mode: TimerMode,
        is_running: bool,
        is_break: bool,
        display_seconds: u64,
        estimated_break_seconds: u64,
        session_id: Option<String>,
        active_task: Option<String>,
        pomodoro: Option<PomodoroProgress>,
        at: DateTime<Utc>,
    },
}
