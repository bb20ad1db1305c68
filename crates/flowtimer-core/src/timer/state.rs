//! Live run state of the timer and its persisted form.

use serde::{Deserialize, Serialize};

use super::policy::{PomodoroProgress, MAX_CYCLES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Idle,
    Working,
    Break,
}

/// The engine's live state.
///
/// `display_seconds` is a cache of the last value derived from the anchors;
/// it is never advanced on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerRunState {
    pub mode: TimerMode,
    /// Elapsed seconds (Flow work) or remaining seconds (Pomodoro work, breaks).
    pub display_seconds: u64,
    /// Start of the current phase (epoch milliseconds).
    pub anchor_ms: i64,
    /// End of the current break (epoch milliseconds).
    pub break_target_ms: Option<i64>,
    /// Identifies the current work period; becomes the recorded session id.
    pub session_id: Option<String>,
    pub pomodoro: Option<PomodoroProgress>,
}

impl Default for TimerRunState {
    fn default() -> Self {
        Self::idle()
    }
}

impl TimerRunState {
    pub fn idle() -> Self {
        Self {
            mode: TimerMode::Idle,
            display_seconds: 0,
            anchor_ms: 0,
            break_target_ms: None,
            session_id: None,
            pomodoro: None,
        }
    }

    pub fn working(anchor_ms: i64, session_id: String, pomodoro: Option<PomodoroProgress>) -> Self {
        Self {
            mode: TimerMode::Working,
            display_seconds: pomodoro.map(|p| p.work_duration_seconds).unwrap_or(0),
            anchor_ms,
            break_target_ms: None,
            session_id: Some(session_id),
            pomodoro,
        }
    }

    pub fn on_break(anchor_ms: i64, break_secs: u64, pomodoro: Option<PomodoroProgress>) -> Self {
        Self {
            mode: TimerMode::Break,
            display_seconds: break_secs,
            anchor_ms,
            break_target_ms: Some(anchor_ms.saturating_add(secs_to_ms(break_secs))),
            session_id: None,
            pomodoro,
        }
    }

    /// Whole seconds since the phase anchor.
    pub fn elapsed_secs(&self, now_ms: i64) -> u64 {
        (now_ms.saturating_sub(self.anchor_ms).max(0) / 1000) as u64
    }

    /// When the current phase ends on its own, if it does.
    pub fn phase_deadline_ms(&self) -> Option<i64> {
        match self.mode {
            TimerMode::Idle => None,
            TimerMode::Working => self
                .pomodoro
                .map(|p| self.anchor_ms.saturating_add(secs_to_ms(p.work_duration_seconds))),
            TimerMode::Break => self.break_target_ms,
        }
    }

    /// Display value derived purely from the anchors and `now_ms`.
    pub fn compute_display(&self, now_ms: i64) -> u64 {
        match (self.mode, self.phase_deadline_ms()) {
            (TimerMode::Idle, _) => 0,
            (TimerMode::Working, None) => self.elapsed_secs(now_ms),
            (_, Some(deadline)) => ceil_secs(deadline.saturating_sub(now_ms)),
            (TimerMode::Break, None) => 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.mode != TimerMode::Idle
    }

    pub fn is_break(&self) -> bool {
        self.mode == TimerMode::Break
    }

    pub fn to_persisted(&self) -> PersistedTimer {
        let running = self.is_running();
        PersistedTimer {
            time: self.display_seconds,
            is_running: running,
            is_break: self.is_break(),
            start_time: running.then_some(self.anchor_ms),
            session_id: self.session_id.clone(),
            target_time: self.break_target_ms,
            current_session: self.pomodoro.map(|p| p.current_cycle),
            total_sessions: self.pomodoro.map(|p| p.total_cycles),
            work_duration: self.pomodoro.map(|p| p.work_duration_seconds),
            break_duration: self.pomodoro.map(|p| p.break_duration_seconds),
        }
    }

    /// Rebuild the run state from a stored record. Returns `None` when the
    /// record is inconsistent (a running timer without its anchors, partial
    /// Pomodoro counters, a zero-length work phase or more than
    /// `MAX_CYCLES` cycles).
    pub fn from_persisted(p: &PersistedTimer) -> Option<Self> {
        if !p.is_running {
            return Some(Self::idle());
        }

        let pomodoro = match (
            p.current_session,
            p.total_sessions,
            p.work_duration,
            p.break_duration,
        ) {
            (None, None, None, None) => None,
            (Some(current), Some(total), Some(work), Some(brk))
                if (1..=MAX_CYCLES).contains(&total) && (1..=total).contains(&current) && work > 0 =>
            {
                Some(PomodoroProgress {
                    current_cycle: current,
                    total_cycles: total,
                    work_duration_seconds: work,
                    break_duration_seconds: brk,
                })
            }
            _ => return None,
        };

        let anchor_ms = p.start_time?;
        if p.is_break {
            let target = p.target_time?;
            Some(Self {
                mode: TimerMode::Break,
                display_seconds: p.time,
                anchor_ms,
                break_target_ms: Some(target),
                session_id: p.session_id.clone(),
                pomodoro,
            })
        } else {
            Some(Self {
                mode: TimerMode::Working,
                display_seconds: p.time,
                anchor_ms,
                break_target_ms: None,
                session_id: p.session_id.clone(),
                pomodoro,
            })
        }
    }
}

/// Stored shape of the timer (`timer_state` key). Timestamps are epoch
/// milliseconds; durations are seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedTimer {
    #[serde(default)]
    pub time: u64,
    pub is_running: bool,
    pub is_break: bool,
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_session: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_sessions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_duration: Option<u64>,
}

pub(crate) fn secs_to_ms(secs: u64) -> i64 {
    i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX)
}

fn ceil_secs(ms: i64) -> u64 {
    if ms <= 0 {
        0
    } else {
        ((ms + 999) / 1000) as u64
    }
}
