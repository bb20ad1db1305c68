//! Break and cycle policy.
//!
//! Flow mode leaves work open-ended and sizes the break from the worked
//! time (or a fixed length). Pomodoro mode runs fixed work/break cycles.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakPolicy {
    /// Stopping goes straight to Idle.
    Disabled,
    /// Break is a percentage of the worked seconds, rounded down.
    Percentage(u8),
    Fixed { seconds: u64 },
}

impl BreakPolicy {
    /// Break length after `worked_secs` of work, `None` when breaks are off.
    pub fn break_seconds(&self, worked_secs: u64) -> Option<u64> {
        match *self {
            BreakPolicy::Disabled => None,
            BreakPolicy::Percentage(pct) => Some(worked_secs.saturating_mul(u64::from(pct)) / 100),
            BreakPolicy::Fixed { seconds } => Some(seconds),
        }
    }

    /// Live projection shown while working.
    pub fn estimate(&self, elapsed_secs: u64) -> u64 {
        self.break_seconds(elapsed_secs).unwrap_or(0)
    }
}

/// Upper bound on cycles per Pomodoro run.
pub const MAX_CYCLES: u32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroPlan {
    pub work_seconds: u64,
    pub break_seconds: u64,
    pub total_cycles: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    Flow(BreakPolicy),
    Pomodoro(PomodoroPlan),
}

/// Pomodoro counters carried in the run state. The durations are a
/// snapshot taken at start, so editing settings mid-run has no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroProgress {
    pub current_cycle: u32,
    pub total_cycles: u32,
    pub work_duration_seconds: u64,
    pub break_duration_seconds: u64,
}

impl PomodoroProgress {
    pub fn first(plan: PomodoroPlan) -> Self {
        Self {
            current_cycle: 1,
            total_cycles: plan.total_cycles.clamp(1, MAX_CYCLES),
            work_duration_seconds: plan.work_seconds,
            break_duration_seconds: plan.break_seconds,
        }
    }

    pub fn is_last_cycle(&self) -> bool {
        self.current_cycle >= self.total_cycles
    }

    /// The following cycle, or `None` once every cycle has run.
    pub fn next_cycle(&self) -> Option<Self> {
        if self.is_last_cycle() {
            return None;
        }
        Some(Self {
            current_cycle: self.current_cycle + 1,
            ..*self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_break_rounds_down() {
        let policy = BreakPolicy::Percentage(20);
        assert_eq!(policy.break_seconds(100), Some(20));
        assert_eq!(policy.break_seconds(104), Some(20));
        assert_eq!(policy.break_seconds(4), Some(0));
        assert_eq!(BreakPolicy::Percentage(15).break_seconds(1000), Some(150));
    }

    #[test]
    fn fixed_break_ignores_worked_time() {
        let policy = BreakPolicy::Fixed { seconds: 300 };
        assert_eq!(policy.break_seconds(10), Some(300));
        assert_eq!(policy.estimate(7200), 300);
    }

    #[test]
    fn disabled_policy_has_no_break() {
        assert_eq!(BreakPolicy::Disabled.break_seconds(3600), None);
        assert_eq!(BreakPolicy::Disabled.estimate(3600), 0);
    }

    #[test]
    fn pomodoro_cycles_run_out() {
        let plan = PomodoroPlan {
            work_seconds: 1500,
            break_seconds: 300,
            total_cycles: 2,
        };
        let first = PomodoroProgress::first(plan);
        assert_eq!(first.current_cycle, 1);
        let second = first.next_cycle().unwrap();
        assert_eq!(second.current_cycle, 2);
        assert!(second.is_last_cycle());
        assert!(second.next_cycle().is_none());
    }
}
