//! Append-only session history and the statistics derived from it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Name prefix for sessions recorded without a task.
pub const FOCUS_PREFIX: &str = "Focus #";

/// One completed work period.
///
/// Fields are private: a recorded session is never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    id: String,
    #[serde(default)]
    task_id: Option<String>,
    task_name: String,
    start_time: i64,
    end_time: i64,
    duration_seconds: u64,
    date_key: String,
}

impl Session {
    pub fn new(
        id: String,
        task_id: Option<String>,
        task_name: String,
        start_time: i64,
        end_time: i64,
        duration_seconds: u64,
        date_key: String,
    ) -> Self {
        Self {
            id,
            task_id,
            task_name,
            start_time,
            end_time,
            duration_seconds,
            date_key,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    /// Task name as it was when the session was recorded.
    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    pub fn end_time(&self) -> i64 {
        self.end_time
    }

    pub fn duration_seconds(&self) -> u64 {
        self.duration_seconds
    }

    pub fn date_key(&self) -> &str {
        &self.date_key
    }

    pub fn is_auto_named(&self) -> bool {
        self.task_name.starts_with(FOCUS_PREFIX)
    }
}

/// Seconds worked on one task name within a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTotal {
    pub task_name: String,
    pub task_id: Option<String>,
    pub seconds: u64,
    pub sessions: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub total_sessions: u64,
    pub total_seconds: u64,
    pub unique_tasks: u64,
    pub average_session_seconds: u64,
    pub longest_session_seconds: u64,
    /// First and last date key covered, when any session matched.
    pub period: Option<(String, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    sessions: Vec<Session>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sessions(sessions: Vec<Session>) -> Self {
        Self { sessions }
    }

    pub fn append(&mut self, session: Session) {
        self.sessions.push(session);
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn sessions_on<'a>(&'a self, date_key: &'a str) -> impl Iterator<Item = &'a Session> + 'a {
        self.sessions.iter().filter(move |s| s.date_key == date_key)
    }

    /// Next auto-generated name for an untasked session on `date_key`.
    pub fn next_focus_name(&self, date_key: &str) -> String {
        let used = self.sessions_on(date_key).filter(|s| s.is_auto_named()).count();
        format!("{FOCUS_PREFIX}{}", used + 1)
    }

    /// Per-task totals for one day, largest first.
    pub fn day_totals(&self, date_key: &str) -> Vec<TaskTotal> {
        let mut by_name: BTreeMap<&str, TaskTotal> = BTreeMap::new();
        for s in self.sessions_on(date_key) {
            let entry = by_name.entry(s.task_name.as_str()).or_insert_with(|| TaskTotal {
                task_name: s.task_name.clone(),
                task_id: s.task_id.clone(),
                seconds: 0,
                sessions: 0,
            });
            entry.seconds += s.duration_seconds;
            entry.sessions += 1;
        }
        let mut totals: Vec<TaskTotal> = by_name.into_values().collect();
        totals.sort_by(|a, b| b.seconds.cmp(&a.seconds).then(a.task_name.cmp(&b.task_name)));
        totals
    }

    /// Summary over sessions whose date key is within `from..=to`.
    /// Missing bounds are open.
    pub fn summary(&self, from: Option<&str>, to: Option<&str>) -> HistorySummary {
        let selected: Vec<&Session> = self
            .sessions
            .iter()
            .filter(|s| from.map_or(true, |f| s.date_key.as_str() >= f))
            .filter(|s| to.map_or(true, |t| s.date_key.as_str() <= t))
            .collect();

        if selected.is_empty() {
            return HistorySummary::default();
        }

        let total_sessions = selected.len() as u64;
        let total_seconds: u64 = selected.iter().map(|s| s.duration_seconds).sum();
        let unique_tasks = selected
            .iter()
            .map(|s| s.task_name.as_str())
            .collect::<HashSet<_>>()
            .len() as u64;
        let longest_session_seconds = selected
            .iter()
            .map(|s| s.duration_seconds)
            .max()
            .unwrap_or(0);
        let first = selected.iter().map(|s| &s.date_key).min().cloned();
        let last = selected.iter().map(|s| &s.date_key).max().cloned();

        HistorySummary {
            total_sessions,
            total_seconds,
            unique_tasks,
            average_session_seconds: total_seconds / total_sessions,
            longest_session_seconds,
            period: first.zip(last),
        }
    }
}
