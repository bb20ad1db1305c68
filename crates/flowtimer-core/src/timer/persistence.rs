//! Persistence bridge between the engine and a [`Store`].
//!
//! Loads never fail: a missing or malformed record becomes its default and
//! is logged. Saves are attempted synchronously after every mutation; a
//! failed save is logged and the in-memory state stays authoritative.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::state::{PersistedTimer, TimerRunState};
use crate::history::{Session, SessionHistory};
use crate::storage::Store;
use crate::task::{Task, TaskRegistry};

pub const TIMER_KEY: &str = "timer_state";
pub const TASKS_KEY: &str = "tasks";
pub const ACTIVE_TASK_KEY: &str = "active_task";
pub const SESSIONS_KEY: &str = "sessions";
pub const SUGGESTIONS_KEY: &str = "task_suggestions";

pub struct PersistenceBridge<S: Store> {
    store: S,
}

impl<S: Store> PersistenceBridge<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Change counter of the underlying store, `None` if it cannot be read.
    pub fn version(&self) -> Option<u64> {
        match self.store.version() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read store version");
                None
            }
        }
    }

    // ── Timer ────────────────────────────────────────────────────────

    pub fn load_timer(&self) -> TimerRunState {
        let Some(persisted) = self.read_json::<PersistedTimer>(TIMER_KEY) else {
            return TimerRunState::idle();
        };
        match TimerRunState::from_persisted(&persisted) {
            Some(state) => state,
            None => {
                tracing::warn!(?persisted, "inconsistent timer snapshot, resetting to idle");
                TimerRunState::idle()
            }
        }
    }

    pub fn save_timer(&self, state: &TimerRunState) {
        self.write_json(TIMER_KEY, &state.to_persisted());
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub fn load_tasks(&self) -> TaskRegistry {
        let tasks = self.read_json::<Vec<Task>>(TASKS_KEY).unwrap_or_default();
        let active = self.read_json::<Option<Task>>(ACTIVE_TASK_KEY).flatten();
        let suggestions = self
            .read_json::<Vec<String>>(SUGGESTIONS_KEY)
            .unwrap_or_default();
        TaskRegistry::from_parts(tasks, active, suggestions)
    }

    pub fn save_tasks(&self, tasks: &TaskRegistry) {
        self.write_json(TASKS_KEY, &tasks.tasks());
        self.write_json(ACTIVE_TASK_KEY, &tasks.active());
        self.write_json(SUGGESTIONS_KEY, &tasks.suggestions());
    }

    // ── History ──────────────────────────────────────────────────────

    pub fn load_history(&self) -> SessionHistory {
        SessionHistory::from_sessions(
            self.read_json::<Vec<Session>>(SESSIONS_KEY)
                .unwrap_or_default(),
        )
    }

    pub fn save_history(&self, history: &SessionHistory) {
        self.write_json(SESSIONS_KEY, &history.sessions());
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!(key, error = %e, "failed to read record");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding malformed record");
                None
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(key, error = %e, "failed to serialize record");
                return;
            }
        };
        if let Err(e) = self.store.set(key, &json) {
            tracing::error!(key, error = %e, "failed to persist record");
        }
    }
}
