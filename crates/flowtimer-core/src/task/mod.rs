//! Task registry.
//!
//! Tasks are the named buckets that work sessions are attributed to. The
//! registry owns the ordered task list, the active-task pointer and the
//! suggestion history used to offer recently used names. The timer engine
//! only ever adds worked seconds to a task; every other mutation is an
//! explicit user operation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Maximum number of names kept in the suggestion history.
pub const MAX_SUGGESTIONS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    /// Cumulative worked seconds across all sessions.
    #[serde(default)]
    pub time_spent_total: u64,
    /// Optional goal in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_goal: Option<u64>,
    /// Creation time (epoch milliseconds).
    pub created_at: i64,
}

impl Task {
    /// Fraction of the goal reached, `None` without a goal.
    pub fn goal_progress(&self) -> Option<f64> {
        match self.estimated_goal {
            Some(0) | None => None,
            Some(goal) => Some(self.time_spent_total as f64 / goal as f64),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
    active_id: Option<String>,
    suggestions: Vec<String>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from its persisted parts.
    ///
    /// An active task that no longer exists in `tasks` is dropped.
    pub fn from_parts(tasks: Vec<Task>, active: Option<Task>, suggestions: Vec<String>) -> Self {
        let active_id = active
            .map(|t| t.id)
            .filter(|id| tasks.iter().any(|t| &t.id == id));
        let mut suggestions = suggestions;
        suggestions.truncate(MAX_SUGGESTIONS);
        Self {
            tasks,
            active_id,
            suggestions,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn active(&self) -> Option<&Task> {
        self.active_id.as_deref().and_then(|id| self.get(id))
    }

    /// Recently used task names, most recent first.
    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn add(
        &mut self,
        name: &str,
        estimated_goal: Option<u64>,
        now_ms: i64,
    ) -> Result<Task, ValidationError> {
        let name = clean_name(name)?;
        let task = Task {
            id: Uuid::new_v4().to_string(),
            name,
            time_spent_total: 0,
            estimated_goal,
            created_at: now_ms,
        };
        self.tasks.push(task.clone());
        Ok(task)
    }

    pub fn rename(&mut self, id: &str, name: &str) -> Result<&Task, ValidationError> {
        let name = clean_name(name)?;
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ValidationError::UnknownTask(id.to_string()))?;
        task.name = name;
        Ok(task)
    }

    /// Delete a task, clearing the active pointer and suggestion entries
    /// that refer to it. Recorded sessions keep their name snapshot.
    pub fn delete(&mut self, id: &str) -> Result<Task, ValidationError> {
        let pos = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| ValidationError::UnknownTask(id.to_string()))?;
        let removed = self.tasks.remove(pos);
        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
        }
        self.suggestions.retain(|s| s != &removed.name);
        Ok(removed)
    }

    pub fn select(&mut self, id: Option<&str>) -> Result<(), ValidationError> {
        match id {
            None => self.active_id = None,
            Some(id) => {
                if self.get(id).is_none() {
                    return Err(ValidationError::UnknownTask(id.to_string()));
                }
                self.active_id = Some(id.to_string());
            }
        }
        Ok(())
    }

    /// Add worked seconds to a task. Returns the updated task.
    pub fn credit(&mut self, id: &str, seconds: u64) -> Option<&Task> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        task.time_spent_total = task.time_spent_total.saturating_add(seconds);
        Some(task)
    }

    /// Move `name` to the front of the suggestion history.
    pub fn remember(&mut self, name: &str) {
        self.suggestions.retain(|s| s != name);
        self.suggestions.insert(0, name.to_string());
        self.suggestions.truncate(MAX_SUGGESTIONS);
    }
}

fn clean_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName {
            field: "task name".into(),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(names: &[&str]) -> (TaskRegistry, Vec<Task>) {
        let mut reg = TaskRegistry::new();
        let tasks = names
            .iter()
            .map(|n| reg.add(n, None, 0).unwrap())
            .collect();
        (reg, tasks)
    }

    #[test]
    fn add_trims_and_rejects_empty_names() {
        let mut reg = TaskRegistry::new();
        let task = reg.add("  Write docs ", Some(3600), 42).unwrap();
        assert_eq!(task.name, "Write docs");
        assert_eq!(task.created_at, 42);
        assert_eq!(
            reg.add("   ", None, 0),
            Err(ValidationError::EmptyName {
                field: "task name".into()
            })
        );
        assert_eq!(reg.tasks().len(), 1);
    }

    #[test]
    fn delete_cascades_to_active_and_suggestions() {
        let (mut reg, tasks) = registry_with(&["Deploy", "Review"]);
        reg.select(Some(&tasks[0].id)).unwrap();
        reg.remember("Deploy");
        reg.remember("Review");

        reg.delete(&tasks[0].id).unwrap();

        assert!(reg.active().is_none());
        assert_eq!(reg.suggestions(), &["Review".to_string()]);
        assert_eq!(reg.tasks().len(), 1);
    }

    #[test]
    fn delete_other_task_keeps_active() {
        let (mut reg, tasks) = registry_with(&["Deploy", "Review"]);
        reg.select(Some(&tasks[0].id)).unwrap();
        reg.delete(&tasks[1].id).unwrap();
        assert_eq!(reg.active().map(|t| t.name.as_str()), Some("Deploy"));
    }

    #[test]
    fn select_unknown_task_fails() {
        let mut reg = TaskRegistry::new();
        assert_eq!(
            reg.select(Some("missing")),
            Err(ValidationError::UnknownTask("missing".into()))
        );
    }

    #[test]
    fn credit_accumulates_time() {
        let (mut reg, tasks) = registry_with(&["Deploy"]);
        reg.credit(&tasks[0].id, 100);
        let task = reg.credit(&tasks[0].id, 20).unwrap();
        assert_eq!(task.time_spent_total, 120);
    }

    #[test]
    fn remember_dedupes_and_caps() {
        let mut reg = TaskRegistry::new();
        for i in 0..15 {
            reg.remember(&format!("task {i}"));
        }
        reg.remember("task 10");
        assert_eq!(reg.suggestions().len(), MAX_SUGGESTIONS);
        assert_eq!(reg.suggestions()[0], "task 10");
        assert_eq!(
            reg.suggestions().iter().filter(|s| *s == "task 10").count(),
            1
        );
    }

    #[test]
    fn from_parts_drops_dangling_active_task() {
        let (reg, tasks) = registry_with(&["Deploy"]);
        let mut ghost = tasks[0].clone();
        ghost.id = "gone".into();
        let rebuilt = TaskRegistry::from_parts(reg.tasks().to_vec(), Some(ghost), vec![]);
        assert!(rebuilt.active().is_none());
    }

    #[test]
    fn goal_progress_ratio() {
        let mut task = Task {
            id: "t".into(),
            name: "t".into(),
            time_spent_total: 1800,
            estimated_goal: Some(3600),
            created_at: 0,
        };
        assert_eq!(task.goal_progress(), Some(0.5));
        task.estimated_goal = None;
        assert_eq!(task.goal_progress(), None);
    }
}
