//! TOML-based application configuration.
//!
//! Holds every setting the timer engine consults:
//! - Timer mode (Flow or Pomodoro) and the Flow break policy
//! - Pomodoro work/break durations and cycle count
//! - Whether tasks are enabled and whether starting requires one
//! - Break-complete notification toggles
//!
//! Configuration is stored at `<data_dir>/config.toml` and passed to the
//! engine as a single value.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::timer::{BreakPolicy, PomodoroPlan, TimerKind, MAX_CYCLES};

/// Break percentages offered for the Flow percentage policy.
pub const ALLOWED_BREAK_PERCENTAGES: [u8; 4] = [10, 15, 20, 25];

const DEFAULT_BREAK_PERCENTAGE: u8 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerModeSetting {
    Flow,
    Pomodoro,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakPolicyKind {
    Percentage,
    Fixed,
}

/// Timer mode and Flow break policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_mode")]
    pub mode: TimerModeSetting,
    #[serde(default = "default_true")]
    pub breaks_enabled: bool,
    #[serde(default = "default_break_policy")]
    pub break_policy: BreakPolicyKind,
    #[serde(default = "default_break_percentage")]
    pub break_percentage: u8,
    #[serde(default = "default_fixed_break_minutes")]
    pub fixed_break_minutes: u32,
}

/// Pomodoro cycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PomodoroConfig {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
    #[serde(default = "default_cycles")]
    pub cycles: u32,
}

/// Task feature flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Refuse to start without an active task.
    #[serde(default)]
    pub require_selection: bool,
}

/// Break-complete notification toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub sound: bool,
    #[serde(default = "default_true")]
    pub system: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub pomodoro: PomodoroConfig,
    #[serde(default)]
    pub tasks: TasksConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

// Default functions
fn default_mode() -> TimerModeSetting {
    TimerModeSetting::Flow
}
fn default_break_policy() -> BreakPolicyKind {
    BreakPolicyKind::Percentage
}
fn default_break_percentage() -> u8 {
    DEFAULT_BREAK_PERCENTAGE
}
fn default_fixed_break_minutes() -> u32 {
    5
}
fn default_work_minutes() -> u32 {
    25
}
fn default_break_minutes() -> u32 {
    5
}
fn default_cycles() -> u32 {
    4
}
fn default_true() -> bool {
    true
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            breaks_enabled: true,
            break_policy: default_break_policy(),
            break_percentage: default_break_percentage(),
            fixed_break_minutes: default_fixed_break_minutes(),
        }
    }
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
            cycles: default_cycles(),
        }
    }
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            require_selection: false,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            sound: true,
            system: true,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(format!("expected true/false: {e}")))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|e| invalid(format!("expected a whole number: {e}")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(unknown());
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the default location, writing defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = %e, "falling back to default configuration");
                Self::default()
            }
        }
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. The change is kept only if the whole
    /// configuration still validates.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// or is out of range.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !ALLOWED_BREAK_PERCENTAGES.contains(&self.timer.break_percentage) {
            return Err(ConfigError::InvalidValue {
                key: "timer.break_percentage".into(),
                message: format!("must be one of {ALLOWED_BREAK_PERCENTAGES:?}"),
            });
        }
        if self.pomodoro.work_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "pomodoro.work_minutes".into(),
                message: "must be at least 1".into(),
            });
        }
        if !(1..=MAX_CYCLES).contains(&self.pomodoro.cycles) {
            return Err(ConfigError::InvalidValue {
                key: "pomodoro.cycles".into(),
                message: format!("must be between 1 and {MAX_CYCLES}"),
            });
        }
        Ok(())
    }

    /// Flow-mode break policy. An unsupported percentage falls back to the
    /// default so a hand-edited file cannot stall the engine.
    pub fn break_policy(&self) -> BreakPolicy {
        if !self.timer.breaks_enabled {
            return BreakPolicy::Disabled;
        }
        match self.timer.break_policy {
            BreakPolicyKind::Fixed => BreakPolicy::Fixed {
                seconds: u64::from(self.timer.fixed_break_minutes).saturating_mul(60),
            },
            BreakPolicyKind::Percentage => {
                let pct = self.timer.break_percentage;
                if ALLOWED_BREAK_PERCENTAGES.contains(&pct) {
                    BreakPolicy::Percentage(pct)
                } else {
                    tracing::warn!(
                        break_percentage = pct,
                        "unsupported break percentage, using {DEFAULT_BREAK_PERCENTAGE}"
                    );
                    BreakPolicy::Percentage(DEFAULT_BREAK_PERCENTAGE)
                }
            }
        }
    }

    pub fn pomodoro_plan(&self) -> PomodoroPlan {
        PomodoroPlan {
            work_seconds: u64::from(self.pomodoro.work_minutes.max(1)).saturating_mul(60),
            break_seconds: u64::from(self.pomodoro.break_minutes).saturating_mul(60),
            total_cycles: self.pomodoro.cycles.clamp(1, MAX_CYCLES),
        }
    }

    pub fn timer_kind(&self) -> TimerKind {
        match self.timer.mode {
            TimerModeSetting::Flow => TimerKind::Flow(self.break_policy()),
            TimerModeSetting::Pomodoro => TimerKind::Pomodoro(self.pomodoro_plan()),
        }
    }

    /// True when starting is gated on an active task.
    pub fn requires_task(&self) -> bool {
        self.tasks.enabled && self.tasks.require_selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.timer.mode, TimerModeSetting::Flow);
        assert_eq!(parsed.timer.break_percentage, 20);
        assert_eq!(parsed.pomodoro.cycles, 4);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[timer]\nmode = \"pomodoro\"\n").unwrap();
        assert_eq!(parsed.timer.mode, TimerModeSetting::Pomodoro);
        assert!(parsed.timer.breaks_enabled);
        assert_eq!(parsed.pomodoro.work_minutes, 25);
        assert!(parsed.notifications.sound);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.mode").as_deref(), Some("flow"));
        assert_eq!(cfg.get("pomodoro.work_minutes").as_deref(), Some("25"));
        assert_eq!(cfg.get("tasks.require_selection").as_deref(), Some("false"));
        assert!(cfg.get("timer.missing_key").is_none());
        assert!(cfg.get("timer").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("timer.mode", "pomodoro").unwrap();
        cfg.set("pomodoro.cycles", "2").unwrap();
        cfg.set("notifications.sound", "false").unwrap();
        assert_eq!(cfg.timer.mode, TimerModeSetting::Pomodoro);
        assert_eq!(cfg.pomodoro.cycles, 2);
        assert!(!cfg.notifications.sound);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("timer.nonexistent_key", "value"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.set("timer", "1"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_invalid_values_and_keeps_old_state() {
        let mut cfg = Config::default();
        assert!(cfg.set("timer.breaks_enabled", "not_a_bool").is_err());
        assert!(cfg.set("timer.mode", "marathon").is_err());
        assert!(cfg.set("timer.break_percentage", "30").is_err());
        assert!(cfg.set("pomodoro.cycles", "0").is_err());
        assert!(cfg.set("pomodoro.cycles", "25").is_err());
        assert_eq!(cfg.timer.mode, TimerModeSetting::Flow);
        assert_eq!(cfg.timer.break_percentage, 20);
        assert_eq!(cfg.pomodoro.cycles, 4);
    }

    #[test]
    fn break_policy_follows_settings() {
        let mut cfg = Config::default();
        assert_eq!(cfg.break_policy(), BreakPolicy::Percentage(20));

        cfg.timer.break_policy = BreakPolicyKind::Fixed;
        cfg.timer.fixed_break_minutes = 7;
        assert_eq!(cfg.break_policy(), BreakPolicy::Fixed { seconds: 420 });

        cfg.timer.breaks_enabled = false;
        assert_eq!(cfg.break_policy(), BreakPolicy::Disabled);
    }

    #[test]
    fn unsupported_percentage_falls_back_to_default() {
        let mut cfg = Config::default();
        cfg.timer.break_percentage = 33;
        assert_eq!(cfg.break_policy(), BreakPolicy::Percentage(20));
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.timer.mode, TimerModeSetting::Flow);
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("pomodoro.work_minutes", "50").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().pomodoro.work_minutes, 50);
    }

    #[test]
    fn load_from_broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timer = [not toml").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn requires_task_needs_both_flags() {
        let mut cfg = Config::default();
        cfg.tasks.require_selection = true;
        assert!(cfg.requires_task());
        cfg.tasks.enabled = false;
        assert!(!cfg.requires_task());
    }
}
