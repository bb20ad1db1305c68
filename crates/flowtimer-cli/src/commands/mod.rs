pub mod config;
pub mod history;
pub mod task;
pub mod timer;

use std::io::Write;

use flowtimer_core::storage::Database;
use flowtimer_core::{Config, Effect, EffectError, Notifier, SystemClock, TimerEngine};
use serde::Serialize;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Open the engine over the on-disk store with terminal effects attached.
pub fn open_engine() -> Result<TimerEngine<Database>, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();
    let mut notifier = Notifier::new();
    notifier.subscribe(Box::new(terminal_effect));
    Ok(TimerEngine::open(db, config, Box::new(SystemClock), notifier))
}

/// Bell for sounds, a stderr line for notifications.
fn terminal_effect(effect: &Effect) -> Result<(), EffectError> {
    let mut err = std::io::stderr();
    let written = match effect {
        Effect::PlaySound { .. } => write!(err, "\x07"),
        Effect::Notify { title, body } => writeln!(err, "{title}: {body}"),
    };
    written.map_err(|e| EffectError::Other(e.to_string()))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `1h 05m 09s`, `5m 09s` or `9s`.
pub fn format_duration(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h {m:02}m {s:02}s")
    } else if m > 0 {
        format!("{m}m {s:02}s")
    } else {
        format!("{s}s")
    }
}

/// `MM:SS`, or `H:MM:SS` past an hour.
pub fn format_clock(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}
