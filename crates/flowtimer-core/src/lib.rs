//! # Flowtimer Core Library
//!
//! Core logic for a Flow/Pomodoro productivity timer. The CLI binary and any
//! other host are thin layers over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based state machine. The host requests
//!   frames and calls `frame()`/`tick()`; displayed values are always derived
//!   from anchor timestamps, never from counting ticks
//! - **Storage**: A key-value [`Store`] of JSON records (SQLite-backed
//!   [`Database`] or in-process [`MemoryStore`]) and TOML configuration
//! - **Tasks & History**: Task registry with time credit, and the append-only
//!   session log with `Focus #N` naming for unattributed work
//! - **Effects**: Break-complete sound and notification requests delivered
//!   to subscribed listeners
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`Config`]: Application configuration management
//! - [`Notifier`]: Effect listener registry

pub mod effects;
pub mod error;
pub mod events;
pub mod history;
pub mod storage;
pub mod task;
pub mod timer;

pub use effects::{Effect, EffectError, EffectListener, EffectRecorder, Notifier, SoundCue};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use history::{HistorySummary, Session, SessionHistory, TaskTotal};
pub use storage::{Config, Database, MemoryStore, Store};
pub use task::{Task, TaskRegistry};
pub use timer::{
    BreakPolicy, Clock, FrameHandle, ManualClock, SystemClock, TimerEngine, TimerMode,
    TimerRunState,
};
