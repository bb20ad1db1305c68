mod clock;
mod engine;
mod persistence;
mod policy;
mod recorder;
mod scheduler;
mod state;

pub use clock::{to_utc, Clock, ManualClock, SystemClock, DATE_KEY_FORMAT};
pub use engine::TimerEngine;
pub use persistence::{
    PersistenceBridge, ACTIVE_TASK_KEY, SESSIONS_KEY, SUGGESTIONS_KEY, TASKS_KEY, TIMER_KEY,
};
pub use policy::{BreakPolicy, PomodoroPlan, PomodoroProgress, TimerKind, MAX_CYCLES};
pub use recorder::{record_session, WorkPeriod};
pub use scheduler::{FrameHandle, TickScheduler, FRAME_INTERVAL};
pub use state::{PersistedTimer, TimerMode, TimerRunState};
