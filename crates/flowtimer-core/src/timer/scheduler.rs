//! Frame-loop bookkeeping.
//!
//! The scheduler does not own a thread or a timer. It tracks whether a frame
//! is requested and which handle the request carries; the host (CLI, GUI)
//! waits roughly `FRAME_INTERVAL` and hands the handle back to
//! `TimerEngine::frame`. A cancelled or superseded handle is ignored, so a
//! host that wakes up late after the engine went Idle does nothing.

use std::time::Duration;

/// Suggested delay between frames. Accuracy does not depend on it.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

#[derive(Debug, Default)]
pub struct TickScheduler {
    pending: Option<FrameHandle>,
    issued: u64,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request frames. Re-arming an armed scheduler keeps the current handle.
    pub fn arm(&mut self) -> FrameHandle {
        if let Some(handle) = self.pending {
            return handle;
        }
        self.issued += 1;
        let handle = FrameHandle(self.issued);
        self.pending = Some(handle);
        handle
    }

    /// Stop requesting frames. Returns the cancelled handle, if any.
    pub fn cancel(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// True when `handle` is the live request.
    pub fn accepts(&self, handle: FrameHandle) -> bool {
        self.pending == Some(handle)
    }
}
