//! Fire-and-forget side effects raised by the engine.
//!
//! Collaborators (audio player, desktop notifier) subscribe an
//! [`EffectListener`] to a [`Notifier`] owned by the engine. A listener
//! failure is logged and never interrupts the transition that raised the
//! effect.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    /// Audio cue at the end of a break.
    PlaySound { cue: SoundCue },
    /// User-facing system notification.
    Notify { title: String, body: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    BreakComplete,
    CyclesComplete,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EffectError {
    #[error("notification permission denied")]
    PermissionDenied,
    #[error("audio playback failed: {0}")]
    Playback(String),
    #[error("{0}")]
    Other(String),
}

pub trait EffectListener {
    fn on_effect(&mut self, effect: &Effect) -> Result<(), EffectError>;
}

impl<F> EffectListener for F
where
    F: FnMut(&Effect) -> Result<(), EffectError>,
{
    fn on_effect(&mut self, effect: &Effect) -> Result<(), EffectError> {
        self(effect)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct Notifier {
    listeners: Vec<(SubscriptionId, Box<dyn EffectListener>)>,
    next_id: u64,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<dyn EffectListener>) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.push((id, listener));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver `effect` to every listener, logging failures.
    pub fn dispatch(&mut self, effect: &Effect) {
        for (id, listener) in &mut self.listeners {
            if let Err(e) = listener.on_effect(effect) {
                tracing::warn!(subscription = id.0, ?effect, error = %e, "effect delivery failed");
            }
        }
    }
}

/// Listener that keeps every effect it receives. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct EffectRecorder {
    log: Rc<RefCell<Vec<Effect>>>,
}

impl EffectRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn effects(&self) -> Vec<Effect> {
        self.log.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&Effect) -> bool) -> usize {
        self.log.borrow().iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

impl EffectListener for EffectRecorder {
    fn on_effect(&mut self, effect: &Effect) -> Result<(), EffectError> {
        self.log.borrow_mut().push(effect.clone());
        Ok(())
    }
}
