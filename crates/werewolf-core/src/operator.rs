//! Operator control: pause and resume a running game.
//!
//! [`OperatorState`] is shared behind an [`Arc`](std::sync::Arc) between
//! the phase engine and whatever control surface the binary exposes. The
//! engine calls [`OperatorState::wait_if_paused`] before every decision
//! call, so a pause takes effect at the next question and never interrupts
//! one in flight.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Shared pause flag.
#[derive(Debug, Default)]
pub struct OperatorState {
    /// Whether the game is paused.
    paused: AtomicBool,

    /// Wakes the engine when resumed.
    resume_notify: Notify,
}

impl OperatorState {
    /// A running (unpaused) game.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the game is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause before the next decision call.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume and wake the engine.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_waiters();
    }

    /// Return immediately if running, otherwise wait for [`resume`](Self::resume).
    pub async fn wait_if_paused(&self) {
        loop {
            // Register before checking the flag so a resume in between is not lost.
            let notified = self.resume_notify.notified();
            if !self.paused.load(Ordering::Acquire) {
                return;
            }
            notified.await;
        }
    }
}
