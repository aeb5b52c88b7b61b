//! Stage trait for the acquisition loops
//!
//! A stage is one independently running loop. The scheduler owns the loop
//! itself and calls [`Stage::work`] repeatedly; each call performs one
//! iteration (one receive attempt, or one dequeue/decode) including any delay
//! that belongs to that iteration.

use super::cancel::CancelToken;
use super::errors::{StageError, StageResult};
use super::events::{StatusEvent, StatusSink};
use super::state::StageKind;
use super::watchdog::{OperationGuard, WatchdogHandle};
use std::sync::Arc;
use std::time::Duration;

/// Everything a stage may use while running one iteration
pub struct StageContext {
    kind: StageKind,
    cancel: CancelToken,
    status: Arc<dyn StatusSink>,
    watchdog: WatchdogHandle,
}

impl StageContext {
    pub(crate) fn new(
        kind: StageKind,
        cancel: CancelToken,
        status: Arc<dyn StatusSink>,
        watchdog: WatchdogHandle,
    ) -> Self {
        Self {
            kind,
            cancel,
            status,
            watchdog,
        }
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    /// Publish a status line for this stage
    pub fn report(&self, message: impl Into<String>) {
        self.status.publish(StatusEvent::new(self.kind, message));
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancellable delay. Returns `Err(StageError::Cancelled)` if the stage
    /// was cancelled before or during the wait.
    pub fn pause(&self, duration: Duration) -> StageResult<()> {
        if self.cancel.sleep(duration) {
            Err(StageError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Track an external call (Frame Source or Decoder) with the watchdog
    /// until the returned guard is dropped.
    pub fn watch(&self) -> OperationGuard<'_> {
        OperationGuard::new(&self.watchdog)
    }
}

/// One of the two pipeline loops
pub trait Stage: Send {
    /// Which stage this is
    fn kind(&self) -> StageKind;

    /// Name of the external call the watchdog should track
    fn operation(&self) -> &str;

    /// Status line published when a run begins
    fn start_message(&self) -> String {
        "started".to_string()
    }

    /// Run one iteration.
    /// Returns Ok(n) where n is the number of items handled, or Err on failure.
    /// `Err(StageError::Cancelled)` ends the run cleanly; any other error
    /// ends it as Faulted.
    fn work(&mut self, ctx: &StageContext) -> StageResult<usize>;
}
