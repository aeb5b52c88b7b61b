//! Thread-per-stage scheduler
//!
//! Spawns a dedicated thread for a stage and manages its lifecycle.
//!
//! The thread calls [`Stage::work`] repeatedly until the stage's cancellation
//! token fires or `work` fails. It then records the final state and returns the
//! stage itself through the join handle, so the Frame Source or Decoder it owns
//! survives for the next run.

use super::cancel::CancelToken;
use super::errors::StageError;
use super::events::StatusSink;
use super::stage::{Stage, StageContext};
use super::state::{StageKind, StageState, StateReader, running_cell};
use super::watchdog::Watchdog;
use crate::{AcqError, Result};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// A running (or finished) stage thread
pub struct StageHandle<S> {
    kind: StageKind,
    join: JoinHandle<Option<S>>,
    cancel: CancelToken,
    state: StateReader,
}

impl<S> StageHandle<S> {
    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn state(&self) -> StageState {
        self.state.get()
    }

    pub fn state_reader(&self) -> StateReader {
        self.state.clone()
    }

    /// Signal the loop to stop at its next check point
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the loop is active and has not been asked to stop
    pub fn is_live(&self) -> bool {
        self.state() == StageState::Running && !self.is_cancelled()
    }

    /// Wait for the thread to exit and take the stage back
    pub fn join(self) -> Result<S> {
        let kind = self.kind;
        self.join
            .join()
            .map_err(|_| AcqError::StagePanicked(kind))?
            .ok_or(AcqError::StageLost(kind))
    }
}

impl<S> fmt::Debug for StageHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "StageHandle[{}, state={}, cancelled={}]",
            self.kind,
            self.state(),
            self.is_cancelled()
        )
    }
}

/// Thread creation failed. Carries the stage back so the caller can keep it.
pub struct SpawnError<S> {
    pub error: AcqError,
    /// `None` only if the new thread had already claimed the stage
    pub stage: Option<S>,
}

impl<S> fmt::Debug for SpawnError<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "SpawnError[{}, stage returned={}]",
            self.error,
            self.stage.is_some()
        )
    }
}

impl<S> From<SpawnError<S>> for AcqError {
    fn from(e: SpawnError<S>) -> Self {
        e.error
    }
}

/// Single-use slot passing a stage into its thread. Whoever takes first wins.
struct Handoff<S> {
    slot: Arc<Mutex<Option<S>>>,
}

impl<S> Handoff<S> {
    fn new(stage: S) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(stage))),
        }
    }

    fn take(&self) -> Option<S> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl<S> Clone for Handoff<S> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

/// Start a stage in its own thread
pub fn spawn_stage<S: Stage + 'static>(
    stage: S,
    status: Arc<dyn StatusSink>,
    watchdog: &Watchdog,
) -> std::result::Result<StageHandle<S>, SpawnError<S>> {
    let kind = stage.kind();
    let cancel = CancelToken::new();
    let (writer, state) = running_cell();
    let ctx = StageContext::new(
        kind,
        cancel.clone(),
        status,
        watchdog.register(kind.as_str(), stage.operation()),
    );

    debug!("Starting stage: {}", kind);

    let handoff = Handoff::new(stage);
    let thread_handoff = handoff.clone();
    let spawned = thread::Builder::new()
        .name(kind.as_str().to_string())
        .spawn(move || {
            let mut stage = thread_handoff.take()?;
            ctx.report(stage.start_message());

            let mut items = 0usize;
            let outcome = loop {
                if ctx.is_cancelled() {
                    break StageState::Idle;
                }

                match stage.work(&ctx) {
                    Ok(n) => items += n,
                    Err(StageError::Cancelled) => break StageState::Idle,
                    // A stop always ends clean, even if the interrupted call failed
                    Err(e) if ctx.is_cancelled() => {
                        debug!("[{}] Error after cancellation ignored: {}", kind, e);
                        break StageState::Idle;
                    }
                    Err(e) => {
                        error!("[{}] Work error: {}", kind, e);
                        ctx.report(e.to_string());
                        break StageState::Faulted;
                    }
                }
            };

            info!("[{}] Shutdown ({}). Handled {} items.", kind, outcome, items);
            if outcome == StageState::Idle {
                ctx.report("stopped");
            }

            writer.finish(outcome);
            Some(stage)
        });

    match spawned {
        Ok(join) => Ok(StageHandle {
            kind,
            join,
            cancel,
            state,
        }),
        Err(e) => Err(SpawnError {
            error: e.into(),
            stage: handoff.take(),
        }),
    }
}
