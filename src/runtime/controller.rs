//! Start/stop/restart control for the two pipeline stages
//!
//! Each stage lives in a [`Slot`]: parked between runs, active while its
//! thread exists, or lost if that thread panicked. Starting a stage moves it
//! out of the slot into a fresh thread; joining the thread moves it back, so
//! the Frame Source and Decoder keep their position across restarts.
//!
//! Stopping cancels the Receiver at once and arms a drain timer that cancels
//! the Parser after the grace period. A `start` issued before the timer
//! fires disarms it under the same lock the timer takes, so the Parser keeps
//! running.
//!
//! A stage that was cancelled but has not exited yet is joined with the state
//! lock released; meanwhile its slot reads as `Stopping` and state queries,
//! `stop` and the drain timer keep working. Concurrent `start` calls are
//! serialized by a separate gate.

use super::cancel::CancelToken;
use super::events::StatusSink;
use super::frame::Frame;
use super::queue::TransferQueue;
use super::scheduler::{SpawnError, StageHandle, spawn_stage};
use super::stage::Stage;
use super::state::{StageKind, StageState, StateReader};
use super::watchdog::Watchdog;
use crate::config::PipelineConfig;
use crate::stages::{ParserStage, ReceiverStage};
use crate::{AcqError, Result};
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

enum Slot<S> {
    Parked(S),
    Active(StageHandle<S>),
    /// Cancelled thread being joined by `start`
    Stopping(StateReader),
    Lost,
}

impl<S> Slot<S> {
    fn state(&self) -> StageState {
        match self {
            Slot::Parked(_) => StageState::Idle,
            Slot::Active(handle) => handle.state(),
            Slot::Stopping(state) => state.get(),
            Slot::Lost => StageState::Faulted,
        }
    }

    /// Take out a handle whose thread is exiting, leaving `Stopping` behind
    fn take_exiting(&mut self) -> Option<StageHandle<S>> {
        match mem::replace(self, Slot::Lost) {
            Slot::Active(handle) if !handle.is_live() => {
                *self = Slot::Stopping(handle.state_reader());
                Some(handle)
            }
            other => {
                *self = other;
                None
            }
        }
    }

    /// Put a stage back after its thread could not be created
    fn park_failed_spawn(&mut self, kind: StageKind, failed: SpawnError<S>) -> AcqError {
        match failed.stage {
            Some(stage) => *self = Slot::Parked(stage),
            None => *self = Slot::Lost,
        }
        warn!("[{}] Cannot create stage thread: {}", kind, failed.error);
        failed.error
    }

    fn cancel(&self) {
        if let Slot::Active(handle) = self {
            handle.cancel();
        }
    }
}

struct Inner {
    receiver: Slot<ReceiverStage>,
    parser: Slot<ParserStage>,
    /// Disarm switch of the drain timer armed by the last `stop()`
    pending_drain: Option<CancelToken>,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns both stages and the threads running them
pub struct PipelineController {
    inner: Arc<Mutex<Inner>>,
    start_gate: Mutex<()>,
    queue: TransferQueue<Frame>,
    status: Arc<dyn StatusSink>,
    config: PipelineConfig,
    watchdog: Watchdog,
    monitor: Option<JoinHandle<()>>,
}

impl PipelineController {
    pub(crate) fn new(
        receiver: ReceiverStage,
        parser: ParserStage,
        queue: TransferQueue<Frame>,
        status: Arc<dyn StatusSink>,
        config: PipelineConfig,
    ) -> Result<Self> {
        let watchdog = Watchdog::new(config.watchdog_threshold);
        let monitor = watchdog.start_monitoring_thread()?;

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                receiver: Slot::Parked(receiver),
                parser: Slot::Parked(parser),
                pending_drain: None,
            })),
            start_gate: Mutex::new(()),
            queue,
            status,
            config,
            watchdog,
            monitor: Some(monitor),
        })
    }

    /// Start whichever stages are not running, Parser first.
    ///
    /// Calling this while both stages run is a no-op. A Parser drain left
    /// pending by an earlier [`stop`](Self::stop) is aborted. Each stage is
    /// attempted even if the other fails; the first error is returned.
    pub fn start(&self) -> Result<()> {
        let _gate = self
            .start_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let (parser_exiting, receiver_exiting) = {
            let mut inner = lock(&self.inner);
            if let Some(drain) = inner.pending_drain.take() {
                debug!("Aborting pending parser drain");
                drain.cancel();
            }
            (inner.parser.take_exiting(), inner.receiver.take_exiting())
        };

        let parser_joined = parser_exiting.map(Self::reclaim);
        let receiver_joined = receiver_exiting.map(Self::reclaim);

        let mut inner = lock(&self.inner);
        let Inner { receiver, parser, .. } = &mut *inner;
        let parser_started = self.ensure_running(StageKind::Parser, parser, parser_joined);
        let receiver_started = self.ensure_running(StageKind::Receiver, receiver, receiver_joined);
        parser_started.and(receiver_started)
    }

    /// Cancel the Receiver now and the Parser after the grace period
    pub fn stop(&self) {
        let mut inner = lock(&self.inner);

        inner.receiver.cancel();

        if inner.pending_drain.is_some() {
            debug!("Parser drain already pending");
            return;
        }
        let Slot::Active(parser) = &inner.parser else {
            return;
        };
        if !parser.is_live() {
            return;
        }

        let grace = self.config.grace_period;
        info!("Stop requested, parser drains for {:?}", grace);

        let disarm = CancelToken::new();
        let timer_disarm = disarm.clone();
        let shared = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name("parser-drain".to_string())
            .spawn(move || {
                if timer_disarm.sleep(grace) {
                    return;
                }
                let mut inner = lock(&shared);
                // A start() may have won the race for the lock
                if timer_disarm.is_cancelled() {
                    return;
                }
                inner.pending_drain = None;
                debug!("Grace period over, cancelling parser");
                inner.parser.cancel();
            });

        match spawned {
            Ok(_) => inner.pending_drain = Some(disarm),
            Err(e) => {
                warn!("Cannot arm parser drain timer ({}), cancelling parser now", e);
                inner.parser.cancel();
            }
        }
    }

    /// Bring Idle or Faulted stages back up without touching running ones
    pub fn restart(&self) -> Result<()> {
        info!(
            "Restart requested (receiver {}, parser {})",
            self.receiver_state(),
            self.parser_state()
        );
        self.start()
    }

    pub fn receiver_state(&self) -> StageState {
        lock(&self.inner).receiver.state()
    }

    pub fn parser_state(&self) -> StageState {
        lock(&self.inner).parser.state()
    }

    /// The queue between the two stages
    pub fn queue(&self) -> &TransferQueue<Frame> {
        &self.queue
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Join an exiting stage thread; exits within one delay interval
    fn reclaim<S>(handle: StageHandle<S>) -> Result<S> {
        debug!("Reclaiming {} from {:?}", handle.kind(), handle);
        handle.join()
    }

    fn ensure_running<S: Stage + 'static>(
        &self,
        kind: StageKind,
        slot: &mut Slot<S>,
        joined: Option<Result<S>>,
    ) -> Result<()> {
        match joined {
            Some(Ok(stage)) => *slot = Slot::Parked(stage),
            Some(Err(e)) => {
                *slot = Slot::Lost;
                return Err(e);
            }
            None => {}
        }

        let stage = match mem::replace(slot, Slot::Lost) {
            Slot::Parked(stage) => stage,
            Slot::Lost => return Err(AcqError::StageLost(kind)),
            running => {
                *slot = running;
                return Ok(());
            }
        };

        match spawn_stage(stage, Arc::clone(&self.status), &self.watchdog) {
            Ok(handle) => {
                info!("[{}] Running", kind);
                *slot = Slot::Active(handle);
                Ok(())
            }
            Err(failed) => Err(slot.park_failed_spawn(kind, failed)),
        }
    }
}

impl Drop for PipelineController {
    fn drop(&mut self) {
        {
            let mut inner = lock(&self.inner);
            if let Some(drain) = inner.pending_drain.take() {
                drain.cancel();
            }
            inner.receiver.cancel();
            inner.parser.cancel();
        }

        self.watchdog.stop();
        if let Some(monitor) = self.monitor.take() {
            let _ = monitor.join();
        }
        debug!("Pipeline controller dropped");
    }
}
