//! Receiver stage
//!
//! Per iteration:
//!   1. Ask the Frame Source for one frame (watched, cancellable)
//!   2. Non-empty frame → enqueue it and report its summary
//!   3. Source error → returned to the scheduler, which reports it and halts the stage
//!   4. Wait the inter-attempt interval (cancellable)

use crate::runtime::{Frame, Stage, StageContext, StageKind, StageResult, TransferQueue};
use crate::sources::FrameSource;
use std::time::Duration;
use tracing::trace;

pub struct ReceiverStage {
    source: Box<dyn FrameSource>,
    queue: TransferQueue<Frame>,
    interval: Duration,
    received: u64,
}

impl ReceiverStage {
    pub fn new(
        source: Box<dyn FrameSource>,
        queue: TransferQueue<Frame>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            queue,
            interval,
            received: 0,
        }
    }

    /// Frames enqueued over the lifetime of this stage, across restarts
    pub fn received(&self) -> u64 {
        self.received
    }
}

impl Stage for ReceiverStage {
    fn kind(&self) -> StageKind {
        StageKind::Receiver
    }

    fn operation(&self) -> &str {
        "receive"
    }

    fn start_message(&self) -> String {
        "started, listening for frames".to_string()
    }

    fn work(&mut self, ctx: &StageContext) -> StageResult<usize> {
        let frame = {
            let _guard = ctx.watch();
            self.source.receive(ctx.cancel_token())?
        };

        let mut handled = 0;
        if frame.is_empty() {
            trace!("[{}] Empty frame skipped", ctx.kind());
        } else {
            let summary = frame.summary();
            self.queue.enqueue(frame);
            self.received += 1;
            handled = 1;
            ctx.report(format!("received {} (queued)", summary));
        }

        ctx.pause(self.interval)?;
        Ok(handled)
    }
}
