//! Parser stage
//!
//! Per iteration:
//!   1. Try to take one frame from the transfer queue (non-blocking)
//!   2. Frame → decode it (watched), report the summary, forward the result
//!   3. Decode error → returned to the scheduler, which reports it and halts the stage
//!   4. Empty queue → wait the idle interval (cancellable) before checking again

use crate::decoders::Decoder;
use crate::runtime::{
    Frame, ResultSink, Stage, StageContext, StageKind, StageResult, TransferQueue,
};
use std::time::Duration;
use tracing::trace;

pub struct ParserStage {
    decoder: Box<dyn Decoder>,
    sink: Box<dyn ResultSink>,
    queue: TransferQueue<Frame>,
    idle_interval: Duration,
    decoded: u64,
}

impl ParserStage {
    pub fn new(
        decoder: Box<dyn Decoder>,
        sink: Box<dyn ResultSink>,
        queue: TransferQueue<Frame>,
        idle_interval: Duration,
    ) -> Self {
        Self {
            decoder,
            sink,
            queue,
            idle_interval,
            decoded: 0,
        }
    }

    /// Results delivered over the lifetime of this stage, across restarts
    pub fn decoded(&self) -> u64 {
        self.decoded
    }
}

impl Stage for ParserStage {
    fn kind(&self) -> StageKind {
        StageKind::Parser
    }

    fn operation(&self) -> &str {
        "decode"
    }

    fn start_message(&self) -> String {
        "started, waiting for frames".to_string()
    }

    fn work(&mut self, ctx: &StageContext) -> StageResult<usize> {
        let Some(frame) = self.queue.try_dequeue() else {
            ctx.pause(self.idle_interval)?;
            return Ok(0);
        };

        trace!("[{}] Decoding {}", ctx.kind(), frame);
        let result = {
            let _guard = ctx.watch();
            self.decoder.decode(&frame)?
        };

        ctx.report(format!("decoded {}", result));
        self.sink.deliver(result)?;
        self.decoded += 1;
        Ok(1)
    }
}
