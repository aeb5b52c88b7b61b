//! Pipeline builder wiring a Frame Source and a Decoder into two stages

use super::controller::PipelineController;
use super::events::{ResultSink, StatusSink, TracingSink};
use super::frame::Frame;
use super::queue::TransferQueue;
use crate::config::PipelineConfig;
use crate::decoders::Decoder;
use crate::sources::FrameSource;
use crate::stages::{ParserStage, ReceiverStage};
use crate::Result;
use std::sync::Arc;
use tracing::info;

/// Collects the pieces of a pipeline. Both sinks default to the `tracing` log.
pub struct Pipeline {
    source: Box<dyn FrameSource>,
    decoder: Box<dyn Decoder>,
    config: PipelineConfig,
    status: Arc<dyn StatusSink>,
    results: Box<dyn ResultSink>,
    queue: TransferQueue<Frame>,
}

impl Pipeline {
    pub fn new(source: impl FrameSource + 'static, decoder: impl Decoder + 'static) -> Self {
        Self {
            source: Box::new(source),
            decoder: Box::new(decoder),
            config: PipelineConfig::default(),
            status: Arc::new(TracingSink),
            results: Box::new(TracingSink),
            queue: TransferQueue::new(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Where both stages publish their status lines
    pub fn with_status_sink(mut self, status: Arc<dyn StatusSink>) -> Self {
        self.status = status;
        self
    }

    /// Where the Parser delivers decoded results
    pub fn with_result_sink(mut self, results: Box<dyn ResultSink>) -> Self {
        self.results = results;
        self
    }

    /// Use an existing queue, e.g. one already holding frames
    pub fn with_queue(mut self, queue: TransferQueue<Frame>) -> Self {
        self.queue = queue;
        self
    }

    /// Validate the configuration and return an idle controller
    pub fn build(self) -> Result<PipelineController> {
        self.config.validate()?;

        info!(
            "Building pipeline: receive interval {:?}, idle interval {:?}, grace period {:?}",
            self.config.receive_interval, self.config.idle_interval, self.config.grace_period
        );

        let receiver = ReceiverStage::new(
            self.source,
            self.queue.clone(),
            self.config.receive_interval,
        );
        let parser = ParserStage::new(
            self.decoder,
            self.results,
            self.queue.clone(),
            self.config.idle_interval,
        );

        PipelineController::new(receiver, parser, self.queue, self.status, self.config)
    }
}
