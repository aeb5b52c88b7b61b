//! Two-stage concurrent data acquisition
//!
//! A Receiver stage pulls raw frames from a Frame Source into an unbounded
//! transfer queue; a Parser stage drains the queue through a Decoder and hands
//! each result to a Result Sink. Both stages publish human-readable status
//! lines to a Status Sink, and a controller starts, stops and restarts them.
//!
//! # Architecture
//!
//! - **Sources**: simulated device, scripted outcomes, channel or byte-stream input
//! - **Stages**: one OS thread per stage, cooperative cancellation
//! - **Controller**: idempotent start, grace-period stop, restart of halted stages
//! - **Decoders**: fixed-length register frames, plus fault-injecting wrappers
//!
//! # Example
//!
//! ```no_run
//! use acqpipe::{Pipeline, RegisterDecoder, SimulatedSource};
//!
//! let controller = Pipeline::new(SimulatedSource::new(), RegisterDecoder::new()).build()?;
//! controller.start()?;
//! // ... later
//! controller.stop();
//! # Ok::<(), acqpipe::AcqError>(())
//! ```

use thiserror::Error;

pub mod config;
pub mod decoders;
pub mod faults;
pub mod runtime;
pub mod sources;
pub mod stages;

pub use config::PipelineConfig;
pub use faults::FaultInjector;

// Re-export decoders
pub use decoders::{Decoder, FlakyDecoder, ParseResult, RegisterDecoder, ScriptedDecoder};

// Re-export sources
pub use sources::{
    ChannelSource, FrameSource, REFERENCE_FRAME, ReaderSource, ScriptEntry, ScriptedSource,
    SimulatedSource,
};

// Re-export runtime components
pub use runtime::{
    AcquireError, CancelToken, DecodeError, Frame, Pipeline, PipelineController, ResultSink,
    StageError, StageKind, StageState, StatusEvent, StatusSink, TracingSink, TransferQueue,
};

#[derive(Error, Debug)]
pub enum AcqError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0} thread panicked")]
    StagePanicked(StageKind),

    #[error("{0} was lost to an earlier panic and cannot be restarted")]
    StageLost(StageKind),
}

pub type Result<T> = std::result::Result<T, AcqError>;
