//! Runtime support for the two-stage acquisition pipeline

pub mod cancel;
pub mod controller;
pub mod errors;
pub mod events;
pub mod frame;
pub mod pipeline;
pub mod queue;
pub mod scheduler;
pub mod stage;
pub mod state;
pub mod watchdog;

pub use cancel::CancelToken;
pub use controller::PipelineController;
pub use errors::{AcquireError, DecodeError, StageError, StageResult};
pub use events::{ResultSink, StatusEvent, StatusSink, TracingSink};
pub use frame::Frame;
pub use pipeline::Pipeline;
pub use queue::TransferQueue;
pub use scheduler::{SpawnError, StageHandle, spawn_stage};
pub use stage::{Stage, StageContext};
pub use state::{StageKind, StageState, StateReader};
pub use watchdog::{OperationGuard, Watchdog, WatchdogHandle};
