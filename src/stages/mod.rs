//! The two pipeline stages
//!
//! - [`ReceiverStage`]: drives a Frame Source and feeds the transfer queue
//! - [`ParserStage`]: drains the transfer queue through a Decoder into a Result Sink
//!
//! Both run under the thread-per-stage scheduler and share nothing but the
//! queue.

mod parser;
mod receiver;

pub use parser::ParserStage;
pub use receiver::ReceiverStage;
