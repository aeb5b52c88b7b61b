//! Frame sources
//!
//! A [`FrameSource`] produces one raw frame per call. The Receiver stage owns
//! exactly one source and drives it from its own thread.
//!
//! - [`SimulatedSource`]: fixed register frame with injected timeouts
//! - [`ScriptedSource`]: replays a fixed list of outcomes (tests, demos)
//! - [`ChannelSource`]: frames pushed by another thread
//! - [`ReaderSource`]: fixed-length frames read from any byte stream

mod channel;
mod reader;
mod scripted;
mod simulated;

use crate::runtime::{AcquireError, CancelToken, Frame};

pub use channel::ChannelSource;
pub use reader::ReaderSource;
pub use scripted::{ScriptEntry, ScriptedSource};
pub use simulated::{REFERENCE_FRAME, SimulatedSource};

/// Produces raw frames on demand
pub trait FrameSource: Send {
    /// Obtain one frame.
    ///
    /// Implementations that suspend must wake up when `cancel` fires and
    /// return [`AcquireError::Cancelled`].
    fn receive(&mut self, cancel: &CancelToken) -> Result<Frame, AcquireError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn receive(&mut self, cancel: &CancelToken) -> Result<Frame, AcquireError> {
        (**self).receive(cancel)
    }
}
