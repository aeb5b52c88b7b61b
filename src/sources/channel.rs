//! Frames pushed by another thread over a crossbeam channel

use super::FrameSource;
use crate::runtime::{AcquireError, CancelToken, Frame};
use bytes::Bytes;
use crossbeam_channel::{Receiver as CrossbeamReceiver, select};
use std::time::Duration;

/// Waits for the next frame on a channel, waking early on cancellation.
///
/// With a timeout set, a wait that runs out yields [`AcquireError::Timeout`].
/// When every sender is gone the source reports [`AcquireError::Disconnected`].
pub struct ChannelSource {
    rx: CrossbeamReceiver<Bytes>,
    timeout: Option<Duration>,
}

impl ChannelSource {
    pub fn new(rx: CrossbeamReceiver<Bytes>) -> Self {
        Self { rx, timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl FrameSource for ChannelSource {
    fn receive(&mut self, cancel: &CancelToken) -> Result<Frame, AcquireError> {
        if cancel.is_cancelled() {
            return Err(AcquireError::Cancelled);
        }

        let received = match self.timeout {
            Some(timeout) => select! {
                recv(cancel.wake()) -> _ => return Err(AcquireError::Cancelled),
                recv(self.rx) -> msg => msg,
                default(timeout) => return Err(AcquireError::Timeout),
            },
            None => select! {
                recv(cancel.wake()) -> _ => return Err(AcquireError::Cancelled),
                recv(self.rx) -> msg => msg,
            },
        };

        received
            .map(Frame::from)
            .map_err(|_| AcquireError::Disconnected)
    }
}
