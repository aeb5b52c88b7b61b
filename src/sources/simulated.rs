//! Simulated register device

use super::FrameSource;
use crate::faults::FaultInjector;
use crate::runtime::{AcquireError, CancelToken, Frame};
use std::time::Duration;
use tracing::trace;

/// Function 0x03 from device 1, register 0x0001, value 0x1234
pub const REFERENCE_FRAME: [u8; 8] = [0x01, 0x03, 0x00, 0x01, 0x00, 0x01, 0x12, 0x34];

/// Returns a fixed payload, failing with [`AcquireError::Timeout`] at the
/// injector's rate (30% by default).
pub struct SimulatedSource {
    payload: &'static [u8],
    faults: FaultInjector,
    latency: Option<Duration>,
}

impl SimulatedSource {
    /// Reference payload with the default 30% failure rate
    pub fn new() -> Self {
        Self::with_faults(FaultInjector::default())
    }

    pub fn with_faults(faults: FaultInjector) -> Self {
        Self {
            payload: &REFERENCE_FRAME,
            faults,
            latency: None,
        }
    }

    /// Replace the payload returned on success
    pub fn with_payload(mut self, payload: &'static [u8]) -> Self {
        self.payload = payload;
        self
    }

    /// Simulate I/O wait before every attempt. The wait is cancellable.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for SimulatedSource {
    fn receive(&mut self, cancel: &CancelToken) -> Result<Frame, AcquireError> {
        if let Some(latency) = self.latency
            && cancel.sleep(latency)
        {
            return Err(AcquireError::Cancelled);
        }
        if cancel.is_cancelled() {
            return Err(AcquireError::Cancelled);
        }
        if self.faults.should_fail() {
            trace!("Injecting receive timeout");
            return Err(AcquireError::Timeout);
        }
        Ok(Frame::from_static(self.payload))
    }
}
