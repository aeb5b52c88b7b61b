//! Decoder wrapper that injects checksum failures

use super::Decoder;
use super::types::ParseResult;
use crate::faults::FaultInjector;
use crate::runtime::{DecodeError, Frame};
use tracing::trace;

/// Fails with [`DecodeError::Checksum`] at the injector's rate, otherwise
/// delegates to the wrapped decoder.
pub struct FlakyDecoder<D> {
    inner: D,
    faults: FaultInjector,
}

impl<D: Decoder> FlakyDecoder<D> {
    pub fn new(inner: D, faults: FaultInjector) -> Self {
        Self { inner, faults }
    }

    pub fn into_inner(self) -> D {
        self.inner
    }
}

impl<D: Decoder> Decoder for FlakyDecoder<D> {
    fn decode(&mut self, frame: &Frame) -> Result<ParseResult, DecodeError> {
        if self.faults.should_fail() {
            trace!("Injecting checksum failure for {}", frame);
            return Err(DecodeError::Checksum);
        }
        self.inner.decode(frame)
    }
}
