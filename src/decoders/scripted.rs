//! Deterministic decoder for tests and demos

use super::Decoder;
use super::types::ParseResult;
use crate::runtime::{DecodeError, Frame};
use std::collections::BTreeSet;

/// Wraps a decoder and fails on chosen call numbers (1-based).
pub struct ScriptedDecoder<D> {
    inner: D,
    fail_on: BTreeSet<usize>,
    calls: usize,
}

impl<D: Decoder> ScriptedDecoder<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            fail_on: BTreeSet::new(),
            calls: 0,
        }
    }

    /// Fail the `call`-th decode (1-based)
    pub fn fail_on(mut self, call: usize) -> Self {
        self.fail_on.insert(call);
        self
    }

    /// Number of decode calls so far
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl<D: Decoder> Decoder for ScriptedDecoder<D> {
    fn decode(&mut self, frame: &Frame) -> Result<ParseResult, DecodeError> {
        self.calls += 1;
        if self.fail_on.contains(&self.calls) {
            return Err(DecodeError::Rejected(format!(
                "scripted failure on call {}",
                self.calls
            )));
        }
        self.inner.decode(frame)
    }
}
