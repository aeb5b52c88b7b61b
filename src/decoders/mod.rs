//! Frame decoders
//!
//! A [`Decoder`] turns one raw [`Frame`](crate::runtime::Frame) into a
//! [`ParseResult`]. The Parser stage owns exactly one decoder and calls it
//! from its own thread, one frame at a time.

pub mod flaky;
pub mod register;
pub mod scripted;
pub mod types;

use crate::runtime::{DecodeError, Frame};

// Re-export common types
pub use types::ParseResult;

// Re-export decoders
pub use flaky::FlakyDecoder;
pub use register::{FRAME_LEN, RegisterDecoder};
pub use scripted::ScriptedDecoder;

/// Turns a raw frame into a structured result, or fails
pub trait Decoder: Send {
    fn decode(&mut self, frame: &Frame) -> Result<ParseResult, DecodeError>;
}

impl<D: Decoder + ?Sized> Decoder for Box<D> {
    fn decode(&mut self, frame: &Frame) -> Result<ParseResult, DecodeError> {
        (**self).decode(frame)
    }
}
