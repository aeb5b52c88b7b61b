//! Fixed-format register frame decoder
//!
//! Layout (8 bytes):
//!
//! | byte  | meaning                      |
//! |-------|------------------------------|
//! | 0     | device address               |
//! | 1     | function code                |
//! | 2..6  | reserved                     |
//! | 6..8  | value, big-endian signed 16  |

use super::Decoder;
use super::types::ParseResult;
use crate::runtime::{DecodeError, Frame};

/// Length of a register frame in bytes
pub const FRAME_LEN: usize = 8;

#[derive(Debug, Default, Clone, Copy)]
pub struct RegisterDecoder;

impl RegisterDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for RegisterDecoder {
    fn decode(&mut self, frame: &Frame) -> Result<ParseResult, DecodeError> {
        let bytes = frame.as_bytes();
        if bytes.len() != FRAME_LEN {
            return Err(DecodeError::Length {
                expected: FRAME_LEN,
                actual: bytes.len(),
            });
        }

        Ok(ParseResult {
            address: bytes[0],
            function: bytes[1],
            value: i16::from_be_bytes([bytes[6], bytes[7]]),
        })
    }
}
