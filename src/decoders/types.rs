//! Decoded frame types

use std::fmt;

/// Structured outcome of decoding one register frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseResult {
    /// Device address (byte 0)
    pub address: u8,
    /// Function code (byte 1)
    pub function: u8,
    /// Register value (bytes 6..8, big-endian)
    pub value: i16,
}

impl ParseResult {
    /// Human-readable one-line summary
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ParseResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "address {}, function 0x{:02X}, value {}",
            self.address, self.function, self.value
        )
    }
}
