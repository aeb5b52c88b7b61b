//! Raw frame carried from the Receiver to the Parser

use bytes::Bytes;
use std::fmt;

/// One unit of raw bytes produced by a Frame Source.
///
/// Not `Clone`: a frame moves from the source into the queue and
/// from the queue into exactly one decode call.
#[derive(PartialEq, Eq)]
pub struct Frame {
    bytes: Bytes,
}

impl Frame {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn from_static(bytes: &'static [u8]) -> Self {
        Self {
            bytes: Bytes::from_static(bytes),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Hex dump, e.g. `01-03-00-01-00-01-12-34`
    pub fn summary(&self) -> String {
        self.bytes
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join("-")
    }
}

impl From<Bytes> for Frame {
    fn from(bytes: Bytes) -> Self {
        Self { bytes }
    }
}

impl From<Vec<u8>> for Frame {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Frame[{}]", self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_is_dash_separated_hex() {
        let frame = Frame::from_static(&[0x01, 0x03, 0x00, 0x01, 0x00, 0x01, 0x12, 0x34]);
        assert_eq!(frame.summary(), "01-03-00-01-00-01-12-34");
        assert_eq!(frame.len(), 8);
        assert!(!frame.is_empty());
    }

    #[test]
    fn test_empty_frame() {
        let frame = Frame::new(Vec::new());
        assert!(frame.is_empty());
        assert_eq!(frame.summary(), "");
    }
}
