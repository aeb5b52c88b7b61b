//! Fixed-length frames read from a byte stream (socket, serial device, file)

use super::FrameSource;
use crate::runtime::{AcquireError, CancelToken, Frame};
use std::io::{ErrorKind, Read};

/// Reads exactly `frame_len` bytes per call.
///
/// The read itself is not interruptible; cancellation is checked before each
/// read. Use a stream with a read timeout if the stage must stop promptly
/// while the peer is silent.
pub struct ReaderSource<R> {
    reader: R,
    frame_len: usize,
}

impl<R: Read + Send> ReaderSource<R> {
    pub fn new(reader: R, frame_len: usize) -> Self {
        Self { reader, frame_len }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read + Send> FrameSource for ReaderSource<R> {
    fn receive(&mut self, cancel: &CancelToken) -> Result<Frame, AcquireError> {
        if cancel.is_cancelled() {
            return Err(AcquireError::Cancelled);
        }

        let mut buf = vec![0u8; self.frame_len];
        match self.reader.read_exact(&mut buf) {
            Ok(()) => Ok(Frame::from(buf)),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(AcquireError::Disconnected),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Err(AcquireError::Timeout)
            }
            Err(e) => Err(AcquireError::Io(e)),
        }
    }
}
