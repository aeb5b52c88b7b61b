//! Error types for the stage runtime

use std::io;

/// Error type for a single Frame Source call
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error("network timeout, no data received")]
    Timeout,

    #[error("source disconnected")]
    Disconnected,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("receive cancelled")]
    Cancelled,
}

/// Error type for a single Decoder call
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("frame length {actual} does not match expected {expected}")]
    Length { expected: usize, actual: usize },

    #[error("malformed frame, CRC check failed")]
    Checksum,

    #[error("frame rejected: {0}")]
    Rejected(String),
}

/// Error type for stage work functions
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("receive failed: {0}")]
    Acquire(AcquireError),

    #[error("parse failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("result sink disconnected")]
    SinkClosed,

    #[error("Shutdown signal received")]
    Cancelled,
}

impl From<AcquireError> for StageError {
    fn from(e: AcquireError) -> Self {
        match e {
            AcquireError::Cancelled => StageError::Cancelled,
            other => StageError::Acquire(other),
        }
    }
}

/// Result type for stage work functions
pub type StageResult<T = ()> = Result<T, StageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_receive_maps_to_stage_cancellation() {
        let err: StageError = AcquireError::Cancelled.into();
        assert!(matches!(err, StageError::Cancelled));
    }

    #[test]
    fn failures_carry_their_message() {
        let err: StageError = AcquireError::Timeout.into();
        assert_eq!(err.to_string(), "receive failed: network timeout, no data received");

        let err: StageError = DecodeError::Length {
            expected: 8,
            actual: 3,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "parse failed: frame length 3 does not match expected 8"
        );
    }
}
