//! Status and result reporting
//!
//! Stages never touch a display directly. They publish [`StatusEvent`]s and
//! decoded results through the sink traits below; whoever consumes them (a
//! UI, a logger, a test) decides when and how to drain them.

use super::errors::{StageError, StageResult};
use super::state::StageKind;
use crate::decoders::ParseResult;
use chrono::{DateTime, Local};
use crossbeam_channel::Sender as CrossbeamSender;
use std::fmt;
use tracing::{debug, info};

/// Timestamped, human-readable status line from one stage
#[derive(Debug, Clone, PartialEq)]
pub struct StatusEvent {
    pub stage: StageKind,
    pub at: DateTime<Local>,
    pub message: String,
}

impl StatusEvent {
    pub fn new(stage: StageKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            at: Local::now(),
            message: message.into(),
        }
    }
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.at.format("%H:%M:%S"),
            self.stage,
            self.message
        )
    }
}

/// Consumer of status events. Called concurrently from both stage threads.
pub trait StatusSink: Send + Sync {
    fn publish(&self, event: StatusEvent);
}

/// Consumer of decoded results, called from the Parser thread in emission order.
pub trait ResultSink: Send {
    fn deliver(&mut self, result: ParseResult) -> StageResult<()>;
}

impl StatusSink for CrossbeamSender<StatusEvent> {
    fn publish(&self, event: StatusEvent) {
        if self.send(event).is_err() {
            debug!("Status consumer gone, dropping event");
        }
    }
}

impl ResultSink for CrossbeamSender<ParseResult> {
    fn deliver(&mut self, result: ParseResult) -> StageResult<()> {
        self.send(result).map_err(|_| StageError::SinkClosed)
    }
}

/// Sink that writes everything to the `tracing` log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl StatusSink for TracingSink {
    fn publish(&self, event: StatusEvent) {
        info!("[{}] {}", event.stage, event.message);
    }
}

impl ResultSink for TracingSink {
    fn deliver(&mut self, result: ParseResult) -> StageResult<()> {
        info!("Result: {}", result);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_status_display_format() {
        let event = StatusEvent::new(StageKind::Receiver, "started");
        let text = event.to_string();
        assert!(text.starts_with('['));
        assert!(text.ends_with("] receiver: started"));
        // [HH:MM:SS]
        assert_eq!(text.find(']'), Some(9));
    }

    #[test]
    fn test_channel_sinks_forward() {
        let (status_tx, status_rx) = unbounded::<StatusEvent>();
        status_tx.publish(StatusEvent::new(StageKind::Parser, "hello"));
        assert_eq!(status_rx.try_recv().unwrap().message, "hello");

        let (mut result_tx, result_rx) = unbounded::<ParseResult>();
        let result = ParseResult {
            address: 1,
            function: 3,
            value: 7,
        };
        result_tx.deliver(result).unwrap();
        assert_eq!(result_rx.try_recv().unwrap(), result);
    }

    #[test]
    fn test_closed_result_channel_is_an_error() {
        let (mut result_tx, result_rx) = unbounded::<ParseResult>();
        drop(result_rx);
        let err = result_tx
            .deliver(ParseResult {
                address: 0,
                function: 0,
                value: 0,
            })
            .unwrap_err();
        assert!(matches!(err, StageError::SinkClosed));
    }

    #[test]
    fn test_closed_status_channel_is_ignored() {
        let (status_tx, status_rx) = unbounded::<StatusEvent>();
        drop(status_rx);
        status_tx.publish(StatusEvent::new(StageKind::Receiver, "nobody listening"));
    }
}
