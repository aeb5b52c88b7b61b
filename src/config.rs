//! Pipeline timing configuration

use crate::{AcqError, Result};
use std::time::Duration;

/// Delay between successful receive attempts
pub const DEFAULT_RECEIVE_INTERVAL: Duration = Duration::from_millis(100);
/// Parser wait before re-checking an empty queue
pub const DEFAULT_IDLE_INTERVAL: Duration = Duration::from_millis(50);
/// Time the Parser keeps draining after `stop()` cancels the Receiver
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(1000);
/// Source/Decoder calls blocked longer than this are reported
pub const DEFAULT_WATCHDOG_THRESHOLD: Duration = Duration::from_secs(5);

/// Timing knobs shared by the controller and both stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub receive_interval: Duration,
    pub idle_interval: Duration,
    pub grace_period: Duration,
    pub watchdog_threshold: Duration,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self {
            receive_interval: DEFAULT_RECEIVE_INTERVAL,
            idle_interval: DEFAULT_IDLE_INTERVAL,
            grace_period: DEFAULT_GRACE_PERIOD,
            watchdog_threshold: DEFAULT_WATCHDOG_THRESHOLD,
        }
    }

    pub fn with_receive_interval(mut self, interval: Duration) -> Self {
        self.receive_interval = interval;
        self
    }

    pub fn with_idle_interval(mut self, interval: Duration) -> Self {
        self.idle_interval = interval;
        self
    }

    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace_period = grace;
        self
    }

    pub fn with_watchdog_threshold(mut self, threshold: Duration) -> Self {
        self.watchdog_threshold = threshold;
        self
    }

    /// Reject settings that would make a stage spin without ever waiting
    pub fn validate(&self) -> Result<()> {
        if self.idle_interval.is_zero() {
            return Err(AcqError::Config("idle interval must be non-zero".to_string()));
        }
        if self.watchdog_threshold.is_zero() {
            return Err(AcqError::Config("watchdog threshold must be non-zero".to_string()));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.receive_interval, Duration::from_millis(100));
        assert_eq!(config.idle_interval, Duration::from_millis(50));
        assert_eq!(config.grace_period, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = PipelineConfig::new()
            .with_receive_interval(Duration::from_millis(5))
            .with_idle_interval(Duration::from_millis(2))
            .with_grace_period(Duration::ZERO)
            .with_watchdog_threshold(Duration::from_millis(500));
        assert_eq!(config.receive_interval, Duration::from_millis(5));
        assert_eq!(config.idle_interval, Duration::from_millis(2));
        assert_eq!(config.grace_period, Duration::ZERO);
        assert_eq!(config.watchdog_threshold, Duration::from_millis(500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_idle_interval_rejected() {
        let config = PipelineConfig::new().with_idle_interval(Duration::ZERO);
        assert!(matches!(config.validate(), Err(AcqError::Config(_))));
    }
}
