//! Watchdog for Frame Source and Decoder calls that stop returning
//!
//! Low-overhead monitoring using atomic timestamps instead of locks.
//! Each stage stores the start time of its current external call in an atomic
//! variable, and the watchdog periodically scans these timestamps to detect
//! calls blocked for longer than the configured threshold.

use super::cancel::CancelToken;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

/// Timestamp in milliseconds since UNIX_EPOCH
#[inline(always)]
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}

/// Shared state for one monitored call site
struct CallState {
    /// Timestamp (ms since epoch) when current call started, or 0 if idle
    last_call_start: AtomicU64,
    /// Track if we've already warned about this call being blocked
    has_warned: AtomicBool,
    stage: String,
    operation: String, // "receive", "decode"
}

/// Handle to a call site's watchdog state (held by the stage context)
#[derive(Clone)]
pub struct WatchdogHandle {
    state: Arc<CallState>,
}

impl WatchdogHandle {
    /// Mark the start of a blocking call (stores current timestamp)
    #[inline(always)]
    pub fn start_operation(&self) {
        self.state.last_call_start.store(now_millis(), Ordering::Relaxed);
        self.state.has_warned.store(false, Ordering::Relaxed);
    }

    /// Mark the end of a blocking call (clears timestamp to 0)
    #[inline(always)]
    pub fn finish_operation(&self) {
        if self.state.has_warned.load(Ordering::Relaxed) {
            info!(
                "UNBLOCKED: [{}] {} returned",
                self.state.stage, self.state.operation
            );
            self.state.has_warned.store(false, Ordering::Relaxed);
        }
        self.state.last_call_start.store(0, Ordering::Relaxed);
    }
}

/// Shared watchdog state
#[derive(Clone)]
pub struct Watchdog {
    calls: Arc<Mutex<Vec<Weak<CallState>>>>,
    threshold: Duration,
    shutdown: CancelToken,
}

impl Watchdog {
    /// Create a new watchdog reporting calls blocked longer than `threshold`
    pub fn new(threshold: Duration) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            threshold,
            shutdown: CancelToken::new(),
        }
    }

    /// Register a new call site for monitoring
    pub fn register(&self, stage: &str, operation: &str) -> WatchdogHandle {
        let state = Arc::new(CallState {
            last_call_start: AtomicU64::new(0),
            has_warned: AtomicBool::new(false),
            stage: stage.to_string(),
            operation: operation.to_string(),
        });

        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::downgrade(&state));

        WatchdogHandle { state }
    }

    /// Check for blocked calls. Returns how many are currently over the threshold.
    pub fn check_for_blocked(&self) -> usize {
        let now = now_millis();
        let threshold_ms = self.threshold.as_millis() as u64;
        let mut blocked = 0;

        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);

        // Remove dead weak references and check live ones
        calls.retain(|weak| {
            let Some(state) = weak.upgrade() else {
                return false;
            };
            let start = state.last_call_start.load(Ordering::Relaxed);
            if start > 0 {
                let duration_ms = now.saturating_sub(start);
                if duration_ms > threshold_ms {
                    blocked += 1;
                    // Only warn once per blocking call
                    if !state.has_warned.swap(true, Ordering::Relaxed) {
                        warn!(
                            "BLOCKED: [{}] {} for {:.1}s",
                            state.stage,
                            state.operation,
                            duration_ms as f64 / 1000.0
                        );
                    }
                }
            }
            true
        });

        blocked
    }

    /// Start the watchdog monitoring thread
    pub fn start_monitoring_thread(&self) -> std::io::Result<JoinHandle<()>> {
        let watchdog = self.clone();
        let period = (self.threshold / 2).clamp(Duration::from_millis(10), Duration::from_secs(1));
        std::thread::Builder::new()
            .name("watchdog".to_string())
            .spawn(move || {
                while !watchdog.shutdown.sleep(period) {
                    watchdog.check_for_blocked();
                }
            })
    }

    /// Stop the watchdog monitoring thread
    pub fn stop(&self) {
        self.shutdown.cancel();
    }
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

/// RAII guard for tracking a call - near-zero cost (just atomic stores)
pub struct OperationGuard<'a> {
    handle: &'a WatchdogHandle,
}

impl<'a> OperationGuard<'a> {
    #[inline(always)]
    pub fn new(handle: &'a WatchdogHandle) -> Self {
        handle.start_operation();
        Self { handle }
    }
}

impl Drop for OperationGuard<'_> {
    #[inline(always)]
    fn drop(&mut self) {
        self.handle.finish_operation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_idle_call_is_not_blocked() {
        let watchdog = Watchdog::new(Duration::from_millis(10));
        let _handle = watchdog.register("receiver", "receive");
        thread::sleep(Duration::from_millis(20));
        assert_eq!(watchdog.check_for_blocked(), 0);
    }

    #[test]
    fn test_long_call_is_reported_until_guard_drops() {
        let watchdog = Watchdog::new(Duration::from_millis(10));
        let handle = watchdog.register("parser", "decode");

        {
            let _guard = OperationGuard::new(&handle);
            thread::sleep(Duration::from_millis(30));
            assert_eq!(watchdog.check_for_blocked(), 1);
        }

        assert_eq!(watchdog.check_for_blocked(), 0);
    }

    #[test]
    fn test_dropped_handles_are_pruned() {
        let watchdog = Watchdog::new(Duration::from_millis(10));
        {
            let handle = watchdog.register("receiver", "receive");
            handle.start_operation();
        }
        thread::sleep(Duration::from_millis(20));
        assert_eq!(watchdog.check_for_blocked(), 0);
        assert!(watchdog.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_monitoring_thread_stops_promptly() {
        let watchdog = Watchdog::new(Duration::from_secs(5));
        let monitor = watchdog.start_monitoring_thread().unwrap();
        let start = std::time::Instant::now();
        watchdog.stop();
        monitor.join().unwrap();
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
