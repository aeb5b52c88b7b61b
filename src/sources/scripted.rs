//! Scripted frame source for tests and demos

use super::FrameSource;
use crate::runtime::{AcquireError, CancelToken, Frame};
use std::collections::VecDeque;
use std::time::Duration;

/// How long an exhausted script parks between cancellation checks
const PARK_INTERVAL: Duration = Duration::from_secs(3600);

/// One scripted receive outcome
pub struct ScriptEntry {
    outcome: Result<Frame, AcquireError>,
    delay: Option<Duration>,
}

impl ScriptEntry {
    pub fn immediate(outcome: Result<Frame, AcquireError>) -> Self {
        Self {
            outcome,
            delay: None,
        }
    }

    /// Outcome returned after a cancellable delay
    pub fn with_delay(outcome: Result<Frame, AcquireError>, delay: Duration) -> Self {
        Self {
            outcome,
            delay: Some(delay),
        }
    }
}

impl From<Result<Frame, AcquireError>> for ScriptEntry {
    fn from(outcome: Result<Frame, AcquireError>) -> Self {
        Self::immediate(outcome)
    }
}

impl From<Frame> for ScriptEntry {
    fn from(frame: Frame) -> Self {
        Self::immediate(Ok(frame))
    }
}

/// Replays scripted outcomes in order. Once the script is exhausted, every
/// call suspends until the stage is cancelled.
#[derive(Default)]
pub struct ScriptedSource {
    script: VecDeque<ScriptEntry>,
    calls: usize,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<Frame, AcquireError>>) -> Self {
        Self::with_script(script.into_iter().map(ScriptEntry::from).collect())
    }

    pub fn with_script(script: Vec<ScriptEntry>) -> Self {
        Self {
            script: script.into(),
            calls: 0,
        }
    }

    /// Script that yields each frame once, in order
    pub fn frames(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self::with_script(frames.into_iter().map(ScriptEntry::from).collect())
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    /// Number of receive calls so far, including ones that failed
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl FrameSource for ScriptedSource {
    fn receive(&mut self, cancel: &CancelToken) -> Result<Frame, AcquireError> {
        let Some(entry) = self.script.pop_front() else {
            while !cancel.sleep(PARK_INTERVAL) {}
            return Err(AcquireError::Cancelled);
        };

        if let Some(delay) = entry.delay
            && cancel.sleep(delay)
        {
            self.script.push_front(entry);
            return Err(AcquireError::Cancelled);
        }

        self.calls += 1;
        entry.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_replays_in_order() {
        let mut source = ScriptedSource::new(vec![
            Ok(Frame::from_static(&[1])),
            Err(AcquireError::Timeout),
            Ok(Frame::from_static(&[2])),
        ]);
        let cancel = CancelToken::new();

        assert_eq!(source.receive(&cancel).unwrap().as_bytes(), &[1]);
        assert!(matches!(source.receive(&cancel), Err(AcquireError::Timeout)));
        assert_eq!(source.receive(&cancel).unwrap().as_bytes(), &[2]);
        assert_eq!(source.remaining(), 0);
        assert_eq!(source.calls(), 3);
    }

    #[test]
    fn test_scripted_delay_respected() {
        let mut source = ScriptedSource::with_script(vec![ScriptEntry::with_delay(
            Ok(Frame::from_static(&[7])),
            Duration::from_millis(5),
        )]);
        let start = Instant::now();
        let frame = source.receive(&CancelToken::new()).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(5));
        assert_eq!(frame.as_bytes(), &[7]);
    }

    #[test]
    fn test_cancelled_delay_keeps_entry() {
        let mut source = ScriptedSource::with_script(vec![ScriptEntry::with_delay(
            Ok(Frame::from_static(&[7])),
            Duration::from_secs(30),
        )]);
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(source.receive(&cancel), Err(AcquireError::Cancelled)));
        assert_eq!(source.remaining(), 1);
        assert_eq!(source.calls(), 0);
    }

    #[test]
    fn test_exhausted_script_parks_until_cancelled() {
        let mut source = ScriptedSource::default();
        let cancel = CancelToken::new();
        let remote = cancel.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.cancel();
        });

        let start = Instant::now();
        assert!(matches!(source.receive(&cancel), Err(AcquireError::Cancelled)));
        assert!(start.elapsed() >= Duration::from_millis(20));
        canceller.join().unwrap();
    }
}
