//! Per-stage lifecycle state
//!
//! Each run of a stage gets a fresh cell, created in the `Running` state. The
//! writer half moves into the stage thread and is the only way to change the
//! cell; everyone else holds a [`StateReader`].

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Which loop a state, status event or error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Receiver,
    Parser,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Receiver => "receiver",
            StageKind::Parser => "parser",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StageState {
    /// Not started, or stopped cleanly
    Idle = 0,
    /// Loop is active
    Running = 1,
    /// Loop exited on an unrecovered error; needs an explicit restart
    Faulted = 2,
}

impl StageState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => StageState::Running,
            2 => StageState::Faulted,
            _ => StageState::Idle,
        }
    }
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            StageState::Idle => "idle",
            StageState::Running => "running",
            StageState::Faulted => "faulted",
        };
        f.write_str(s)
    }
}

/// Create a fresh state cell in the `Running` state
pub(crate) fn running_cell() -> (StateWriter, StateReader) {
    let cell = Arc::new(AtomicU8::new(StageState::Running as u8));
    (
        StateWriter {
            cell: Arc::clone(&cell),
        },
        StateReader { cell },
    )
}

/// Exclusive write access, owned by the stage thread
pub(crate) struct StateWriter {
    cell: Arc<AtomicU8>,
}

impl StateWriter {
    /// Record the final state of this run
    pub(crate) fn finish(self, state: StageState) {
        self.cell.store(state as u8, Ordering::Release);
    }
}

impl Drop for StateWriter {
    fn drop(&mut self) {
        // Thread unwound without finishing
        let _ = self.cell.compare_exchange(
            StageState::Running as u8,
            StageState::Faulted as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

/// Read-only view of a stage's state
#[derive(Clone)]
pub struct StateReader {
    cell: Arc<AtomicU8>,
}

impl StateReader {
    pub fn get(&self) -> StageState {
        StageState::from_u8(self.cell.load(Ordering::Acquire))
    }
}

impl fmt::Debug for StateReader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "StateReader[{}]", self.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cell_is_running() {
        let (_writer, reader) = running_cell();
        assert_eq!(reader.get(), StageState::Running);
    }

    #[test]
    fn test_finish_sets_final_state() {
        let (writer, reader) = running_cell();
        writer.finish(StageState::Idle);
        assert_eq!(reader.get(), StageState::Idle);
    }

    #[test]
    fn test_dropped_writer_marks_faulted() {
        let (writer, reader) = running_cell();
        drop(writer);
        assert_eq!(reader.get(), StageState::Faulted);
    }

    #[test]
    fn test_writer_dropped_in_panicking_thread() {
        let (writer, reader) = running_cell();
        let result = std::thread::spawn(move || {
            let _writer = writer;
            panic!("boom");
        })
        .join();
        assert!(result.is_err());
        assert_eq!(reader.get(), StageState::Faulted);
    }
}
