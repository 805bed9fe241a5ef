//! Process-wide log capture for tests asserting on socket diagnostics.
//!
//! `logtest` installs one global logger, so every capture goes through a
//! shared lock. Pair this with `#[serial]` when a test asserts on records.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use log::Level;
use logtest::Logger;
use rstest::fixture;

/// One record taken out of the capture buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedRecord {
    pub level: Level,
    pub target: String,
    pub message: String,
}

/// Exclusive access to the captured log stream.
pub struct LoggerHandle {
    guard: MutexGuard<'static, Logger>,
}

impl LoggerHandle {
    /// Lock the shared capture, starting it on first use.
    ///
    /// A test that panicked while holding the lock leaves its records
    /// behind; call [`LoggerHandle::clear`] before the scenario under test.
    #[must_use]
    pub fn new() -> Self {
        static CAPTURE: OnceLock<Mutex<Logger>> = OnceLock::new();

        let guard = CAPTURE
            .get_or_init(|| Mutex::new(Logger::start()))
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Self { guard }
    }

    /// Discard everything captured so far.
    pub fn clear(&mut self) { while self.guard.pop().is_some() {} }

    /// Remove and return every captured record, oldest first.
    pub fn take(&mut self) -> Vec<CapturedRecord> {
        std::iter::from_fn(|| self.guard.pop())
            .map(|record| CapturedRecord {
                level: record.level(),
                target: record.target().to_owned(),
                message: record.args().to_owned(),
            })
            .collect()
    }

    /// Whether a record at `level` mentions `needle`. Consumes the capture.
    pub fn contains(&mut self, level: Level, needle: &str) -> bool {
        self.take()
            .iter()
            .any(|record| record.level == level && record.message.contains(needle))
    }
}

impl Default for LoggerHandle {
    fn default() -> Self { Self::new() }
}

#[allow(
    unused_braces,
    reason = "rustc false positive for single line rstest fixtures"
)]
#[fixture]
pub fn logger() -> LoggerHandle { LoggerHandle::new() }
