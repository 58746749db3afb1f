// src/test_logging.rs

//! Crate-internal log capture for unit tests.
//!
//! The `log` facade allows a single global logger per process, so the
//! capturing logger is installed once and each test snapshots the entries
//! recorded while its closure runs.

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::sync::{Mutex, Once, OnceLock};

static INSTALL: Once = Once::new();
static LOGGER: CaptureLogger = CaptureLogger;

fn buffer() -> &'static Mutex<Vec<(Level, String)>> {
    static BUFFER: OnceLock<Mutex<Vec<(Level, String)>>> = OnceLock::new();
    BUFFER.get_or_init(|| Mutex::new(Vec::new()))
}

struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        buffer()
            .lock()
            .expect("log capture buffer poisoned")
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

/// Runs `f` and returns the log entries recorded while it ran.
///
/// Tests execute in parallel and share the buffer, so entries from other
/// tests may interleave with the caller's; assert with `contains` on messages
/// unique to the caller rather than on exact sequences.
pub(crate) fn capture_logs<F: FnOnce()>(f: F) -> Vec<(Level, String)> {
    INSTALL.call_once(|| {
        log::set_logger(&LOGGER).ok();
        log::set_max_level(LevelFilter::Trace);
    });

    let start = buffer().lock().expect("log capture buffer poisoned").len();
    f();
    let entries = buffer().lock().expect("log capture buffer poisoned");
    entries[start..].to_vec()
}
