//! Structured diagnostics contract.
//!
//! Every warning or failure site in LDB reports through a [`Logger`] with a
//! subsystem tag and a numeric code that identifies that exact message site.
//! `critical` never returns: it is reserved for broken internal invariants.

use std::fmt;
use std::sync::Mutex;

/// Subsystem tag attached to every log call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Subsystem {
    /// Object store, stream, and database root.
    Odb,
    /// Engineering change order journal.
    Eco,
    /// Command-line front end.
    Cli,
}

impl Subsystem {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Odb => "ODB",
            Self::Eco => "ECO",
            Self::Cli => "CLI",
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a recorded line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Report,
    Info,
    Warn,
    Error,
    Critical,
}

/// Diagnostics sink installed on a database root.
pub trait Logger: Send + Sync {
    /// Plain report line with no subsystem or code (tables, summaries).
    fn report(&self, message: fmt::Arguments<'_>);

    fn info(&self, subsystem: Subsystem, code: u32, message: fmt::Arguments<'_>);

    fn warn(&self, subsystem: Subsystem, code: u32, message: fmt::Arguments<'_>);

    fn error(&self, subsystem: Subsystem, code: u32, message: fmt::Arguments<'_>);

    /// Report a violated internal invariant and terminate.
    fn critical(&self, subsystem: Subsystem, code: u32, message: fmt::Arguments<'_>) -> !;
}

/// Print the "no logger installed" diagnostic and exit.
pub fn missing_logger() -> ! {
    eprintln!("[CRITICAL ODB-0001] No logger is installed in odb.");
    std::process::exit(1)
}

/// Logger that forwards to `tracing` events.
///
/// `critical` emits an error event, echoes the line on stderr, and exits the
/// process with status 1.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn report(&self, message: fmt::Arguments<'_>) {
        tracing::info!(target: "ldb::report", "{}", message);
    }

    fn info(&self, subsystem: Subsystem, code: u32, message: fmt::Arguments<'_>) {
        tracing::info!(subsystem = %subsystem, code, "{}", message);
    }

    fn warn(&self, subsystem: Subsystem, code: u32, message: fmt::Arguments<'_>) {
        tracing::warn!(subsystem = %subsystem, code, "{}", message);
    }

    fn error(&self, subsystem: Subsystem, code: u32, message: fmt::Arguments<'_>) {
        tracing::error!(subsystem = %subsystem, code, "{}", message);
    }

    fn critical(&self, subsystem: Subsystem, code: u32, message: fmt::Arguments<'_>) -> ! {
        tracing::error!(subsystem = %subsystem, code, critical = true, "{}", message);
        eprintln!("[CRITICAL {subsystem}-{code:04}] {message}");
        std::process::exit(1)
    }
}

/// One line captured by [`RecordingLogger`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    pub level: Level,
    pub subsystem: Option<Subsystem>,
    pub code: Option<u32>,
    pub message: String,
}

/// Logger that keeps every line in memory.
///
/// Used by tests and by embedders that want to inspect diagnostics. Its
/// `critical` records the line and then panics.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all captured records.
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }

    /// Messages of all captured records, in order.
    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(|r| r.message.clone()).collect()
    }

    /// Returns `true` if any record carries the given subsystem and code.
    pub fn has_code(&self, subsystem: Subsystem, code: u32) -> bool {
        self.lock()
            .iter()
            .any(|r| r.subsystem == Some(subsystem) && r.code == Some(code))
    }

    /// Drop all captured records.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogRecord>> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn push(&self, level: Level, subsystem: Option<Subsystem>, code: Option<u32>, message: String) {
        self.lock().push(LogRecord {
            level,
            subsystem,
            code,
            message,
        });
    }
}

impl Logger for RecordingLogger {
    fn report(&self, message: fmt::Arguments<'_>) {
        self.push(Level::Report, None, None, message.to_string());
    }

    fn info(&self, subsystem: Subsystem, code: u32, message: fmt::Arguments<'_>) {
        self.push(Level::Info, Some(subsystem), Some(code), message.to_string());
    }

    fn warn(&self, subsystem: Subsystem, code: u32, message: fmt::Arguments<'_>) {
        self.push(Level::Warn, Some(subsystem), Some(code), message.to_string());
    }

    fn error(&self, subsystem: Subsystem, code: u32, message: fmt::Arguments<'_>) {
        self.push(Level::Error, Some(subsystem), Some(code), message.to_string());
    }

    fn critical(&self, subsystem: Subsystem, code: u32, message: fmt::Arguments<'_>) -> ! {
        let text = message.to_string();
        self.push(Level::Critical, Some(subsystem), Some(code), text.clone());
        panic!("[CRITICAL {subsystem}-{code:04}] {text}")
    }
}
