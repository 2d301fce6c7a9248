//! Diagnostics channel for the merge pipeline
//!
//! The pipeline never prints on its own. Every notable event goes through a
//! [`Reporter`] handed in by the caller: the binary installs a
//! [`StderrReporter`], tests install a [`CollectingReporter`].

use std::fmt;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::config::ColorMode;

/// How loud a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Events emitted while loading configuration and running a merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    FilterActive {
        filter: String,
    },
    ConfigUnavailable {
        path: PathBuf,
    },
    RunStarted {
        sources: usize,
        workers: usize,
    },
    SourceUnavailable {
        label: String,
        path: PathBuf,
    },
    SourceReadFailed {
        label: String,
        path: PathBuf,
        /// Last line read successfully before the failure
        line: usize,
        error: String,
    },
    IngestFinished {
        elapsed: Duration,
        records: usize,
    },
    SortFinished {
        elapsed: Duration,
        records: usize,
    },
    OutputWritten {
        path: PathBuf,
        records: usize,
    },
    RunFinished {
        elapsed: Duration,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::ConfigUnavailable { .. }
            | Diagnostic::SourceUnavailable { .. }
            | Diagnostic::SourceReadFailed { .. } => Severity::Warning,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::FilterActive { filter } => {
                write!(f, "Filter: '{}' (case insensitive)", filter)
            }
            Diagnostic::ConfigUnavailable { path } => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            Diagnostic::RunStarted { sources, workers } => write!(
                f,
                "Starting processing of {} source(s) (using {} worker(s))",
                sources, workers
            ),
            Diagnostic::SourceUnavailable { label, path } => {
                write!(f, "File not found: {} [{}]", path.display(), label)
            }
            Diagnostic::SourceReadFailed {
                label,
                path,
                line,
                error,
            } => write!(
                f,
                "Read failed after line {} of {} [{}], skipping remainder: {}",
                line,
                path.display(),
                label,
                error
            ),
            Diagnostic::IngestFinished { elapsed, records } => write!(
                f,
                "Files processed in {:.3} sec ({} lines collected)",
                elapsed.as_secs_f64(),
                records
            ),
            Diagnostic::SortFinished { elapsed, records } => write!(
                f,
                "Sorting completed in {:.3} sec, total lines: {}",
                elapsed.as_secs_f64(),
                records
            ),
            Diagnostic::OutputWritten { path, records } => {
                write!(f, "Wrote {} lines to {}", records, path.display())
            }
            Diagnostic::RunFinished { elapsed } => {
                write!(f, "Total execution time: {:.3} sec", elapsed.as_secs_f64())
            }
        }
    }
}

/// Sink for diagnostics; shared by every ingest worker
pub trait Reporter: Send + Sync {
    fn report(&self, diagnostic: &Diagnostic);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _diagnostic: &Diagnostic) {}
}

/// Keeps diagnostics in memory, in arrival order
#[derive(Debug, Default)]
pub struct CollectingReporter {
    collected: Mutex<Vec<Diagnostic>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        match self.collected.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.lock()
            .iter()
            .filter(|d| d.severity() >= Severity::Warning)
            .cloned()
            .collect()
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, diagnostic: &Diagnostic) {
        self.lock().push(diagnostic.clone());
    }
}

/// Writes diagnostics to stderr.
///
/// Quiet level 1 hides informational messages, level 2 also hides warnings.
#[derive(Debug, Clone)]
pub struct StderrReporter {
    quiet: u8,
    no_emoji: bool,
    use_colors: bool,
}

impl StderrReporter {
    pub fn new(quiet: u8, no_emoji: bool, color: ColorMode) -> Self {
        Self {
            quiet,
            no_emoji,
            use_colors: should_use_colors_with_mode(color),
        }
    }

    fn is_visible(&self, severity: Severity) -> bool {
        match severity {
            Severity::Info => self.quiet == 0,
            Severity::Warning => self.quiet < 2,
            Severity::Error => true,
        }
    }

    /// Render one message with the prefix and color for its severity
    pub fn format_message(&self, severity: Severity, message: &str) -> String {
        let prefix = match (self.no_emoji, severity) {
            (true, _) => "logmerge:",
            (false, Severity::Info) => "🔹",
            (false, Severity::Warning) => "⚠️ ",
            (false, Severity::Error) => "❌",
        };

        if !self.use_colors {
            return format!("{} {}", prefix, message);
        }

        let color = match severity {
            Severity::Info => "\x1b[36m",
            Severity::Warning => "\x1b[93m",
            Severity::Error => "\x1b[91m",
        };
        format!("{}{} {}\x1b[0m", color, prefix, message)
    }

    /// Fatal errors bypass the quiet level
    pub fn report_fatal(&self, message: &str) {
        self.emit(Severity::Error, message);
    }

    fn emit(&self, severity: Severity, message: &str) {
        let line = self.format_message(severity, message);
        // Nothing sensible to do if stderr itself is gone
        let _ = writeln!(io::stderr().lock(), "{}", line);
    }
}

impl Reporter for StderrReporter {
    fn report(&self, diagnostic: &Diagnostic) {
        let severity = diagnostic.severity();
        if self.is_visible(severity) {
            self.emit(severity, &diagnostic.to_string());
        }
    }
}

/// Determine if colors should be used based on CLI color mode and environment
pub fn should_use_colors_with_mode(color_mode: ColorMode) -> bool {
    match color_mode {
        ColorMode::Never => false,
        // Even with Always, respect NO_COLOR
        ColorMode::Always => std::env::var_os("NO_COLOR").is_none(),
        ColorMode::Auto => {
            if !io::stderr().is_terminal() || std::env::var_os("NO_COLOR").is_some() {
                return false;
            }
            true
        }
    }
}
