//! Output formatting for human-readable and JSON output

mod formatter;
mod progress;

pub use formatter::{CopyReport, Formatter};
pub use progress::ConsoleObserver;

/// Output settings shared by every command
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Emit a single JSON document instead of text
    pub json: bool,
    /// Disable ANSI colors
    pub no_color: bool,
    /// Suppress progress lines and the summary (errors are still printed)
    pub quiet: bool,
    /// Show a progress spinner on stderr
    pub progress: bool,
}
