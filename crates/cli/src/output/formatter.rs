//! Rendering of copy progress, the run summary and diagnostics
//!
//! Progress lines and the summary go to stdout, diagnostics to stderr. A
//! closed stdout (`bcp ... | head`) is not an error: further lines are dropped.

use std::io::{self, Write};

use bcp_core::{CopyRequest, FailedCopy, RunConfig, RunSummary};
use console::Style;
use serde::Serialize;

use super::OutputConfig;

/// Styles applied to the parts of a copy report
#[derive(Debug, Clone)]
struct Theme {
    bucket: Style,
    count: Style,
    done: Style,
    failure: Style,
}

impl Theme {
    fn colored() -> Self {
        Self {
            bucket: Style::new().bold(),
            count: Style::new().cyan(),
            done: Style::new().green(),
            failure: Style::new().red(),
        }
    }

    fn plain() -> Self {
        Self {
            bucket: Style::new(),
            count: Style::new(),
            done: Style::new(),
            failure: Style::new(),
        }
    }
}

/// Final report of a completed run, also the JSON document printed by `--json`
#[derive(Debug, Serialize)]
pub struct CopyReport<'a> {
    pub source_bucket: &'a str,
    pub dest_bucket: &'a str,
    pub retention_days: i64,
    pub copied: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failures: &'a [FailedCopy],
}

impl<'a> CopyReport<'a> {
    pub fn new(config: &'a RunConfig, summary: &'a RunSummary) -> Self {
        Self {
            source_bucket: &config.source_bucket,
            dest_bucket: &config.dest_bucket,
            retention_days: config.retention_days,
            copied: summary.copied,
            skipped: summary.skipped,
            failed: summary.failed,
            failures: &summary.failures,
        }
    }
}

/// Writes everything the copy command shows to the user
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
    theme: Theme,
}

impl Formatter {
    pub fn new(config: OutputConfig) -> Self {
        let theme = if config.no_color || config.json {
            Theme::plain()
        } else {
            Theme::colored()
        };
        Self { config, theme }
    }

    pub fn is_json(&self) -> bool {
        self.config.json
    }

    pub fn is_quiet(&self) -> bool {
        self.config.quiet
    }

    pub fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    /// Whether per-object progress lines are shown
    pub fn shows_progress_lines(&self) -> bool {
        !self.config.json && !self.config.quiet
    }

    /// Print the progress line for a finished copy
    pub fn copied(&self, req: &CopyRequest) {
        if self.shows_progress_lines() {
            write_stdout(&req.progress_line());
        }
    }

    /// Print the report of a completed run
    ///
    /// JSON mode prints the report as one document. Otherwise a one-line
    /// summary goes to stdout (unless quiet) and each failed key to stderr.
    pub fn report(&self, report: &CopyReport<'_>) {
        if self.config.json {
            match serde_json::to_string_pretty(report) {
                Ok(json) => write_stdout(&json),
                Err(e) => eprintln!("Error serializing output: {e}"),
            }
            return;
        }

        if !self.config.quiet {
            write_stdout("");
            write_stdout(&self.headline(report));
        }
        if report.failed > 0 {
            let header = format!("{} object(s) failed to copy:", report.failed);
            write_stderr(&self.theme.failure.apply_to(header).to_string());
            for failure in report.failures {
                write_stderr(&self.failure_line(failure));
            }
        }
    }

    /// Print an error that stopped the run
    ///
    /// Errors are always printed, even in quiet mode.
    pub fn error(&self, message: &str) {
        if self.config.json {
            let error = serde_json::json!({ "error": message });
            let text =
                serde_json::to_string_pretty(&error).unwrap_or_else(|_| message.to_string());
            write_stderr(&text);
        } else {
            write_stderr(&format!("{} {message}", self.theme.failure.apply_to("✗")));
        }
    }

    fn headline(&self, report: &CopyReport<'_>) -> String {
        format!(
            "{} Copy from {} to {} complete: {} copied, {} skipped, {} failed",
            self.theme.done.apply_to("✓"),
            self.theme.bucket.apply_to(report.source_bucket),
            self.theme.bucket.apply_to(report.dest_bucket),
            self.theme.count.apply_to(report.copied),
            self.theme.count.apply_to(report.skipped),
            self.theme.count.apply_to(report.failed),
        )
    }

    fn failure_line(&self, failure: &FailedCopy) -> String {
        format!(
            "  {}: {}",
            failure.key,
            self.theme.failure.apply_to(&failure.error)
        )
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}

fn write_stdout(line: &str) {
    write_line(&mut io::stdout().lock(), line);
}

fn write_stderr(line: &str) {
    write_line(&mut io::stderr().lock(), line);
}

/// Write one line, dropping it when the reader has gone away
fn write_line(out: &mut impl Write, line: &str) {
    match writeln!(out, "{line}") {
        Err(e) if e.kind() != io::ErrorKind::BrokenPipe => {
            tracing::debug!(error = %e, "Failed to write output");
        }
        _ => {}
    }
}
