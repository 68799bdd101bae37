//! Console reporting of per-object progress

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bcp_core::{CopyObserver, CopyRequest, Error};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::Formatter;

/// Prints "Copied {key} from {source} to {dest}" for every successful copy
///
/// Invoked concurrently from every pool worker. When a spinner is shown the
/// lines are printed through it so the two never interleave.
pub struct ConsoleObserver {
    formatter: Formatter,
    spinner: Option<ProgressBar>,
    failed: AtomicUsize,
}

impl ConsoleObserver {
    pub fn new(formatter: Formatter, show_progress: bool) -> Self {
        let spinner = (show_progress && !formatter.is_json()).then(|| {
            let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
            let template = if formatter.colors_enabled() {
                "{spinner:.green} {pos} copied, {msg} [{elapsed_precise}]"
            } else {
                "{spinner} {pos} copied, {msg} [{elapsed_precise}]"
            };
            if let Ok(style) = ProgressStyle::with_template(template) {
                pb.set_style(style);
            }
            pb.set_message("0 failed");
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        });

        Self {
            formatter,
            spinner,
            failed: AtomicUsize::new(0),
        }
    }

    /// Stop the spinner before the summary is printed
    pub fn finish(&self) {
        if let Some(pb) = &self.spinner {
            pb.finish_and_clear();
        }
    }
}

impl CopyObserver for ConsoleObserver {
    fn on_copied(&self, req: &CopyRequest) {
        match &self.spinner {
            Some(pb) => {
                pb.suspend(|| self.formatter.copied(req));
                pb.inc(1);
            }
            None => self.formatter.copied(req),
        }
    }

    fn on_failed(&self, _req: &CopyRequest, _error: &Error) {
        let failed = self.failed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(pb) = &self.spinner {
            pb.set_message(format!("{failed} failed"));
        }
    }
}
