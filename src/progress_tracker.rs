use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};

use crate::batch::BatchSummary;
use crate::errors::{display_chain, ConvertError};

/// Receives batch events in order: one `batch_started`, a `file_started` /
/// `file_finished` pair per input, one `batch_finished`.
pub trait ProgressReporter {
    fn batch_started(&mut self, total: usize);
    fn file_started(&mut self, input: &Path, output: &Path);
    fn file_finished(&mut self, input: &Path, outcome: &Result<PathBuf, ConvertError>);
    fn batch_finished(&mut self, summary: &BatchSummary);
}

/// Text of each console line.
pub mod messages {
    use super::*;

    pub const COMPLETED: &str = "All done!";

    pub fn found(total: usize) -> String {
        format!("Found {total} images to process...")
    }

    pub fn processing(input: &Path, output: &Path) -> String {
        format!("Processing: {} -> {}", base_name(input), base_name(output))
    }

    pub fn finished(input: &Path, outcome: &Result<PathBuf, ConvertError>) -> String {
        match outcome {
            Ok(output) => format!("Success: {}", base_name(output)),
            Err(err) => format!("Error processing {}: {}", base_name(input), display_chain(err)),
        }
    }

    pub fn base_name(path: &Path) -> String {
        path.file_name()
            .unwrap_or(path.as_os_str())
            .to_string_lossy()
            .into_owned()
    }
}

/// Prints one line per event to stdout, with a progress bar on stderr while
/// files are being processed.
#[derive(Default)]
pub struct ConsoleReporter {
    progress_bar: Option<ProgressBar>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn print(&self, line: &str) {
        match &self.progress_bar {
            Some(progress_bar) => progress_bar.suspend(|| println!("{line}")),
            None => println!("{line}"),
        }
    }
}

impl ProgressReporter for ConsoleReporter {
    fn batch_started(&mut self, total: usize) {
        self.print(&messages::found(total));
        if total == 0 {
            return;
        }

        let progress_bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
        ) {
            progress_bar.set_style(style.progress_chars("#>-"));
        }
        self.progress_bar = Some(progress_bar);
    }

    fn file_started(&mut self, input: &Path, output: &Path) {
        self.print(&messages::processing(input, output));
    }

    fn file_finished(&mut self, input: &Path, outcome: &Result<PathBuf, ConvertError>) {
        self.print(&messages::finished(input, outcome));
        if let Some(progress_bar) = &self.progress_bar {
            progress_bar.inc(1);
        }
    }

    fn batch_finished(&mut self, _summary: &BatchSummary) {
        if let Some(progress_bar) = self.progress_bar.take() {
            progress_bar.finish_and_clear();
        }
        self.print(messages::COMPLETED);
    }
}
