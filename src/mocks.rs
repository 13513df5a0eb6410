use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::batch::BatchSummary;
use crate::errors::{ConvertError, RemovalError};
use crate::progress_tracker::{messages, ProgressReporter};
use crate::traits::BackgroundRemover;

/// テスト用のモック背景除去
///
/// どの入力にも同じバイト列を返す。`rejected` に一致する入力だけは失敗させる
#[derive(Debug, Default)]
pub struct FixedOutputRemover {
    output: Vec<u8>,
    rejected: Vec<Vec<u8>>,
    calls: AtomicUsize,
}

impl FixedOutputRemover {
    pub fn new(output: Vec<u8>) -> Self {
        Self {
            output,
            rejected: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// `input` と完全一致する入力で [`RemovalError::Rejected`] を返す
    pub fn rejecting(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.rejected.push(input.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BackgroundRemover for FixedOutputRemover {
    fn remove(&self, image: &[u8]) -> Result<Vec<u8>, RemovalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.rejected.iter().any(|r| r.as_slice() == image) {
            return Err(RemovalError::Rejected(
                "cannot identify image format".to_string(),
            ));
        }
        Ok(self.output.clone())
    }
}

/// [`crate::ConsoleReporter`] が出力する行を記録するテスト用レポーター
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub lines: Vec<String>,
    pub summary: Option<BatchSummary>,
}

impl ProgressReporter for RecordingReporter {
    fn batch_started(&mut self, total: usize) {
        self.lines.push(messages::found(total));
    }

    fn file_started(&mut self, input: &Path, output: &Path) {
        self.lines.push(messages::processing(input, output));
    }

    fn file_finished(&mut self, input: &Path, outcome: &Result<PathBuf, ConvertError>) {
        self.lines.push(messages::finished(input, outcome));
    }

    fn batch_finished(&mut self, summary: &BatchSummary) {
        self.lines.push(messages::COMPLETED.to_string());
        self.summary = Some(*summary);
    }
}

/// テスト用のファクトリー関数：全ての画像を `b"PNG"` に変換する
pub fn create_mock_remover() -> FixedOutputRemover {
    FixedOutputRemover::new(b"PNG".to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_output_remover() {
        let remover = create_mock_remover().rejecting(b"corrupt".as_slice());

        assert_eq!(remover.remove(b"anything").unwrap(), b"PNG");
        assert!(matches!(
            remover.remove(b"corrupt"),
            Err(RemovalError::Rejected(_))
        ));
        assert_eq!(remover.calls(), 2);
    }

    #[test]
    fn test_recording_reporter_order() {
        let mut reporter = RecordingReporter::default();
        reporter.batch_started(0);
        reporter.batch_finished(&BatchSummary::new(0));

        assert_eq!(
            reporter.lines,
            vec!["Found 0 images to process...", "All done!"]
        );
        assert_eq!(reporter.summary, Some(BatchSummary::new(0)));
    }
}
