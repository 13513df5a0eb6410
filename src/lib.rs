pub mod batch;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod imageops_ai;
pub mod model;
pub mod progress_tracker;
pub mod traits;

pub mod mocks;

use std::path::{Path, PathBuf};

pub use batch::BatchSummary;
pub use config::Config;
pub use discovery::{discover_inputs, ExtensionRule};
pub use errors::{BgBatchError, ConvertError, ConvertErrorKind, RemovalError, Result};
pub use model::Model;
pub use progress_tracker::{ConsoleReporter, ProgressReporter};
pub use traits::*;

/// Converts every matching file in one directory, one file at a time.
pub struct BatchConverter<R: BackgroundRemover> {
    remover: R,
    input_dir: PathBuf,
    rule: ExtensionRule,
}

impl<R: BackgroundRemover> BatchConverter<R> {
    pub const fn new(remover: R, input_dir: PathBuf, rule: ExtensionRule) -> Self {
        Self {
            remover,
            input_dir,
            rule,
        }
    }

    pub const fn remover(&self) -> &R {
        &self.remover
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub const fn rule(&self) -> &ExtensionRule {
        &self.rule
    }

    /// Visit every discovered input once, in file name order.
    ///
    /// A failing file is reported and skipped; only discovery errors end the
    /// batch early.
    pub fn process_directory<P: ProgressReporter + ?Sized>(
        &self,
        reporter: &mut P,
    ) -> Result<BatchSummary> {
        let inputs = discover_inputs(&self.input_dir, &self.rule)?;

        reporter.batch_started(inputs.len());
        let mut summary = BatchSummary::new(inputs.len());

        for input in &inputs {
            let outcome = match self.rule.output_path_for(input) {
                Ok(output) => {
                    reporter.file_started(input, &output);
                    batch::process_file(input, &output, &self.remover)
                }
                Err(err) => Err(err),
            };
            reporter.file_finished(input, &outcome);
            summary.record(&outcome);
        }

        reporter.batch_finished(&summary);
        Ok(summary)
    }

    /// 単一ファイルを変換し、導出した出力パスに書き込む
    pub fn convert_file(&self, input: &Path) -> std::result::Result<PathBuf, ConvertError> {
        let output = self.rule.output_path_for(input)?;
        batch::process_file(input, &output, &self.remover)
    }
}

impl BatchConverter<Model> {
    pub fn with_onnx_model(config: &Config) -> Result<Self> {
        let rule = config.extension_rule()?;
        let model = Model::new(&config.model_path, config.device_id, config.output_format()?)?;
        Ok(Self::new(model, config.input_dir.clone(), rule))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{FixedOutputRemover, RecordingReporter};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_convert_file() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let input = temp_dir.path().join("rose.jpeg");
        fs::write(&input, b"jpeg bytes")?;

        let converter = BatchConverter::new(
            FixedOutputRemover::new(b"png bytes".to_vec()),
            temp_dir.path().to_path_buf(),
            ExtensionRule::new("jpeg", "png")?,
        );

        let output = converter.convert_file(&input)?;
        assert_eq!(output, temp_dir.path().join("rose.png"));
        assert_eq!(fs::read(&output)?, b"png bytes");
        Ok(())
    }

    #[test]
    fn test_converter_accessors() -> Result<()> {
        let converter = BatchConverter::new(
            FixedOutputRemover::new(Vec::new()),
            PathBuf::from("flowers"),
            ExtensionRule::new(".jpeg", ".png")?,
        );

        assert_eq!(converter.input_dir(), Path::new("flowers"));
        assert_eq!(converter.rule().source(), "jpeg");
        assert_eq!(converter.rule().target(), "png");
        assert_eq!(converter.remover().calls(), 0);
        Ok(())
    }

    #[test]
    fn test_convert_file_rejects_wrong_extension() -> Result<()> {
        let converter = BatchConverter::new(
            FixedOutputRemover::new(Vec::new()),
            PathBuf::from("."),
            ExtensionRule::new("jpeg", "png")?,
        );

        let err = converter
            .convert_file(Path::new("archive.jpeg.bak"))
            .unwrap_err();
        assert_eq!(err.kind(), ConvertErrorKind::ExtensionMismatch);
        Ok(())
    }

    #[test]
    fn test_process_directory_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let converter = BatchConverter::new(
            FixedOutputRemover::new(Vec::new()),
            temp_dir.path().join("missing"),
            ExtensionRule::new("jpeg", "png").unwrap(),
        );
        let mut reporter = RecordingReporter::default();

        assert!(converter.process_directory(&mut reporter).is_err());
        assert!(reporter.lines.is_empty());
    }
}
