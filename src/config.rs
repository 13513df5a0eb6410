use clap::Parser;
use image::ImageFormat;
use std::path::PathBuf;

use crate::discovery::ExtensionRule;
use crate::errors::{BgBatchError, Result};

/// Remove the background of every matching image in a directory.
///
/// Each `<name>.<source-ext>` file directly inside INPUT_DIR is written back
/// next to itself as `<name>.<target-ext>`.
#[derive(Parser, Clone, Debug)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Directory holding the images to convert
    pub input_dir: PathBuf,

    /// ONNX segmentation model with an `img` input and a `mask` output
    #[arg(short, long)]
    pub model_path: PathBuf,

    /// Extension of the files to pick up (case-sensitive)
    #[arg(short, long, default_value = "jpeg")]
    pub source_ext: String,

    /// Extension, and image format, of the files to write
    #[arg(short, long, default_value = "png", value_parser = check_format)]
    pub target_ext: String,

    #[arg(short, long, default_value_t = 0)]
    pub device_id: i32,
}

impl Config {
    /// モデルファイルと入力ディレクトリの存在を確認
    pub fn validate(&self) -> Result<()> {
        if !self.model_path.is_file() {
            return Err(BgBatchError::Configuration {
                message: format!("model path {:?} does not exist", self.model_path),
            });
        }
        if !self.input_dir.is_dir() {
            return Err(BgBatchError::Configuration {
                message: format!("input directory {:?} does not exist", self.input_dir),
            });
        }
        Ok(())
    }

    pub fn extension_rule(&self) -> Result<ExtensionRule> {
        ExtensionRule::new(&self.source_ext, &self.target_ext)
    }

    pub fn output_format(&self) -> Result<ImageFormat> {
        let ext = self.target_ext.trim_start_matches('.');
        ImageFormat::from_extension(ext).ok_or_else(|| BgBatchError::Configuration {
            message: format!("`{}` is not a known image format", self.target_ext),
        })
    }
}

fn check_format(s: &str) -> std::result::Result<String, String> {
    let supported: Vec<_> = ImageFormat::all()
        .filter(|f| f.writing_enabled())
        .flat_map(|f| f.extensions_str())
        .map(|s| format!("`{}`", s))
        .collect();
    let supported_message = format!("Supported formats: {}", supported.join(", "));

    let format = ImageFormat::from_extension(s.trim_start_matches('.'))
        .ok_or(format!("{} is not supported. {}", s, supported_message))?;
    if !format.writing_enabled() {
        return Err(format!("{} is not supported. {}", s, supported_message));
    }

    Ok(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["bg-batch", "flowers", "-m", "model.onnx"]).unwrap();

        assert_eq!(config.input_dir, PathBuf::from("flowers"));
        assert_eq!(config.source_ext, "jpeg");
        assert_eq!(config.target_ext, "png");
        assert_eq!(config.device_id, 0);
        assert_eq!(config.output_format().unwrap(), ImageFormat::Png);

        let rule = config.extension_rule().unwrap();
        assert_eq!(rule.source(), "jpeg");
        assert_eq!(rule.target(), "png");
    }

    #[test]
    fn test_custom_extensions() {
        let config = Config::try_parse_from([
            "bg-batch", "shots", "-m", "model.onnx", "-s", ".jpg", "-t", "webp",
        ])
        .unwrap();

        assert_eq!(config.output_format().unwrap(), ImageFormat::WebP);
        assert_eq!(config.extension_rule().unwrap().source(), "jpg");
    }

    #[test]
    fn test_unknown_target_format_rejected() {
        let result =
            Config::try_parse_from(["bg-batch", "shots", "-m", "model.onnx", "-t", "xyz"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_model_path_required() {
        assert!(Config::try_parse_from(["bg-batch", "shots"]).is_err());
    }

    #[test]
    fn test_validate() {
        let temp_dir = TempDir::new().unwrap();
        let model_path = temp_dir.path().join("model.onnx");
        fs::write(&model_path, b"dummy_model").unwrap();

        let mut config = Config {
            input_dir: temp_dir.path().to_path_buf(),
            model_path,
            source_ext: "jpeg".to_string(),
            target_ext: "png".to_string(),
            device_id: 0,
        };
        assert!(config.validate().is_ok());

        config.input_dir = temp_dir.path().join("missing");
        assert!(matches!(
            config.validate(),
            Err(BgBatchError::Configuration { .. })
        ));
    }
}
