use anyhow::{Context, Result};
use clap::Parser;

use bg_batch::{BatchConverter, Config, ConsoleReporter};

fn main() -> Result<()> {
    let config = Config::parse();
    config.validate()?;

    let converter = BatchConverter::with_onnx_model(&config).with_context(|| {
        format!(
            "Failed to set up the converter with model {}",
            config.model_path.display()
        )
    })?;

    let mut reporter = ConsoleReporter::new();
    converter
        .process_directory(&mut reporter)
        .with_context(|| format!("Failed to scan {}", config.input_dir.display()))?;

    Ok(())
}
