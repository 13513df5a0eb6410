use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::errors::ConvertError;
use crate::traits::BackgroundRemover;

/// Counts for one pass over the input directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub found: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub const fn new(found: usize) -> Self {
        Self {
            found,
            succeeded: 0,
            failed: 0,
        }
    }

    pub fn record(&mut self, outcome: &Result<PathBuf, ConvertError>) {
        match outcome {
            Ok(_) => self.succeeded += 1,
            Err(_) => self.failed += 1,
        }
    }

    pub const fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Read `input`, run it through `remover` and write the result to `output`.
///
/// Each step maps to its own [`ConvertError`] variant. The output is only
/// touched once removal has succeeded, and is replaced atomically.
pub fn process_file<R>(
    input: &Path,
    output: &Path,
    remover: &R,
) -> Result<PathBuf, ConvertError>
where
    R: BackgroundRemover + ?Sized,
{
    let image = fs::read(input).map_err(|source| ConvertError::Read {
        path: input.to_path_buf(),
        source,
    })?;

    let removed = remover
        .remove(&image)
        .map_err(|source| ConvertError::Removal {
            path: input.to_path_buf(),
            source,
        })?;

    write_output(output, &removed).map_err(|source| ConvertError::Write {
        path: output.to_path_buf(),
        source,
    })?;

    Ok(output.to_path_buf())
}

/// Stage the bytes next to `output`, then rename over it.
///
/// A failure at any point drops the staged file, leaving `output` as it was.
fn write_output(output: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut builder = tempfile::Builder::new();
    builder.prefix(".bg-batch-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o644));
    }

    let mut staged = builder.tempfile_in(dir)?;
    staged.write_all(bytes)?;
    staged.flush()?;
    staged.persist(output).map_err(|err| err.error)?;
    Ok(())
}
