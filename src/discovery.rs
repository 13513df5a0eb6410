use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::errors::{BgBatchError, ConvertError, Result};

/// Source and target extensions, stored without a leading dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionRule {
    source: String,
    target: String,
}

impl ExtensionRule {
    pub fn new(source: &str, target: &str) -> Result<Self> {
        let source = normalize_extension("source", source)?;
        let target = normalize_extension("target", target)?;
        if source == target {
            return Err(BgBatchError::Configuration {
                message: format!(
                    "source and target extensions are both `.{source}`; \
                     outputs would overwrite inputs"
                ),
            });
        }
        Ok(Self { source, target })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// True when the file name ends in exactly `.<source>` and has a non-empty stem.
    ///
    /// The comparison is done on the raw name, so names that are not valid
    /// UTF-8 still match.
    pub fn matches(&self, path: &Path) -> bool {
        self.stem_of(path).is_some()
    }

    /// Replace the trailing source extension of the file name with the target one.
    ///
    /// Only the final component is touched, so `a.jpeg.d/b.jpeg.c.jpeg` becomes
    /// `a.jpeg.d/b.jpeg.c.png`.
    pub fn output_path_for(&self, path: &Path) -> std::result::Result<PathBuf, ConvertError> {
        let stem = self
            .stem_of(path)
            .ok_or_else(|| ConvertError::ExtensionMismatch {
                path: path.to_path_buf(),
                expected: self.source.clone(),
            })?;
        let mut name = stem.to_os_string();
        name.push(".");
        name.push(&self.target);
        Ok(path.with_file_name(name))
    }

    fn stem_of<'a>(&self, path: &'a Path) -> Option<&'a OsStr> {
        let name = path.file_name()?;
        let bytes = name.as_encoded_bytes();
        let suffix_len = self.source.len() + 1;
        if bytes.len() <= suffix_len
            || !bytes.ends_with(self.source.as_bytes())
            || bytes[bytes.len() - suffix_len] != b'.'
        {
            return None;
        }

        // peel one extension per dot in `.<source>`
        let mut stem = Path::new(name);
        for _ in 0..=self.source.matches('.').count() {
            stem = Path::new(stem.file_stem()?);
        }
        let stem = stem.as_os_str();
        (stem.as_encoded_bytes().len() == bytes.len() - suffix_len).then_some(stem)
    }
}

fn normalize_extension(field: &str, raw: &str) -> Result<String> {
    let ext = raw.strip_prefix('.').unwrap_or(raw);
    if ext.is_empty() {
        return Err(BgBatchError::Configuration {
            message: format!("{field} extension must not be empty"),
        });
    }
    if ext.contains(['/', '\\']) {
        return Err(BgBatchError::Configuration {
            message: format!("{field} extension `{raw}` must not contain a path separator"),
        });
    }
    Ok(ext.to_string())
}

/// List the files directly inside `input_dir` whose names match `rule`.
///
/// Subdirectories are not descended into. Entries are sorted by file name.
pub fn discover_inputs(input_dir: &Path, rule: &ExtensionRule) -> Result<Vec<PathBuf>> {
    if !input_dir.is_dir() {
        return Err(BgBatchError::FileSystem {
            path: input_dir.to_path_buf(),
            operation: "input directory lookup".to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "input directory does not exist or is not a directory",
            ),
        });
    }

    let mut inputs = Vec::new();
    for entry in WalkDir::new(input_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| BgBatchError::Discovery {
            path: input_dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && rule.matches(path) {
            inputs.push(entry.into_path());
        }
    }

    Ok(inputs)
}
