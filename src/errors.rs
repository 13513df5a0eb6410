use std::path::{Path, PathBuf};
use thiserror::Error;

/// Batch-level errors: anything that prevents the batch from running at all.
///
/// Per-file failures never surface here. They are reported as [`ConvertError`]
/// and the batch moves on to the next file.
#[derive(Error, Debug)]
pub enum BgBatchError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Filesystem error: {operation} failed for {path:?}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Discovery error: could not list {path:?}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Model error: {operation} failed")]
    Model {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type Result<T> = std::result::Result<T, BgBatchError>;

/// Failure of a single background-removal call.
#[derive(Error, Debug)]
pub enum RemovalError {
    #[error("unsupported or malformed image data")]
    Decode(#[source] image::ImageError),

    #[error("segmentation model failed during {operation}")]
    Model {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("could not encode the result")]
    Encode(#[source] image::ImageError),

    #[error("{0}")]
    Rejected(String),
}

/// Convert ONNX Runtime errors to model errors.
impl From<ort::Error> for RemovalError {
    fn from(err: ort::Error) -> Self {
        Self::Model {
            operation: "ort operation".to_string(),
            source: err.to_string().into(),
        }
    }
}

/// Shape errors come out of tensor handling around inference, so they count as
/// model errors.
impl From<ndarray::ShapeError> for RemovalError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::Model {
            operation: "tensor shape conversion".to_string(),
            source: Box::new(err),
        }
    }
}

/// Which step of converting one file went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertErrorKind {
    Read,
    Removal,
    Write,
    ExtensionMismatch,
}

/// Failure while converting one input file.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("could not read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("background removal failed for {}", .path.display())]
    Removal {
        path: PathBuf,
        #[source]
        source: RemovalError,
    },

    #[error("could not write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} does not end in `.{expected}`", .path.display())]
    ExtensionMismatch { path: PathBuf, expected: String },
}

impl ConvertError {
    pub const fn kind(&self) -> ConvertErrorKind {
        match self {
            Self::Read { .. } => ConvertErrorKind::Read,
            Self::Removal { .. } => ConvertErrorKind::Removal,
            Self::Write { .. } => ConvertErrorKind::Write,
            Self::ExtensionMismatch { .. } => ConvertErrorKind::ExtensionMismatch,
        }
    }

    /// The path the failing step was working on. For writes this is the output.
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. }
            | Self::Removal { path, .. }
            | Self::Write { path, .. }
            | Self::ExtensionMismatch { path, .. } => path,
        }
    }
}

/// Render an error followed by every `source()` in its chain, separated by `: `.
pub fn display_chain(err: &(dyn std::error::Error + 'static)) -> String {
    anyhow::Chain::new(err)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_path() {
        let err = ConvertError::Removal {
            path: PathBuf::from("flowers/corrupt.jpeg"),
            source: RemovalError::Rejected("bad header".to_string()),
        };
        assert_eq!(err.kind(), ConvertErrorKind::Removal);
        assert_eq!(err.path(), Path::new("flowers/corrupt.jpeg"));
    }

    #[test]
    fn test_display_chain_includes_causes() {
        let err = ConvertError::Read {
            path: PathBuf::from("rose.jpeg"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied"),
        };
        assert_eq!(display_chain(&err), "could not read rose.jpeg: access denied");
    }

    #[test]
    fn test_display_chain_nested_removal() {
        let err = ConvertError::Removal {
            path: PathBuf::from("corrupt.jpeg"),
            source: RemovalError::Model {
                operation: "inference".to_string(),
                source: "out of memory".into(),
            },
        };
        assert_eq!(
            display_chain(&err),
            "background removal failed for corrupt.jpeg: \
             segmentation model failed during inference: out of memory"
        );
    }
}
