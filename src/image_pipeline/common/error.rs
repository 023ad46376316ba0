use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{source_name} has an unrecognized color depth ({bits}-bit); only 16-bit and 8-bit are accepted")]
    UnexpectedColorDepth { source_name: String, bits: u32 },

    #[error("{source_name} has an unexpected number of color components ({components}); {expected}")]
    UnexpectedComponentCount {
        source_name: String,
        components: usize,
        expected: &'static str,
    },

    #[error("Ruler image ({ruler_width} pixels) is too short for core image ({core_width} pixels)")]
    RulerTooShort { ruler_width: usize, core_width: usize },

    #[error("{property} of images is not uniform: {details}")]
    DimensionMismatch { property: &'static str, details: String },

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Cannot trim {trim_columns} columns from an image {width} pixels wide")]
    TrimOutOfRange { trim_columns: usize, width: usize },

    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Failed to encode image: {0}")]
    EncodeError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PipelineError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        PipelineError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Whether this error belongs to the file-access family (missing,
    /// unreadable, undecodable, unwritable).
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            PipelineError::InputReadError(_)
                | PipelineError::OutputWriteError(_)
                | PipelineError::DecodeError(_)
                | PipelineError::EncodeError(_)
                | PipelineError::IoError(_)
        )
    }

    /// Re-labels color model errors raised by a codec with the path they came from.
    pub fn for_source(self, source: &Path) -> Self {
        match self {
            PipelineError::UnexpectedColorDepth { bits, .. } => PipelineError::UnexpectedColorDepth {
                source_name: source.display().to_string(),
                bits,
            },
            PipelineError::UnexpectedComponentCount {
                components,
                expected,
                ..
            } => PipelineError::UnexpectedComponentCount {
                source_name: source.display().to_string(),
                components,
                expected,
            },
            PipelineError::DecodeError(msg) => {
                PipelineError::DecodeError(format!("{}: {}", source.display(), msg))
            }
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
