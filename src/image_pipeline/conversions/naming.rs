use std::path::Path;

use crate::image_pipeline::common::error::{PipelineError, Result};

/// Where an output base name comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputNaming {
    /// `cores/HOLE-1A.tif` -> `HOLE-1A`
    #[default]
    InputFileName,
    /// `HOLE-1A/radiograph.tif` -> `HOLE-1A`
    ParentDirectory,
}

impl OutputNaming {
    pub fn base_name_for(self, input: &Path) -> Result<String> {
        let name = match self {
            OutputNaming::InputFileName => input.file_stem(),
            OutputNaming::ParentDirectory => input.parent().and_then(Path::file_name),
        };
        name.map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                PipelineError::invalid(
                    "output_base_name",
                    format!("cannot derive a name from {}", input.display()),
                )
            })
    }
}
