//! Output directory layout and written-file bookkeeping.

use std::fs;
use std::path::{Path, PathBuf};

use crate::image_pipeline::common::error::{PipelineError, Result};

/// One derivative product of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// Archival TIFF, `tiff/<name>.tif`
    Tiff,
    /// Distribution JPEG, `jpeg/<name>.jpg`
    Jpeg,
    /// Downscaled ICD JPEG, `ICD/<name>.jpg`
    IcdJpeg,
    /// Radiograph TIFF, `radiograph/<name>.tif`
    RadiographTiff,
    /// Legacy radiograph JPEG, `radiograph/<name>.jpg`
    RadiographJpeg,
}

impl OutputKind {
    pub fn directory(self) -> &'static str {
        match self {
            OutputKind::Tiff => "tiff",
            OutputKind::Jpeg => "jpeg",
            OutputKind::IcdJpeg => "ICD",
            OutputKind::RadiographTiff | OutputKind::RadiographJpeg => "radiograph",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputKind::Tiff | OutputKind::RadiographTiff => "tif",
            OutputKind::Jpeg | OutputKind::IcdJpeg | OutputKind::RadiographJpeg => "jpg",
        }
    }
}

/// Resolves output paths beneath a destination root.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, kind: OutputKind, base_name: &str) -> PathBuf {
        self.root
            .join(kind.directory())
            .join(format!("{}.{}", base_name, kind.extension()))
    }

    /// Creates the subdirectories for `kinds` if they are missing. Safe to
    /// call repeatedly.
    pub fn prepare(&self, kinds: &[OutputKind]) -> Result<()> {
        for kind in kinds {
            let dir = self.root.join(kind.directory());
            fs::create_dir_all(&dir).map_err(|e| {
                PipelineError::OutputWriteError(format!("{}: {}", dir.display(), e))
            })?;
        }
        Ok(())
    }
}
