use std::path::{Path, PathBuf};

use crate::image_pipeline::conversions::output::OutputKind;

/// Which pipeline produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineVariant {
    CoreScan,
    Xrf,
    Merge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenOutput {
    pub kind: OutputKind,
    pub path: PathBuf,
    pub width: usize,
    pub height: usize,
}

/// Files written by a successful pipeline run, in write order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResult {
    pub variant: PipelineVariant,
    pub outputs: Vec<WrittenOutput>,
}

impl PipelineResult {
    pub(crate) fn new(variant: PipelineVariant) -> Self {
        Self {
            variant,
            outputs: Vec::new(),
        }
    }

    pub fn output(&self, kind: OutputKind) -> Option<&WrittenOutput> {
        self.outputs.iter().find(|o| o.kind == kind)
    }

    pub fn path(&self, kind: OutputKind) -> Option<&Path> {
        self.output(kind).map(|o| o.path.as_path())
    }
}
