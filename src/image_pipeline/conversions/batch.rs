//! Sequential processing of several inputs, one full pipeline run at a time.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::conversions::result::PipelineResult;

/// What to do when one item of a batch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPolicy {
    /// Stop at the first failure and return its error unchanged.
    #[default]
    AbortOnError,
    /// Record the failure and move on to the next item.
    SkipAndContinue,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<(PathBuf, PipelineResult)>,
    pub failed: Vec<(PathBuf, PipelineError)>,
}

impl BatchReport {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs `run` for each item in order. Items never overlap.
pub fn run_batch<P, F>(items: &[P], policy: BatchPolicy, mut run: F) -> Result<BatchReport>
where
    P: AsRef<Path>,
    F: FnMut(&Path) -> Result<PipelineResult>,
{
    let mut report = BatchReport::default();
    for (idx, item) in items.iter().enumerate() {
        let item = item.as_ref();
        info!("Batch item {}/{}: {}", idx + 1, items.len(), item.display());
        match run(item) {
            Ok(result) => report.succeeded.push((item.to_path_buf(), result)),
            Err(e) => match policy {
                BatchPolicy::AbortOnError => {
                    error!(
                        "{} failed, abandoning {} remaining item(s): {}",
                        item.display(),
                        items.len() - idx - 1,
                        e
                    );
                    return Err(e);
                }
                BatchPolicy::SkipAndContinue => {
                    warn!("{} failed, continuing: {}", item.display(), e);
                    report.failed.push((item.to_path_buf(), e));
                }
            },
        }
    }
    Ok(report)
}
