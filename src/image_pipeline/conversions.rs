//! Pipeline conversions module
//!
//! This module contains the orchestration of the core-scan, radiograph and
//! merge pipelines, plus the configuration, progress and batch plumbing
//! their callers need.

mod batch;
mod config;
mod naming;
mod output;
mod progress;
mod result;
mod scan_pipeline;

#[cfg(test)]
mod tests;

pub use batch::{BatchPolicy, BatchReport, run_batch};
pub use config::{PipelineConfig, PipelineConfigBuilder, XrfOutput};
pub use naming::OutputNaming;
pub use output::{OutputKind, OutputLayout};
pub use progress::{NoProgress, ProgressSink};
pub use result::{PipelineResult, PipelineVariant, WrittenOutput};
pub use scan_pipeline::{ScanPipeline, run_core_pipeline, run_merge_pipeline, run_xrf_pipeline};
