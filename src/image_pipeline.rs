//! Core-scan and radiograph image composition
//!
//! This module turns line-scan core images and radiographs into publishable
//! composites, with separate modules for raster types, decoding/encoding,
//! pixel transforms and pipeline orchestration.

pub mod codec;
pub mod common;
pub mod conversions;
pub mod raster;
pub mod transform;

pub use common::{
    PipelineError,
    Result,
};

pub use raster::{
    BitDepth,
    ColorLayout,
    Image,
};

pub use codec::{
    EncodeOptions,
    ImageReader,
    ImageWriter,
    StandardImageReader,
    StandardImageWriter,
    TiffCompression,
};

pub use transform::ColorPolicy;

pub use conversions::{
    BatchPolicy,
    BatchReport,
    OutputKind,
    OutputNaming,
    PipelineConfig,
    PipelineConfigBuilder,
    PipelineResult,
    PipelineVariant,
    ProgressSink,
    ScanPipeline,
    XrfOutput,
    run_batch,
    run_core_pipeline,
    run_merge_pipeline,
    run_xrf_pipeline,
};
