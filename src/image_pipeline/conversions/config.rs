//! Pipeline configuration types

use std::path::PathBuf;

use crate::image_pipeline::codec::{EncodeOptions, TiffCompression};
use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::transform::ColorPolicy;

/// Output product of the radiograph pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XrfOutput {
    /// Single-component TIFF at the source bit depth
    #[default]
    Tiff,
    /// 8-bit JPEG with grayscale triplicated to RGB
    LegacyJpeg,
}

/// Configuration shared by the core-scan, radiograph and merge pipelines
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Pixels per inch of both the core images and the ruler
    pub dpi: f64,
    /// Inches removed from the core-top edge
    pub trim_inches: f64,
    /// Percentage applied to the ICD derivative
    pub icd_scaling_percent: f64,
    /// Contrast exponent, radiographs only
    pub gamma: f64,
    /// Filename stem shared by every output
    pub output_base_name: String,
    /// Directory receiving the `tiff/`, `jpeg/`, `ICD/` or `radiograph/` subdirectories
    pub destination_root: PathBuf,
    /// Component handling for core-scan and merge runs
    pub color_policy: ColorPolicy,
    pub xrf_output: XrfOutput,
    pub compression: TiffCompression,
    pub jpeg_quality: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dpi: 508.0,
            trim_inches: 0.25,
            icd_scaling_percent: 30.0,
            gamma: 1.4,
            output_base_name: String::new(),
            destination_root: PathBuf::from("."),
            color_policy: ColorPolicy::RgbUniform,
            xrf_output: XrfOutput::Tiff,
            compression: TiffCompression::None,
            jpeg_quality: 95,
        }
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PipelineError::invalid(
            name,
            format!("must be greater than 0, got {}", value),
        ));
    }
    Ok(())
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Copy of this configuration writing under a different base name.
    pub fn with_output_base_name(&self, name: impl Into<String>) -> Self {
        Self {
            output_base_name: name.into(),
            ..self.clone()
        }
    }

    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            compression: self.compression,
            jpeg_quality: self.jpeg_quality,
        }
    }

    fn validate_common(&self) -> Result<()> {
        if self.output_base_name.trim().is_empty() {
            return Err(PipelineError::invalid("output_base_name", "must not be empty"));
        }
        if self
            .output_base_name
            .contains(|c| c == '/' || c == '\\')
        {
            return Err(PipelineError::invalid(
                "output_base_name",
                format!("must be a bare file stem, got {:?}", self.output_base_name),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(PipelineError::invalid(
                "jpeg_quality",
                format!("must be between 1 and 100, got {}", self.jpeg_quality),
            ));
        }
        Ok(())
    }

    /// Checks the parameters used by the core-scan and merge pipelines.
    pub fn validate_core(&self) -> Result<()> {
        positive("dpi", self.dpi)?;
        if !self.trim_inches.is_finite() || self.trim_inches < 0.0 {
            return Err(PipelineError::invalid(
                "trim_inches",
                format!("must be 0 or greater, got {}", self.trim_inches),
            ));
        }
        positive("icd_scaling_percent", self.icd_scaling_percent)?;
        self.validate_common()
    }

    /// Checks the parameters used by the radiograph pipeline.
    pub fn validate_xrf(&self) -> Result<()> {
        positive("gamma", self.gamma)?;
        self.validate_common()
    }
}

/// Builder for PipelineConfig
#[derive(Default)]
pub struct PipelineConfigBuilder {
    dpi: Option<f64>,
    trim_inches: Option<f64>,
    icd_scaling_percent: Option<f64>,
    gamma: Option<f64>,
    output_base_name: Option<String>,
    destination_root: Option<PathBuf>,
    color_policy: Option<ColorPolicy>,
    xrf_output: Option<XrfOutput>,
    compression: Option<TiffCompression>,
    jpeg_quality: Option<u8>,
}

impl PipelineConfigBuilder {
    pub fn dpi(mut self, dpi: f64) -> Self {
        self.dpi = Some(dpi);
        self
    }

    pub fn trim_inches(mut self, trim_inches: f64) -> Self {
        self.trim_inches = Some(trim_inches);
        self
    }

    pub fn icd_scaling_percent(mut self, percent: f64) -> Self {
        self.icd_scaling_percent = Some(percent);
        self
    }

    pub fn gamma(mut self, gamma: f64) -> Self {
        self.gamma = Some(gamma);
        self
    }

    pub fn output_base_name(mut self, name: impl Into<String>) -> Self {
        self.output_base_name = Some(name.into());
        self
    }

    pub fn destination_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.destination_root = Some(root.into());
        self
    }

    pub fn color_policy(mut self, policy: ColorPolicy) -> Self {
        self.color_policy = Some(policy);
        self
    }

    pub fn xrf_output(mut self, output: XrfOutput) -> Self {
        self.xrf_output = Some(output);
        self
    }

    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = Some(quality);
        self
    }

    pub fn build(self) -> PipelineConfig {
        let default = PipelineConfig::default();
        PipelineConfig {
            dpi: self.dpi.unwrap_or(default.dpi),
            trim_inches: self.trim_inches.unwrap_or(default.trim_inches),
            icd_scaling_percent: self.icd_scaling_percent.unwrap_or(default.icd_scaling_percent),
            gamma: self.gamma.unwrap_or(default.gamma),
            output_base_name: self.output_base_name.unwrap_or(default.output_base_name),
            destination_root: self.destination_root.unwrap_or(default.destination_root),
            color_policy: self.color_policy.unwrap_or(default.color_policy),
            xrf_output: self.xrf_output.unwrap_or(default.xrf_output),
            compression: self.compression.unwrap_or(default.compression),
            jpeg_quality: self.jpeg_quality.unwrap_or(default.jpeg_quality),
        }
    }
}
