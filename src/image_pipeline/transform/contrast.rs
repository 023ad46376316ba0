//! Gamma-corrected contrast stretch for radiographs.
//!
//! The observed sample range `[min, max]` of the image is stretched to the full
//! range of the output depth:
//!
//! ```text
//! level(v) = 0                              v <= min
//! level(v) = 1                              v >= max
//! level(v) = ((v - min) / (max - min))^(1/gamma)
//! out(v)   = round(level(v) * (2^bits - 1))
//! ```
//!
//! A flat image (`min == max`) has no range to stretch and is returned with
//! its samples untouched (only re-depthed when the output depth differs).

use tracing::{debug, warn};

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::raster::{BitDepth, Image};
use crate::image_pipeline::transform::color_model::match_depth;

/// Maps sample values from an observed `[min, max]` range onto `[0, 2^bits - 1]`.
#[derive(Debug, Clone, Copy)]
pub struct ContrastAdjuster {
    min: u16,
    max: u16,
    inv_gamma: f64,
    output_max: f64,
}

impl ContrastAdjuster {
    pub fn new(min: u16, max: u16, gamma: f64, output_depth: BitDepth) -> Result<Self> {
        if !gamma.is_finite() || gamma <= 0.0 {
            return Err(PipelineError::invalid(
                "gamma",
                format!("must be greater than 0.0, got {}", gamma),
            ));
        }
        if min >= max {
            return Err(PipelineError::invalid(
                "range",
                format!("min ({}) must be below max ({})", min, max),
            ));
        }
        Ok(Self {
            min,
            max,
            inv_gamma: 1.0 / gamma,
            output_max: output_depth.max_value() as f64,
        })
    }

    /// Normalized level in `[0, 1]`.
    pub fn level(&self, value: u16) -> f64 {
        if value <= self.min {
            return 0.0;
        }
        if value >= self.max {
            return 1.0;
        }
        let interval = (self.max - self.min) as f64;
        ((value - self.min) as f64 / interval).powf(self.inv_gamma)
    }

    pub fn adjust(&self, value: u16) -> u16 {
        (self.level(value) * self.output_max).round() as u16
    }
}

/// Smallest and largest sample in the image. Scans every sample.
pub fn pixel_range(image: &Image) -> (u16, u16) {
    image
        .data()
        .iter()
        .fold((u16::MAX, u16::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// Stretches contrast to the full range of the image's own bit depth.
pub fn adjust_contrast(image: &Image, gamma: f64) -> Result<Image> {
    adjust_contrast_to(image, gamma, image.bit_depth())
}

/// Stretches contrast and writes the result at `output_depth`.
pub fn adjust_contrast_to(image: &Image, gamma: f64, output_depth: BitDepth) -> Result<Image> {
    if !gamma.is_finite() || gamma <= 0.0 {
        return Err(PipelineError::invalid(
            "gamma",
            format!("must be greater than 0.0, got {}", gamma),
        ));
    }

    let (min, max) = pixel_range(image);
    debug!(min, max, gamma, "Pixel range");

    if min == max {
        warn!(value = min, "Flat image has no contrast to stretch; leaving samples unchanged");
        return match_depth(image, output_depth);
    }

    let adjuster = ContrastAdjuster::new(min, max, gamma, output_depth)?;
    let data = image.data().iter().map(|&v| adjuster.adjust(v)).collect();
    image.with_samples(output_depth, image.layout(), data)
}
