//! In-memory image types shared by every pipeline stage

use crate::image_pipeline::common::error::{PipelineError, Result};

/// Per-sample bit depth. Only 8 and 16-bit images enter the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitDepth {
    Eight,
    Sixteen,
}

impl BitDepth {
    /// Classifies a raw bits-per-sample value, naming `source_name` on failure.
    pub fn from_bits(bits: u32, source_name: &str) -> Result<Self> {
        match bits {
            8 => Ok(BitDepth::Eight),
            16 => Ok(BitDepth::Sixteen),
            _ => Err(PipelineError::UnexpectedColorDepth {
                source_name: source_name.to_string(),
                bits,
            }),
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
        }
    }

    /// Largest sample value, `2^bits - 1`.
    pub fn max_value(self) -> u16 {
        match self {
            BitDepth::Eight => u8::MAX as u16,
            BitDepth::Sixteen => u16::MAX,
        }
    }
}

/// Component arrangement of each pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorLayout {
    Gray,
    Rgb,
    Rgba,
}

impl ColorLayout {
    pub fn from_components(components: usize, source_name: &str) -> Result<Self> {
        match components {
            1 => Ok(ColorLayout::Gray),
            3 => Ok(ColorLayout::Rgb),
            4 => Ok(ColorLayout::Rgba),
            _ => Err(PipelineError::UnexpectedComponentCount {
                source_name: source_name.to_string(),
                components,
                expected: "only grayscale, RGB and RGBA are accepted",
            }),
        }
    }

    pub fn components(self) -> usize {
        match self {
            ColorLayout::Gray => 1,
            ColorLayout::Rgb => 3,
            ColorLayout::Rgba => 4,
        }
    }
}

/// A rectangular grid of pixels.
///
/// Samples are stored row-major and interleaved (`[R, G, B, R, G, B, ...]`),
/// widened to `u16` regardless of bit depth. Every stage takes an `&Image`
/// and returns a fresh one; nothing mutates a shared buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: usize,
    height: usize,
    bit_depth: BitDepth,
    layout: ColorLayout,
    data: Vec<u16>,
}

impl Image {
    pub fn new(
        width: usize,
        height: usize,
        bit_depth: BitDepth,
        layout: ColorLayout,
        data: Vec<u16>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PipelineError::invalid(
                "dimensions",
                format!("image must not be empty ({}x{})", width, height),
            ));
        }
        let expected = width * height * layout.components();
        if data.len() != expected {
            return Err(PipelineError::DecodeError(format!(
                "sample buffer holds {} values, {}x{} {:?} needs {}",
                data.len(),
                width,
                height,
                layout,
                expected
            )));
        }
        if bit_depth == BitDepth::Eight && data.iter().any(|&v| v > BitDepth::Eight.max_value()) {
            return Err(PipelineError::DecodeError(
                "8-bit image holds samples above 255".to_string(),
            ));
        }
        Ok(Self {
            width,
            height,
            bit_depth,
            layout,
            data,
        })
    }

    /// Builds an image by evaluating `sample(x, y, component)` for every sample.
    pub fn from_fn<F>(
        width: usize,
        height: usize,
        bit_depth: BitDepth,
        layout: ColorLayout,
        mut sample: F,
    ) -> Result<Self>
    where
        F: FnMut(usize, usize, usize) -> u16,
    {
        let components = layout.components();
        let mut data = Vec::with_capacity(width * height * components);
        for y in 0..height {
            for x in 0..width {
                for c in 0..components {
                    data.push(sample(x, y, c));
                }
            }
        }
        Self::new(width, height, bit_depth, layout, data)
    }

    pub fn filled(
        width: usize,
        height: usize,
        bit_depth: BitDepth,
        layout: ColorLayout,
        value: u16,
    ) -> Result<Self> {
        Self::new(
            width,
            height,
            bit_depth,
            layout,
            vec![value; width * height * layout.components()],
        )
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    pub fn layout(&self) -> ColorLayout {
        self.layout
    }

    pub fn components(&self) -> usize {
        self.layout.components()
    }

    pub fn data(&self) -> &[u16] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u16> {
        self.data
    }

    /// Samples of one row.
    pub fn row(&self, y: usize) -> &[u16] {
        let stride = self.width * self.components();
        &self.data[y * stride..(y + 1) * stride]
    }

    /// Samples of the pixel at (`x`, `y`).
    pub fn pixel(&self, x: usize, y: usize) -> &[u16] {
        let components = self.components();
        let start = (y * self.width + x) * components;
        &self.data[start..start + components]
    }

    /// Same geometry, new samples. Used by stages that only remap values.
    pub(crate) fn with_samples(
        &self,
        bit_depth: BitDepth,
        layout: ColorLayout,
        data: Vec<u16>,
    ) -> Result<Self> {
        Self::new(self.width, self.height, bit_depth, layout, data)
    }
}
