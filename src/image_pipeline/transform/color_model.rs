//! Bit depth and component reconciliation between a core image and its ruler.

use tracing::{debug, warn};

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::raster::{BitDepth, ColorLayout, Image};

/// Factor between 8-bit and 16-bit sample ranges.
const DEPTH_SCALE: u16 = 256;

/// How component layouts are reconciled before composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorPolicy {
    /// Alpha is dropped and grayscale replicated so both images end up RGB.
    #[default]
    RgbUniform,
    /// Both images must be single-component; anything else is rejected.
    GrayscaleOnly,
}

/// Widens 8-bit samples to 16-bit by multiplying by 256. Lossless.
pub fn widen_to_16(image: &Image) -> Result<Image> {
    if image.bit_depth() == BitDepth::Sixteen {
        return Ok(image.clone());
    }
    let data = image.data().iter().map(|&v| v * DEPTH_SCALE).collect();
    image.with_samples(BitDepth::Sixteen, image.layout(), data)
}

/// Narrows 16-bit samples to 8-bit by dividing by 256 and truncating.
pub fn narrow_to_8(image: &Image) -> Result<Image> {
    if image.bit_depth() == BitDepth::Eight {
        return Ok(image.clone());
    }
    let data = image.data().iter().map(|&v| v / DEPTH_SCALE).collect();
    image.with_samples(BitDepth::Eight, image.layout(), data)
}

pub fn match_depth(image: &Image, target: BitDepth) -> Result<Image> {
    match (image.bit_depth(), target) {
        (BitDepth::Eight, BitDepth::Sixteen) => widen_to_16(image),
        (BitDepth::Sixteen, BitDepth::Eight) => narrow_to_8(image),
        _ => Ok(image.clone()),
    }
}

/// Drops the fourth component of RGBA pixels. No blending.
pub fn strip_alpha(image: &Image) -> Result<Image> {
    if image.layout() != ColorLayout::Rgba {
        return Ok(image.clone());
    }
    let data = image
        .data()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    image.with_samples(image.bit_depth(), ColorLayout::Rgb, data)
}

/// Replicates each gray value into R, G and B.
pub fn gray_to_rgb(image: &Image) -> Result<Image> {
    if image.layout() != ColorLayout::Gray {
        return Ok(image.clone());
    }
    let data = image.data().iter().flat_map(|&v| [v, v, v]).collect();
    image.with_samples(image.bit_depth(), ColorLayout::Rgb, data)
}

/// 8-bit RGB rendition used for JPEG output.
pub fn to_rgb8(image: &Image) -> Result<Image> {
    let narrowed = narrow_to_8(image)?;
    let opaque = strip_alpha(&narrowed)?;
    gray_to_rgb(&opaque)
}

impl ColorPolicy {
    /// Applies the policy's component rules to one image.
    pub fn apply(self, image: &Image, source_name: &str) -> Result<Image> {
        match self {
            ColorPolicy::RgbUniform => gray_to_rgb(&strip_alpha(image)?),
            ColorPolicy::GrayscaleOnly => match image.layout() {
                ColorLayout::Gray => Ok(image.clone()),
                ColorLayout::Rgb => Err(PipelineError::UnexpectedComponentCount {
                    source_name: source_name.to_string(),
                    components: 3,
                    expected: "image appears to be RGB; only grayscale images are accepted",
                }),
                ColorLayout::Rgba => Err(PipelineError::UnexpectedComponentCount {
                    source_name: source_name.to_string(),
                    components: 4,
                    expected: "only grayscale images are accepted",
                }),
            },
        }
    }
}

/// Brings `ruler` to the bit depth of `primary` and applies `policy`.
///
/// 16-bit rulers matched against an 8-bit core lose their low byte.
pub fn normalize_ruler(
    primary: &Image,
    ruler: &Image,
    policy: ColorPolicy,
    source_name: &str,
) -> Result<Image> {
    let target = primary.bit_depth();
    match (ruler.bit_depth(), target) {
        (BitDepth::Eight, BitDepth::Sixteen) => {
            debug!("Converting 8-bit ruler to 16-bit to match core image")
        }
        (BitDepth::Sixteen, BitDepth::Eight) => {
            warn!("Converting 16-bit ruler to 8-bit to match core image; low byte discarded")
        }
        _ => {}
    }
    let depth_matched = match_depth(ruler, target)?;
    policy.apply(&depth_matched, source_name)
}
