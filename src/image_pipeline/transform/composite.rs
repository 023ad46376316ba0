//! Vertical concatenation of core images and their ruler strip.

use tracing::debug;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::raster::Image;
use crate::image_pipeline::transform::geometry::truncate_width;

/// Fails with `RulerTooShort` unless the ruler spans the core's depth axis.
///
/// Both widths are the untrimmed values, so the diagnostic reports what the
/// scanner produced rather than what was left after trimming.
pub fn ensure_ruler_length(ruler_width: usize, core_depth_pixels: usize) -> Result<()> {
    if ruler_width < core_depth_pixels {
        return Err(PipelineError::RulerTooShort {
            ruler_width,
            core_width: core_depth_pixels,
        });
    }
    Ok(())
}

/// Stacks `parts` top to bottom in the order given.
pub fn stack_vertical(parts: &[&Image]) -> Result<Image> {
    let first = parts
        .first()
        .ok_or_else(|| PipelineError::invalid("images", "nothing to concatenate"))?;

    for (idx, part) in parts.iter().enumerate().skip(1) {
        if part.width() != first.width() {
            return Err(PipelineError::DimensionMismatch {
                property: "Width",
                details: format!("part 0 is {} pixels, part {} is {}", first.width(), idx, part.width()),
            });
        }
        if part.bit_depth() != first.bit_depth() {
            return Err(PipelineError::DimensionMismatch {
                property: "Color depth",
                details: format!(
                    "part 0 is {}-bit, part {} is {}-bit",
                    first.bit_depth().bits(),
                    idx,
                    part.bit_depth().bits()
                ),
            });
        }
        if part.layout() != first.layout() {
            return Err(PipelineError::DimensionMismatch {
                property: "Component layout",
                details: format!("part 0 is {:?}, part {} is {:?}", first.layout(), idx, part.layout()),
            });
        }
    }

    let height = parts.iter().map(|p| p.height()).sum();
    let mut data = Vec::with_capacity(parts.iter().map(|p| p.data().len()).sum());
    for part in parts {
        data.extend_from_slice(part.data());
    }
    Image::new(first.width(), height, first.bit_depth(), first.layout(), data)
}

/// Trims the ruler's trailing columns to the core's width and appends it
/// beneath the core.
pub fn append_ruler(core: &Image, ruler: &Image) -> Result<Image> {
    ensure_ruler_length(ruler.width(), core.width())?;
    let fitted = truncate_width(ruler, core.width())?;
    debug!(
        core_width = core.width(),
        core_height = core.height(),
        ruler_height = fitted.height(),
        "Appending ruler"
    );
    stack_vertical(&[core, &fitted])
}

/// Concatenates `cores` in order and appends the ruler once at the bottom.
pub fn merge_with_ruler(cores: &[Image], ruler: &Image) -> Result<Image> {
    let parts: Vec<&Image> = cores.iter().collect();
    let merged = stack_vertical(&parts)?;
    append_ruler(&merged, ruler)
}

/// Checks that every named image shares bit depth and depth-axis pixel count.
///
/// The depth axis is the image height in scanner orientation.
pub fn ensure_uniform(images: &[(String, &Image)]) -> Result<()> {
    let Some((_, first)) = images.first() else {
        return Ok(());
    };

    let describe = |value: &dyn Fn(&Image) -> String| {
        images
            .iter()
            .map(|(name, img)| format!("{} = {}", name, value(img)))
            .collect::<Vec<_>>()
            .join(", ")
    };

    if images.iter().any(|(_, img)| img.bit_depth() != first.bit_depth()) {
        return Err(PipelineError::DimensionMismatch {
            property: "Color depth",
            details: describe(&|img| format!("{}-bit", img.bit_depth().bits())),
        });
    }
    if images.iter().any(|(_, img)| img.height() != first.height()) {
        return Err(PipelineError::DimensionMismatch {
            property: "Depth axis pixel count",
            details: describe(&|img| img.height().to_string()),
        });
    }
    Ok(())
}
