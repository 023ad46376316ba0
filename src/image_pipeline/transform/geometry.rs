//! Rotation, column trimming and proportional scaling.

use fast_image_resize as fr;
use tracing::debug;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::raster::{BitDepth, ColorLayout, Image};

/// Builds a same-format image of `width`x`height` where output pixel (x, y)
/// copies source pixel `source(x, y)`.
fn remap<F>(image: &Image, width: usize, height: usize, source: F) -> Result<Image>
where
    F: Fn(usize, usize) -> (usize, usize),
{
    let components = image.components();
    let mut data = Vec::with_capacity(width * height * components);
    for y in 0..height {
        for x in 0..width {
            let (sx, sy) = source(x, y);
            data.extend_from_slice(image.pixel(sx, sy));
        }
    }
    Image::new(width, height, image.bit_depth(), image.layout(), data)
}

/// Rotates 90 degrees counter-clockwise. The top edge becomes the left edge.
pub fn rotate90_ccw(image: &Image) -> Result<Image> {
    let (w, h) = image.dimensions();
    remap(image, h, w, |x, y| (w - 1 - y, x))
}

/// Rotates 90 degrees clockwise. The left edge becomes the top edge.
pub fn rotate90_cw(image: &Image) -> Result<Image> {
    let (w, h) = image.dimensions();
    remap(image, h, w, |x, y| (y, h - 1 - x))
}

pub fn rotate180(image: &Image) -> Result<Image> {
    let (w, h) = image.dimensions();
    remap(image, w, h, |x, y| (w - 1 - x, h - 1 - y))
}

/// Keeps columns `start..end`.
pub fn crop_columns(image: &Image, start: usize, end: usize) -> Result<Image> {
    if start >= end || end > image.width() {
        return Err(PipelineError::invalid(
            "columns",
            format!("{}..{} is outside an image {} pixels wide", start, end, image.width()),
        ));
    }
    let components = image.components();
    let mut data = Vec::with_capacity((end - start) * image.height() * components);
    for y in 0..image.height() {
        let row = image.row(y);
        data.extend_from_slice(&row[start * components..end * components]);
    }
    Image::new(end - start, image.height(), image.bit_depth(), image.layout(), data)
}

/// Number of columns removed for `trim_inches` at `dpi`.
pub fn trim_column_count(dpi: f64, trim_inches: f64) -> Result<usize> {
    if !dpi.is_finite() || dpi <= 0.0 {
        return Err(PipelineError::invalid("dpi", format!("must be greater than 0, got {}", dpi)));
    }
    if !trim_inches.is_finite() || trim_inches < 0.0 {
        return Err(PipelineError::invalid(
            "trim_inches",
            format!("must be 0 or greater, got {}", trim_inches),
        ));
    }
    Ok((dpi * trim_inches).round() as usize)
}

/// Removes `round(dpi * trim_inches)` columns from the leading (left) edge.
pub fn trim_leading_columns(image: &Image, dpi: f64, trim_inches: f64) -> Result<Image> {
    let trim_columns = trim_column_count(dpi, trim_inches)?;
    if trim_columns >= image.width() {
        return Err(PipelineError::TrimOutOfRange {
            trim_columns,
            width: image.width(),
        });
    }
    debug!(trim_columns, width = image.width(), "Trimming leading columns");
    crop_columns(image, trim_columns, image.width())
}

/// Removes trailing columns so the image is exactly `width` wide.
pub fn truncate_width(image: &Image, width: usize) -> Result<Image> {
    if width == image.width() {
        return Ok(image.clone());
    }
    crop_columns(image, 0, width)
}

fn pixel_type(depth: BitDepth, layout: ColorLayout) -> fr::PixelType {
    match (depth, layout) {
        (BitDepth::Eight, ColorLayout::Gray) => fr::PixelType::U8,
        (BitDepth::Eight, ColorLayout::Rgb) => fr::PixelType::U8x3,
        (BitDepth::Eight, ColorLayout::Rgba) => fr::PixelType::U8x4,
        (BitDepth::Sixteen, ColorLayout::Gray) => fr::PixelType::U16,
        (BitDepth::Sixteen, ColorLayout::Rgb) => fr::PixelType::U16x3,
        (BitDepth::Sixteen, ColorLayout::Rgba) => fr::PixelType::U16x4,
    }
}

fn to_bytes(image: &Image) -> Vec<u8> {
    match image.bit_depth() {
        BitDepth::Eight => image.data().iter().map(|&v| v as u8).collect(),
        BitDepth::Sixteen => image.data().iter().flat_map(|v| v.to_ne_bytes()).collect(),
    }
}

fn from_bytes(bytes: Vec<u8>, depth: BitDepth) -> Vec<u16> {
    match depth {
        BitDepth::Eight => bytes.into_iter().map(u16::from).collect(),
        BitDepth::Sixteen => bytes
            .chunks_exact(2)
            .map(|b| u16::from_ne_bytes([b[0], b[1]]))
            .collect(),
    }
}

/// Resizes both dimensions to `percent` of their current size with
/// area-averaging (box convolution), which avoids aliasing on downscale.
pub fn scale_proportional(image: &Image, percent: f64) -> Result<Image> {
    if !percent.is_finite() || percent <= 0.0 {
        return Err(PipelineError::invalid(
            "icd_scaling_percent",
            format!("must be greater than 0, got {}", percent),
        ));
    }
    let factor = percent / 100.0;
    let target_width = ((image.width() as f64 * factor).round() as usize).max(1);
    let target_height = ((image.height() as f64 * factor).round() as usize).max(1);

    debug!(
        from_width = image.width(),
        from_height = image.height(),
        target_width,
        target_height,
        "Scaling image"
    );

    if (target_width, target_height) == image.dimensions() {
        return Ok(image.clone());
    }

    let pixel_type = pixel_type(image.bit_depth(), image.layout());
    let src = fr::images::Image::from_vec_u8(
        image.width() as u32,
        image.height() as u32,
        to_bytes(image),
        pixel_type,
    )
    .map_err(|e| PipelineError::EncodeError(format!("resize source buffer: {}", e)))?;

    let mut dst = fr::images::Image::new(target_width as u32, target_height as u32, pixel_type);

    let options = fr::ResizeOptions::new()
        .resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Box));
    let mut resizer = fr::Resizer::new();
    resizer
        .resize(&src, &mut dst, Some(&options))
        .map_err(|e| PipelineError::EncodeError(format!("resize failed: {}", e)))?;

    Image::new(
        target_width,
        target_height,
        image.bit_depth(),
        image.layout(),
        from_bytes(dst.into_vec(), image.bit_depth()),
    )
}
