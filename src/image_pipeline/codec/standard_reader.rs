//! Image reader for core, radiograph and ruler files.
//!
//! TIFF input goes through the `tiff` crate so 16-bit grayscale and RGB(A)
//! samples arrive untouched. Anything else (rulers are sometimes shipped as
//! JPEG or PNG) is handed to the `image` crate.

use std::io::Cursor;

use tiff::decoder::{Decoder, DecodingResult};
use tracing::debug;

use crate::image_pipeline::codec::reader::ImageReader;
use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::raster::{BitDepth, ColorLayout, Image};

/// Placeholder source name; the pipeline replaces it with the file path.
const UNNAMED_SOURCE: &str = "image";

pub struct StandardImageReader;

fn is_tiff(data: &[u8]) -> bool {
    data.starts_with(b"II*\0") || data.starts_with(b"MM\0*")
}

fn decode_error(e: impl std::fmt::Display) -> PipelineError {
    PipelineError::DecodeError(e.to_string())
}

fn unaccepted_layout(components: usize, expected: &'static str) -> PipelineError {
    PipelineError::UnexpectedComponentCount {
        source_name: UNNAMED_SOURCE.to_string(),
        components,
        expected,
    }
}

fn widen(values: Vec<u8>) -> Vec<u16> {
    values.into_iter().map(u16::from).collect()
}

impl StandardImageReader {
    fn read_tiff(&self, data: &[u8]) -> Result<Image> {
        let mut decoder = Decoder::new(Cursor::new(data)).map_err(decode_error)?;
        let (width, height) = decoder.dimensions().map_err(decode_error)?;
        let colortype = decoder.colortype().map_err(decode_error)?;

        debug!("TIFF {}x{} {:?}", width, height, colortype);

        let (components, bits) = match colortype {
            tiff::ColorType::Gray(bits) => (1, bits),
            tiff::ColorType::GrayA(bits) => (2, bits),
            tiff::ColorType::RGB(bits) => (3, bits),
            tiff::ColorType::RGBA(bits) => (4, bits),
            tiff::ColorType::Palette(_) => {
                return Err(unaccepted_layout(
                    1,
                    "palette TIFFs are not accepted, only grayscale, RGB and RGBA",
                ));
            }
            tiff::ColorType::YCbCr(_) => {
                return Err(unaccepted_layout(
                    3,
                    "YCbCr TIFFs are not accepted, only grayscale, RGB and RGBA",
                ));
            }
            tiff::ColorType::CMYK(_) => {
                return Err(unaccepted_layout(
                    4,
                    "CMYK TIFFs are not accepted, only grayscale, RGB and RGBA",
                ));
            }
            tiff::ColorType::CMYKA(_) => {
                return Err(unaccepted_layout(
                    5,
                    "CMYK TIFFs are not accepted, only grayscale, RGB and RGBA",
                ));
            }
            tiff::ColorType::Multiband { num_samples, .. } => {
                return Err(unaccepted_layout(
                    usize::from(num_samples),
                    "multiband TIFFs are not accepted, only grayscale, RGB and RGBA",
                ));
            }
            other => {
                return Err(PipelineError::DecodeError(format!(
                    "unsupported TIFF color type {:?}",
                    other
                )));
            }
        };
        let layout = ColorLayout::from_components(components, UNNAMED_SOURCE)?;
        let bit_depth = BitDepth::from_bits(u32::from(bits), UNNAMED_SOURCE)?;

        let samples = match decoder.read_image().map_err(decode_error)? {
            DecodingResult::U8(values) => widen(values),
            DecodingResult::U16(values) => values,
            _ => {
                return Err(PipelineError::UnexpectedColorDepth {
                    source_name: UNNAMED_SOURCE.to_string(),
                    bits: u32::from(bits),
                });
            }
        };

        Image::new(width as usize, height as usize, bit_depth, layout, samples)
    }

    fn read_other(&self, data: &[u8]) -> Result<Image> {
        let decoded = image::load_from_memory(data).map_err(decode_error)?;
        let (width, height) = (decoded.width() as usize, decoded.height() as usize);

        debug!("Decoded {}x{} {:?}", width, height, decoded.color());

        let (bit_depth, layout, samples) = match decoded {
            image::DynamicImage::ImageLuma8(buf) => (BitDepth::Eight, ColorLayout::Gray, widen(buf.into_raw())),
            image::DynamicImage::ImageRgb8(buf) => (BitDepth::Eight, ColorLayout::Rgb, widen(buf.into_raw())),
            image::DynamicImage::ImageRgba8(buf) => (BitDepth::Eight, ColorLayout::Rgba, widen(buf.into_raw())),
            image::DynamicImage::ImageLuma16(buf) => (BitDepth::Sixteen, ColorLayout::Gray, buf.into_raw()),
            image::DynamicImage::ImageRgb16(buf) => (BitDepth::Sixteen, ColorLayout::Rgb, buf.into_raw()),
            image::DynamicImage::ImageRgba16(buf) => (BitDepth::Sixteen, ColorLayout::Rgba, buf.into_raw()),
            image::DynamicImage::ImageLumaA8(_) | image::DynamicImage::ImageLumaA16(_) => {
                return Err(PipelineError::UnexpectedComponentCount {
                    source_name: UNNAMED_SOURCE.to_string(),
                    components: 2,
                    expected: "only grayscale, RGB and RGBA are accepted",
                });
            }
            other => {
                return Err(PipelineError::UnexpectedColorDepth {
                    source_name: UNNAMED_SOURCE.to_string(),
                    bits: u32::from(other.color().bits_per_pixel())
                        / u32::from(other.color().channel_count()),
                });
            }
        };

        Image::new(width, height, bit_depth, layout, samples)
    }
}

impl ImageReader for StandardImageReader {
    fn read_image(&self, data: &[u8]) -> Result<Image> {
        debug!("Decoding image, {} bytes", data.len());
        if is_tiff(data) {
            self.read_tiff(data)
        } else {
            self.read_other(data)
        }
    }
}
