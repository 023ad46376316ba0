use std::io::Write;

use tiff::encoder::{TiffEncoder, colortype};
use tracing::debug;

use crate::image_pipeline::codec::types::{EncodeOptions, TiffCompression};
use crate::image_pipeline::codec::writer::ImageWriter;
use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::raster::{BitDepth, ColorLayout, Image};
use crate::image_pipeline::transform::color_model::to_rgb8;

pub struct StandardImageWriter;

fn encode_error(e: impl std::fmt::Display) -> PipelineError {
    PipelineError::EncodeError(e.to_string())
}

fn bytes8(image: &Image) -> Vec<u8> {
    image.data().iter().map(|&v| v as u8).collect()
}

impl ImageWriter for StandardImageWriter {
    fn write_tiff(&self, image: &Image, output: &mut dyn Write, options: &EncodeOptions) -> Result<()> {
        debug!(
            "Encoding TIFF image: {}x{} {}-bit {:?}",
            image.width(),
            image.height(),
            image.bit_depth().bits(),
            image.layout()
        );

        let mut buffer = Vec::new();

        let compression = match options.compression {
            TiffCompression::None => tiff::encoder::Compression::Uncompressed,
            TiffCompression::Lzw => tiff::encoder::Compression::Lzw,
            TiffCompression::Deflate => tiff::encoder::Compression::Deflate(
                tiff::encoder::compression::DeflateLevel::Balanced,
            ),
        };

        let mut encoder = TiffEncoder::new(std::io::Cursor::new(&mut buffer))
            .map_err(encode_error)?
            .with_compression(compression);

        let (width, height) = (image.width() as u32, image.height() as u32);
        match (image.bit_depth(), image.layout()) {
            (BitDepth::Eight, ColorLayout::Gray) => {
                encoder.write_image::<colortype::Gray8>(width, height, &bytes8(image))
            }
            (BitDepth::Eight, ColorLayout::Rgb) => {
                encoder.write_image::<colortype::RGB8>(width, height, &bytes8(image))
            }
            (BitDepth::Eight, ColorLayout::Rgba) => {
                encoder.write_image::<colortype::RGBA8>(width, height, &bytes8(image))
            }
            (BitDepth::Sixteen, ColorLayout::Gray) => {
                encoder.write_image::<colortype::Gray16>(width, height, image.data())
            }
            (BitDepth::Sixteen, ColorLayout::Rgb) => {
                encoder.write_image::<colortype::RGB16>(width, height, image.data())
            }
            (BitDepth::Sixteen, ColorLayout::Rgba) => {
                encoder.write_image::<colortype::RGBA16>(width, height, image.data())
            }
        }
        .map_err(encode_error)?;

        output.write_all(&buffer)?;

        debug!("TIFF encoding complete");
        Ok(())
    }

    fn write_jpeg(&self, image: &Image, output: &mut dyn Write, options: &EncodeOptions) -> Result<()> {
        // JPEG components are always 8-bit RGB.
        let rgb = to_rgb8(image)?;
        debug!(
            "Encoding JPEG image: {}x{} quality {}",
            rgb.width(),
            rgb.height(),
            options.jpeg_quality
        );

        let mut buffer = Vec::new();
        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, options.jpeg_quality);
        encoder
            .encode(
                &bytes8(&rgb),
                rgb.width() as u32,
                rgb.height() as u32,
                image::ExtendedColorType::Rgb8,
            )
            .map_err(encode_error)?;

        output.write_all(&buffer)?;

        debug!("JPEG encoding complete");
        Ok(())
    }
}
