use std::io::Write;
use crate::image_pipeline::codec::types::EncodeOptions;
use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::raster::Image;

pub trait ImageWriter {
    fn write_tiff(&self, image: &Image, output: &mut dyn Write, options: &EncodeOptions) -> Result<()>;
    fn write_jpeg(&self, image: &Image, output: &mut dyn Write, options: &EncodeOptions) -> Result<()>;
}
