//! Encode/decode boundary
//!
//! The pipeline talks to files only through `ImageReader` and `ImageWriter`,
//! so alternative backends can be swapped in without touching the stages.

mod reader;
mod standard_reader;
mod standard_writer;
pub mod types;
mod writer;


pub use reader::ImageReader;
pub use standard_reader::StandardImageReader;
pub use standard_writer::StandardImageWriter;
pub use types::{EncodeOptions, TiffCompression};
pub use writer::ImageWriter;
