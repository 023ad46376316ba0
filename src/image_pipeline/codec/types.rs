//! Encoder configuration types

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    #[default]
    None,
    /// LZW compression (slow, good compression)
    Lzw,
    /// Deflate compression at the balanced level
    Deflate,
}

/// Settings handed to an `ImageWriter` for each output file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    pub compression: TiffCompression,
    /// JPEG quality, 1-100
    pub jpeg_quality: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            compression: TiffCompression::None,
            jpeg_quality: 95,
        }
    }
}
