//! Raster image module
//!
//! The value type every stage consumes and produces.

pub mod types;

pub use types::{BitDepth, ColorLayout, Image};
