//! Pure image stages
//!
//! Every function here takes images by reference and returns new ones.

pub mod color_model;
pub mod composite;
pub mod contrast;
pub mod geometry;

pub use color_model::{ColorPolicy, normalize_ruler};
pub use composite::{append_ruler, ensure_ruler_length, ensure_uniform, merge_with_ruler, stack_vertical};
pub use contrast::{ContrastAdjuster, adjust_contrast, adjust_contrast_to};
pub use geometry::{
    rotate90_ccw, rotate90_cw, rotate180, scale_proportional, trim_column_count,
    trim_leading_columns,
};
