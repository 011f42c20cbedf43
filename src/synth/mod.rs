//! Line-shape synthesis: multiplet expansion and peak-shape rendering.

pub mod lineshape;
pub mod multiplet;

pub use lineshape::LineShape;
pub use multiplet::{expand_peak, splitting_pattern, Line};
