//! Dimension classification
//!
//! Picks dimension-shaped values out of recognized text: an optional
//! diameter mark, a number with `.` or `,` as decimal separator, and an
//! optional metric unit.

mod classifier;
mod types;

pub use classifier::DimensionClassifier;
pub use types::{Coordinates, DimensionToken};
