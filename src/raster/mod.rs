//! PDF rasterization
//!
//! Renders drawing pages to bitmaps at a caller-chosen DPI using MuPDF.
//!
//! PDF geometry is expressed in points (72 per inch), so a page rendered at
//! `dpi` uses a uniform scale of `dpi / 72`. A US-letter page (612×792pt) at
//! 300 DPI becomes a 2550×3300 pixel image.
//!
//! Everything here is synchronous and CPU-bound. Async callers run it on the
//! blocking pool (see [`crate::extract`]).

mod renderer;

pub use renderer::{PageRange, RasterImage, Rasterizer};

/// PDF points per inch
pub const POINTS_PER_INCH: f64 = 72.0;

/// Pixel scale factor for rendering at `dpi`
pub fn dpi_scale(dpi: u32) -> f64 {
    f64::from(dpi) / POINTS_PER_INCH
}
