//! Coordinate geometry
//!
//! Conversion of caller-supplied regions from PDF point space into the pixel
//! space of a rendered page.
//!
//! ```text
//!   PDF points (72/in)                pixels (dpi/in)
//!   ┌──────────────┐                 ┌──────────────────────┐
//!   │  (startX,    │   × dpi / 72    │  (x, y)              │
//!   │   startY)──┐ │  ─────────────▶ │     ┌────┐           │
//!   │            │ │                 │     └────┘ clipped   │
//!   └──────────────┘                 └──────────────────────┘
//! ```

mod transform;
mod types;

pub use transform::to_pixel_region;
pub use types::{BoundingBox, InvalidRegionError, PixelRegion};
