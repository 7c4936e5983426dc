//! Region types in point and pixel space

use serde::{Deserialize, Serialize};

/// Region selected on a drawing page, in PDF points
///
/// Sent by the labeling front end in camelCase. `scale` is the display zoom
/// the user had when drawing the box; it is echoed back for calibration but
/// plays no part in pixel math.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub start_x: f64,
    pub start_y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_display_scale")]
    pub scale: f64,
    /// 1-based page number
    pub page_number: u32,
}

fn default_display_scale() -> f64 {
    1.0
}

impl BoundingBox {
    /// Check the box before any rendering work happens
    pub fn validate(&self) -> Result<(), InvalidRegionError> {
        let coords = [self.start_x, self.start_y, self.width, self.height, self.scale];
        if coords.iter().any(|v| !v.is_finite()) {
            return Err(InvalidRegionError::new(
                self,
                "coordinates must be finite numbers",
            ));
        }
        if self.page_number < 1 {
            return Err(InvalidRegionError::new(self, "page number must be >= 1"));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(InvalidRegionError::new(
                self,
                "width and height must be positive",
            ));
        }
        Ok(())
    }
}

/// Region in pixel coordinates of a rendered page
///
/// Always lies inside the image it was derived for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRegion {
    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Whether the region fits inside an image of the given size
    pub fn fits_within(&self, image_width: u32, image_height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.right() <= image_width
            && self.bottom() <= image_height
    }
}

/// A bounding box that does not overlap the page image
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid region on page {page}: {reason} (box x={start_x}, y={start_y}, w={width}, h={height} pt; dpi={dpi:?}; image={image_size:?})")]
pub struct InvalidRegionError {
    pub page: u32,
    pub start_x: f64,
    pub start_y: f64,
    pub width: f64,
    pub height: f64,
    pub dpi: Option<u32>,
    pub image_size: Option<(u32, u32)>,
    pub reason: String,
}

impl InvalidRegionError {
    pub fn new(bbox: &BoundingBox, reason: impl Into<String>) -> Self {
        Self {
            page: bbox.page_number,
            start_x: bbox.start_x,
            start_y: bbox.start_y,
            width: bbox.width,
            height: bbox.height,
            dpi: None,
            image_size: None,
            reason: reason.into(),
        }
    }

    /// Attach the render context the box was checked against
    pub fn with_render_context(mut self, dpi: u32, image_width: u32, image_height: u32) -> Self {
        self.dpi = Some(dpi);
        self.image_size = Some((image_width, image_height));
        self
    }
}
