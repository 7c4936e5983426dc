//! Point-space to pixel-space transform

use crate::raster::dpi_scale;

use super::types::{BoundingBox, InvalidRegionError, PixelRegion};

/// Map a bounding box onto the pixel grid of a page rendered at `dpi`
///
/// Coordinates are scaled by `dpi / 72` and rounded half away from zero.
/// Boxes that run past the right or bottom edge are shrunk to fit. A negative
/// origin is clamped to zero and the clipped part is removed from the size,
/// so a box lying entirely left of or above the page has no overlap.
///
/// Fails when nothing of the box remains inside the image.
pub fn to_pixel_region(
    bbox: &BoundingBox,
    dpi: u32,
    image_width: u32,
    image_height: u32,
) -> Result<PixelRegion, InvalidRegionError> {
    let invalid = |reason: &str| {
        InvalidRegionError::new(bbox, reason).with_render_context(dpi, image_width, image_height)
    };

    bbox.validate()
        .map_err(|e| e.with_render_context(dpi, image_width, image_height))?;

    let scale = dpi_scale(dpi);
    let (x, width) = clip_axis(bbox.start_x, bbox.width, scale, image_width);
    let (y, height) = clip_axis(bbox.start_y, bbox.height, scale, image_height);

    if x >= i64::from(image_width) || y >= i64::from(image_height) {
        return Err(invalid("region starts outside the page image"));
    }
    if width <= 0 || height <= 0 {
        return Err(invalid("region has no overlap with the page image"));
    }

    let region = PixelRegion {
        x: x as u32,
        y: y as u32,
        width: width as u32,
        height: height as u32,
    };
    debug_assert!(region.fits_within(image_width, image_height));

    Ok(region)
}

/// Scale and clip one axis, returning (start, length) in pixels
fn clip_axis(start_pt: f64, length_pt: f64, scale: f64, limit: u32) -> (i64, i64) {
    let raw_start = (start_pt * scale).round() as i64;
    let raw_length = (length_pt * scale).round() as i64;

    let start = raw_start.max(0);
    let clipped_before = start - raw_start;
    let length = (raw_length - clipped_before).min(i64::from(limit) - start);

    (start, length)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(start_x: f64, start_y: f64, width: f64, height: f64) -> BoundingBox {
        BoundingBox {
            start_x,
            start_y,
            width,
            height,
            scale: 1.0,
            page_number: 1,
        }
    }

    #[test]
    fn test_letter_page_at_300_dpi() {
        // 612x792pt page renders to 2550x3300 at 300 DPI
        let region = to_pixel_region(&bbox(100.0, 100.0, 50.0, 20.0), 300, 2550, 3300).unwrap();
        assert_eq!(
            region,
            PixelRegion { x: 417, y: 417, width: 208, height: 83 }
        );
    }

    #[test]
    fn test_72_dpi_is_identity() {
        let region = to_pixel_region(&bbox(12.0, 34.0, 56.0, 78.0), 72, 612, 792).unwrap();
        assert_eq!(region, PixelRegion { x: 12, y: 34, width: 56, height: 78 });
    }

    #[test]
    fn test_deterministic() {
        let b = bbox(33.3, 44.4, 55.5, 66.6);
        let first = to_pixel_region(&b, 217, 1844, 2387).unwrap();
        for _ in 0..10 {
            assert_eq!(to_pixel_region(&b, 217, 1844, 2387).unwrap(), first);
        }
    }

    #[test]
    fn test_display_scale_is_ignored() {
        let mut scaled = bbox(100.0, 100.0, 50.0, 20.0);
        scaled.scale = 2.5;
        assert_eq!(
            to_pixel_region(&scaled, 300, 2550, 3300).unwrap(),
            to_pixel_region(&bbox(100.0, 100.0, 50.0, 20.0), 300, 2550, 3300).unwrap()
        );
    }

    #[test]
    fn test_box_overhanging_edge_is_shrunk() {
        // Starts inside, extends 100pt past the right and bottom edges
        let region = to_pixel_region(&bbox(562.0, 742.0, 150.0, 150.0), 72, 612, 792).unwrap();
        assert_eq!(region, PixelRegion { x: 562, y: 742, width: 50, height: 50 });
    }

    #[test]
    fn test_negative_origin_is_clipped() {
        let region = to_pixel_region(&bbox(-10.0, -5.0, 30.0, 20.0), 72, 612, 792).unwrap();
        assert_eq!(region, PixelRegion { x: 0, y: 0, width: 20, height: 15 });
    }

    #[test]
    fn test_box_right_of_page_is_invalid() {
        let err = to_pixel_region(&bbox(700.0, 100.0, 50.0, 20.0), 72, 612, 792).unwrap_err();
        assert_eq!(err.dpi, Some(72));
        assert_eq!(err.image_size, Some((612, 792)));
    }

    #[test]
    fn test_box_below_page_is_invalid() {
        assert!(to_pixel_region(&bbox(10.0, 800.0, 50.0, 20.0), 72, 612, 792).is_err());
    }

    #[test]
    fn test_box_left_of_page_is_invalid() {
        assert!(to_pixel_region(&bbox(-100.0, 10.0, 50.0, 20.0), 72, 612, 792).is_err());
    }

    #[test]
    fn test_box_starting_exactly_at_edge_is_invalid() {
        assert!(to_pixel_region(&bbox(612.0, 10.0, 5.0, 5.0), 72, 612, 792).is_err());
    }

    #[test]
    fn test_sub_pixel_box_is_invalid() {
        // 0.2pt at 72 DPI rounds to zero pixels
        assert!(to_pixel_region(&bbox(10.0, 10.0, 0.2, 0.2), 72, 612, 792).is_err());
    }

    #[test]
    fn test_boxes_inside_page_stay_inside_image() {
        let (page_w, page_h) = (612.0, 792.0);
        for dpi in [72u32, 96, 150, 200, 300, 600] {
            let scale = f64::from(dpi) / 72.0;
            let img_w = (page_w * scale).round() as u32;
            let img_h = (page_h * scale).round() as u32;
            for (sx, sy, w, h) in [
                (0.0, 0.0, page_w, page_h),
                (0.5, 0.5, 611.5, 791.5),
                (300.3, 400.7, 311.7, 391.3),
                (611.0, 791.0, 1.0, 1.0),
                (123.456, 654.321, 0.9, 0.9),
            ] {
                let region = to_pixel_region(&bbox(sx, sy, w, h), dpi, img_w, img_h).unwrap();
                assert!(
                    region.fits_within(img_w, img_h),
                    "{:?} escapes {}x{} at {} dpi",
                    region,
                    img_w,
                    img_h,
                    dpi
                );
            }
        }
    }
}
