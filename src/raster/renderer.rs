//! MuPDF page renderer
//!
//! Opens a PDF from bytes, renders the requested pages through a
//! `dpi / 72` scale matrix and converts the resulting pixmaps into
//! [`image::DynamicImage`] buffers.

use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use mupdf::{Colorspace, Document, Matrix};
use serde::Deserialize;

use crate::document::{is_pdf, DocumentError, DocumentResult};

use super::dpi_scale;

const PDF_MIME: &str = "application/pdf";

/// Inclusive, 1-based page range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRange {
    pub first: u32,
    pub last: u32,
}

impl PageRange {
    pub fn new(first: u32, last: u32) -> Self {
        Self { first, last }
    }

    /// Check the range against a document's page count
    pub fn validate(&self, page_count: u32) -> DocumentResult<()> {
        if self.first == 0 || self.first > self.last {
            return Err(DocumentError::InvalidPageRange {
                first: self.first,
                last: self.last,
            });
        }
        if self.last > page_count {
            return Err(DocumentError::PageOutOfRange {
                page: self.last,
                page_count,
            });
        }
        Ok(())
    }
}

/// A rendered page
///
/// Owned by whichever pipeline stage holds it; never cached.
#[derive(Debug, Clone)]
pub struct RasterImage {
    /// 1-based page number
    pub page: u32,
    /// Resolution the page was rendered at
    pub dpi: u32,
    /// Page width in PDF points
    pub page_width_pt: f32,
    /// Page height in PDF points
    pub page_height_pt: f32,
    /// Decoded bitmap
    pub image: DynamicImage,
}

impl RasterImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Renders PDF pages to bitmaps
#[derive(Debug, Clone)]
pub struct Rasterizer {
    max_dpi: u32,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new(600)
    }
}

impl Rasterizer {
    /// Create a rasterizer accepting DPI values up to `max_dpi`
    pub fn new(max_dpi: u32) -> Self {
        Self { max_dpi }
    }

    /// Count pages without rendering anything
    pub fn page_count(&self, pdf: &[u8]) -> DocumentResult<u32> {
        let doc = open_document(pdf)?;
        document_page_count(&doc)
    }

    /// Render a page range (all pages when `range` is `None`)
    pub fn render(
        &self,
        pdf: &[u8],
        dpi: u32,
        range: Option<PageRange>,
    ) -> DocumentResult<Vec<RasterImage>> {
        let mut pages = Vec::new();
        self.render_each(pdf, dpi, range, |raster| {
            pages.push(raster);
            Ok::<_, DocumentError>(())
        })?;
        Ok(pages)
    }

    /// Render a page range one page at a time
    ///
    /// Each raster is handed to `visit` and dropped before the next page is
    /// rendered. An error from `visit` stops the walk.
    pub fn render_each<E, F>(
        &self,
        pdf: &[u8],
        dpi: u32,
        range: Option<PageRange>,
        mut visit: F,
    ) -> Result<(), E>
    where
        E: From<DocumentError>,
        F: FnMut(RasterImage) -> Result<(), E>,
    {
        self.check_dpi(dpi)?;

        let doc = open_document(pdf)?;
        let page_count = document_page_count(&doc)?;
        let range = range.unwrap_or(PageRange::new(1, page_count));
        range.validate(page_count)?;

        tracing::debug!(
            "Rendering pages {}-{} of {} at {} DPI",
            range.first,
            range.last,
            page_count,
            dpi
        );

        for page in range.first..=range.last {
            visit(render_document_page(&doc, page, dpi)?)?;
        }
        Ok(())
    }

    /// Render a single 1-based page
    pub fn render_page(&self, pdf: &[u8], dpi: u32, page: u32) -> DocumentResult<RasterImage> {
        self.check_dpi(dpi)?;

        let doc = open_document(pdf)?;
        let page_count = document_page_count(&doc)?;
        if page == 0 || page > page_count {
            return Err(DocumentError::PageOutOfRange { page, page_count });
        }

        render_document_page(&doc, page, dpi)
    }

    fn check_dpi(&self, dpi: u32) -> DocumentResult<()> {
        if dpi == 0 || dpi > self.max_dpi {
            return Err(DocumentError::UnsupportedDpi {
                dpi,
                max_dpi: self.max_dpi,
            });
        }
        Ok(())
    }
}

fn open_document(pdf: &[u8]) -> DocumentResult<Document> {
    if !is_pdf(pdf) {
        return Err(DocumentError::InvalidPdf(
            "missing %PDF header".to_string(),
        ));
    }
    Document::from_bytes(pdf, PDF_MIME).map_err(|e| DocumentError::InvalidPdf(e.to_string()))
}

fn document_page_count(doc: &Document) -> DocumentResult<u32> {
    let count = doc
        .page_count()
        .map_err(|e| DocumentError::InvalidPdf(e.to_string()))?;
    if count <= 0 {
        return Err(DocumentError::EmptyDocument);
    }
    Ok(count as u32)
}

fn render_document_page(doc: &Document, page: u32, dpi: u32) -> DocumentResult<RasterImage> {
    let render_err = |e: mupdf::Error| DocumentError::RenderError {
        page,
        message: e.to_string(),
    };

    let mupdf_page = doc.load_page(page as i32 - 1).map_err(render_err)?;
    let bounds = mupdf_page.bounds().map_err(render_err)?;

    let scale = dpi_scale(dpi) as f32;
    let matrix = Matrix::new_scale(scale, scale);
    let colorspace = Colorspace::device_rgb();
    let pixmap = mupdf_page
        .to_pixmap(&matrix, &colorspace, false, true)
        .map_err(render_err)?;

    let image = pixmap_to_image(
        pixmap.samples(),
        pixmap.width() as u32,
        pixmap.height() as u32,
        pixmap.n() as usize,
    )?;

    Ok(RasterImage {
        page,
        dpi,
        page_width_pt: bounds.x1 - bounds.x0,
        page_height_pt: bounds.y1 - bounds.y0,
        image,
    })
}

/// Convert raw pixmap samples into an image buffer
///
/// Rows may be padded, so the stride is derived from the sample length.
fn pixmap_to_image(
    samples: &[u8],
    width: u32,
    height: u32,
    n: usize,
) -> DocumentResult<DynamicImage> {
    if width == 0 || height == 0 {
        return Err(DocumentError::ImageError(format!(
            "empty pixmap {}x{}",
            width, height
        )));
    }

    let row_len = width as usize * n;
    let stride = samples.len() / height as usize;
    if stride < row_len {
        return Err(DocumentError::ImageError(format!(
            "pixmap has {} bytes, expected at least {}",
            samples.len(),
            row_len * height as usize
        )));
    }

    let mut packed = Vec::with_capacity(row_len * height as usize);
    for row in samples.chunks(stride).take(height as usize) {
        packed.extend_from_slice(&row[..row_len]);
    }

    let buffer_err = || DocumentError::ImageError("Failed to create image buffer".to_string());
    let image = match n {
        1 => DynamicImage::ImageLuma8(GrayImage::from_raw(width, height, packed).ok_or_else(buffer_err)?),
        3 => DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, packed).ok_or_else(buffer_err)?),
        4 => DynamicImage::ImageRgba8(RgbaImage::from_raw(width, height, packed).ok_or_else(buffer_err)?),
        other => {
            return Err(DocumentError::ImageError(format!(
                "unsupported pixmap component count {}",
                other
            )))
        }
    };

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::fixtures::blank_pdf;

    #[test]
    fn test_page_range_validation() {
        assert!(PageRange::new(1, 3).validate(3).is_ok());
        assert!(matches!(
            PageRange::new(2, 4).validate(3),
            Err(DocumentError::PageOutOfRange { page: 4, page_count: 3 })
        ));
        assert!(matches!(
            PageRange::new(3, 1).validate(3),
            Err(DocumentError::InvalidPageRange { .. })
        ));
        assert!(matches!(
            PageRange::new(0, 1).validate(3),
            Err(DocumentError::InvalidPageRange { .. })
        ));
    }

    #[test]
    fn test_pixmap_to_image_rgb() {
        let samples = vec![10u8, 20, 30, 40, 50, 60];
        let image = pixmap_to_image(&samples, 2, 1, 3).unwrap();
        assert_eq!(image.width(), 2);
        assert_eq!(image.height(), 1);
        assert_eq!(image.to_rgb8().get_pixel(1, 0).0, [40, 50, 60]);
    }

    #[test]
    fn test_pixmap_to_image_handles_row_padding() {
        // 1x2 gray image with one padding byte per row
        let samples = vec![7u8, 0, 9, 0];
        let image = pixmap_to_image(&samples, 1, 2, 1).unwrap();
        let gray = image.to_luma8();
        assert_eq!(gray.get_pixel(0, 0).0, [7]);
        assert_eq!(gray.get_pixel(0, 1).0, [9]);
    }

    #[test]
    fn test_pixmap_to_image_rejects_short_buffer() {
        let samples = vec![0u8; 5];
        assert!(matches!(
            pixmap_to_image(&samples, 2, 1, 3),
            Err(DocumentError::ImageError(_))
        ));
    }

    #[test]
    fn test_rejects_non_pdf() {
        let rasterizer = Rasterizer::default();
        let result = rasterizer.render(b"definitely not a pdf", 72, None);
        assert!(matches!(result, Err(DocumentError::InvalidPdf(_))));
    }

    #[test]
    fn test_rejects_bad_dpi() {
        let rasterizer = Rasterizer::new(400);
        let pdf = blank_pdf(612, 792, 1);
        assert!(matches!(
            rasterizer.render_page(&pdf, 0, 1),
            Err(DocumentError::UnsupportedDpi { dpi: 0, .. })
        ));
        assert!(matches!(
            rasterizer.render_page(&pdf, 401, 1),
            Err(DocumentError::UnsupportedDpi { dpi: 401, max_dpi: 400 })
        ));
    }

    #[test]
    fn test_render_page_dimensions_follow_dpi() {
        let rasterizer = Rasterizer::default();
        let pdf = blank_pdf(612, 792, 1);

        let at_72 = rasterizer.render_page(&pdf, 72, 1).unwrap();
        assert_eq!((at_72.width(), at_72.height()), (612, 792));
        assert_eq!(at_72.page, 1);
        assert_eq!(at_72.page_width_pt, 612.0);

        let at_300 = rasterizer.render_page(&pdf, 300, 1).unwrap();
        assert_eq!((at_300.width(), at_300.height()), (2550, 3300));
        assert_eq!(at_300.dpi, 300);
    }

    #[test]
    fn test_render_all_pages_and_out_of_range() {
        let rasterizer = Rasterizer::default();
        let pdf = blank_pdf(200, 100, 3);

        assert_eq!(rasterizer.page_count(&pdf).unwrap(), 3);

        let pages = rasterizer.render(&pdf, 36, None).unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages.iter().map(|p| p.page).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!((pages[0].width(), pages[0].height()), (100, 50));

        let subset = rasterizer.render(&pdf, 36, Some(PageRange::new(2, 3))).unwrap();
        assert_eq!(subset.len(), 2);
        assert_eq!(subset[0].page, 2);

        assert!(matches!(
            rasterizer.render_page(&pdf, 72, 4),
            Err(DocumentError::PageOutOfRange { page: 4, page_count: 3 })
        ));
    }

    #[test]
    fn test_render_each_stops_on_visitor_error() {
        let rasterizer = Rasterizer::default();
        let pdf = blank_pdf(200, 100, 3);

        let mut seen = Vec::new();
        let result = rasterizer.render_each(&pdf, 36, None, |raster| {
            seen.push(raster.page);
            if raster.page == 2 {
                return Err(DocumentError::ImageError("stop".into()));
            }
            Ok(())
        });

        assert!(matches!(result, Err(DocumentError::ImageError(_))));
        assert_eq!(seen, vec![1, 2]);
    }
}
