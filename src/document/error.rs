//! Document error types
//!
//! Errors raised while opening and rasterizing drawing PDFs.

use thiserror::Error;

/// Errors from opening or rendering a PDF drawing
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Input is not a PDF or MuPDF refused to open it
    #[error("Invalid PDF document: {0}")]
    InvalidPdf(String),

    /// Document opened but contains no pages
    #[error("PDF document has no pages")]
    EmptyDocument,

    /// Requested page outside the document
    #[error("Page {page} is out of range (document has {page_count} pages)")]
    PageOutOfRange { page: u32, page_count: u32 },

    /// Page range with first > last
    #[error("Invalid page range {first}-{last}")]
    InvalidPageRange { first: u32, last: u32 },

    /// Too many pages requested for one sweep
    #[error("Document has {page_count} pages, the limit is {max_pages}")]
    TooManyPages { page_count: u32, max_pages: u32 },

    /// DPI outside the accepted range
    #[error("Unsupported DPI {dpi} (accepted range: 1-{max_dpi})")]
    UnsupportedDpi { dpi: u32, max_dpi: u32 },

    /// Failed to render a page
    #[error("Failed to render page {page}: {message}")]
    RenderError { page: u32, message: String },

    /// Image conversion or encoding error
    #[error("Image error: {0}")]
    ImageError(String),
}

impl DocumentError {
    /// Whether the caller can fix the request (bad file, bad page, bad DPI)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidPdf(_)
                | Self::EmptyDocument
                | Self::PageOutOfRange { .. }
                | Self::InvalidPageRange { .. }
                | Self::TooManyPages { .. }
                | Self::UnsupportedDpi { .. }
        )
    }
}

/// Result type alias for document operations
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Alias for Result
pub type DocumentResult<T> = Result<T>;

impl From<image::ImageError> for DocumentError {
    fn from(err: image::ImageError) -> Self {
        DocumentError::ImageError(err.to_string())
    }
}
