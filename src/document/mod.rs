//! Source document handling
//!
//! Error taxonomy and format detection for the PDF drawings fed into the
//! extraction pipeline. Rendering itself lives in [`crate::raster`].

mod error;

pub use error::{DocumentError, DocumentResult, Result};

/// PDF magic bytes
const PDF_MAGIC: &[u8] = b"%PDF";

/// Check whether the bytes look like a PDF document
///
/// Only the header is inspected. MuPDF may still reject the body.
pub fn is_pdf(bytes: &[u8]) -> bool {
    // Some producers prepend junk before the header; PDF readers accept it
    // within the first kilobyte.
    let window = &bytes[..bytes.len().min(1024)];
    window
        .windows(PDF_MAGIC.len())
        .any(|w| w == PDF_MAGIC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(b"%PDF-1.7\n..."));
        assert!(is_pdf(b"\xEF\xBB\xBF%PDF-1.4"));
        assert!(!is_pdf(b"PK\x03\x04"));
        assert!(!is_pdf(b""));
    }
}
