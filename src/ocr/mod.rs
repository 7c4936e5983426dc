//! OCR Module
//!
//! Text recognition over rendered drawing pages and cropped regions.
//!
//! The recognizer is built from an explicit [`TesseractConfig`]; nothing is
//! looked up from process-global state.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use drawscan_server::ocr::{RecognitionMode, TesseractConfig, TesseractRecognizer, TextRecognizer};
//!
//! let recognizer = TesseractRecognizer::new(TesseractConfig::default());
//! let tokens = recognizer.recognize(&gray_page, RecognitionMode::Sparse, 200)?;
//! ```

mod provider;
mod tsv;
mod types;

pub use provider::{TesseractRecognizer, TextRecognizer};
pub use types::{normalize_confidence, OcrError, RawToken, RecognitionMode, TesseractConfig};

#[cfg(test)]
pub(crate) use provider::MockRecognizer;
