//! Region extraction pipeline
//!
//! Composes rasterizing, preprocessing, recognition and classification for
//! whole-document sweeps and single bounding-box requests, and merges the
//! OCR result of a region with the structured-extraction model's answer.
//!
//! ```text
//! sweep:  PDF -> render all pages -> preprocess -> OCR (sparse) -> classify (strict)
//! region: PDF -> render page -> box to pixels -> crop -> preprocess -> OCR (dense) -> find_all
//!                                                     \-> structured model (concurrent, optional)
//! ```

mod error;
mod service;
mod types;

pub use error::ExtractError;
pub use service::ExtractionService;
pub use types::{CropImage, DebugInfo, DocumentSweep, ExtractionConfig, OcrSummary, RegionExtraction};
