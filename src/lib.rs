//! Drawscan Server Library
//!
//! Dimension and tolerance extraction from scanned engineering drawings.
//! The server binary in main.rs wires these modules behind an axum router;
//! benchmarks and tests use them directly.
//!
//! # Modules
//!
//! - `raster`: PDF page rendering via MuPDF
//! - `preprocess`: grayscale + contrast normalization before OCR
//! - `geometry`: PDF point boxes to pixel regions
//! - `ocr`: Tesseract text recognition
//! - `dimension`: pattern-based dimension classification
//! - `structured`: multimodal model client for typed measurements
//! - `extract`: the region/document extraction pipeline

pub mod config;
pub mod dimension;
pub mod document;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod ocr;
pub mod preprocess;
pub mod raster;
pub mod routes;
pub mod state;
pub mod structured;
