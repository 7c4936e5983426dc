//! OCR Types
//!
//! Types shared by the text recognizer and its callers.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Recognition mode
///
/// The two modes trade recall against phrase coherence differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognitionMode {
    /// Isolated numbers scattered over a whole page; one token per word
    Sparse,
    /// A small crop holding a label or phrase; one token per text line
    Dense,
}

/// Text recognized by the engine, in the pixel space of the image it was given
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawToken {
    pub text: String,
    /// Engine confidence (0-100); `None` when the engine reported none
    pub confidence: Option<f32>,
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl RawToken {
    /// Build a token from an engine row, mapping the `-1` "no score" marker to `None`
    pub fn from_engine(
        text: impl Into<String>,
        confidence: f32,
        left: u32,
        top: u32,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            text: text.into(),
            confidence: normalize_confidence(confidence),
            left,
            top,
            width,
            height,
        }
    }
}

/// Map engine confidence to an optional score
///
/// Tesseract reports `-1` for rows without a score. Anything negative or
/// non-finite is treated the same way.
pub fn normalize_confidence(raw: f32) -> Option<f32> {
    if raw.is_finite() && raw >= 0.0 {
        Some(raw)
    } else {
        None
    }
}

/// Tesseract settings, passed to the recognizer at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TesseractConfig {
    /// Path or name of the tesseract binary
    pub binary: PathBuf,
    /// Language pack (e.g. "eng")
    pub language: String,
    /// OCR engine mode
    pub oem: u8,
    /// Page segmentation mode for sparse sweeps (11 = sparse text)
    pub sparse_psm: u8,
    /// Page segmentation mode for dense regions (6 = single uniform block)
    pub dense_psm: u8,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            oem: 3,
            sparse_psm: 11,
            dense_psm: 6,
        }
    }
}

impl TesseractConfig {
    /// Page segmentation mode for a recognition mode
    pub fn psm_for(&self, mode: RecognitionMode) -> u8 {
        match mode {
            RecognitionMode::Sparse => self.sparse_psm,
            RecognitionMode::Dense => self.dense_psm,
        }
    }
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    /// Engine binary missing or not executable
    #[error("OCR engine not available: {0}")]
    Unavailable(String),

    #[error("Failed to prepare image for OCR: {0}")]
    ImageError(String),

    #[error("OCR processing failed: {0}")]
    ProcessingError(String),
}

impl OcrError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
