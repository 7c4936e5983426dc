use axum::http::StatusCode;
use thiserror::Error;

use crate::document::DocumentError;
use crate::geometry::InvalidRegionError;
use crate::ocr::OcrError;

/// Errors that fail an extraction request
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    InvalidRegion(#[from] InvalidRegionError),

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error("Extraction timed out after {0}s")]
    Timeout(u64),

    #[error("Internal extraction error: {0}")]
    Internal(String),
}

impl ExtractError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Document(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Document(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidRegion(_) => StatusCode::BAD_REQUEST,
            Self::Ocr(e) => e.status_code(),
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Document(e) if e.is_client_error() => "invalid_document",
            Self::Document(_) => "render_error",
            Self::InvalidRegion(_) => "invalid_region",
            Self::Ocr(OcrError::Unavailable(_)) => "ocr_unavailable",
            Self::Ocr(_) => "ocr_error",
            Self::Timeout(_) => "timeout",
            Self::Internal(_) => "internal_error",
        }
    }
}
