//! Extraction settings and results

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dimension::DimensionToken;
use crate::geometry::PixelRegion;
use crate::preprocess::PreprocessConfig;
use crate::structured::DrawingMeasurement;

/// Orchestrator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// DPI for single-region requests
    pub region_dpi: u32,
    /// DPI for whole-document sweeps
    pub sweep_dpi: u32,
    /// Highest DPI a request may ask for
    pub max_dpi: u32,
    /// Largest document a sweep will process
    pub max_pages: u32,
    /// Budget for each CPU-bound stage (render, recognize)
    pub pipeline_timeout_secs: u64,
    pub preprocess: PreprocessConfig,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            region_dpi: 300,
            sweep_dpi: 200,
            max_dpi: 600,
            max_pages: 50,
            pipeline_timeout_secs: 120,
            preprocess: PreprocessConfig::default(),
        }
    }
}

/// Dimensions found on each page of a document, keyed by 1-based page number
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSweep {
    pub dpi: u32,
    pub page_count: u32,
    pub results: BTreeMap<u32, Vec<DimensionToken>>,
}

impl DocumentSweep {
    pub fn token_count(&self) -> usize {
        self.results.values().map(Vec::len).sum()
    }
}

/// Cropped region as a base64 PNG
#[derive(Debug, Clone, Serialize)]
pub struct CropImage {
    pub data: String,
    pub width: u32,
    pub height: u32,
}

/// OCR side of a region result
#[derive(Debug, Clone, Serialize)]
pub struct OcrSummary {
    pub tokens: Vec<DimensionToken>,
    /// Recognized text, one line per token
    pub raw_text: String,
    pub token_count: usize,
}

/// Geometry used for the crop, for calibrating the front end
#[derive(Debug, Clone, Serialize)]
pub struct DebugInfo {
    /// Size of the rendered page
    pub image_width: u32,
    pub image_height: u32,
    pub pixel_region: PixelRegion,
    /// Points to pixels (`dpi / 72`)
    pub scale_factor: f64,
    pub dpi: u32,
    /// Display scale the box was drawn at; not used in pixel math
    pub display_scale: f64,
    pub page_width_pt: f32,
    pub page_height_pt: f32,
}

/// Merged result of one region request
///
/// Both sides are reported; neither overrides the other.
#[derive(Debug, Clone, Serialize)]
pub struct RegionExtraction {
    pub image: CropImage,
    pub ocr: OcrSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_result: Option<DrawingMeasurement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_error: Option<String>,
    pub debug: DebugInfo,
}
