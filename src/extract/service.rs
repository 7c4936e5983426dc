//! Extraction orchestrator

use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use base64::Engine;
use image::{DynamicImage, ImageFormat};
use tokio::time::{timeout, Duration};

use super::error::ExtractError;
use super::types::{
    CropImage, DebugInfo, DocumentSweep, ExtractionConfig, OcrSummary, RegionExtraction,
};
use crate::dimension::{DimensionClassifier, DimensionToken};
use crate::document::DocumentError;
use crate::geometry::{to_pixel_region, BoundingBox, PixelRegion};
use crate::ocr::{RawToken, RecognitionMode, TextRecognizer};
use crate::preprocess::Preprocessor;
use crate::raster::{dpi_scale, Rasterizer};
use crate::structured::{DrawingMeasurement, ExternalModelError, StructuredExtractor, INSTRUCTION};

/// Default budget for one structured-extraction call
const STRUCTURED_TIMEOUT_SECS: u64 = 30;

/// Output of the render + crop stage
struct CroppedRegion {
    crop: DynamicImage,
    png: Vec<u8>,
    region: PixelRegion,
    image_width: u32,
    image_height: u32,
    page_width_pt: f32,
    page_height_pt: f32,
}

/// Set when a blocking stage outlives the pipeline timeout
///
/// The request has already failed by then; work that checks the flag stops
/// at its next checkpoint.
#[derive(Clone, Default)]
struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Runs extraction requests
///
/// Holds no per-request state; share it behind an `Arc`.
pub struct ExtractionService {
    config: ExtractionConfig,
    rasterizer: Rasterizer,
    preprocessor: Preprocessor,
    classifier: DimensionClassifier,
    recognizer: Arc<dyn TextRecognizer>,
    extractor: Option<Arc<dyn StructuredExtractor>>,
    structured_timeout: Duration,
}

impl ExtractionService {
    pub fn new(config: ExtractionConfig, recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            rasterizer: Rasterizer::new(config.max_dpi),
            preprocessor: Preprocessor::new(config.preprocess),
            classifier: DimensionClassifier::new(),
            config,
            recognizer,
            extractor: None,
            structured_timeout: Duration::from_secs(STRUCTURED_TIMEOUT_SECS),
        }
    }

    /// Attach a structured extractor with its own timeout
    pub fn with_extractor(mut self, extractor: Arc<dyn StructuredExtractor>, limit: Duration) -> Self {
        self.extractor = Some(extractor);
        self.structured_timeout = limit;
        self
    }

    /// Shared handle to the text recognizer
    pub fn recognizer(&self) -> Arc<dyn TextRecognizer> {
        Arc::clone(&self.recognizer)
    }

    /// Name of the structured extractor, if one is configured
    pub fn extractor_name(&self) -> Option<&'static str> {
        self.extractor.as_ref().map(|e| e.name())
    }

    /// Find dimensions on every page of a document
    ///
    /// Pages are rendered at the sweep DPI (or `dpi` when given), recognized
    /// in sparse mode and classified strictly. Only one page bitmap is alive
    /// at a time, and a timed-out sweep stops after the page in flight.
    pub async fn sweep_document(
        &self,
        pdf: Vec<u8>,
        dpi: Option<u32>,
    ) -> Result<DocumentSweep, ExtractError> {
        let dpi = dpi.unwrap_or(self.config.sweep_dpi);
        let max_pages = self.config.max_pages;
        let rasterizer = self.rasterizer.clone();
        let preprocessor = self.preprocessor.clone();
        let classifier = self.classifier;
        let recognizer = Arc::clone(&self.recognizer);
        let timeout_secs = self.config.pipeline_timeout_secs;
        let started = Instant::now();

        let sweep = self
            .run_blocking(move |cancel| {
                let page_count = rasterizer.page_count(&pdf)?;
                if page_count > max_pages {
                    return Err(DocumentError::TooManyPages {
                        page_count,
                        max_pages,
                    }
                    .into());
                }

                let mut results = BTreeMap::new();
                rasterizer.render_each::<ExtractError, _>(&pdf, dpi, None, |raster| {
                    let page = raster.page;
                    let gray = preprocessor.preprocess(&raster.image);
                    drop(raster);
                    let tokens = recognizer.recognize(&gray, RecognitionMode::Sparse, dpi)?;
                    let dimensions = classifier.classify(&tokens);
                    tracing::debug!(
                        page,
                        words = tokens.len(),
                        dimensions = dimensions.len(),
                        "Page swept"
                    );
                    results.insert(page, dimensions);

                    if cancel.is_cancelled() {
                        tracing::debug!(page, "Sweep cancelled after timeout");
                        return Err(ExtractError::Timeout(timeout_secs));
                    }
                    Ok(())
                })?;

                Ok(DocumentSweep {
                    dpi,
                    page_count,
                    results,
                })
            })
            .await?;

        tracing::info!(
            pages = sweep.page_count,
            dpi,
            dimensions = sweep.token_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Document sweep complete"
        );

        Ok(sweep)
    }

    /// Extract the dimension inside one bounding box
    ///
    /// OCR failures fail the request. The structured model runs alongside
    /// OCR and any failure there only sets `structured_error`.
    pub async fn extract_region(
        &self,
        pdf: Vec<u8>,
        bbox: BoundingBox,
        dpi: Option<u32>,
    ) -> Result<RegionExtraction, ExtractError> {
        bbox.validate()?;

        let dpi = dpi.unwrap_or(self.config.region_dpi);
        let started = Instant::now();

        let rasterizer = self.rasterizer.clone();
        let cropped = self
            .run_blocking(move |_| crop_region(&rasterizer, &pdf, &bbox, dpi))
            .await?;

        tracing::debug!(
            page = bbox.page_number,
            dpi,
            region = ?cropped.region,
            "Region cropped"
        );

        let structured_task = self.extractor.as_ref().map(|extractor| {
            let extractor = Arc::clone(extractor);
            let png = cropped.png.clone();
            let limit = self.structured_timeout;
            let name = extractor.name();
            (
                name,
                tokio::spawn(async move { request_measurement(extractor.as_ref(), &png, limit).await }),
            )
        });

        let preprocessor = self.preprocessor.clone();
        let classifier = self.classifier;
        let recognizer = Arc::clone(&self.recognizer);
        let crop = cropped.crop;
        let ocr = self
            .run_blocking(move |_| {
                let gray = preprocessor.preprocess(&crop);
                let tokens = recognizer.recognize(&gray, RecognitionMode::Dense, dpi)?;
                let dimensions = classifier.find_all(&tokens);
                Ok((tokens, dimensions))
            })
            .await;

        let (raw_tokens, dimensions) = match ocr {
            Ok(result) => result,
            Err(e) => {
                if let Some((_, task)) = structured_task {
                    task.abort();
                }
                return Err(e);
            }
        };

        let structured = match structured_task {
            None => Err(ExternalModelError::NotConfigured),
            Some((name, task)) => task.await.unwrap_or_else(|e| {
                Err(ExternalModelError::Transport {
                    provider: name,
                    message: format!("extraction task failed: {}", e),
                })
            }),
        };

        let (structured_result, structured_error) = match structured {
            Ok(measurement) => (Some(measurement), None),
            Err(ExternalModelError::NotConfigured) => {
                (None, Some(ExternalModelError::NotConfigured.to_string()))
            }
            Err(e) => {
                tracing::warn!(page = bbox.page_number, "Structured extraction failed: {}", e);
                (None, Some(e.to_string()))
            }
        };

        let region = cropped.region;
        let extraction = RegionExtraction {
            image: CropImage {
                data: base64::engine::general_purpose::STANDARD.encode(&cropped.png),
                width: region.width,
                height: region.height,
            },
            ocr: summarize(&raw_tokens, dimensions),
            structured_result,
            structured_error,
            debug: DebugInfo {
                image_width: cropped.image_width,
                image_height: cropped.image_height,
                pixel_region: region,
                scale_factor: dpi_scale(dpi),
                dpi,
                display_scale: bbox.scale,
                page_width_pt: cropped.page_width_pt,
                page_height_pt: cropped.page_height_pt,
            },
        };

        tracing::info!(
            page = bbox.page_number,
            dpi,
            tokens = extraction.ocr.token_count,
            structured = extraction.structured_result.is_some(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Region extraction complete"
        );

        Ok(extraction)
    }

    /// Run CPU-bound work on the blocking pool under the pipeline timeout
    ///
    /// A blocking thread cannot be interrupted. On timeout the request fails
    /// right away and `work` sees its [`CancelFlag`] set.
    async fn run_blocking<T, F>(&self, work: F) -> Result<T, ExtractError>
    where
        F: FnOnce(CancelFlag) -> Result<T, ExtractError> + Send + 'static,
        T: Send + 'static,
    {
        let secs = self.config.pipeline_timeout_secs;
        let cancel = CancelFlag::default();
        let handle = tokio::task::spawn_blocking({
            let cancel = cancel.clone();
            move || work(cancel)
        });

        match timeout(Duration::from_secs(secs), handle).await {
            Ok(join_result) => join_result
                .map_err(|e| ExtractError::Internal(format!("Task join error: {}", e)))?,
            Err(_) => {
                cancel.cancel();
                Err(ExtractError::Timeout(secs))
            }
        }
    }
}

/// Render the requested page, map the box to pixels, crop and encode
fn crop_region(
    rasterizer: &Rasterizer,
    pdf: &[u8],
    bbox: &BoundingBox,
    dpi: u32,
) -> Result<CroppedRegion, ExtractError> {
    let raster = rasterizer.render_page(pdf, dpi, bbox.page_number)?;
    let (image_width, image_height) = (raster.width(), raster.height());

    let region = to_pixel_region(bbox, dpi, image_width, image_height)?;
    let crop = raster
        .image
        .crop_imm(region.x, region.y, region.width, region.height);

    let mut png = Vec::new();
    crop.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(DocumentError::from)?;

    Ok(CroppedRegion {
        crop,
        png,
        region,
        image_width,
        image_height,
        page_width_pt: raster.page_width_pt,
        page_height_pt: raster.page_height_pt,
    })
}

async fn request_measurement(
    extractor: &dyn StructuredExtractor,
    png: &[u8],
    limit: Duration,
) -> Result<DrawingMeasurement, ExternalModelError> {
    let measurement = timeout(limit, extractor.extract(png, INSTRUCTION))
        .await
        .map_err(|_| ExternalModelError::Timeout(limit.as_secs()))??;
    measurement.validate()?;
    Ok(measurement)
}

fn summarize(raw_tokens: &[RawToken], dimensions: Vec<DimensionToken>) -> OcrSummary {
    let raw_text = raw_tokens
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    OcrSummary {
        token_count: dimensions.len(),
        tokens: dimensions,
        raw_text,
    }
}
