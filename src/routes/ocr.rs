//! OCR extraction endpoints
//!
//! - `POST /api/ocr/process`: find dimensions on every page of an uploaded PDF
//! - `POST /api/ocr/region`: extract the dimension inside one bounding box
//!
//! Both take a multipart body with the PDF in a `file` (or `pdf`) field.
//! The region endpoint also needs a `bbox` field holding the box as JSON and
//! accepts an optional `dpi` field.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::extract::{DocumentSweep, RegionExtraction};
use crate::geometry::BoundingBox;
use crate::state::AppState;

/// Create the OCR router
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/process", post(process_document))
        .route("/region", post(extract_region))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

#[derive(Serialize)]
pub struct SweepResponse {
    pub success: bool,
    #[serde(flatten)]
    pub sweep: DocumentSweep,
}

#[derive(Serialize)]
pub struct RegionResponse {
    pub success: bool,
    #[serde(flatten)]
    pub extraction: RegionExtraction,
}

/// Fields read from an extraction upload
#[derive(Default)]
struct UploadForm {
    pdf: Option<Vec<u8>>,
    bbox: Option<String>,
    dpi: Option<String>,
}

impl UploadForm {
    fn take_pdf(&mut self) -> Result<Vec<u8>> {
        self.pdf.take().ok_or_else(|| {
            AppError::BadRequest("No file provided. Use field name 'file' or 'pdf'".to_string())
        })
    }

    fn bounding_box(&self) -> Result<BoundingBox> {
        let raw = self
            .bbox
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("Missing 'bbox' field".to_string()))?;
        serde_json::from_str(raw)
            .map_err(|e| AppError::BadRequest(format!("Invalid bbox JSON: {}", e)))
    }

    fn dpi(&self) -> Result<Option<u32>> {
        match self.dpi.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| AppError::BadRequest(format!("Invalid dpi '{}'", raw))),
        }
    }
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read upload: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();
        tracing::debug!(
            "Received field: name='{}', filename={:?}, content_type={:?}",
            name,
            field.file_name(),
            field.content_type()
        );

        match name.as_str() {
            "file" | "pdf" => {
                let data = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;
                tracing::debug!("Read {} bytes of file data", data.len());
                form.pdf = Some(data.to_vec());
            }
            "bbox" | "dpi" => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read field '{}': {}", name, e))
                })?;
                if name == "bbox" {
                    form.bbox = Some(text);
                } else {
                    form.dpi = Some(text);
                }
            }
            _ => tracing::debug!("Ignoring unknown field '{}'", name),
        }
    }

    Ok(form)
}

/// Sweep every page of an uploaded drawing
async fn process_document(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SweepResponse>> {
    let mut form = read_form(multipart).await?;
    let dpi = form.dpi()?;
    let pdf = form.take_pdf()?;

    let span = tracing::info_span!("sweep", request_id = %Uuid::new_v4(), bytes = pdf.len());
    let sweep = state
        .extraction()
        .sweep_document(pdf, dpi)
        .instrument(span)
        .await?;

    Ok(Json(SweepResponse {
        success: true,
        sweep,
    }))
}

/// Extract one bounding box from an uploaded drawing
async fn extract_region(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<RegionResponse>> {
    let mut form = read_form(multipart).await?;
    let bbox = form.bounding_box()?;
    let dpi = form.dpi()?;
    let pdf = form.take_pdf()?;

    let span = tracing::info_span!("region", request_id = %Uuid::new_v4(), page = bbox.page_number);
    tracing::debug!(parent: &span, ?dpi, "Region request: {:?}", bbox);

    let extraction = state
        .extraction()
        .extract_region(pdf, bbox, dpi)
        .instrument(span)
        .await?;

    Ok(Json(RegionResponse {
        success: true,
        extraction,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::extract::{ExtractionConfig, ExtractionService};
    use crate::ocr::{MockRecognizer, RawToken};
    use crate::raster::fixtures::blank_pdf;
    use crate::routes;
    use crate::state::AppState;

    const BOUNDARY: &str = "drawscan-test-boundary";

    fn app(recognizer: MockRecognizer) -> axum::Router {
        let service = ExtractionService::new(ExtractionConfig::default(), Arc::new(recognizer));
        routes::router(AppState::with_service(Config::default(), service))
    }

    fn dimension_recognizer() -> MockRecognizer {
        MockRecognizer::with_tokens(vec![RawToken::from_engine("⌀12.5mm", 90.0, 1, 2, 3, 4)])
    }

    /// Multipart body: (name, optional filename, content)
    fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, filename, content) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match filename {
                Some(file) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/pdf\r\n\r\n",
                        name, file
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                ),
            }
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    async fn post(app: axum::Router, uri: &str, body: Vec<u8>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_process_document() {
        let pdf = blank_pdf(612, 792, 2);
        let body = multipart_body(&[("dpi", None, &b"72"[..]), ("file", Some("part.pdf"), &pdf[..])]);

        let (status, json) = post(app(dimension_recognizer()), "/api/ocr/process", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["dpi"], 72);
        assert_eq!(json["page_count"], 2);
        assert_eq!(json["results"]["1"][0]["value"], "⌀12.5mm");
        assert_eq!(json["results"]["2"][0]["coordinates"]["y"], 2);
    }

    #[tokio::test]
    async fn test_process_requires_file() {
        let body = multipart_body(&[("dpi", None, &b"72"[..])]);
        let (status, json) = post(app(dimension_recognizer()), "/api/ocr/process", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_process_rejects_non_pdf() {
        let body = multipart_body(&[("pdf", Some("notes.pdf"), &b"hello"[..])]);
        let (status, json) = post(app(dimension_recognizer()), "/api/ocr/process", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid_document");
    }

    #[tokio::test]
    async fn test_region() {
        let pdf = blank_pdf(612, 792, 1);
        let bbox: &[u8] = br#"{"startX":100,"startY":100,"width":50,"height":20,"scale":2.0,"pageNumber":1}"#;
        let body = multipart_body(&[("pdf", Some("part.pdf"), &pdf[..]), ("bbox", None, bbox)]);

        let (status, json) = post(app(dimension_recognizer()), "/api/ocr/region", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["image"]["width"], 208);
        assert_eq!(json["image"]["height"], 83);
        assert_eq!(json["ocr"]["token_count"], 1);
        assert_eq!(json["ocr"]["tokens"][0]["value"], "⌀12.5mm");
        assert_eq!(json["ocr"]["raw_text"], "⌀12.5mm");
        assert_eq!(json["debug"]["pixel_region"]["x"], 417);
        assert_eq!(json["debug"]["dpi"], 300);
        assert_eq!(json["debug"]["display_scale"], 2.0);
        assert!(json.get("structured_result").is_none());
        assert_eq!(json["structured_error"], "no structured extractor configured");
    }

    #[tokio::test]
    async fn test_region_bad_bbox_json() {
        let pdf = blank_pdf(612, 792, 1);
        let body = multipart_body(&[("file", Some("part.pdf"), &pdf[..]), ("bbox", None, &b"{not json"[..])]);
        let (status, json) = post(app(dimension_recognizer()), "/api/ocr/region", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["message"].as_str().unwrap().contains("Invalid bbox JSON"));
    }

    #[tokio::test]
    async fn test_region_bad_dpi() {
        let pdf = blank_pdf(612, 792, 1);
        let bbox: &[u8] = br#"{"startX":1,"startY":1,"width":5,"height":5,"pageNumber":1}"#;
        let body = multipart_body(&[
            ("file", Some("part.pdf"), &pdf[..]),
            ("bbox", None, bbox),
            ("dpi", None, &b"fine"[..]),
        ]);
        let (status, _) = post(app(dimension_recognizer()), "/api/ocr/region", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_region_outside_page() {
        let pdf = blank_pdf(612, 792, 1);
        let bbox: &[u8] = br#"{"startX":-200,"startY":10,"width":50,"height":20,"pageNumber":1}"#;
        let body = multipart_body(&[("file", Some("part.pdf"), &pdf[..]), ("bbox", None, bbox)]);
        let (status, json) = post(app(dimension_recognizer()), "/api/ocr/region", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid_region");
    }

    #[tokio::test]
    async fn test_region_ocr_unavailable() {
        let pdf = blank_pdf(612, 792, 1);
        let bbox: &[u8] = br#"{"startX":10,"startY":10,"width":50,"height":20,"pageNumber":1}"#;
        let body = multipart_body(&[("file", Some("part.pdf"), &pdf[..]), ("bbox", None, bbox)]);
        let (status, json) = post(app(MockRecognizer::unavailable()), "/api/ocr/region", body).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "ocr_unavailable");
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder()
            .uri("/api/v1/health")
            .body(Body::empty())
            .unwrap();
        let response = app(dimension_recognizer()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["ocr_available"], true);
        assert_eq!(json["structured_provider"], Value::Null);
    }
}
