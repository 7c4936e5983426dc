//! Text recognizers
//!
//! Defines the recognizer trait and the Tesseract implementation.

use std::process::Command;

use image::{GrayImage, ImageFormat};

use super::tsv::{parse_words, words_to_tokens};
use super::types::{OcrError, RawToken, RecognitionMode, TesseractConfig};

/// Text recognizer trait
///
/// Recognition is CPU-bound and synchronous; async callers run it on the
/// blocking pool.
pub trait TextRecognizer: Send + Sync {
    /// Short engine name for logs and health output
    fn name(&self) -> &'static str;

    /// Check if the engine can be invoked
    fn is_available(&self) -> bool;

    /// Recognize text in a preprocessed image
    ///
    /// `dpi` is the resolution the image was rendered at. Token coordinates
    /// are in the pixel space of `image`.
    fn recognize(
        &self,
        image: &GrayImage,
        mode: RecognitionMode,
        dpi: u32,
    ) -> Result<Vec<RawToken>, OcrError>;
}

/// Tesseract OCR via the command-line binary
pub struct TesseractRecognizer {
    config: TesseractConfig,
}

impl TesseractRecognizer {
    pub fn new(config: TesseractConfig) -> Self {
        Self { config }
    }

    fn run_tsv(&self, input: &std::path::Path, mode: RecognitionMode, dpi: u32) -> Result<String, OcrError> {
        let psm = self.config.psm_for(mode);

        let output = Command::new(&self.config.binary)
            .arg(input)
            .arg("stdout")
            .arg("-l")
            .arg(&self.config.language)
            .arg("--oem")
            .arg(self.config.oem.to_string())
            .arg("--psm")
            .arg(psm.to_string())
            .arg("--dpi")
            .arg(dpi.to_string())
            .arg("tsv")
            .output()
            .map_err(|e| {
                OcrError::Unavailable(format!(
                    "failed to run {}: {}",
                    self.config.binary.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::ProcessingError(format!(
                "Tesseract failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        Command::new(&self.config.binary)
            .arg("--version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn recognize(
        &self,
        image: &GrayImage,
        mode: RecognitionMode,
        dpi: u32,
    ) -> Result<Vec<RawToken>, OcrError> {
        // Removed on drop, including every early return below
        let input = tempfile::Builder::new()
            .prefix("drawscan-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::ImageError(format!("Failed to create temp file: {}", e)))?;

        image
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|e| OcrError::ImageError(format!("Failed to write temp image: {}", e)))?;

        let tsv = self.run_tsv(input.path(), mode, dpi)?;
        let words = parse_words(&tsv);
        let tokens = words_to_tokens(words, mode);

        tracing::debug!(
            "Tesseract {:?} pass on {}x{} image produced {} tokens",
            mode,
            image.width(),
            image.height(),
            tokens.len()
        );

        Ok(tokens)
    }
}

/// Canned recognizer for tests
#[cfg(test)]
pub(crate) struct MockRecognizer {
    pub tokens: Vec<RawToken>,
    pub available: bool,
    pub delay: Option<std::time::Duration>,
    pub calls: std::sync::Mutex<Vec<(RecognitionMode, u32, u32, u32)>>,
}

#[cfg(test)]
impl MockRecognizer {
    pub fn with_tokens(tokens: Vec<RawToken>) -> Self {
        Self {
            tokens,
            available: true,
            delay: None,
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Block for `delay` on every call
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::with_tokens(Vec::new())
        }
    }

    /// (mode, image width, image height, dpi) for each call
    pub fn calls(&self) -> Vec<(RecognitionMode, u32, u32, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl TextRecognizer for MockRecognizer {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn recognize(
        &self,
        image: &GrayImage,
        mode: RecognitionMode,
        dpi: u32,
    ) -> Result<Vec<RawToken>, OcrError> {
        if !self.available {
            return Err(OcrError::Unavailable("mock engine disabled".into()));
        }
        self.calls
            .lock()
            .unwrap()
            .push((mode, image.width(), image.height(), dpi));
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        Ok(self.tokens.clone())
    }
}
