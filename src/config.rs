//! Configuration management for the drawscan server

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::extract::ExtractionConfig;
use crate::ocr::TesseractConfig;
use crate::preprocess::{ContrastPivot, PreprocessConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub extraction: ExtractionConfig,
    pub ocr: TesseractConfig,
    pub structured: StructuredConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origin; any origin when unset
    pub cors_origin: Option<String>,
    pub max_upload_mb: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructuredProvider {
    None,
    Ollama,
    OpenAi,
}

impl FromStr for StructuredProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" | "off" => Ok(Self::None),
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAi),
            other => Err(format!("unknown provider '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StructuredConfig {
    pub provider: StructuredProvider,
    /// Base URL; for OpenAI-compatible servers, without the `/v1` suffix
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

/// Invalid configuration value
#[derive(Debug, Error)]
#[error("Invalid value '{value}' for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                cors_origin: None,
                max_upload_mb: 50,
            },
            extraction: ExtractionConfig::default(),
            ocr: TesseractConfig::default(),
            structured: StructuredConfig {
                provider: StructuredProvider::None,
                url: "http://localhost:11434".to_string(),
                model: "llava".to_string(),
                api_key: None,
                timeout_secs: 30,
            },
        }
    }
}

impl Config {
    /// Build the configuration from environment variables
    ///
    /// Unset variables keep their defaults; set but unparsable ones are an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let extraction = ExtractionConfig {
            region_dpi: parse_var("REGION_DPI", defaults.extraction.region_dpi)?,
            sweep_dpi: parse_var("SWEEP_DPI", defaults.extraction.sweep_dpi)?,
            max_dpi: parse_var("MAX_DPI", defaults.extraction.max_dpi)?,
            max_pages: parse_var("MAX_PAGES", defaults.extraction.max_pages)?,
            pipeline_timeout_secs: parse_var(
                "PIPELINE_TIMEOUT_SECS",
                defaults.extraction.pipeline_timeout_secs,
            )?,
            preprocess: PreprocessConfig {
                contrast_factor: parse_var(
                    "CONTRAST_FACTOR",
                    defaults.extraction.preprocess.contrast_factor,
                )?,
                pivot: parse_var("CONTRAST_PIVOT", defaults.extraction.preprocess.pivot)?,
            },
        };
        check_dpi_settings(&extraction)?;

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT", defaults.server.port)?,
                cors_origin: env::var("CORS_ORIGIN").ok().filter(|v| !v.trim().is_empty()),
                max_upload_mb: parse_var("MAX_UPLOAD_MB", defaults.server.max_upload_mb)?,
            },
            extraction,
            ocr: TesseractConfig {
                binary: env::var("TESSERACT_CMD")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.ocr.binary),
                language: env::var("OCR_LANGUAGE").unwrap_or(defaults.ocr.language),
                oem: parse_var("OCR_OEM", defaults.ocr.oem)?,
                sparse_psm: parse_var("OCR_SPARSE_PSM", defaults.ocr.sparse_psm)?,
                dense_psm: parse_var("OCR_DENSE_PSM", defaults.ocr.dense_psm)?,
            },
            structured: StructuredConfig {
                provider: parse_var("STRUCTURED_PROVIDER", defaults.structured.provider)?,
                url: env::var("STRUCTURED_URL").unwrap_or(defaults.structured.url),
                model: env::var("STRUCTURED_MODEL").unwrap_or(defaults.structured.model),
                api_key: env::var("STRUCTURED_API_KEY").ok().filter(|v| !v.is_empty()),
                timeout_secs: parse_var("STRUCTURED_TIMEOUT_SECS", defaults.structured.timeout_secs)?,
            },
        })
    }
}

fn parse_var<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(value) => parse_value(var, &value),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn check_dpi_settings(extraction: &ExtractionConfig) -> Result<(), ConfigError> {
    for (var, dpi) in [
        ("REGION_DPI", extraction.region_dpi),
        ("SWEEP_DPI", extraction.sweep_dpi),
    ] {
        if dpi == 0 || dpi > extraction.max_dpi {
            return Err(ConfigError {
                var,
                value: dpi.to_string(),
                reason: format!("must be between 1 and MAX_DPI ({})", extraction.max_dpi),
            });
        }
    }
    Ok(())
}
