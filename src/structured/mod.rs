//! Structured extraction
//!
//! Client side of the multimodal model that reads a cropped drawing region
//! and returns a typed [`DrawingMeasurement`]. The model itself is an
//! external service; only the request/response contract lives here.

mod error;
mod prompt;
mod provider;
mod types;

pub use error::ExternalModelError;
pub use prompt::{measurement_schema, INSTRUCTION};
pub use provider::{decode_measurement, OllamaExtractor, OpenAiExtractor, StructuredExtractor};
pub use types::{DrawingMeasurement, GdtFeatureControlFrame, GdtSymbol, GdtUnit, MeasurementType};

#[cfg(test)]
pub(crate) use provider::MockExtractor;
