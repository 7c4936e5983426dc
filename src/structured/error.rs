use thiserror::Error;

/// Failures talking to the structured-extraction model
///
/// None of these fail a request; they end up in `structured_error`.
#[derive(Debug, Error)]
pub enum ExternalModelError {
    #[error("no structured extractor configured")]
    NotConfigured,

    #[error("request to {provider} failed: {message}")]
    Transport { provider: &'static str, message: String },

    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("could not decode model output: {0}")]
    Decode(String),

    #[error("model returned an invalid measurement: {0}")]
    InvalidMeasurement(String),

    #[error("model did not answer within {0}s")]
    Timeout(u64),
}
