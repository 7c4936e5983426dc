//! Fixed instruction and output schema for the structured-extraction model

use serde_json::{json, Value};

use super::types::{GdtSymbol, MeasurementType};

/// Instruction sent with every region crop
pub const INSTRUCTION: &str = "You are reading a cropped region of a scanned engineering drawing. \
Identify the single engineering dimension depicted in the image. \
The region may be rotated; infer the true orientation of the text before reading it. \
Return exactly one DrawingMeasurement as JSON matching the provided schema. \
Give numeric values as numbers, with tolerances split into tolerance_plus and tolerance_minus. \
When measurement_type is \"gd&t\", fill the gdt feature control frame with its symbol, \
tolerance, datum letters in order and unit. Omit fields you cannot read.";

/// JSON schema of a `DrawingMeasurement`
pub fn measurement_schema() -> Value {
    let measurement_types: Vec<&str> = MeasurementType::ALL.iter().map(|t| t.as_str()).collect();
    let symbols: Vec<&str> = GdtSymbol::ALL.iter().map(|s| s.as_str()).collect();

    json!({
        "type": "object",
        "properties": {
            "feature_name": { "type": "string" },
            "measurement_type": { "type": "string", "enum": measurement_types },
            "value": { "type": "number" },
            "unit": { "type": "string" },
            "tolerance_plus": { "type": "number" },
            "tolerance_minus": { "type": "number" },
            "location_note": { "type": "string" },
            "notes": { "type": "string" },
            "gdt": {
                "type": "object",
                "properties": {
                    "symbol": { "type": "string", "enum": symbols },
                    "tolerance": { "type": "number" },
                    "datum_reference_frame": {
                        "type": "array",
                        "items": { "type": "string" }
                    },
                    "unit": { "type": "string", "enum": ["mm", "in"] }
                },
                "required": ["symbol", "tolerance", "unit"]
            }
        },
        "required": ["feature_name", "measurement_type"]
    })
}
