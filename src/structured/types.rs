//! Typed measurement returned by the structured-extraction model

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::ExternalModelError;

/// Datum feature label: `A`, `AA`, or a common datum such as `A-B`
static DATUM_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[A-Z]{1,2}(?:-[A-Z]{1,2})?$")
        .expect("datum label regex pattern is valid and should compile")
});

/// Kind of dimension a measurement describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementType {
    Linear,
    Diameter,
    Radius,
    Angle,
    Thread,
    Tolerance,
    SurfaceFinish,
    #[serde(rename = "gd&t")]
    Gdt,
}

impl MeasurementType {
    pub const ALL: [MeasurementType; 8] = [
        Self::Linear,
        Self::Diameter,
        Self::Radius,
        Self::Angle,
        Self::Thread,
        Self::Tolerance,
        Self::SurfaceFinish,
        Self::Gdt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Diameter => "diameter",
            Self::Radius => "radius",
            Self::Angle => "angle",
            Self::Thread => "thread",
            Self::Tolerance => "tolerance",
            Self::SurfaceFinish => "surface_finish",
            Self::Gdt => "gd&t",
        }
    }
}

/// Geometric characteristic symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GdtSymbol {
    Flatness,
    Straightness,
    Cylindricity,
    Parallelism,
    Perpendicularity,
    Angularity,
    Position,
    Concentricity,
    Symmetry,
    CircularRunout,
    TotalRunout,
    ProfileOfLine,
    ProfileOfSurface,
}

impl GdtSymbol {
    pub const ALL: [GdtSymbol; 13] = [
        Self::Flatness,
        Self::Straightness,
        Self::Cylindricity,
        Self::Parallelism,
        Self::Perpendicularity,
        Self::Angularity,
        Self::Position,
        Self::Concentricity,
        Self::Symmetry,
        Self::CircularRunout,
        Self::TotalRunout,
        Self::ProfileOfLine,
        Self::ProfileOfSurface,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flatness => "flatness",
            Self::Straightness => "straightness",
            Self::Cylindricity => "cylindricity",
            Self::Parallelism => "parallelism",
            Self::Perpendicularity => "perpendicularity",
            Self::Angularity => "angularity",
            Self::Position => "position",
            Self::Concentricity => "concentricity",
            Self::Symmetry => "symmetry",
            Self::CircularRunout => "circular_runout",
            Self::TotalRunout => "total_runout",
            Self::ProfileOfLine => "profile_of_line",
            Self::ProfileOfSurface => "profile_of_surface",
        }
    }
}

/// Unit of a GD&T tolerance zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GdtUnit {
    Mm,
    In,
}

/// Feature control frame of a GD&T callout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GdtFeatureControlFrame {
    pub symbol: GdtSymbol,
    pub tolerance: f64,
    /// Datum letters in precedence order (primary first)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datum_reference_frame: Option<Vec<String>>,
    pub unit: GdtUnit,
}

/// A single engineering dimension read from a drawing region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingMeasurement {
    pub feature_name: String,
    pub measurement_type: MeasurementType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance_plus: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance_minus: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gdt: Option<GdtFeatureControlFrame>,
}

impl DrawingMeasurement {
    /// Check the measurement is internally consistent
    ///
    /// A `gd&t` measurement needs a feature control frame. Numbers must be
    /// finite and datum references must be datum labels.
    pub fn validate(&self) -> Result<(), ExternalModelError> {
        let invalid = |reason: String| Err(ExternalModelError::InvalidMeasurement(reason));

        if self.feature_name.trim().is_empty() {
            return invalid("feature_name is empty".to_string());
        }

        for (field, value) in [
            ("value", self.value),
            ("tolerance_plus", self.tolerance_plus),
            ("tolerance_minus", self.tolerance_minus),
        ] {
            if let Some(v) = value {
                if !v.is_finite() {
                    return invalid(format!("{} is not a finite number", field));
                }
            }
        }

        match (&self.measurement_type, &self.gdt) {
            (MeasurementType::Gdt, None) => {
                return invalid("gd&t measurement without a feature control frame".to_string());
            }
            (_, Some(frame)) => {
                if !frame.tolerance.is_finite() || frame.tolerance < 0.0 {
                    return invalid(format!("gd&t tolerance {} is not valid", frame.tolerance));
                }
                if let Some(datums) = &frame.datum_reference_frame {
                    if let Some(bad) = datums.iter().find(|d| !DATUM_LABEL.is_match(d.trim())) {
                        return invalid(format!("'{}' is not a datum label", bad));
                    }
                }
            }
            _ => {}
        }

        Ok(())
    }
}
