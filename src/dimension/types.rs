use serde::{Deserialize, Serialize};

use crate::ocr::RawToken;

/// Pixel box of a token, in the image it was recognized in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl From<&RawToken> for Coordinates {
    fn from(token: &RawToken) -> Self {
        Self {
            x: token.left,
            y: token.top,
            width: token.width,
            height: token.height,
        }
    }
}

/// A recognized dimension value
///
/// `value` is the matched text exactly as recognized; it is never parsed
/// during classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionToken {
    pub value: String,
    pub coordinates: Coordinates,
    pub confidence: Option<f32>,
}

impl DimensionToken {
    pub fn new(value: impl Into<String>, coordinates: Coordinates, confidence: Option<f32>) -> Self {
        Self {
            value: value.into(),
            coordinates,
            confidence,
        }
    }

    /// Numeric part of the value
    ///
    /// Strips the diameter mark and unit and treats `,` as the decimal
    /// separator. Returns `None` if what is left is not a number.
    pub fn numeric_value(&self) -> Option<f64> {
        let digits: String = self
            .value
            .trim()
            .trim_start_matches(['Ø', 'ø', '⌀'])
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
            .map(|c| if c == ',' { '.' } else { c })
            .collect();
        digits.parse().ok()
    }

    /// Unit suffix, lowercased, if the value carries one
    pub fn unit(&self) -> Option<String> {
        let unit: String = self
            .value
            .trim_end()
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        if unit.is_empty() {
            None
        } else {
            Some(unit.to_lowercase())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(value: &str) -> DimensionToken {
        DimensionToken::new(
            value,
            Coordinates {
                x: 0,
                y: 0,
                width: 1,
                height: 1,
            },
            None,
        )
    }

    #[test]
    fn test_numeric_value() {
        assert_eq!(token("⌀12.5mm").numeric_value(), Some(12.5));
        assert_eq!(token("Ø8").numeric_value(), Some(8.0));
        assert_eq!(token("25,4 mm").numeric_value(), Some(25.4));
        assert_eq!(token("3 CM").numeric_value(), Some(3.0));
        assert_eq!(token("mm").numeric_value(), None);
    }

    #[test]
    fn test_unit() {
        assert_eq!(token("25.4 mm").unit().as_deref(), Some("mm"));
        assert_eq!(token("3CM").unit().as_deref(), Some("cm"));
        assert_eq!(token("⌀12").unit(), None);
    }

    #[test]
    fn test_serializes_absent_confidence_as_null() {
        let json = serde_json::to_value(token("5")).unwrap();
        assert_eq!(json["confidence"], serde_json::Value::Null);
        assert_eq!(json["coordinates"]["width"], 1);
    }
}
