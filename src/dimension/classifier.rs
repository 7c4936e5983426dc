use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{Coordinates, DimensionToken};
use crate::ocr::RawToken;

/// Whole-token match: the trimmed text must be a dimension and nothing else
static STRICT_DIMENSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:Ø|⌀)?\d+(?:[.,]\d+)?(?:\s*(?:mm|cm|m))?$")
        .expect("strict dimension regex pattern is valid and should compile")
});

/// Substring match; the unit only counts when it ends a word
static DIMENSION_IN_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Ø|⌀)?\d+(?:[.,]\d+)?(?:\s*(?:mm|cm|m)\b)?")
        .expect("permissive dimension regex pattern is valid and should compile")
});

/// Pattern-based dimension classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct DimensionClassifier;

impl DimensionClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Keep tokens whose whole text is a dimension
    ///
    /// Used for page sweeps, where a token is a single recognized word.
    pub fn classify(&self, tokens: &[RawToken]) -> Vec<DimensionToken> {
        tokens
            .iter()
            .filter_map(|token| {
                let text = token.text.trim();
                STRICT_DIMENSION
                    .is_match(text)
                    .then(|| DimensionToken::new(text, Coordinates::from(token), token.confidence))
            })
            .collect()
    }

    /// Every non-overlapping dimension inside each token's text
    ///
    /// Used for regions, where a token can be a phrase like
    /// `"shaft diameter 25.4 mm"`. Matches share the coordinates and
    /// confidence of the token they came from.
    pub fn find_all(&self, tokens: &[RawToken]) -> Vec<DimensionToken> {
        tokens
            .iter()
            .flat_map(|token| {
                let coordinates = Coordinates::from(token);
                DIMENSION_IN_TEXT
                    .find_iter(&token.text)
                    .map(move |m| DimensionToken::new(m.as_str(), coordinates, token.confidence))
            })
            .collect()
    }

    /// Whether a single piece of text is a dimension on its own
    pub fn is_dimension(&self, text: &str) -> bool {
        STRICT_DIMENSION.is_match(text.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str) -> RawToken {
        RawToken::from_engine(text, 87.0, 10, 20, 30, 40)
    }

    fn values(tokens: &[DimensionToken]) -> Vec<&str> {
        tokens.iter().map(|t| t.value.as_str()).collect()
    }

    #[test]
    fn test_strict_accepts_diameter_with_unit() {
        let found = DimensionClassifier::new().classify(&[raw("⌀12.5mm")]);
        assert_eq!(values(&found), vec!["⌀12.5mm"]);
        assert_eq!(
            found[0].coordinates,
            Coordinates {
                x: 10,
                y: 20,
                width: 30,
                height: 40
            }
        );
        assert_eq!(found[0].confidence, Some(87.0));
    }

    #[test]
    fn test_strict_rejects_words() {
        let classifier = DimensionClassifier::new();
        assert!(classifier.classify(&[raw("Gearbox")]).is_empty());
        assert!(classifier.classify(&[raw("M8")]).is_empty());
        assert!(classifier.classify(&[raw("12.5mm thick")]).is_empty());
    }

    #[test]
    fn test_strict_formats() {
        let classifier = DimensionClassifier::new();
        for text in ["Ø8", "25,4", "100", "3 CM", "2m", " 40 mm "] {
            assert!(classifier.is_dimension(text), "{text} should match");
        }
        for text in ["", "mm", "12.", ".5", "1.2.3", "5 km"] {
            assert!(!classifier.is_dimension(text), "{text} should not match");
        }
    }

    #[test]
    fn test_strict_value_is_trimmed_text() {
        let found = DimensionClassifier::new().classify(&[raw("  40 mm ")]);
        assert_eq!(values(&found), vec!["40 mm"]);
    }

    #[test]
    fn test_permissive_finds_phrase_value() {
        let found = DimensionClassifier::new().find_all(&[raw("shaft diameter 25.4 mm tolerance")]);
        assert_eq!(values(&found), vec!["25.4 mm"]);
        assert_eq!(found[0].coordinates.x, 10);
    }

    #[test]
    fn test_permissive_finds_multiple() {
        let found = DimensionClassifier::new().find_all(&[raw("⌀20 x 35,5mm"), raw("depth 4")]);
        assert_eq!(values(&found), vec!["⌀20", "35,5mm", "4"]);
    }

    #[test]
    fn test_permissive_unit_needs_word_boundary() {
        let found = DimensionClassifier::new().find_all(&[raw("25 months")]);
        assert_eq!(values(&found), vec!["25"]);
    }

    #[test]
    fn test_permissive_no_digits() {
        assert!(DimensionClassifier::new().find_all(&[raw("Gearbox housing")]).is_empty());
    }
}
