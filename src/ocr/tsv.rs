//! Tesseract TSV output parsing
//!
//! Column layout:
//! `level page_num block_num par_num line_num word_num left top width height conf text`

use std::collections::BTreeMap;

use super::types::{RawToken, RecognitionMode};

/// TSV level for word rows
const WORD_LEVEL: u32 = 5;

/// One word row from the TSV output, confidence still raw
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TsvWord {
    pub block: u32,
    pub paragraph: u32,
    pub line: u32,
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    pub confidence: f32,
    pub text: String,
}

/// Parse word rows, skipping the header, non-word levels and malformed lines
pub(crate) fn parse_words(tsv: &str) -> Vec<TsvWord> {
    tsv.lines()
        .filter_map(|row| {
            let cols: Vec<&str> = row.split('\t').collect();
            if cols.len() < 11 {
                return None;
            }
            let level: u32 = cols[0].trim().parse().ok()?;
            if level != WORD_LEVEL {
                return None;
            }
            let num = |idx: usize| cols[idx].trim().parse::<u32>().ok();
            Some(TsvWord {
                block: num(2)?,
                paragraph: num(3)?,
                line: num(4)?,
                left: num(6)?,
                top: num(7)?,
                width: num(8)?,
                height: num(9)?,
                confidence: cols[10].trim().parse().unwrap_or(-1.0),
                text: cols.get(11).map(|t| t.trim().to_string()).unwrap_or_default(),
            })
        })
        .collect()
}

/// Turn word rows into tokens for the given mode
///
/// Words with empty text are dropped in both modes.
pub(crate) fn words_to_tokens(words: Vec<TsvWord>, mode: RecognitionMode) -> Vec<RawToken> {
    let words = words.into_iter().filter(|w| !w.text.is_empty());
    match mode {
        RecognitionMode::Sparse => words
            .map(|w| RawToken::from_engine(w.text, w.confidence, w.left, w.top, w.width, w.height))
            .collect(),
        RecognitionMode::Dense => {
            let mut lines: BTreeMap<(u32, u32, u32), Vec<TsvWord>> = BTreeMap::new();
            for word in words {
                lines
                    .entry((word.block, word.paragraph, word.line))
                    .or_default()
                    .push(word);
            }
            lines.into_values().map(merge_line).collect()
        }
    }
}

/// Join the words of one line into a single token
fn merge_line(mut words: Vec<TsvWord>) -> RawToken {
    words.sort_by_key(|w| w.left);

    let text = words
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let left = words.iter().map(|w| w.left).min().unwrap_or(0);
    let top = words.iter().map(|w| w.top).min().unwrap_or(0);
    let right = words.iter().map(|w| w.left + w.width).max().unwrap_or(left);
    let bottom = words.iter().map(|w| w.top + w.height).max().unwrap_or(top);

    let scored: Vec<f32> = words
        .iter()
        .map(|w| w.confidence)
        .filter(|c| c.is_finite() && *c >= 0.0)
        .collect();
    let confidence = if scored.is_empty() {
        -1.0
    } else {
        scored.iter().sum::<f32>() / scored.len() as f32
    };

    RawToken::from_engine(text, confidence, left, top, right - left, bottom - top)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t400\t120\t-1\t
2\t1\t1\t0\t0\t0\t10\t10\t300\t40\t-1\t
4\t1\t1\t1\t1\t0\t10\t10\t300\t40\t-1\t
5\t1\t1\t1\t1\t1\t10\t12\t60\t30\t91.2\tshaft
5\t1\t1\t1\t1\t2\t80\t10\t40\t32\t88.8\t25.4
5\t1\t1\t1\t1\t3\t130\t12\t30\t30\t-1\tmm
5\t1\t1\t1\t1\t4\t170\t12\t30\t30\t95\t
5\t1\t2\t1\t1\t1\t20\t70\t90\t35\t77\t⌀12,5
";

    #[test]
    fn test_parse_words_keeps_word_rows_only() {
        let words = parse_words(SAMPLE);
        assert_eq!(words.len(), 5);
        assert_eq!(words[0].text, "shaft");
        assert_eq!(words[2].confidence, -1.0);
        assert_eq!(words[3].text, "");
        assert_eq!(words[4].block, 2);
    }

    #[test]
    fn test_parse_handles_missing_text_column() {
        let words = parse_words("5\t1\t1\t1\t1\t1\t0\t0\t5\t5\t-1\n");
        assert_eq!(words.len(), 1);
        assert!(words[0].text.is_empty());
        assert!(words_to_tokens(words, RecognitionMode::Sparse).is_empty());
    }

    #[test]
    fn test_parse_skips_garbage() {
        assert!(parse_words("not\ta\ttsv").is_empty());
        assert!(parse_words("").is_empty());
    }

    #[test]
    fn test_sparse_tokens_are_words() {
        let tokens = words_to_tokens(parse_words(SAMPLE), RecognitionMode::Sparse);
        let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["shaft", "25.4", "mm", "⌀12,5"]);
        assert_eq!(tokens[1].confidence, Some(88.8));
        assert_eq!(tokens[2].confidence, None);
        assert_eq!((tokens[1].left, tokens[1].top), (80, 10));
    }

    #[test]
    fn test_dense_tokens_are_lines() {
        let tokens = words_to_tokens(parse_words(SAMPLE), RecognitionMode::Dense);
        assert_eq!(tokens.len(), 2);

        let first = &tokens[0];
        assert_eq!(first.text, "shaft 25.4 mm");
        assert_eq!((first.left, first.top), (10, 10));
        assert_eq!((first.width, first.height), (150, 32));
        // -1 rows do not drag the mean down
        assert!((first.confidence.unwrap() - 90.0).abs() < 1e-3);

        assert_eq!(tokens[1].text, "⌀12,5");
    }

    #[test]
    fn test_dense_line_without_scores_has_no_confidence() {
        let tsv = "5\t1\t1\t1\t1\t1\t0\t0\t5\t5\t-1\tM8\n5\t1\t1\t1\t1\t2\t8\t0\t5\t5\t-1\tx1.25\n";
        let tokens = words_to_tokens(parse_words(tsv), RecognitionMode::Dense);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "M8 x1.25");
        assert_eq!(tokens[0].confidence, None);
    }
}
