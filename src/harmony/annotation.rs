//! Directive grammar for "no chord" annotations.
//!
//! A directive tells the cluster resolver how to carve up the span it starts and
//! which parts to listen to. It is made of two optional tokens, at least one of
//! which must be present:
//!
//! ```text
//! directive      := harmonic_rhythm harmonic_parts? | harmonic_parts
//! harmonic_rhythm := "n" | "m" | number        (never / per measure / every N beats)
//! harmonic_parts  := "p" | "a"                  (tagged parts only / all parts)
//! number          := [0-9]* "."? [0-9]+
//! ```
//!
//! `ma`, `m`, `a`, `np`, `n`, `p`, `6`, `1.5` and `.5` are all directives;
//! `xa`, `mm`, `aa`, `am`, `b` and the empty string are not.

use crate::error::AnalysisError;
use crate::timed::{parse_beat, Beat};
use once_cell::sync::Lazy;
use regex::Regex;

/// How often a new chord is derived inside a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarmonicRhythm {
    /// One chord for the whole span (`n`).
    Never,
    /// One chord per measure (`m`).
    PerMeasure,
    /// One chord every N beats.
    EveryBeats(Beat),
}

/// Which parts feed the clustering of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarmonicParts {
    /// Every part of the score (`a`).
    AllParts,
    /// Only the parts annotated `p` at this offset.
    TaggedParts,
}

/// A parsed directive. `None` means the token was left unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpanDirective {
    pub rhythm: Option<HarmonicRhythm>,
    pub parts: Option<HarmonicParts>,
}

// Group names must be unique, so the parts-only alternative is `parts_only`.
static DIRECTIVE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let number = r"(?:[0-9]*\.)?[0-9]+";
    let rhythm = format!(r"(?P<rhythm>n|m|{number})");
    let parts = r"(?P<parts>[pa])";
    let pattern = format!(r"^(?:{rhythm}{parts}?|(?P<parts_only>[pa]))$");
    Regex::new(&pattern).expect("directive pattern is a valid regex")
});

/// Parse the text of a directive annotation found at `offset`.
pub fn parse_directive(text: &str, offset: Beat) -> Result<SpanDirective, AnalysisError> {
    let normalized = text.trim().to_lowercase();
    let malformed = |reason: &str| AnalysisError::MalformedAnnotation {
        offset,
        text: text.to_string(),
        reason: reason.to_string(),
    };

    let captures = DIRECTIVE_PATTERN
        .captures(&normalized)
        .ok_or_else(|| malformed("expected a harmonic rhythm (n, m or a number) and/or a part scope (p or a)"))?;

    let rhythm = match captures.name("rhythm").map(|m| m.as_str()) {
        None => None,
        Some("n") => Some(HarmonicRhythm::Never),
        Some("m") => Some(HarmonicRhythm::PerMeasure),
        Some(number) => {
            let beats = parse_beat(number).ok_or_else(|| malformed("harmonic rhythm is not a number"))?;
            if beats <= Beat::from_integer(0) {
                return Err(malformed("harmonic rhythm must be a positive number of beats"));
            }
            Some(HarmonicRhythm::EveryBeats(beats))
        }
    };

    let parts = captures
        .name("parts")
        .or_else(|| captures.name("parts_only"))
        .map(|m| match m.as_str() {
            "p" => HarmonicParts::TaggedParts,
            _ => HarmonicParts::AllParts,
        });

    Ok(SpanDirective { rhythm, parts })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zero() -> Beat {
        Beat::from_integer(0)
    }

    #[test]
    fn test_accepts_directives() {
        for text in ["ma", "m", "a", "np", "n", "p", "6", "1.5", ".5"] {
            assert!(
                parse_directive(text, zero()).is_ok(),
                "should accept {text:?}"
            );
        }
    }

    #[test]
    fn test_rejects_non_directives() {
        for text in ["xa", "", "mm", "aa", "am", "b", "ba"] {
            let result = parse_directive(text, zero());
            assert!(
                matches!(result, Err(AnalysisError::MalformedAnnotation { .. })),
                "should reject {text:?}"
            );
        }
    }

    #[test]
    fn test_tokens() {
        assert_eq!(
            parse_directive("ma", zero()).unwrap(),
            SpanDirective {
                rhythm: Some(HarmonicRhythm::PerMeasure),
                parts: Some(HarmonicParts::AllParts),
            }
        );
        assert_eq!(
            parse_directive("p", zero()).unwrap(),
            SpanDirective {
                rhythm: None,
                parts: Some(HarmonicParts::TaggedParts),
            }
        );
        assert_eq!(
            parse_directive("1.5", zero()).unwrap(),
            SpanDirective {
                rhythm: Some(HarmonicRhythm::EveryBeats(Beat::new(3, 2))),
                parts: None,
            }
        );
        assert_eq!(
            parse_directive("2p", zero()).unwrap().rhythm,
            Some(HarmonicRhythm::EveryBeats(Beat::from_integer(2)))
        );
    }

    #[test]
    fn test_case_and_whitespace_are_ignored() {
        assert_eq!(
            parse_directive(" NP ", zero()).unwrap(),
            SpanDirective {
                rhythm: Some(HarmonicRhythm::Never),
                parts: Some(HarmonicParts::TaggedParts),
            }
        );
    }

    #[test]
    fn test_zero_rhythm_is_rejected() {
        assert!(parse_directive("0", zero()).is_err());
        assert!(parse_directive("0.0a", zero()).is_err());
    }

    #[test]
    fn test_error_reports_text_and_offset() {
        let err = parse_directive("mm", Beat::from_integer(8)).unwrap_err();
        match err {
            AnalysisError::MalformedAnnotation { offset, text, .. } => {
                assert_eq!(offset, Beat::from_integer(8));
                assert_eq!(text, "mm");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
