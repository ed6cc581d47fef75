//! Sequence diagram detector
//!
//! Identifies sequence diagram syntax from input text.

use std::sync::OnceLock;

use regex::Regex;

use crate::core::Detector;

fn arrow_like() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\S\s*[-~]>\s*\S").expect("arrow-like regex"))
}

fn chart_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^\s*chart\s*:\s*sequence\s*$").expect("chart header regex")
    })
}

fn declaration() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?im)^\s*\S.*\s+is\s+an?\s+\w+").expect("declaration regex"))
}

/// Whether any line contains something shaped like a message arrow
///
/// Used as the last-resort content check when a document has no
/// `chart: sequence` header and no message parsed.
pub fn has_arrow_like(input: &str) -> bool {
    input.lines().any(|line| arrow_like().is_match(line))
}

/// Detector for sequence diagram syntax
pub struct SequenceDetector;

impl SequenceDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SequenceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for SequenceDetector {
    fn detect(&self, input: &str) -> bool {
        self.confidence(input) > 0.5
    }

    fn confidence(&self, input: &str) -> f64 {
        if chart_header().is_match(input) {
            return 1.0;
        }

        let has_arrows = has_arrow_like(input);
        let has_declaration = declaration().is_match(input);

        if has_arrows && has_declaration {
            return 0.8;
        }

        if has_arrows {
            return 0.6;
        }

        0.0
    }

    fn diagram_type(&self) -> &'static str {
        "sequence"
    }

    fn patterns(&self) -> Vec<&'static str> {
        vec!["chart: sequence", "->", "~>"]
    }
}
