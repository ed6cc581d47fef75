//! Shared chumsky parser utilities for diagram parsing
//!
//! This module provides common parser combinators used by the statement
//! parsers. Statements are parsed one line at a time, so none of these
//! consume newlines.

use chumsky::prelude::*;

/// Parse inline whitespace only (spaces and tabs, no newlines).
pub fn inline_whitespace<'src>() -> impl Parser<'src, &'src str, ()> + Clone {
    one_of(" \t").repeated().ignored()
}

/// Parse everything up to the end of the line, trimmed.
pub fn rest_of_line<'src>() -> impl Parser<'src, &'src str, &'src str> + Clone {
    none_of("\n\r").repeated().to_slice().map(|s: &str| s.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_whitespace() {
        let parser = inline_whitespace().then(just("test")).then_ignore(end());
        assert!(parser.parse("test").into_result().is_ok());
        assert!(parser.parse(" test").into_result().is_ok());
        assert!(parser.parse("\ttest").into_result().is_ok());
        // Should NOT consume newlines
        assert!(parser.parse("\ntest").into_result().is_err());
    }

    #[test]
    fn test_rest_of_line() {
        let parser = just(':').ignore_then(rest_of_line()).then_ignore(end());
        assert_eq!(parser.parse(":  hello  ").into_result().ok(), Some("hello"));
        assert_eq!(parser.parse(":").into_result().ok(), Some(""));
    }
}
