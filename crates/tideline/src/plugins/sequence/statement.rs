//! Message statement parser using chumsky
//!
//! Parses a single content line of the form `From -> To: label` (sync) or
//! `From ~> To: label` (async). Whitespace around the arrow and the colon is
//! free-form; the label is everything after the first colon. Participant
//! names use the same character set as declarations.

use chumsky::prelude::*;

use crate::core::chumsky_utils::{inline_whitespace, rest_of_line};

/// A parsed message line, borrowing from the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageStatement<'a> {
    pub from: &'a str,
    pub to: &'a str,
    /// Raw label text, before return-label extraction
    pub label: &'a str,
    pub is_async: bool,
}

/// `->` is sync, `~>` is async
fn arrow<'src>() -> impl Parser<'src, &'src str, bool> + Clone {
    just("->").to(false).or(just("~>").to(true))
}

/// Participant name: letters, digits, `_`, `.` and `-`, never an arrow
fn participant_name<'src>() -> impl Parser<'src, &'src str, &'src str> + Clone {
    any()
        .filter(|c: &char| c.is_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .and_is(arrow().not())
        .repeated()
        .at_least(1)
        .to_slice()
}

fn statement_parser<'src>() -> impl Parser<'src, &'src str, MessageStatement<'src>> {
    let sender = participant_name().padded_by(inline_whitespace());
    let receiver = participant_name().padded_by(inline_whitespace());

    let label = just(':')
        .ignore_then(rest_of_line())
        .or_not()
        .map(|label| label.unwrap_or(""));

    sender
        .then(arrow())
        .then(receiver)
        .then(label)
        .then_ignore(end())
        .map(|(((from, is_async), to), label)| MessageStatement {
            from,
            to,
            label,
            is_async,
        })
}

/// Parse a message line, returning `None` when the line is not a message
///
/// Names may not contain whitespace; a display label with spaces is given
/// with `aka` on a declaration instead.
///
/// # Example
/// ```
/// use tideline::plugins::sequence::parse_message_statement;
///
/// let statement = parse_message_statement("A  ~>  B :  fire").unwrap();
/// assert_eq!((statement.from, statement.to, statement.label), ("A", "B", "fire"));
/// assert!(statement.is_async);
/// ```
pub fn parse_message_statement(line: &str) -> Option<MessageStatement<'_>> {
    let statement = statement_parser().parse(line).into_result().ok()?;
    if statement.from.is_empty() || statement.to.is_empty() {
        return None;
    }
    Some(statement)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_tolerance() {
        for line in ["A->B:msg", "A -> B: msg", "A  ->  B  :  msg", "\tA->B :msg  "] {
            let statement = parse_message_statement(line).unwrap();
            assert_eq!(statement.from, "A", "{line}");
            assert_eq!(statement.to, "B", "{line}");
            assert_eq!(statement.label, "msg", "{line}");
            assert!(!statement.is_async);
        }
    }

    #[test]
    fn test_async_arrow() {
        let statement = parse_message_statement("Worker ~> Queue: publish").unwrap();
        assert!(statement.is_async);
        assert_eq!(statement.to, "Queue");
    }

    #[test]
    fn test_label_is_optional() {
        let statement = parse_message_statement("A -> B").unwrap();
        assert_eq!(statement.label, "");
    }

    #[test]
    fn test_names_with_hyphens_and_dots() {
        let statement = parse_message_statement("Auth-Service -> orders.db: save").unwrap();
        assert_eq!(statement.from, "Auth-Service");
        assert_eq!(statement.to, "orders.db");
    }

    #[test]
    fn test_rejects_names_with_spaces() {
        assert!(parse_message_statement("Auth Service -> Orders: save").is_none());
        assert!(parse_message_statement("Auth -> Order Store: save").is_none());
        assert!(parse_message_statement("if ready -> go").is_none());
    }

    #[test]
    fn test_hyphen_before_arrow_stays_in_name() {
        let statement = parse_message_statement("A-->B: x").unwrap();
        assert_eq!(statement.from, "A-");
        assert_eq!(statement.to, "B");
    }

    #[test]
    fn test_label_keeps_later_arrows_and_colons() {
        let statement = parse_message_statement("A -> B: x -> y: z").unwrap();
        assert_eq!(statement.label, "x -> y: z");
    }

    #[test]
    fn test_self_call() {
        let statement = parse_message_statement("A -> A: think").unwrap();
        assert_eq!(statement.from, statement.to);
    }

    #[test]
    fn test_rejects_non_messages() {
        assert!(parse_message_statement("title: hello").is_none());
        assert!(parse_message_statement("if ready").is_none());
        assert!(parse_message_statement("-> B: no sender").is_none());
        assert!(parse_message_statement("A -> : no receiver").is_none());
        assert!(parse_message_statement("key: A -> B").is_none());
    }
}
