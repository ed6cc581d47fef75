//! Core parser trait for diagram markup
//!
//! This trait defines the interface for parsing diagram markup language
//! into structured data that can be stored in a database.

use anyhow::Result;

use super::Database;

/// Core trait for diagram parsers
///
/// This trait represents the parsing layer that converts diagram markup
/// into structured data. Each diagram type has its own parser implementation.
///
/// # Example
/// ```
/// use tideline::core::{Database, Parser};
/// use tideline::plugins::sequence::{SequenceDatabase, SequenceParser};
///
/// let parser = SequenceParser::new();
/// let mut db = SequenceDatabase::new();
/// parser.parse("A -> B: hello", &mut db).unwrap();
/// assert_eq!(db.edge_count(), 1);
/// ```
pub trait Parser<D: Database>: Send + Sync {
    /// Parse diagram markup into the provided database
    fn parse(&self, input: &str, database: &mut D) -> Result<()>;

    /// Get the name of this parser
    fn name(&self) -> &'static str;

    /// Get the version of this parser
    fn version(&self) -> &'static str;

    /// Check if the input can be parsed by this parser
    fn can_parse(&self, input: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::sequence::*;

    #[test]
    fn test_parser_trait_metadata() {
        let parser = SequenceParser::new();
        assert_eq!(parser.name(), "sequence");
        assert_eq!(parser.version(), "0.1.0");
    }

    #[test]
    fn test_parser_can_parse() {
        let parser = SequenceParser::new();
        assert!(parser.can_parse("A -> B: hi"));
        assert!(parser.can_parse("chart: sequence"));
        assert!(!parser.can_parse("some other text"));
    }

    #[test]
    fn test_basic_parsing() {
        let parser = SequenceParser::new();
        let mut database = SequenceDatabase::new();

        parser.parse("A -> B: hi\nB -> C: hey", &mut database).unwrap();
        assert_eq!(database.node_count(), 3);
        assert_eq!(database.edge_count(), 2);
    }
}
