//! Core layout trait for diagram positioning
//!
//! This trait defines the interface for arranging diagram elements
//! in a coordinate system.

use anyhow::Result;

use super::Database;

/// Core trait for layout algorithms
///
/// Layout algorithms are pure passes over an immutable database. They may be
/// re-run as often as needed (for example after a collapse toggle) without
/// re-parsing.
///
/// # Example
/// ```
/// use tideline::core::{LayoutAlgorithm, Parser};
/// use tideline::plugins::sequence::{SequenceDatabase, SequenceLayoutAlgorithm, SequenceParser};
///
/// let mut db = SequenceDatabase::new();
/// SequenceParser::new().parse("A -> B: hi", &mut db).unwrap();
/// let positioned = SequenceLayoutAlgorithm::new().layout(&db).unwrap();
/// assert_eq!(positioned.participants.len(), 2);
/// ```
pub trait LayoutAlgorithm<D: Database>: Send + Sync {
    /// The output type of this layout algorithm
    type Output;

    /// Arrange elements in the database using this layout algorithm
    fn layout(&self, database: &D) -> Result<Self::Output>;

    /// Get the name of this layout algorithm
    fn name(&self) -> &'static str;

    /// Get the version of this layout algorithm
    fn version(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Parser;
    use crate::plugins::sequence::*;

    #[test]
    fn test_layout_algorithm_metadata() {
        let layout = SequenceLayoutAlgorithm::new();
        assert_eq!(layout.name(), "timeline");
        assert_eq!(layout.version(), "0.1.0");
    }

    #[test]
    fn test_basic_layout() {
        let mut database = SequenceDatabase::new();
        SequenceParser::new()
            .parse("A -> B: one\nB -> C: two", &mut database)
            .unwrap();

        let output = SequenceLayoutAlgorithm::new().layout(&database).unwrap();
        assert_eq!(output.participants.len(), 3);
        assert!(output.width > 0.0);
        assert!(output.height > 0.0);
    }
}
