//! Core database trait for diagram data storage
//!
//! This trait defines the interface for storing and managing parsed diagram
//! data. Each diagram type implements it with its own node and edge types.

use anyhow::Result;

/// Core trait for diagram databases
///
/// This trait represents the data storage layer produced by a parser.
/// For sequence diagrams the nodes are participants and the edges are
/// messages; everything else (blocks, sections, notes, groups) lives on the
/// concrete database type.
pub trait Database: Send + Sync {
    /// The node data type for this database
    type Node: Clone + Send + Sync;

    /// The edge data type for this database
    type Edge: Clone + Send + Sync;

    /// Add a node to the database
    fn add_node(&mut self, node: Self::Node) -> Result<()>;

    /// Add an edge to the database
    fn add_edge(&mut self, edge: Self::Edge) -> Result<()>;

    /// Get a node by ID
    fn get_node(&self, id: &str) -> Option<&Self::Node>;

    /// Iterate over all nodes
    fn nodes(&self) -> impl Iterator<Item = &Self::Node>;

    /// Iterate over all edges
    fn edges(&self) -> impl Iterator<Item = &Self::Edge>;

    /// Clear all data from the database
    fn clear(&mut self);

    /// Get the number of nodes
    fn node_count(&self) -> usize;

    /// Get the number of edges
    fn edge_count(&self) -> usize;
}
