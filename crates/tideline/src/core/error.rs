//! Core error types for diagram processing
//!
//! This module defines common error types used throughout the diagram processing pipeline.

use serde::Serialize;
use thiserror::Error;

/// Core error types for diagram processing
///
/// Parse errors are fatal: the first one aborts parsing and is also stored on
/// the document so callers holding only the database can still report it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DiagramError {
    /// Malformed or misplaced syntax on a specific line
    #[error("Line {line}: {message}")]
    Structural { message: String, line: usize },

    /// The input does not look like a sequence diagram at all
    #[error("{message}")]
    Content { message: String },

    #[error("Layout error: {message}")]
    Layout { message: String },

    #[error("Detection error: {message}")]
    Detection { message: String },
}

impl DiagramError {
    /// Create a new structural (line-numbered) error
    pub fn structural(message: impl Into<String>, line: usize) -> Self {
        Self::Structural {
            message: message.into(),
            line,
        }
    }

    /// Create a new content error
    pub fn content(message: impl Into<String>) -> Self {
        Self::Content {
            message: message.into(),
        }
    }

    /// Create a new layout error
    pub fn layout_error(message: impl Into<String>) -> Self {
        Self::Layout {
            message: message.into(),
        }
    }

    /// Create a new detection error
    pub fn detection_error(message: impl Into<String>) -> Self {
        Self::Detection {
            message: message.into(),
        }
    }

    /// Line number the error points at, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Structural { line, .. } => Some(*line),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_error() {
        let error = DiagramError::structural("Invalid syntax", 5);
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Line 5"));
        assert!(error_msg.contains("Invalid syntax"));
        assert_eq!(error.line(), Some(5));
    }

    #[test]
    fn test_content_error() {
        let error = DiagramError::content("No sequence content detected");
        assert_eq!(format!("{}", error), "No sequence content detected");
        assert_eq!(error.line(), None);
    }

    #[test]
    fn test_layout_error() {
        let error = DiagramError::layout_error("Layout failed");
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Layout error"));
        assert!(error_msg.contains("Layout failed"));
    }

    #[test]
    fn test_detection_error() {
        let error = DiagramError::detection_error("Detection failed");
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Detection error"));
        assert!(error_msg.contains("Detection failed"));
    }

    #[test]
    fn test_anyhow_downcast() {
        let err: anyhow::Error = DiagramError::structural("bad", 2).into();
        let inner = err.downcast_ref::<DiagramError>().unwrap();
        assert_eq!(inner.line(), Some(2));
    }
}
