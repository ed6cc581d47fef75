//! Plugin orchestrator for coordinating the diagram processing pipeline
//!
//! The orchestrator manages the flow of data through all plugins:
//! Detector → Parser → Database → Layout

use anyhow::Result;
use std::collections::HashMap;
use tracing::{debug, info, span, trace, warn, Level};

use crate::core::{Detector, DiagramError, Parser};
use crate::plugins::sequence::{
    LayoutConfig, SequenceDatabase, SequenceDetector, SequenceLayoutAlgorithm,
    SequenceLayoutResult, SequenceParser, ViewState,
};

/// Plugin orchestrator that coordinates the entire pipeline
///
/// The orchestrator wires detectors, the parser and the layout algorithm
/// together so callers can run a full pipeline without handling each trait
/// manually. A parsed database can be laid out again under a new
/// [`ViewState`] without re-parsing.
pub struct Orchestrator {
    detectors: HashMap<String, Box<dyn Detector>>,
    sequence_parser: Option<SequenceParser>,
    sequence_layout: Option<SequenceLayoutAlgorithm>,
}

impl Orchestrator {
    /// Create a new empty orchestrator
    pub fn new() -> Self {
        Self {
            detectors: HashMap::new(),
            sequence_parser: None,
            sequence_layout: None,
        }
    }

    /// Create a new orchestrator with the sequence plugins and detector registered
    pub fn with_sequence_plugins() -> Self {
        Self::with_layout_config(LayoutConfig::default())
    }

    /// Create a new orchestrator with sequence plugins and custom geometry
    pub fn with_layout_config(config: LayoutConfig) -> Self {
        let mut orchestrator = Self {
            detectors: HashMap::new(),
            sequence_parser: Some(SequenceParser::new()),
            sequence_layout: Some(SequenceLayoutAlgorithm::with_config(config)),
        };
        orchestrator.register_default_detectors();
        orchestrator
    }

    /// Register a detector plugin
    pub fn register_detector(&mut self, name: String, detector: Box<dyn Detector>) {
        self.detectors.insert(name, detector);
    }

    /// Register the built-in detectors
    pub fn register_default_detectors(&mut self) {
        self.register_detector("sequence".to_string(), Box::new(SequenceDetector::new()));
    }

    /// Get available detector names
    pub fn get_detectors(&self) -> Vec<String> {
        self.detectors.keys().cloned().collect()
    }

    /// Check if sequence plugins are available
    pub fn has_sequence_plugins(&self) -> bool {
        self.sequence_parser.is_some() && self.sequence_layout.is_some()
    }

    /// Detect diagram type from input text
    ///
    /// The detector with the highest confidence wins.
    pub fn detect(&self, input: &str) -> Result<String> {
        let detect_span = span!(Level::INFO, "detect_diagram_type", input_len = input.len());
        let _enter = detect_span.enter();

        trace!("Starting diagram type detection");

        let mut best: Option<(&str, f64)> = None;
        for (name, detector) in &self.detectors {
            let confidence = detector.confidence(input);
            trace!(detector = name, confidence, "Checking detector");
            if !detector.detect(input) {
                continue;
            }
            if best.map_or(true, |(_, current)| confidence > current) {
                best = Some((name.as_str(), confidence));
            }
        }

        match best {
            Some((name, confidence)) => {
                info!(detector = name, confidence, "Detected diagram type");
                Ok(name.to_string())
            }
            None => {
                warn!("No suitable detector found for input");
                Err(DiagramError::detection_error("No suitable detector found for input").into())
            }
        }
    }

    /// Parse sequence input into a fresh database (skip detection)
    pub fn parse(&self, input: &str) -> Result<SequenceDatabase> {
        let parse_span = span!(Level::DEBUG, "pipeline_parse", input_len = input.len());
        let _enter = parse_span.enter();

        let parser = self
            .sequence_parser
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("No sequence parser available"))?;

        let mut database = SequenceDatabase::new();
        parser.parse(input, &mut database)?;
        debug!(
            participant_count = database.participant_count(),
            message_count = database.message_count(),
            "Parsing completed"
        );
        Ok(database)
    }

    /// Lay out an already-parsed database under a view
    ///
    /// The database is left untouched, so toggling collapse state only
    /// needs this call.
    pub fn relayout(
        &self,
        database: &SequenceDatabase,
        view: &ViewState,
    ) -> Result<SequenceLayoutResult> {
        let layout_span = span!(Level::DEBUG, "pipeline_layout");
        let _enter = layout_span.enter();

        let layout = self
            .sequence_layout
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("No sequence layout available"))?;
        layout.layout_with_view(database, view)
    }

    /// Process input through the complete pipeline
    ///
    /// Runs detector → parser → layout using registered plugins.
    pub fn process(&self, input: &str) -> Result<SequenceLayoutResult> {
        self.process_with_view(input, &ViewState::default())
    }

    /// Process input through the complete pipeline under a view
    pub fn process_with_view(&self, input: &str, view: &ViewState) -> Result<SequenceLayoutResult> {
        let process_span = span!(Level::INFO, "process_diagram", input_len = input.len());
        let _enter = process_span.enter();

        info!("Starting diagram processing pipeline");

        let diagram_type = self.detect(input)?;
        debug!(diagram_type, "Diagram type detected");
        if diagram_type != "sequence" {
            warn!(diagram_type, "Unsupported diagram type");
            return Err(anyhow::anyhow!(
                "Only sequence diagrams are currently supported"
            ));
        }

        let database = self.parse(input)?;
        let result = self.relayout(&database, view)?;

        info!(
            step_count = result.steps.len(),
            "Pipeline completed successfully"
        );
        Ok(result)
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orchestrator_creation() {
        let orchestrator = Orchestrator::new();
        assert_eq!(orchestrator.get_detectors().len(), 0);
        assert!(!orchestrator.has_sequence_plugins());
    }

    #[test]
    fn test_orchestrator_default() {
        let orchestrator = Orchestrator::default();
        assert_eq!(orchestrator.get_detectors().len(), 0);
        assert!(!orchestrator.has_sequence_plugins());
    }

    #[test]
    fn test_orchestrator_with_sequence_plugins() {
        let orchestrator = Orchestrator::with_sequence_plugins();
        assert_eq!(orchestrator.get_detectors(), vec!["sequence"]);
        assert!(orchestrator.has_sequence_plugins());
    }

    #[test]
    fn test_detect_with_no_detectors() {
        let orchestrator = Orchestrator::new();
        let result = orchestrator.detect("A -> B: hi");
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "Detection error: No suitable detector found for input"
        );
    }

    #[test]
    fn test_detect_sequence() {
        let orchestrator = Orchestrator::with_sequence_plugins();
        assert_eq!(orchestrator.detect("chart: sequence").unwrap(), "sequence");
        assert_eq!(orchestrator.detect("A -> B: hi").unwrap(), "sequence");
    }

    #[test]
    fn test_process_with_missing_plugins() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.register_default_detectors();

        let result = orchestrator.process("A -> B: hi");
        assert_eq!(
            result.unwrap_err().to_string(),
            "No sequence parser available"
        );
    }

    #[test]
    fn test_process_success() {
        let orchestrator = Orchestrator::with_sequence_plugins();
        let result = orchestrator
            .process("User -> API: login : token\nAPI -> DB: lookup")
            .unwrap();
        assert_eq!(result.participants.len(), 3);
        assert!(!result.steps.is_empty());
        assert!(result.width > 0.0 && result.height > 0.0);
    }

    #[test]
    fn test_process_plain_text_fails_detection() {
        let orchestrator = Orchestrator::with_sequence_plugins();
        let err = orchestrator
            .process("This is just plain text, not a diagram")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DiagramError>(),
            Some(DiagramError::Detection { .. })
        ));
    }

    #[test]
    fn test_process_reports_structural_error() {
        let orchestrator = Orchestrator::with_sequence_plugins();
        let err = orchestrator
            .process("A -> B: hi\n## Late group")
            .unwrap_err();
        let diagram_error = err.downcast_ref::<DiagramError>().unwrap();
        assert_eq!(diagram_error.line(), Some(2));
    }

    #[test]
    fn test_relayout_reuses_database() {
        let orchestrator = Orchestrator::with_sequence_plugins();
        let database = orchestrator
            .parse("== One ==\nA -> B: a\n== Two ==\nA -> B: b")
            .unwrap();

        let expanded = orchestrator.relayout(&database, &ViewState::default()).unwrap();
        let collapsed = orchestrator
            .relayout(&database, &ViewState::new().with_collapsed_section(0))
            .unwrap();
        assert_eq!(expanded.steps.len(), 2);
        assert_eq!(collapsed.steps.len(), 1);
        assert_eq!(database.message_count(), 2);
    }

    #[test]
    fn test_process_with_view_hides_notes() {
        let orchestrator = Orchestrator::with_sequence_plugins();
        let input = "A -> B: hi\nnote: hello";
        assert_eq!(orchestrator.process(input).unwrap().notes.len(), 1);
        let hidden = orchestrator
            .process_with_view(input, &ViewState::new().with_notes_hidden())
            .unwrap();
        assert!(hidden.notes.is_empty());
    }
}
