//! Collapse and visibility state
//!
//! View state lives outside the parsed document: toggling a section or a
//! note only changes this value, and layout is re-run from the unchanged
//! database.

use std::collections::BTreeSet;

use serde::Serialize;

/// Which sections and notes are collapsed, and whether notes are shown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// Section indices (document order) whose messages are hidden
    pub collapsed_sections: BTreeSet<usize>,
    /// Note indices (document order) rendered as placeholders
    pub collapsed_notes: BTreeSet<usize>,
    pub show_notes: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            collapsed_sections: BTreeSet::new(),
            collapsed_notes: BTreeSet::new(),
            show_notes: true,
        }
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collapsed_section(mut self, section: usize) -> Self {
        self.collapsed_sections.insert(section);
        self
    }

    pub fn with_collapsed_note(mut self, note: usize) -> Self {
        self.collapsed_notes.insert(note);
        self
    }

    pub fn with_notes_hidden(mut self) -> Self {
        self.show_notes = false;
        self
    }

    /// Flip a section between collapsed and expanded
    pub fn toggle_section(&mut self, section: usize) {
        if !self.collapsed_sections.remove(&section) {
            self.collapsed_sections.insert(section);
        }
    }

    /// Flip a note between collapsed and expanded
    pub fn toggle_note(&mut self, note: usize) {
        if !self.collapsed_notes.remove(&note) {
            self.collapsed_notes.insert(note);
        }
    }

    pub fn is_section_collapsed(&self, section: usize) -> bool {
        self.collapsed_sections.contains(&section)
    }

    pub fn is_note_collapsed(&self, note: usize) -> bool {
        self.collapsed_notes.contains(&note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_shows_everything() {
        let view = ViewState::default();
        assert!(view.show_notes);
        assert!(!view.is_section_collapsed(0));
        assert!(!view.is_note_collapsed(0));
    }

    #[test]
    fn test_toggles() {
        let mut view = ViewState::new().with_collapsed_section(1);
        view.toggle_section(1);
        view.toggle_section(2);
        assert!(!view.is_section_collapsed(1));
        assert!(view.is_section_collapsed(2));

        view.toggle_note(0);
        assert!(view.is_note_collapsed(0));
        view.toggle_note(0);
        assert!(!view.is_note_collapsed(0));
    }
}
