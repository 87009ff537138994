//! Bounded undo/redo of full scene snapshots.

use crate::config::DEFAULT_HISTORY_DEPTH;
use serde::{Deserialize, Serialize};

/// One saved document state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryState {
    /// Scene JSON as produced by `SceneGraph::to_json`.
    pub serialized_document: String,
    /// Decimal id of the layer to reactivate on restore.
    pub active_container_id: String,
    /// Human-readable description; diagnostics only.
    pub label: String,
}

/// Undo and redo stacks.
///
/// The top of the undo stack is always the current document state, so
/// undoing pops it onto the redo stack and returns the new top.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    undo_stack: Vec<HistoryState>,
    redo_stack: Vec<HistoryState>,
    max_depth: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

impl HistoryManager {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Push a new current state. Clears redo and evicts the oldest entry
    /// past the depth limit.
    pub fn save(&mut self, state: HistoryState) {
        log::debug!("Saving snapshot: {}", state.label);
        self.undo_stack.push(state);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
    }

    /// Step back. Returns the state to restore, or `None` when fewer than
    /// two states are recorded.
    pub fn undo(&mut self) -> Option<&HistoryState> {
        if self.undo_stack.len() < 2 {
            return None;
        }
        let current = self.undo_stack.pop()?;
        log::debug!("Undo: {}", current.label);
        self.redo_stack.push(current);
        self.undo_stack.last()
    }

    /// Step forward. Returns the state to restore, or `None` when there is
    /// nothing to redo.
    pub fn redo(&mut self) -> Option<&HistoryState> {
        let state = self.redo_stack.pop()?;
        log::debug!("Redo: {}", state.label);
        self.undo_stack.push(state);
        self.undo_stack.last()
    }

    pub fn current(&self) -> Option<&HistoryState> {
        self.undo_stack.last()
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() >= 2
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of states on the undo stack.
    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Labels of the undo stack, oldest first.
    pub fn labels(&self) -> Vec<&str> {
        self.undo_stack.iter().map(|s| s.label.as_str()).collect()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(label: &str) -> HistoryState {
        HistoryState {
            serialized_document: format!("doc-{label}"),
            active_container_id: "1".to_string(),
            label: label.to_string(),
        }
    }

    #[test]
    fn test_undo_needs_two_states() {
        let mut history = HistoryManager::default();
        assert!(history.undo().is_none());
        history.save(state("initial"));
        assert!(history.undo().is_none());
        assert_eq!(history.len(), 1);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_undo_redo_walk() {
        let mut history = HistoryManager::default();
        history.save(state("a"));
        history.save(state("b"));
        history.save(state("c"));

        assert_eq!(history.undo().unwrap().label, "b");
        assert_eq!(history.undo().unwrap().label, "a");
        assert!(history.undo().is_none());
        assert_eq!(history.redo().unwrap().label, "b");
        assert_eq!(history.redo().unwrap().label, "c");
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_save_clears_redo() {
        let mut history = HistoryManager::default();
        history.save(state("a"));
        history.save(state("b"));
        history.undo();
        assert!(history.can_redo());
        history.save(state("c"));
        assert!(!history.can_redo());
        assert_eq!(history.labels(), vec!["a", "c"]);
    }

    #[test]
    fn test_depth_evicts_oldest() {
        let mut history = HistoryManager::default();
        for i in 0..100 {
            history.save(state(&i.to_string()));
        }
        assert_eq!(history.len(), 80);
        assert_eq!(history.labels()[0], "20");
        assert_eq!(history.current().unwrap().label, "99");
    }

    #[test]
    fn test_undo_redo_inverse() {
        let mut history = HistoryManager::new(5);
        for label in ["a", "b", "c"] {
            history.save(state(label));
        }
        let before = history.current().cloned();
        history.undo();
        history.redo();
        assert_eq!(history.current().cloned(), before);
        assert_eq!(history.len(), 3);
    }
}
