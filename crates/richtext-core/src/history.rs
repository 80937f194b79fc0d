use serde::{Deserialize, Serialize};

use crate::node::Selection;
use crate::ops::Op;

/// One committed command. `inverse_ops` are stored in the order undo applies
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub ops: Vec<Op>,
    pub inverse_ops: Vec<Op>,
    pub selection_before: Selection,
    pub selection_after: Selection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct History {
    undo: Vec<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    max_undo: usize,
}

impl History {
    pub fn new(max_undo: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            max_undo,
        }
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn last_undo(&self) -> Option<&HistoryEntry> {
        self.undo.last()
    }

    /// Record a fresh commit. Any redoable entries are discarded.
    pub fn commit(&mut self, entry: HistoryEntry) {
        self.redo.clear();
        self.push_undo(entry);
    }

    pub(crate) fn push_undo(&mut self, entry: HistoryEntry) {
        self.undo.push(entry);
        if self.max_undo > 0 && self.undo.len() > self.max_undo {
            let overflow = self.undo.len() - self.max_undo;
            self.undo.drain(..overflow);
        }
    }

    pub(crate) fn pop_undo(&mut self) -> Option<HistoryEntry> {
        self.undo.pop()
    }

    pub(crate) fn push_redo(&mut self, entry: HistoryEntry) {
        self.redo.push(entry);
    }

    pub(crate) fn pop_redo(&mut self) -> Option<HistoryEntry> {
        self.redo.pop()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Point;

    fn entry(tag: &str) -> HistoryEntry {
        let sel = Selection::collapsed(Point::new(vec![0, 0], 0));
        HistoryEntry {
            ops: Vec::new(),
            inverse_ops: Vec::new(),
            selection_before: sel.clone(),
            selection_after: sel,
            source: Some(tag.to_string()),
        }
    }

    #[test]
    fn bounded_history_drops_oldest() {
        let mut history = History::new(2);
        history.commit(entry("a"));
        history.commit(entry("b"));
        history.commit(entry("c"));
        assert_eq!(history.undo_len(), 2);
        assert_eq!(history.pop_undo().unwrap().source.as_deref(), Some("c"));
        assert_eq!(history.pop_undo().unwrap().source.as_deref(), Some("b"));
        assert!(history.pop_undo().is_none());
    }

    #[test]
    fn commit_clears_redo() {
        let mut history = History::new(10);
        history.push_redo(entry("a"));
        assert!(history.can_redo());
        history.commit(entry("b"));
        assert!(!history.can_redo());
    }

    #[test]
    fn clear_empties_both_stacks() {
        let mut history = History::new(10);
        history.commit(entry("a"));
        history.push_redo(entry("b"));
        history.clear();
        assert_eq!(history.undo_len(), 0);
        assert_eq!(history.redo_len(), 0);
        assert!(history.last_undo().is_none());
    }
}
