use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::config::EditorConfig;
use crate::error::{EditorError, Result};
use crate::history::{History, HistoryEntry};
use crate::node::{Document, Marks, Point, Selection};
use crate::normalize::clamp_selection;
use crate::ops::{Op, Transaction};
use crate::plugin::PluginRegistry;
use crate::render::Snapshot;
use crate::transforms::Transforms;

/// One editing session: the document, the selection, the marks the next
/// typed text will carry, and the undo/redo history.
pub struct Editor {
    doc: Document,
    selection: Selection,
    pending_marks: Option<Marks>,
    registry: PluginRegistry,
    config: EditorConfig,
    history: History,
}

impl Editor {
    /// Normalizes `doc` and checks it against the grammar. The selection is
    /// clamped onto live leaves.
    pub fn new(doc: Document, selection: Selection, registry: PluginRegistry) -> Result<Self> {
        Self::with_config(doc, selection, registry, EditorConfig::default())
    }

    pub fn with_config(
        doc: Document,
        selection: Selection,
        registry: PluginRegistry,
        config: EditorConfig,
    ) -> Result<Self> {
        let config = config.with_defaults();
        let mut editor = Self {
            doc,
            selection,
            pending_marks: None,
            registry,
            history: History::new(config.max_undo),
            config,
        };

        {
            let mut tx = Transforms::new(&mut editor.doc, &mut editor.selection);
            normalize(&editor.registry, editor.config.max_normalize_iterations, &mut tx)?;
        }
        editor.doc.validate()?;
        editor.selection = clamp_selection(&editor.doc, &editor.selection)
            .ok_or_else(|| EditorError::structural("Document has no leaf to select"))?;
        Ok(editor)
    }

    pub fn with_core_plugins() -> Self {
        Self::empty(PluginRegistry::core())
    }

    pub fn with_richtext_plugins() -> Self {
        Self::empty(PluginRegistry::richtext())
    }

    fn empty(registry: PluginRegistry) -> Self {
        let config = EditorConfig::default();
        Self {
            doc: Document::default(),
            selection: Selection::collapsed(Point::new(vec![0, 0], 0)),
            pending_marks: None,
            registry,
            history: History::new(config.max_undo),
            config,
        }
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn pending_marks(&self) -> Option<&Marks> {
        self.pending_marks.as_ref()
    }

    pub(crate) fn set_pending_marks(&mut self, marks: Marks) {
        trace!(?marks, "pending marks");
        self.pending_marks = Some(marks);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            document: self.doc.clone(),
            selection: self.selection.clone(),
        }
    }

    /// Both points must address a leaf and sit on a char boundary in it.
    pub fn set_selection(&mut self, selection: Selection) -> Result<()> {
        self.doc.check_point(&selection.anchor)?;
        self.doc.check_point(&selection.focus)?;
        self.selection = selection;
        self.pending_marks = None;
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Returns `Ok(false)` when there is nothing to undo. If the inverse ops
    /// no longer apply, the tree is left as it was and the entry stays on the
    /// undo stack.
    pub fn undo(&mut self) -> Result<bool> {
        let Some(entry) = self.history.pop_undo() else {
            return Ok(false);
        };
        if let Err(err) = self.replay(&entry.inverse_ops) {
            self.history.push_undo(entry);
            return Err(err);
        }
        self.restore_selection(&entry.selection_before);
        debug!(
            source = entry.source.as_deref().unwrap_or_default(),
            ops = entry.inverse_ops.len(),
            undo_depth = self.history.undo_len(),
            "undo"
        );
        self.history.push_redo(entry);
        Ok(true)
    }

    pub fn redo(&mut self) -> Result<bool> {
        let Some(entry) = self.history.pop_redo() else {
            return Ok(false);
        };
        if let Err(err) = self.replay(&entry.ops) {
            self.history.push_redo(entry);
            return Err(err);
        }
        self.restore_selection(&entry.selection_after);
        debug!(
            source = entry.source.as_deref().unwrap_or_default(),
            ops = entry.ops.len(),
            redo_depth = self.history.redo_len(),
            "redo"
        );
        self.history.push_undo(entry);
        Ok(true)
    }

    fn restore_selection(&mut self, selection: &Selection) {
        self.selection =
            clamp_selection(&self.doc, selection).unwrap_or_else(|| selection.clone());
        self.pending_marks = None;
    }

    fn replay(&mut self, ops: &[Op]) -> Result<()> {
        let doc_before = self.doc.clone();
        let selection_before = self.selection.clone();

        let result = (|| -> Result<()> {
            let mut tx = Transforms::new(&mut self.doc, &mut self.selection);
            for op in ops {
                tx.apply(op.clone())?;
            }
            tx.doc().validate()
        })();

        if let Err(err) = &result {
            warn!(error = %err, "history replay failed, rolling back");
            self.doc = doc_before;
            self.selection = selection_before;
        }
        result
    }

    /// Commit a caller-built batch of operations as one history entry.
    pub fn apply(&mut self, tx: Transaction) -> Result<()> {
        let Transaction {
            ops,
            selection_after,
            meta,
        } = tx;
        let source = meta.source.unwrap_or_else(|| "transaction".to_string());
        self.transact(&source, |tx| {
            for op in ops {
                tx.apply(op)?;
            }
            if let Some(selection) = selection_after {
                tx.doc().check_point(&selection.anchor)?;
                tx.doc().check_point(&selection.focus)?;
                tx.set_selection(selection);
            }
            Ok(())
        })
    }

    /// Run `f` as one all-or-nothing batch: normalize, validate and record a
    /// single history entry, or restore the tree and selection on any error.
    /// A batch that produces no ops is a `NoOp`.
    pub(crate) fn transact(
        &mut self,
        source: &str,
        f: impl FnOnce(&mut Transforms<'_>) -> Result<()>,
    ) -> Result<()> {
        let doc_before = self.doc.clone();
        let selection_before = self.selection.clone();

        let result = (|| -> Result<(Vec<Op>, Vec<Op>)> {
            let mut tx = Transforms::new(&mut self.doc, &mut self.selection);
            f(&mut tx)?;
            normalize(&self.registry, self.config.max_normalize_iterations, &mut tx)?;
            tx.doc().validate()?;
            Ok(tx.finish())
        })();

        let (ops, inverse_ops) = match result {
            Ok(batch) => batch,
            Err(err) => {
                if !err.is_no_op() {
                    warn!(source, error = %err, "command failed, rolling back");
                }
                self.doc = doc_before;
                self.selection = selection_before;
                return Err(err);
            }
        };
        if ops.is_empty() {
            self.selection = selection_before;
            return Err(EditorError::no_op(format!("{source} changed nothing")));
        }

        if let Some(selection) = clamp_selection(&self.doc, &self.selection) {
            self.selection = selection;
        }
        self.pending_marks = None;

        let entry = HistoryEntry {
            ops,
            inverse_ops,
            selection_before,
            selection_after: self.selection.clone(),
            source: Some(source.to_string()),
        };
        debug!(
            source,
            ops = entry.ops.len(),
            undo_depth = self.history.undo_len() + 1,
            "commit"
        );
        self.history.commit(entry);
        Ok(())
    }

    /// Run a registered command and hand back the resulting state.
    pub fn dispatch(&mut self, id: &str, args: Option<Value>) -> Result<Snapshot> {
        let Some(command) = self.registry.command(id) else {
            return Err(EditorError::UnknownCommand(id.to_string()));
        };
        debug!(command = id, "dispatch");
        (command.handler)(self, args)?;
        Ok(self.snapshot())
    }

    pub fn run_query_json(&self, id: &str, args: Option<Value>) -> Result<Value> {
        let Some(query) = self.registry.query(id) else {
            return Err(EditorError::UnknownQuery(id.to_string()));
        };
        (query.handler)(self, args)
    }

    pub fn run_query<T>(&self, id: &str, args: Option<Value>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let value = self.run_query_json(id, args)?;
        serde_json::from_value(value).map_err(|err| {
            EditorError::invalid_args(id, format!("Failed to decode query result: {err}"))
        })
    }
}

/// Run the registry's passes until none of them has anything to fix. One
/// pass at a time: each pass sees the tree the previous one left.
fn normalize(registry: &PluginRegistry, max_iterations: usize, tx: &mut Transforms<'_>) -> Result<()> {
    for _ in 0..max_iterations {
        let next = registry.normalize_passes().iter().find_map(|pass| {
            let ops = pass.run(tx.doc());
            (!ops.is_empty()).then(|| (pass.id(), ops))
        });
        let Some((pass, ops)) = next else {
            return Ok(());
        };
        trace!(pass, ops = ops.len(), "normalize");
        for op in ops {
            tx.apply(op)?;
        }
    }
    Err(EditorError::NormalizeDidNotConverge(max_iterations))
}
