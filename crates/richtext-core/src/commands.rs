//! Toolbar-level intents. Each command runs as one batch through
//! [`Editor::transact`](crate::Editor) and leaves exactly one history entry.

use tracing::debug;

use crate::core::Editor;
use crate::error::{EditorError, Result};
use crate::node::{
    Align, ElementKind, ElementProps, Location, MarkKind, MarkValue, Marks, Node, Point,
    Selection, TextNode,
};
use crate::ops::{ElementPatch, MarksPatch, Op, PropsPatch};
use crate::path;
use crate::query;
use crate::transforms::{Match, Transforms};

impl Editor {
    pub fn is_mark_active(&self, kind: MarkKind) -> bool {
        match self.pending_marks() {
            Some(marks) if self.selection().is_collapsed() => marks.is_active(kind),
            _ => query::is_mark_active(self.doc(), self.selection(), kind),
        }
    }

    pub fn active_marks(&self) -> Marks {
        match self.pending_marks() {
            Some(marks) if self.selection().is_collapsed() => marks.resolved(),
            _ => query::active_marks(self.doc(), self.selection()),
        }
    }

    pub fn mark_value(&self, kind: MarkKind) -> Option<MarkValue> {
        self.active_marks().get(kind).cloned()
    }

    pub fn is_block_active(&self, kind: ElementKind) -> bool {
        query::is_block_active(self.doc(), self.selection(), kind)
    }

    pub fn active_alignment(&self) -> Option<Align> {
        query::active_alignment(self.doc(), self.selection())
    }

    pub fn active_checklist_checked(&self) -> Option<bool> {
        query::active_checklist_checked(self.doc(), self.selection())
    }

    /// `checked` of the checklist item at `path`.
    pub fn checklist_checked(&self, path: &[usize]) -> Result<bool> {
        let el = self.doc().element(path)?;
        match (el.kind, el.checked) {
            (ElementKind::ChecklistItem, Some(checked)) => Ok(checked),
            _ => Err(EditorError::structural(format!(
                "{} at {path:?} is not a checklist item",
                el.kind.as_str()
            ))),
        }
    }

    /// Marks the next typed text will carry.
    fn typing_marks(&self) -> Option<Marks> {
        self.pending_marks()
            .cloned()
            .or_else(|| query::caret_marks(self.doc(), &self.selection().anchor))
    }

    pub fn toggle_mark(&mut self, kind: MarkKind) -> Result<()> {
        if self.is_mark_active(kind) {
            self.unset_mark(kind)
        } else if kind.is_flag() {
            self.set_mark(kind, MarkValue::Flag(true))
        } else {
            Err(EditorError::invalid_args(
                "marks.toggle",
                format!("{kind:?} needs a value; use marks.set"),
            ))
        }
    }

    /// Apply a mark over the selected text. At a caret the mark is held for
    /// the next typed text instead.
    pub fn set_mark(&mut self, kind: MarkKind, value: MarkValue) -> Result<()> {
        if !kind.accepts(&value) {
            return Err(EditorError::invalid_args(
                "marks.set",
                format!("{kind:?} cannot hold {value:?}"),
            ));
        }
        if self.selection().is_collapsed() {
            let mut marks = self
                .typing_marks()
                .ok_or_else(|| EditorError::no_op("Caret is not in text"))?;
            marks.insert(kind, value);
            self.set_pending_marks(marks);
            return Ok(());
        }
        let patch = PropsPatch::Text(MarksPatch::set(kind, value));
        self.transact("marks.set", |tx| mark_selection(tx, &patch))
    }

    pub fn unset_mark(&mut self, kind: MarkKind) -> Result<()> {
        if self.selection().is_collapsed() {
            let mut marks = self
                .typing_marks()
                .ok_or_else(|| EditorError::no_op("Caret is not in text"))?;
            marks.remove(kind);
            self.set_pending_marks(marks);
            return Ok(());
        }
        let patch = PropsPatch::Text(MarksPatch::remove(kind));
        self.transact("marks.unset", |tx| mark_selection(tx, &patch))
    }

    /// Switch the selected blocks to `kind`, or back to paragraphs when they
    /// already are. Lists are always torn down first, so changing list type
    /// never nests one list in another.
    pub fn toggle_block(&mut self, kind: ElementKind) -> Result<()> {
        let active = self.is_block_active(kind);
        let target = if active {
            ElementKind::Paragraph
        } else if kind.is_list() {
            ElementKind::ListItem
        } else {
            kind
        };
        debug!(kind = kind.as_str(), active, target = target.as_str(), "toggle block");

        self.transact("block.toggle", |tx| {
            retype_selected_blocks(tx, target)?;
            if !active && kind.is_list() {
                let at = Location::Range(tx.selection().clone());
                tx.wrap_nodes(
                    ElementProps::of_kind(kind),
                    &at,
                    Match::Kind(ElementKind::ListItem),
                )?;
            }
            Ok(())
        })
    }

    pub fn set_alignment(&mut self, align: Align) -> Result<()> {
        let at = Location::Range(self.selection().clone());
        let patch = PropsPatch::Element(ElementPatch::align(align));
        self.transact("block.set_align", |tx| {
            tx.set_nodes(&patch, &at, Match::Kind(ElementKind::Paragraph), false)?;
            Ok(())
        })
    }

    /// Turn the selected blocks into unchecked checklist items, keeping their
    /// text, or back into paragraphs when they already are.
    pub fn toggle_checklist(&mut self) -> Result<()> {
        let target = if self.is_block_active(ElementKind::ChecklistItem) {
            ElementKind::Paragraph
        } else {
            ElementKind::ChecklistItem
        };
        self.transact("checklist.toggle", |tx| retype_selected_blocks(tx, target))
    }

    pub fn set_checklist_checked(&mut self, path: &[usize], checked: bool) -> Result<()> {
        self.checklist_checked(path)?;
        let patch = PropsPatch::Element(ElementPatch::checked(checked));
        self.transact("checklist.set_checked", |tx| {
            tx.set_node_properties(path, &patch)?;
            Ok(())
        })
    }

    pub fn toggle_checklist_checked(&mut self, path: &[usize]) -> Result<()> {
        let checked = self.checklist_checked(path)?;
        self.set_checklist_checked(path, !checked)
    }

    /// Start a fresh unchecked item after the checklist item holding the
    /// caret and move the caret into it.
    pub fn continue_checklist(&mut self) -> Result<()> {
        let (block, kind) = query::anchor_block(self.doc(), self.selection())
            .ok_or_else(|| EditorError::no_op("Caret is not in a block"))?;
        if kind != ElementKind::ChecklistItem {
            return Err(EditorError::no_op("Caret is not in a checklist item"));
        }
        let at = path::next(&block)?;
        self.transact("checklist.continue", |tx| {
            tx.insert_node(&at, Node::checklist_item("", false))?;
            tx.set_selection(Selection::collapsed(Point::new(path::child(&at, 0), 0)));
            Ok(())
        })
    }

    /// Turn the checklist item holding the caret back into a paragraph.
    pub fn exit_checklist(&mut self) -> Result<()> {
        let (block, kind) = query::anchor_block(self.doc(), self.selection())
            .ok_or_else(|| EditorError::no_op("Caret is not in a block"))?;
        if kind != ElementKind::ChecklistItem {
            return Err(EditorError::no_op("Caret is not in a checklist item"));
        }
        let patch = PropsPatch::Element(ElementPatch::retype(ElementKind::Paragraph));
        self.transact("checklist.exit", |tx| {
            tx.set_node_properties(&block, &patch)?;
            Ok(())
        })
    }

    /// Insert at a collapsed caret. Held marks that differ from the leaf's
    /// put the text in a new run.
    pub fn insert_text(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Err(EditorError::no_op("Nothing to insert"));
        }
        if !self.selection().is_collapsed() {
            return Err(EditorError::no_op("Text insertion needs a collapsed selection"));
        }
        let caret = self.selection().anchor.clone();
        let leaf = self.doc().leaf(&caret.path)?;
        let leaf_len = leaf.text.len();
        let run_marks = self
            .pending_marks()
            .filter(|marks| marks.resolved() != leaf.marks.resolved())
            .cloned();

        self.transact("text.insert", |tx| match run_marks {
            None => tx.apply(Op::InsertText {
                path: caret.path.clone(),
                offset: caret.offset,
                text: text.to_string(),
            }),
            Some(marks) => {
                let at = if caret.offset == 0 {
                    caret.path.clone()
                } else {
                    if caret.offset < leaf_len {
                        tx.split_node(&caret.path, caret.offset)?;
                    }
                    path::next(&caret.path)?
                };
                tx.insert_node(&at, Node::Text(TextNode::with_marks(text, marks)))?;
                tx.set_selection(Selection::collapsed(Point::new(at, text.len())));
                Ok(())
            }
        })
    }
}

fn mark_selection(tx: &mut Transforms<'_>, patch: &PropsPatch) -> Result<()> {
    let at = Location::Range(tx.selection().clone());
    tx.set_nodes(patch, &at, Match::Text, true)?;
    Ok(())
}

/// Lift the selected blocks out of any list, then retype them.
fn retype_selected_blocks(tx: &mut Transforms<'_>, target: ElementKind) -> Result<()> {
    let at = Location::Range(tx.selection().clone());
    tx.unwrap_nodes(&at, Match::List, true)?;
    let at = Location::Range(tx.selection().clone());
    tx.set_nodes(
        &PropsPatch::Element(ElementPatch::retype(target)),
        &at,
        Match::TextBlock,
        false,
    )?;
    Ok(())
}
