//! Read-only questions about the tree under a selection.

use crate::node::{Align, Document, ElementKind, MarkKind, Marks, Node, Point, Selection};
use crate::path::{self, Path};

/// Leaves sharing a non-empty stretch of text with an expanded selection.
pub fn selected_leaves<'a>(doc: &'a Document, selection: &Selection) -> Vec<(Path, &'a Marks)> {
    let (start, end) = selection.ordered();
    doc.paths_between(&start.path, &end.path)
        .into_iter()
        .filter_map(|p| {
            let Ok(Node::Text(t)) = doc.node(&p) else {
                return None;
            };
            let from = if p == start.path { start.offset } else { 0 };
            let to = if p == end.path { end.offset } else { t.text.len() };
            (from < to).then_some((p, &t.marks))
        })
        .collect()
}

/// Marks newly typed text at `point` would pick up: those of the leaf under
/// the caret, or of the leaf just before it when the caret sits at the start
/// of a leaf.
pub fn caret_marks(doc: &Document, point: &Point) -> Option<Marks> {
    let leaf = doc.leaf(&point.path).ok()?;
    if point.offset == 0 {
        if let Ok(prev) = path::previous(&point.path) {
            if let Ok(Node::Text(prev)) = doc.node(&prev) {
                return Some(prev.marks.clone());
            }
        }
    }
    Some(leaf.marks.clone())
}

/// For an expanded selection: true iff every intersecting leaf carries the
/// mark with a truthy value. A collapsed selection asks the caret.
pub fn is_mark_active(doc: &Document, selection: &Selection, kind: MarkKind) -> bool {
    if selection.is_collapsed() {
        return caret_marks(doc, &selection.anchor).is_some_and(|m| m.is_active(kind));
    }
    let leaves = selected_leaves(doc, selection);
    !leaves.is_empty() && leaves.iter().all(|(_, marks)| marks.is_active(kind))
}

/// Truthy marks shared, with equal values, by the whole selection.
pub fn active_marks(doc: &Document, selection: &Selection) -> Marks {
    if selection.is_collapsed() {
        return caret_marks(doc, &selection.anchor)
            .map(|m| m.resolved())
            .unwrap_or_default();
    }
    let leaves = selected_leaves(doc, selection);
    let Some(((_, first), rest)) = leaves.split_first() else {
        return Marks::new();
    };
    let mut shared = first.resolved();
    for (_, marks) in rest {
        shared = shared
            .iter()
            .filter(|(kind, value)| marks.get(*kind) == Some(*value))
            .fold(Marks::new(), |acc, (kind, value)| acc.with(kind, value.clone()));
    }
    shared
}

/// True iff an element of `kind` encloses the anchor or lies inside the
/// selected span. A selection that only partly covers such an element still
/// reports it active, so toggling `kind` turns the whole selection off.
pub fn is_block_active(doc: &Document, selection: &Selection, kind: ElementKind) -> bool {
    let (start, end) = selection.ordered();
    doc.paths_between(&start.path, &end.path)
        .iter()
        .any(|p| doc.node(p).ok().and_then(Node::kind) == Some(kind))
}

/// Path and kind of the text block holding the anchor.
pub fn anchor_block(doc: &Document, selection: &Selection) -> Option<(Path, ElementKind)> {
    doc.block_of(&selection.anchor.path)
        .ok()
        .map(|(path, el)| (path, el.kind))
}

pub fn active_alignment(doc: &Document, selection: &Selection) -> Option<Align> {
    doc.block_of(&selection.anchor.path).ok().and_then(|(_, el)| el.align)
}

/// `checked` of the checklist item holding the anchor.
pub fn active_checklist_checked(doc: &Document, selection: &Selection) -> Option<bool> {
    doc.block_of(&selection.anchor.path)
        .ok()
        .and_then(|(_, el)| el.checked)
}
