//! Location-based editing primitives built on top of [`Op`].
//!
//! A [`Transforms`] borrows the live document and selection for the length of
//! one command. Every primitive lowers to ops through [`Transforms::apply`],
//! which records the forward op and its inverse and carries the selection
//! along. Public primitives check the grammar once they are done and are
//! atomic: on any error the ops they applied are undone, dropped from the
//! batch, and the selection is put back.

use tracing::{trace, warn};

use crate::error::Result;
use crate::node::{Document, ElementKind, ElementProps, Location, Node, Point, Selection};
use crate::ops::{Affinity, Op, PropsPatch};
use crate::path::{self, Path};

/// Which nodes a location-based primitive acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    Text,
    Kind(ElementKind),
    /// Elements whose children are leaves.
    TextBlock,
    List,
}

impl Match {
    pub fn matches(self, node: &Node) -> bool {
        match (self, node) {
            (Match::Text, Node::Text(_)) => true,
            (Match::Kind(kind), Node::Element(el)) => el.kind == kind,
            (Match::TextBlock, Node::Element(el)) => el.kind.is_text_block(),
            (Match::List, Node::Element(el)) => el.kind.is_list(),
            _ => false,
        }
    }
}

pub struct Transforms<'a> {
    doc: &'a mut Document,
    selection: &'a mut Selection,
    ops: Vec<Op>,
    inverse: Vec<Op>,
}

impl<'a> Transforms<'a> {
    pub fn new(doc: &'a mut Document, selection: &'a mut Selection) -> Self {
        Self {
            doc,
            selection,
            ops: Vec::new(),
            inverse: Vec::new(),
        }
    }

    pub fn doc(&self) -> &Document {
        self.doc
    }

    pub fn selection(&self) -> &Selection {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        *self.selection = selection;
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Forward ops in application order, and their inverses in undo order.
    pub fn finish(self) -> (Vec<Op>, Vec<Op>) {
        let Self {
            ops, mut inverse, ..
        } = self;
        inverse.reverse();
        (ops, inverse)
    }

    pub fn apply(&mut self, op: Op) -> Result<()> {
        trace!(op = op.name(), path = ?op.path(), "apply op");
        let inverse = op.clone().apply(self.doc)?;
        self.selection.transform(&op);
        self.ops.push(op);
        self.inverse.push(inverse);
        Ok(())
    }

    /// Run `f` as one unit. On error, replay the inverses it recorded, drop
    /// its ops and restore the selection.
    fn atomic<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let mark = self.ops.len();
        let selection = self.selection.clone();
        let result = f(self);
        if result.is_err() {
            self.rollback(mark, selection);
        }
        result
    }

    fn rollback(&mut self, mark: usize, selection: Selection) {
        self.ops.truncate(mark);
        for inverse in self.inverse.drain(mark..).rev() {
            if let Err(err) = inverse.apply(self.doc) {
                warn!(%err, "inverse op failed during rollback");
            }
        }
        *self.selection = selection;
    }

    /// Apply `op` and carry `tracked` points through it with their affinity.
    fn apply_tracking(&mut self, op: Op, tracked: &mut [(&mut Point, Affinity)]) -> Result<()> {
        self.apply(op.clone())?;
        for (point, affinity) in tracked.iter_mut() {
            if let Some(next) = point.transform(&op, *affinity) {
                **point = next;
            }
        }
        Ok(())
    }

    pub fn insert_node(&mut self, path: &[usize], node: Node) -> Result<()> {
        self.atomic(|tx| {
            tx.apply(Op::InsertNode {
                path: path.to_vec(),
                node,
            })?;
            tx.doc.validate()
        })
    }

    pub fn remove_node(&mut self, path: &[usize]) -> Result<()> {
        self.atomic(|tx| {
            tx.apply(Op::RemoveNode {
                path: path.to_vec(),
            })?;
            tx.doc.validate()
        })
    }

    pub fn split_node(&mut self, path: &[usize], position: usize) -> Result<()> {
        self.atomic(|tx| {
            let op = tx.split_op(path, position)?;
            tx.apply(op)?;
            tx.doc.validate()
        })
    }

    /// Merge the node at `path` into its previous sibling.
    pub fn merge_node(&mut self, path: &[usize]) -> Result<()> {
        self.atomic(|tx| {
            let prev = path::previous(path)?;
            let position = match tx.doc.node(&prev)? {
                Node::Text(t) => t.text.len(),
                Node::Element(el) => el.children.len(),
            };
            let properties = tx.doc.node(path)?.props();
            tx.apply(Op::MergeNode {
                path: path.to_vec(),
                position,
                properties,
            })?;
            tx.doc.validate()
        })
    }

    /// Apply the part of `patch` that would change the node at `path`.
    /// Returns whether anything changed.
    pub fn set_node_properties(&mut self, path: &[usize], patch: &PropsPatch) -> Result<bool> {
        self.atomic(|tx| {
            let changed = tx.patch_node(path, patch)?;
            tx.doc.validate()?;
            Ok(changed)
        })
    }

    fn patch_node(&mut self, path: &[usize], patch: &PropsPatch) -> Result<bool> {
        let effective = match (self.doc.node(path)?, patch) {
            (Node::Element(el), PropsPatch::Element(p)) => {
                let p = p.effective(el);
                (!p.is_empty()).then_some(PropsPatch::Element(p))
            }
            (Node::Text(t), PropsPatch::Text(p)) => {
                let p = p.effective(&t.marks);
                (!p.is_empty()).then_some(PropsPatch::Text(p))
            }
            _ => None,
        };
        let Some(patch) = effective else {
            return Ok(false);
        };
        self.apply(Op::SetNodeProperties {
            path: path.to_vec(),
            patch,
        })?;
        Ok(true)
    }

    /// Patch every node at `at` accepted by `matcher`. With `split`, leaves
    /// partially covered by an expanded range are split at the range edges
    /// first so only the covered text changes. Returns the number of matched
    /// nodes.
    pub fn set_nodes(
        &mut self,
        patch: &PropsPatch,
        at: &Location,
        matcher: Match,
        split: bool,
    ) -> Result<usize> {
        self.atomic(|tx| tx.set_nodes_in_place(patch, at, matcher, split))
    }

    fn set_nodes_in_place(
        &mut self,
        patch: &PropsPatch,
        at: &Location,
        matcher: Match,
        split: bool,
    ) -> Result<usize> {
        let (mut start, mut end) = self.doc.span(at)?;
        let expanded = start != end;

        if split && expanded && matcher == Match::Text {
            let follows_selection = self.selection.ordered() == (start.clone(), end.clone());
            let backward = self.selection.focus.is_before(&self.selection.anchor);

            let end_len = self.doc.leaf(&end.path)?.text.len();
            if end.offset > 0 && end.offset < end_len {
                let op = self.split_op(&end.path, end.offset)?;
                self.apply_tracking(op, &mut [(&mut start, Affinity::Forward)])?;
            }
            let start_len = self.doc.leaf(&start.path)?.text.len();
            if start.offset > 0 && start.offset < start_len {
                let op = self.split_op(&start.path, start.offset)?;
                self.apply_tracking(op, &mut [(&mut end, Affinity::Backward)])?;
                start = Point::new(path::next(&start.path)?, 0);
            }

            if follows_selection {
                *self.selection = if backward {
                    Selection::new(end.clone(), start.clone())
                } else {
                    Selection::new(start.clone(), end.clone())
                };
            }
        }

        let targets = self.matching_paths(&start, &end, matcher)?;
        for target in &targets {
            self.patch_node(target, patch)?;
        }
        self.doc.validate()?;
        Ok(targets.len())
    }

    fn split_op(&self, path: &[usize], position: usize) -> Result<Op> {
        Ok(Op::SplitNode {
            path: path.to_vec(),
            position,
            properties: self.doc.node(path)?.props(),
        })
    }

    fn matching_paths(&self, start: &Point, end: &Point, matcher: Match) -> Result<Vec<Path>> {
        let expanded = start != end;
        let mut out = Vec::new();
        for p in self.doc.paths_between(&start.path, &end.path) {
            let node = self.doc.node(&p)?;
            if !matcher.matches(node) {
                continue;
            }
            if let (true, Node::Text(t)) = (expanded, node) {
                let from = if p == start.path { start.offset } else { 0 };
                let to = if p == end.path { end.offset } else { t.text.len() };
                if from >= to {
                    continue;
                }
            }
            out.push(p);
        }
        Ok(out)
    }

    /// Wrap each contiguous sibling run of matched nodes at `at` in a new
    /// element. Nodes inside an already matched node are left alone.
    pub fn wrap_nodes(&mut self, wrapper: ElementProps, at: &Location, matcher: Match) -> Result<usize> {
        self.atomic(|tx| tx.wrap_nodes_in_place(wrapper, at, matcher))
    }

    fn wrap_nodes_in_place(&mut self, wrapper: ElementProps, at: &Location, matcher: Match) -> Result<usize> {
        let mut matched: Vec<Path> = Vec::new();
        for p in self.doc.paths_at(at)? {
            if !matcher.matches(self.doc.node(&p)?) {
                continue;
            }
            if matched.iter().any(|m| path::is_ancestor(m, &p)) {
                continue;
            }
            matched.push(p);
        }

        let mut runs: Vec<(Path, usize)> = Vec::new();
        for p in matched {
            if let Some((first, count)) = runs.last_mut() {
                let (first_parent, first_ix) = first.split_at(first.len() - 1);
                let (parent, ix) = p.split_at(p.len() - 1);
                if first_parent == parent && first_ix[0] + *count == ix[0] {
                    *count += 1;
                    continue;
                }
            }
            runs.push((p, 1));
        }

        let wrapped = runs.len();
        for (path, count) in runs.into_iter().rev() {
            self.apply(Op::WrapNodes {
                path,
                count,
                wrapper,
            })?;
        }
        self.doc.validate()?;
        Ok(wrapped)
    }

    /// Lift the children of every matched element at `at` into its parent.
    /// With `split`, only the children covered by the location are lifted;
    /// the rest stay behind in copies of the element.
    pub fn unwrap_nodes(&mut self, at: &Location, matcher: Match, split: bool) -> Result<usize> {
        self.atomic(|tx| tx.unwrap_nodes_in_place(at, matcher, split))
    }

    fn unwrap_nodes_in_place(&mut self, at: &Location, matcher: Match, split: bool) -> Result<usize> {
        let (mut start, mut end) = self.doc.span(at)?;
        let mut targets: Vec<Path> = Vec::new();
        for p in self.doc.paths_between(&start.path, &end.path) {
            let node = self.doc.node(&p)?;
            if matches!(node, Node::Element(_)) && matcher.matches(node) {
                targets.push(p);
            }
        }

        for target in targets.iter().rev() {
            let len = self.doc.element(target)?.children.len();
            if !split || len == 0 {
                self.apply_tracking(
                    Op::UnwrapNodes {
                        path: target.clone(),
                        count: len,
                    },
                    &mut [(&mut start, Affinity::Forward), (&mut end, Affinity::Backward)],
                )?;
                continue;
            }

            let depth = target.len();
            let first = if path::is_ancestor(target, &start.path) {
                start.path[depth]
            } else {
                0
            };
            let last = if path::is_ancestor(target, &end.path) {
                end.path[depth]
            } else {
                len - 1
            };
            let last = last.max(first);

            if last + 1 < len {
                let op = self.split_op(target, last + 1)?;
                self.apply_tracking(
                    op,
                    &mut [(&mut start, Affinity::Forward), (&mut end, Affinity::Backward)],
                )?;
            }
            let mut lifted = target.clone();
            if first > 0 {
                let op = self.split_op(target, first)?;
                self.apply_tracking(
                    op,
                    &mut [(&mut start, Affinity::Forward), (&mut end, Affinity::Backward)],
                )?;
                lifted = path::next(target)?;
            }
            self.apply_tracking(
                Op::UnwrapNodes {
                    path: lifted,
                    count: last - first + 1,
                },
                &mut [(&mut start, Affinity::Forward), (&mut end, Affinity::Backward)],
            )?;
        }
        self.doc.validate()?;
        Ok(targets.len())
    }
}
