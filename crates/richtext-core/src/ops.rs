use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};
use crate::node::{
    Align, Document, ElementKind, ElementNode, ElementProps, MarkKind, Marks, Node, NodeProps,
    Point, Selection, TextNode,
};
use crate::path::{self, Path, PathError};

/// One primitive, invertible tree mutation. Every variant carries what it
/// needs to be replayed and inverted without looking at the tree first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    InsertText {
        #[serde(default)]
        path: Path,
        offset: usize,
        text: String,
    },
    RemoveText {
        #[serde(default)]
        path: Path,
        range: Range<usize>,
    },
    InsertNode {
        #[serde(default)]
        path: Path,
        node: Node,
    },
    RemoveNode {
        #[serde(default)]
        path: Path,
    },
    SetNodeProperties {
        #[serde(default)]
        path: Path,
        patch: PropsPatch,
    },
    /// Splits the node at `path` at `position` (byte offset for a leaf, child
    /// index for an element). The right half becomes the next sibling and
    /// takes `properties`.
    SplitNode {
        #[serde(default)]
        path: Path,
        position: usize,
        properties: NodeProps,
    },
    /// Merges the node at `path` into its previous sibling, whose length is
    /// `position`. `properties` are those of the node being merged away.
    MergeNode {
        #[serde(default)]
        path: Path,
        position: usize,
        properties: NodeProps,
    },
    /// Reparents `count` siblings starting at `path` under a new element.
    WrapNodes {
        #[serde(default)]
        path: Path,
        count: usize,
        wrapper: ElementProps,
    },
    /// Lifts the `count` children of the element at `path` into its place.
    UnwrapNodes {
        #[serde(default)]
        path: Path,
        count: usize,
    },
}

impl Op {
    pub fn path(&self) -> &[usize] {
        match self {
            Op::InsertText { path, .. }
            | Op::RemoveText { path, .. }
            | Op::InsertNode { path, .. }
            | Op::RemoveNode { path }
            | Op::SetNodeProperties { path, .. }
            | Op::SplitNode { path, .. }
            | Op::MergeNode { path, .. }
            | Op::WrapNodes { path, .. }
            | Op::UnwrapNodes { path, .. } => path,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Op::InsertText { .. } => "insert_text",
            Op::RemoveText { .. } => "remove_text",
            Op::InsertNode { .. } => "insert_node",
            Op::RemoveNode { .. } => "remove_node",
            Op::SetNodeProperties { .. } => "set_node_properties",
            Op::SplitNode { .. } => "split_node",
            Op::MergeNode { .. } => "merge_node",
            Op::WrapNodes { .. } => "wrap_nodes",
            Op::UnwrapNodes { .. } => "unwrap_nodes",
        }
    }

    /// Apply to `doc`, returning the operation that undoes it. On error the
    /// document is left as it was.
    pub fn apply(self, doc: &mut Document) -> Result<Op> {
        match self {
            Op::InsertText { path, offset, text } => {
                let leaf = leaf_mut(doc, &path)?;
                check_boundary(&leaf.text, offset, &path)?;
                leaf.text.insert_str(offset, &text);
                Ok(Op::RemoveText {
                    path,
                    range: offset..offset + text.len(),
                })
            }
            Op::RemoveText { path, range } => {
                let leaf = leaf_mut(doc, &path)?;
                if range.start > range.end {
                    return Err(PathError::new(&path, "Text range is reversed").into());
                }
                check_boundary(&leaf.text, range.start, &path)?;
                check_boundary(&leaf.text, range.end, &path)?;
                let removed = leaf.text[range.clone()].to_string();
                leaf.text.replace_range(range.clone(), "");
                Ok(Op::InsertText {
                    path,
                    offset: range.start,
                    text: removed,
                })
            }
            Op::InsertNode { path, node } => {
                let (parent, index) = split_path(&path)?;
                let children = doc.children_mut(parent)?;
                if index > children.len() {
                    return Err(PathError::new(
                        &path,
                        format!("Insert index out of bounds: {index} > {}", children.len()),
                    )
                    .into());
                }
                children.insert(index, node);
                Ok(Op::RemoveNode { path })
            }
            Op::RemoveNode { path } => {
                let (parent, index) = split_path(&path)?;
                let children = doc.children_mut(parent)?;
                if index >= children.len() {
                    return Err(PathError::new(
                        &path,
                        format!("Remove index out of bounds: {index} >= {}", children.len()),
                    )
                    .into());
                }
                let node = children.remove(index);
                Ok(Op::InsertNode { path, node })
            }
            Op::SetNodeProperties { path, patch } => {
                let node = doc.node_mut(&path)?;
                let inverse = match (node, &patch) {
                    (Node::Element(el), PropsPatch::Element(p)) => PropsPatch::Element(p.apply(el)),
                    (Node::Text(t), PropsPatch::Text(p)) => PropsPatch::Text(p.apply(&mut t.marks)?),
                    (Node::Element(_), PropsPatch::Text(_)) => {
                        return Err(EditorError::structural(format!(
                            "Mark patch targets an element at {path:?}"
                        )));
                    }
                    (Node::Text(_), PropsPatch::Element(_)) => {
                        return Err(EditorError::structural(format!(
                            "Element patch targets a leaf at {path:?}"
                        )));
                    }
                };
                Ok(Op::SetNodeProperties {
                    path,
                    patch: inverse,
                })
            }
            Op::SplitNode {
                path,
                position,
                properties,
            } => {
                let (parent, index) = split_path(&path)?;
                let right = match (doc.node_mut(&path)?, &properties) {
                    (Node::Text(t), NodeProps::Text(marks)) => {
                        check_boundary(&t.text, position, &path)?;
                        let rest = t.text.split_off(position);
                        Node::Text(TextNode::with_marks(rest, marks.clone()))
                    }
                    (Node::Element(el), NodeProps::Element(props)) => {
                        if position > el.children.len() {
                            return Err(PathError::new(
                                &path,
                                format!(
                                    "Split position out of bounds: {position} > {}",
                                    el.children.len()
                                ),
                            )
                            .into());
                        }
                        let rest = el.children.split_off(position);
                        Node::Element(ElementNode::from_props(*props, rest))
                    }
                    _ => {
                        return Err(EditorError::structural(format!(
                            "Split properties do not match the node at {path:?}"
                        )));
                    }
                };
                doc.children_mut(parent)?.insert(index + 1, right);
                Ok(Op::MergeNode {
                    path: path::next(&path)?,
                    position,
                    properties,
                })
            }
            Op::MergeNode {
                path,
                position,
                properties,
            } => {
                let (parent, index) = split_path(&path)?;
                if index == 0 {
                    return Err(PathError::new(&path, "First child has nothing to merge into").into());
                }
                let children = doc.children_mut(parent)?;
                if index >= children.len() {
                    return Err(PathError::new(
                        &path,
                        format!("Merge index out of bounds: {index} >= {}", children.len()),
                    )
                    .into());
                }
                if children[index].props() != properties {
                    return Err(EditorError::structural(format!(
                        "Merge properties do not match the node at {path:?}"
                    )));
                }
                let left_len = match (&children[index - 1], &children[index]) {
                    (Node::Text(l), Node::Text(_)) => l.text.len(),
                    (Node::Element(l), Node::Element(_)) => l.children.len(),
                    _ => {
                        return Err(EditorError::structural(format!(
                            "Cannot merge a leaf with an element at {path:?}"
                        )));
                    }
                };
                if left_len != position {
                    return Err(EditorError::structural(format!(
                        "Merge position {position} does not match previous sibling length {left_len}"
                    )));
                }
                let right = children.remove(index);
                match (&mut children[index - 1], right) {
                    (Node::Text(l), Node::Text(r)) => l.text.push_str(&r.text),
                    (Node::Element(l), Node::Element(r)) => l.children.extend(r.children),
                    _ => unreachable!("merge pair checked above"),
                }
                Ok(Op::SplitNode {
                    path: path::previous(&path)?,
                    position,
                    properties,
                })
            }
            Op::WrapNodes {
                path,
                count,
                wrapper,
            } => {
                let (parent, start) = split_path(&path)?;
                let children = doc.children_mut(parent)?;
                if start + count > children.len() {
                    return Err(PathError::new(
                        &path,
                        format!(
                            "Wrap range out of bounds: {}..{} > {}",
                            start,
                            start + count,
                            children.len()
                        ),
                    )
                    .into());
                }
                let wrapped: Vec<Node> = children.drain(start..start + count).collect();
                children.insert(start, Node::Element(ElementNode::from_props(wrapper, wrapped)));
                Ok(Op::UnwrapNodes { path, count })
            }
            Op::UnwrapNodes { path, count } => {
                let (parent, index) = split_path(&path)?;
                let children = doc.children_mut(parent)?;
                let Some(Node::Element(el)) = children.get(index) else {
                    return Err(PathError::new(&path, "Expected an element to unwrap").into());
                };
                if el.children.len() != count {
                    return Err(EditorError::structural(format!(
                        "Unwrap count {count} does not match {} children at {path:?}",
                        el.children.len()
                    )));
                }
                let Node::Element(el) = children.remove(index) else {
                    unreachable!("element checked above");
                };
                let wrapper = el.props();
                children.splice(index..index, el.children);
                Ok(Op::WrapNodes {
                    path,
                    count,
                    wrapper,
                })
            }
        }
    }
}

fn split_path(path: &[usize]) -> std::result::Result<(&[usize], usize), PathError> {
    match path.split_last() {
        Some((&index, parent)) => Ok((parent, index)),
        None => Err(PathError::new(path, "Empty path")),
    }
}

fn leaf_mut<'a>(doc: &'a mut Document, path: &[usize]) -> std::result::Result<&'a mut TextNode, PathError> {
    match doc.node_mut(path)? {
        Node::Text(t) => Ok(t),
        Node::Element(_) => Err(PathError::new(path, "Expected a leaf")),
    }
}

fn check_boundary(text: &str, offset: usize, path: &[usize]) -> std::result::Result<(), PathError> {
    if offset > text.len() || !text.is_char_boundary(offset) {
        return Err(PathError::new(
            path,
            format!("Offset {offset} is not a char boundary (len {})", text.len()),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropsPatch {
    Element(ElementPatch),
    Text(MarksPatch),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field<T> {
    Set(T),
    Clear,
}

impl<T: Copy> Field<T> {
    fn value(&self) -> Option<T> {
        match self {
            Field::Set(v) => Some(*v),
            Field::Clear => None,
        }
    }

    fn from_value(value: Option<T>) -> Self {
        match value {
            Some(v) => Field::Set(v),
            None => Field::Clear,
        }
    }
}

/// Property delta for an element. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ElementKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Field<Align>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<Field<bool>>,
}

impl ElementPatch {
    pub fn kind(kind: ElementKind) -> Self {
        Self {
            kind: Some(kind),
            ..Default::default()
        }
    }

    pub fn align(align: Align) -> Self {
        Self {
            align: Some(Field::Set(align)),
            ..Default::default()
        }
    }

    pub fn checked(checked: bool) -> Self {
        Self {
            checked: Some(Field::Set(checked)),
            ..Default::default()
        }
    }

    /// Retype a block, dropping attributes the new kind cannot carry and
    /// giving checklist items an unchecked state.
    pub fn retype(kind: ElementKind) -> Self {
        Self {
            kind: Some(kind),
            align: (!kind.supports_align()).then_some(Field::Clear),
            checked: Some(if kind == ElementKind::ChecklistItem {
                Field::Set(false)
            } else {
                Field::Clear
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.align.is_none() && self.checked.is_none()
    }

    /// The part of this patch that would change `el`.
    pub fn effective(&self, el: &ElementNode) -> ElementPatch {
        ElementPatch {
            kind: self.kind.filter(|k| *k != el.kind),
            align: self.align.clone().filter(|a| a.value() != el.align),
            checked: self.checked.clone().filter(|c| c.value() != el.checked),
        }
    }

    fn apply(&self, el: &mut ElementNode) -> ElementPatch {
        let mut inverse = ElementPatch::default();
        if let Some(kind) = self.kind {
            inverse.kind = Some(el.kind);
            el.kind = kind;
        }
        if let Some(align) = &self.align {
            inverse.align = Some(Field::from_value(el.align));
            el.align = align.value();
        }
        if let Some(checked) = &self.checked {
            inverse.checked = Some(Field::from_value(el.checked));
            el.checked = checked.value();
        }
        inverse
    }
}

/// Mark delta for a leaf, mirroring set/remove semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarksPatch {
    #[serde(default, skip_serializing_if = "Marks::is_empty")]
    pub set: Marks,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove: Vec<MarkKind>,
}

impl MarksPatch {
    pub fn set(kind: MarkKind, value: crate::node::MarkValue) -> Self {
        Self {
            set: Marks::new().with(kind, value),
            remove: Vec::new(),
        }
    }

    pub fn remove(kind: MarkKind) -> Self {
        Self {
            set: Marks::new(),
            remove: vec![kind],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.remove.is_empty()
    }

    pub fn effective(&self, marks: &Marks) -> MarksPatch {
        let mut out = MarksPatch::default();
        for (kind, value) in self.set.iter() {
            if marks.get(kind) != Some(value) {
                out.set.insert(kind, value.clone());
            }
        }
        out.remove = self
            .remove
            .iter()
            .copied()
            .filter(|k| marks.get(*k).is_some())
            .collect();
        out
    }

    /// Apply to `marks` (left untouched on error), returning the inverse.
    pub fn apply(&self, marks: &mut Marks) -> Result<MarksPatch> {
        if let Some((kind, value)) = self.set.iter().find(|(k, v)| !k.accepts(v)) {
            return Err(EditorError::structural(format!(
                "Mark {kind:?} cannot hold {value:?}"
            )));
        }

        let mut inverse = MarksPatch::default();
        for (kind, value) in self.set.iter() {
            match marks.insert(kind, value.clone()) {
                Some(prev) => {
                    inverse.set.insert(kind, prev);
                }
                None => inverse.remove.push(kind),
            }
        }
        for kind in &self.remove {
            if let Some(prev) = marks.remove(*kind) {
                inverse.set.insert(*kind, prev);
            }
        }
        Ok(inverse)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    Forward,
    Backward,
}

impl Point {
    /// Carry the point through `op`. `None` when its leaf was removed.
    pub fn transform(&self, op: &Op, affinity: Affinity) -> Option<Point> {
        let mut point = self.clone();
        match op {
            Op::InsertText { path, offset, text } if *path == point.path => {
                if *offset < point.offset || (*offset == point.offset && affinity == Affinity::Forward)
                {
                    point.offset += text.len();
                }
            }
            Op::RemoveText { path, range } if *path == point.path => {
                if point.offset >= range.end {
                    point.offset -= range.end - range.start;
                } else if point.offset > range.start {
                    point.offset = range.start;
                }
            }
            Op::SplitNode { path, position, .. } if *path == point.path => {
                if *position < point.offset
                    || (*position == point.offset && affinity == Affinity::Forward)
                {
                    point.offset -= position;
                    point.path = path::next(path).ok()?;
                }
            }
            Op::MergeNode { path, position, .. } if *path == point.path => {
                point.offset += position;
                point.path = path::previous(path).ok()?;
            }
            _ => point.path = path::transform(&point.path, op)?,
        }
        Some(point)
    }
}

impl Selection {
    /// Carry both points through `op`. A point whose leaf was removed lands
    /// at the removed path; callers clamp it back onto a live leaf.
    pub fn transform(&mut self, op: &Op) {
        for point in [&mut self.anchor, &mut self.focus] {
            *point = point
                .transform(op, Affinity::Forward)
                .unwrap_or_else(|| Point::new(op.path().to_vec(), 0));
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A caller-built batch of operations committed as one history entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub ops: Vec<Op>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_after: Option<Selection>,
    #[serde(default)]
    pub meta: TransactionMeta,
}

impl Transaction {
    pub fn new(ops: Vec<Op>) -> Self {
        Self {
            ops,
            selection_after: None,
            meta: TransactionMeta::default(),
        }
    }

    pub fn selection_after(mut self, selection_after: Selection) -> Self {
        self.selection_after = Some(selection_after);
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.meta.source = Some(source.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::MarkValue;

    #[test]
    fn split_then_merge_restores_leaf() {
        let mut doc = Document::new(vec![Node::paragraph("hello")]);
        let before = doc.clone();
        let inverse = Op::SplitNode {
            path: vec![0, 0],
            position: 2,
            properties: NodeProps::Text(Marks::new()),
        }
        .apply(&mut doc)
        .unwrap();
        assert_eq!(doc.node(&[0, 1]).unwrap().string(), "llo");
        inverse.apply(&mut doc).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn marks_patch_rejects_mismatched_value() {
        let mut marks = Marks::new();
        let patch = MarksPatch::set(MarkKind::Bold, MarkValue::Text("x".into()));
        assert!(patch.apply(&mut marks).is_err());
        assert!(marks.is_empty());
    }

    #[test]
    fn point_moves_into_right_half_of_split() {
        let point = Point::new(vec![0, 0], 4);
        let op = Op::SplitNode {
            path: vec![0, 0],
            position: 1,
            properties: NodeProps::Text(Marks::new()),
        };
        let moved = point.transform(&op, Affinity::Backward).unwrap();
        assert_eq!(moved, Point::new(vec![0, 1], 3));
    }
}
