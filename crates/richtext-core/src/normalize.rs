use crate::node::{Document, ElementKind, ElementNode, ElementProps, Node, Point, Selection};
use crate::ops::{ElementPatch, Field, Op, PropsPatch};
use crate::path::{self, Path};

/// A repair rule. `run` reports the ops that bring `doc` closer to canonical
/// form, computed against `doc` as given; an empty result means the rule is
/// satisfied. Ops are applied in order, so later ops must account for
/// earlier ones.
pub trait NormalizePass: Send + Sync {
    fn id(&self) -> &'static str;
    fn run(&self, doc: &Document) -> Vec<Op>;
}

fn for_each_element(doc: &Document, mut f: impl FnMut(&Path, &ElementNode)) {
    fn walk(children: &[Node], path: &mut Path, f: &mut dyn FnMut(&Path, &ElementNode)) {
        for (ix, node) in children.iter().enumerate() {
            let Node::Element(el) = node else {
                continue;
            };
            path.push(ix);
            f(path, el);
            walk(&el.children, path, f);
            path.pop();
        }
    }

    walk(&doc.children, &mut Vec::new(), &mut f);
}

pub struct EnsureNonEmptyDocument;

impl NormalizePass for EnsureNonEmptyDocument {
    fn id(&self) -> &'static str {
        "core.ensure_non_empty_document"
    }

    fn run(&self, doc: &Document) -> Vec<Op> {
        if doc.children.is_empty() {
            return vec![Op::InsertNode {
                path: vec![0],
                node: Node::paragraph(""),
            }];
        }
        Vec::new()
    }
}

/// Top-level leaves get a paragraph around them.
pub struct WrapStrayLeaves;

impl NormalizePass for WrapStrayLeaves {
    fn id(&self) -> &'static str {
        "core.wrap_stray_leaves"
    }

    fn run(&self, doc: &Document) -> Vec<Op> {
        doc.children
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, node)| matches!(node, Node::Text(_)))
            .map(|(ix, _)| Op::WrapNodes {
                path: vec![ix],
                count: 1,
                wrapper: ElementProps::of_kind(ElementKind::Paragraph),
            })
            .collect()
    }
}

/// Text blocks always hold a leaf; lists that lost every item go away.
pub struct EnsureBlocksHaveContent;

impl NormalizePass for EnsureBlocksHaveContent {
    fn id(&self) -> &'static str {
        "core.ensure_blocks_have_content"
    }

    fn run(&self, doc: &Document) -> Vec<Op> {
        let mut inserts = Vec::new();
        let mut removals = Vec::new();
        for_each_element(doc, |path, el| {
            if !el.children.is_empty() {
                return;
            }
            if el.kind.is_text_block() {
                inserts.push(Op::InsertNode {
                    path: path::child(path, 0),
                    node: Node::text(""),
                });
            } else {
                removals.push(Op::RemoveNode { path: path.clone() });
            }
        });
        removals.reverse();
        inserts.extend(removals);
        inserts
    }
}

/// `checked` only on checklist items (and always there), `align` only on
/// kinds that render it.
pub struct NormalizeBlockAttrs;

impl NormalizePass for NormalizeBlockAttrs {
    fn id(&self) -> &'static str {
        "core.normalize_block_attrs"
    }

    fn run(&self, doc: &Document) -> Vec<Op> {
        let mut ops = Vec::new();
        for_each_element(doc, |path, el| {
            let mut patch = ElementPatch::default();
            match (el.kind, el.checked) {
                (ElementKind::ChecklistItem, None) => patch.checked = Some(Field::Set(false)),
                (ElementKind::ChecklistItem, Some(_)) | (_, None) => {}
                (_, Some(_)) => patch.checked = Some(Field::Clear),
            }
            if el.align.is_some() && !el.kind.supports_align() {
                patch.align = Some(Field::Clear);
            }
            if !patch.is_empty() {
                ops.push(Op::SetNodeProperties {
                    path: path.clone(),
                    patch: PropsPatch::Element(patch),
                });
            }
        });
        ops
    }
}

/// Empty leaves are dropped from blocks that have other leaves. A block of
/// nothing but empty leaves keeps its first one.
pub struct RemoveEmptyLeaves;

impl NormalizePass for RemoveEmptyLeaves {
    fn id(&self) -> &'static str {
        "core.remove_empty_leaves"
    }

    fn run(&self, doc: &Document) -> Vec<Op> {
        let mut ops = Vec::new();
        for_each_element(doc, |path, el| {
            if !el.kind.is_text_block() || el.children.len() < 2 {
                return;
            }
            let empty: Vec<usize> = el
                .children
                .iter()
                .enumerate()
                .filter(|(_, n)| n.as_text().is_some_and(|t| t.text.is_empty()))
                .map(|(ix, _)| ix)
                .collect();
            let keep_first = empty.len() == el.children.len();
            for &ix in empty.iter().skip(keep_first as usize).rev() {
                ops.push(Op::RemoveNode {
                    path: path::child(path, ix),
                });
            }
        });
        ops
    }
}

/// Neighbouring leaves with the same effective marks become one leaf.
pub struct MergeAdjacentTextLeaves;

impl NormalizePass for MergeAdjacentTextLeaves {
    fn id(&self) -> &'static str {
        "core.merge_adjacent_text_leaves"
    }

    fn run(&self, doc: &Document) -> Vec<Op> {
        let mut ops = Vec::new();
        for_each_element(doc, |path, el| {
            if !el.kind.is_text_block() {
                return;
            }
            for ix in (1..el.children.len()).rev() {
                let (Node::Text(left), Node::Text(right)) = (&el.children[ix - 1], &el.children[ix])
                else {
                    continue;
                };
                if left.marks.resolved() != right.marks.resolved() {
                    continue;
                }
                ops.push(Op::MergeNode {
                    path: path::child(path, ix),
                    position: left.text.len(),
                    properties: el.children[ix].props(),
                });
            }
        });
        ops
    }
}

/// Move a point onto the nearest live leaf, clamping its offset into the
/// leaf's text and down to a char boundary.
pub fn clamp_point(doc: &Document, point: &Point) -> Option<Point> {
    if doc.children.is_empty() {
        return None;
    }

    let mut resolved: Path = Vec::new();
    let mut children: &[Node] = &doc.children;
    let mut offset = point.offset;
    for (depth, &wanted) in point.path.iter().enumerate() {
        if children.is_empty() {
            break;
        }
        let ix = wanted.min(children.len() - 1);
        if ix < wanted {
            offset = usize::MAX;
        }
        resolved.push(ix);
        match &children[ix] {
            Node::Text(t) => {
                let mut offset = offset.min(t.text.len());
                while !t.text.is_char_boundary(offset) {
                    offset -= 1;
                }
                return Some(Point::new(resolved, offset));
            }
            Node::Element(el) => children = &el.children,
        }
        if depth + 1 == point.path.len() {
            break;
        }
    }

    let leaf = if offset == usize::MAX {
        doc.last_leaf_path(&resolved).ok()?
    } else {
        doc.first_leaf_path(&resolved).ok()?
    };
    let len = doc.leaf(&leaf).ok()?.text.len();
    let offset = if offset == usize::MAX { len } else { 0 };
    Some(Point::new(leaf, offset))
}

pub fn clamp_selection(doc: &Document, selection: &Selection) -> Option<Selection> {
    let anchor = clamp_point(doc, &selection.anchor)
        .or_else(|| clamp_point(doc, &selection.focus))
        .or_else(|| doc.start_point())?;
    let focus = clamp_point(doc, &selection.focus).unwrap_or_else(|| anchor.clone());
    Some(Selection::new(anchor, focus))
}
