use serde::{Deserialize, Serialize};

use crate::node::{Align, Document, ElementKind, Marks, Node, Selection};
use crate::path::Path;

/// Owned view of the session handed to the renderer after each command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub document: Document,
    pub selection: Selection,
}

/// What the renderer needs per node. Leaves only carry marks that change how
/// the text looks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum RenderNode {
    Element {
        path: Path,
        kind: ElementKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        align: Option<Align>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        checked: Option<bool>,
        children: Vec<RenderNode>,
    },
    Leaf {
        path: Path,
        text: String,
        #[serde(default, skip_serializing_if = "Marks::is_empty")]
        marks: Marks,
    },
}

impl RenderNode {
    pub fn path(&self) -> &[usize] {
        match self {
            RenderNode::Element { path, .. } | RenderNode::Leaf { path, .. } => path,
        }
    }
}

impl Document {
    pub fn render_tree(&self) -> Vec<RenderNode> {
        fn describe(nodes: &[Node], path: &mut Path) -> Vec<RenderNode> {
            let mut out = Vec::with_capacity(nodes.len());
            for (ix, node) in nodes.iter().enumerate() {
                path.push(ix);
                out.push(match node {
                    Node::Element(el) => RenderNode::Element {
                        path: path.clone(),
                        kind: el.kind,
                        align: el.align,
                        checked: el.checked,
                        children: describe(&el.children, path),
                    },
                    Node::Text(t) => RenderNode::Leaf {
                        path: path.clone(),
                        text: t.text.clone(),
                        marks: t.marks.resolved(),
                    },
                });
                path.pop();
            }
            out
        }

        describe(&self.children, &mut Vec::new())
    }
}
