//! Grammar every committed tree must satisfy.

use crate::error::{EditorError, Result};
use crate::node::{Document, ElementKind, ElementNode, Node};
use crate::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildConstraint {
    /// Only leaves.
    InlineOnly,
    /// Only list items.
    ListItemsOnly,
}

impl ElementKind {
    pub fn child_constraint(self) -> ChildConstraint {
        match self {
            ElementKind::Paragraph | ElementKind::ListItem | ElementKind::ChecklistItem => {
                ChildConstraint::InlineOnly
            }
            ElementKind::BulletedList | ElementKind::NumberedList => {
                ChildConstraint::ListItemsOnly
            }
        }
    }
}

impl Document {
    pub fn validate(&self) -> Result<()> {
        if self.children.is_empty() {
            return Err(EditorError::structural("Document has no blocks"));
        }
        let mut path: Path = Vec::new();
        for (ix, node) in self.children.iter().enumerate() {
            path.push(ix);
            match node {
                Node::Element(el) => validate_element(el, &mut path)?,
                Node::Text(_) => {
                    return Err(EditorError::structural(format!(
                        "Leaf at top level {path:?}"
                    )));
                }
            }
            path.pop();
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

fn validate_element(el: &ElementNode, path: &mut Path) -> Result<()> {
    let kind = el.kind.as_str();
    if el.align.is_some() && !el.kind.supports_align() {
        return Err(EditorError::structural(format!(
            "{kind} at {path:?} cannot carry an alignment"
        )));
    }
    match (el.kind, el.checked) {
        (ElementKind::ChecklistItem, None) => {
            return Err(EditorError::structural(format!(
                "checklist-item at {path:?} has no checked state"
            )));
        }
        (ElementKind::ChecklistItem, Some(_)) | (_, None) => {}
        (_, Some(_)) => {
            return Err(EditorError::structural(format!(
                "{kind} at {path:?} cannot carry a checked state"
            )));
        }
    }
    if el.children.is_empty() {
        return Err(EditorError::structural(format!(
            "{kind} at {path:?} has no children"
        )));
    }

    match el.kind.child_constraint() {
        ChildConstraint::InlineOnly => {
            if let Some(ix) = el.children.iter().position(|n| !matches!(n, Node::Text(_))) {
                return Err(EditorError::structural(format!(
                    "{kind} at {path:?} holds a block at child {ix}"
                )));
            }
        }
        ChildConstraint::ListItemsOnly => {
            for (ix, child) in el.children.iter().enumerate() {
                let Node::Element(item) = child else {
                    return Err(EditorError::structural(format!(
                        "{kind} at {path:?} holds a leaf at child {ix}"
                    )));
                };
                if item.kind != ElementKind::ListItem {
                    return Err(EditorError::structural(format!(
                        "{kind} at {path:?} holds a {} at child {ix}",
                        item.kind.as_str()
                    )));
                }
                path.push(ix);
                validate_element(item, path)?;
                path.pop();
            }
        }
    }
    Ok(())
}
