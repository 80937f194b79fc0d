use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::path::{self, Path, PathError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Default for Document {
    /// A fresh document holds one empty paragraph.
    fn default() -> Self {
        Self {
            children: vec![Node::paragraph("")],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(TextNode::new(text))
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Node::Element(ElementNode::new(ElementKind::Paragraph, vec![Node::text(text)]))
    }

    pub fn list_item(text: impl Into<String>) -> Self {
        Node::Element(ElementNode::new(ElementKind::ListItem, vec![Node::text(text)]))
    }

    pub fn checklist_item(text: impl Into<String>, checked: bool) -> Self {
        let mut el = ElementNode::new(ElementKind::ChecklistItem, vec![Node::text(text)]);
        el.checked = Some(checked);
        Node::Element(el)
    }

    pub fn list(kind: ElementKind, items: Vec<Node>) -> Self {
        Node::Element(ElementNode::new(kind, items))
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            Node::Text(t) => Some(t),
            Node::Element(_) => None,
        }
    }

    pub fn kind(&self) -> Option<ElementKind> {
        self.as_element().map(|el| el.kind)
    }

    pub fn props(&self) -> NodeProps {
        match self {
            Node::Element(el) => NodeProps::Element(el.props()),
            Node::Text(t) => NodeProps::Text(t.marks.clone()),
        }
    }

    /// Concatenated text of every leaf below this node.
    pub fn string(&self) -> String {
        match self {
            Node::Text(t) => t.text.clone(),
            Node::Element(el) => el.children.iter().map(Node::string).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Paragraph,
    BulletedList,
    NumberedList,
    ListItem,
    ChecklistItem,
}

impl ElementKind {
    pub fn is_list(self) -> bool {
        matches!(self, ElementKind::BulletedList | ElementKind::NumberedList)
    }

    /// Blocks whose children are leaves.
    pub fn is_text_block(self) -> bool {
        match self {
            ElementKind::Paragraph | ElementKind::ListItem | ElementKind::ChecklistItem => true,
            ElementKind::BulletedList | ElementKind::NumberedList => false,
        }
    }

    pub fn supports_align(self) -> bool {
        matches!(self, ElementKind::Paragraph | ElementKind::ChecklistItem)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Paragraph => "paragraph",
            ElementKind::BulletedList => "bulleted-list",
            ElementKind::NumberedList => "numbered-list",
            ElementKind::ListItem => "list-item",
            ElementKind::ChecklistItem => "checklist-item",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl ElementNode {
    pub fn new(kind: ElementKind, children: Vec<Node>) -> Self {
        Self {
            kind,
            align: None,
            checked: None,
            children,
        }
    }

    pub fn from_props(props: ElementProps, children: Vec<Node>) -> Self {
        Self {
            kind: props.kind,
            align: props.align,
            checked: props.checked,
            children,
        }
    }

    pub fn props(&self) -> ElementProps {
        ElementProps {
            kind: self.kind,
            align: self.align,
            checked: self.checked,
        }
    }
}

/// Everything an element carries apart from its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementProps {
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
}

impl ElementProps {
    pub fn of_kind(kind: ElementKind) -> Self {
        Self {
            kind,
            align: None,
            checked: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeProps {
    Element(ElementProps),
    Text(Marks),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Superscript,
    FontFamily,
    FontSize,
    Color,
    Highlight,
}

impl MarkKind {
    pub fn is_flag(self) -> bool {
        matches!(
            self,
            MarkKind::Bold
                | MarkKind::Italic
                | MarkKind::Underline
                | MarkKind::Strikethrough
                | MarkKind::Superscript
        )
    }

    pub fn accepts(self, value: &MarkValue) -> bool {
        match self {
            MarkKind::Bold
            | MarkKind::Italic
            | MarkKind::Underline
            | MarkKind::Strikethrough
            | MarkKind::Superscript => matches!(value, MarkValue::Flag(_)),
            MarkKind::FontFamily | MarkKind::Color | MarkKind::Highlight => {
                matches!(value, MarkValue::Text(_))
            }
            MarkKind::FontSize => matches!(value, MarkValue::Size(_)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarkValue {
    Flag(bool),
    Size(u32),
    Text(String),
}

impl MarkValue {
    pub fn is_truthy(&self) -> bool {
        match self {
            MarkValue::Flag(v) => *v,
            MarkValue::Size(v) => *v > 0,
            MarkValue::Text(v) => !v.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Marks(BTreeMap<MarkKind, MarkValue>);

impl Marks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: MarkKind, value: MarkValue) -> Self {
        self.0.insert(kind, value);
        self
    }

    pub fn get(&self, kind: MarkKind) -> Option<&MarkValue> {
        self.0.get(&kind)
    }

    pub fn insert(&mut self, kind: MarkKind, value: MarkValue) -> Option<MarkValue> {
        self.0.insert(kind, value)
    }

    pub fn remove(&mut self, kind: MarkKind) -> Option<MarkValue> {
        self.0.remove(&kind)
    }

    pub fn is_active(&self, kind: MarkKind) -> bool {
        self.get(kind).is_some_and(MarkValue::is_truthy)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MarkKind, &MarkValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    /// Only the marks that would change how the text looks.
    pub fn resolved(&self) -> Marks {
        Marks(
            self.0
                .iter()
                .filter(|(_, v)| v.is_truthy())
                .map(|(k, v)| (*k, v.clone()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    #[serde(default, skip_serializing_if = "Marks::is_empty")]
    pub marks: Marks,
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Marks::default(),
        }
    }

    pub fn with_marks(text: impl Into<String>, marks: Marks) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    #[serde(default)]
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: Path, offset: usize) -> Self {
        Self { path, offset }
    }

    pub fn is_before(&self, other: &Point) -> bool {
        match path::compare(&self.path, &other.path) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Equal => self.offset < other.offset,
            std::cmp::Ordering::Greater => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// `(start, end)` in document order.
    pub fn ordered(&self) -> (Point, Point) {
        if self.focus.is_before(&self.anchor) {
            (self.focus.clone(), self.anchor.clone())
        } else {
            (self.anchor.clone(), self.focus.clone())
        }
    }
}

/// Where a transform applies: a whole node or a span between two points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Path(Path),
    Range(Selection),
}

impl From<Selection> for Location {
    fn from(value: Selection) -> Self {
        Location::Range(value)
    }
}

impl From<Path> for Location {
    fn from(value: Path) -> Self {
        Location::Path(value)
    }
}

impl Document {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    /// Resolve a path to its node.
    pub fn node(&self, path: &[usize]) -> Result<&Node, PathError> {
        let Some((&first, rest)) = path.split_first() else {
            return Err(PathError::new(path, "The root is not a node"));
        };
        let mut node = self.children.get(first).ok_or_else(|| {
            PathError::new(
                path,
                format!("Out of bounds at depth 0: {first} >= {}", self.children.len()),
            )
        })?;
        for (depth, &ix) in rest.iter().enumerate() {
            node = match node {
                Node::Element(el) => el.children.get(ix).ok_or_else(|| {
                    PathError::new(
                        path,
                        format!(
                            "Out of bounds at depth {}: {ix} >= {}",
                            depth + 1,
                            el.children.len()
                        ),
                    )
                })?,
                Node::Text(_) => {
                    return Err(PathError::new(
                        path,
                        format!("Leaf at depth {depth} has no children"),
                    ));
                }
            };
        }
        Ok(node)
    }

    pub fn node_mut(&mut self, path: &[usize]) -> Result<&mut Node, PathError> {
        let Some((&first, rest)) = path.split_first() else {
            return Err(PathError::new(path, "The root is not a node"));
        };
        let len = self.children.len();
        let mut node = self.children.get_mut(first).ok_or_else(|| {
            PathError::new(path, format!("Out of bounds at depth 0: {first} >= {len}"))
        })?;
        for (depth, &ix) in rest.iter().enumerate() {
            node = match node {
                Node::Element(el) => {
                    let len = el.children.len();
                    el.children.get_mut(ix).ok_or_else(|| {
                        PathError::new(
                            path,
                            format!("Out of bounds at depth {}: {ix} >= {len}", depth + 1),
                        )
                    })?
                }
                Node::Text(_) => {
                    return Err(PathError::new(
                        path,
                        format!("Leaf at depth {depth} has no children"),
                    ));
                }
            };
        }
        Ok(node)
    }

    pub fn leaf(&self, path: &[usize]) -> Result<&TextNode, PathError> {
        match self.node(path)? {
            Node::Text(t) => Ok(t),
            Node::Element(_) => Err(PathError::new(path, "Expected a leaf")),
        }
    }

    pub fn element(&self, path: &[usize]) -> Result<&ElementNode, PathError> {
        match self.node(path)? {
            Node::Element(el) => Ok(el),
            Node::Text(_) => Err(PathError::new(path, "Expected an element")),
        }
    }

    /// Children of `parent`; the empty path addresses the root.
    pub fn children(&self, parent: &[usize]) -> Result<&[Node], PathError> {
        if parent.is_empty() {
            return Ok(&self.children);
        }
        match self.node(parent)? {
            Node::Element(el) => Ok(&el.children),
            Node::Text(_) => Err(PathError::new(parent, "A leaf is not a container")),
        }
    }

    pub fn children_mut(&mut self, parent: &[usize]) -> Result<&mut Vec<Node>, PathError> {
        if parent.is_empty() {
            return Ok(&mut self.children);
        }
        match self.node_mut(parent)? {
            Node::Element(el) => Ok(&mut el.children),
            Node::Text(_) => Err(PathError::new(parent, "A leaf is not a container")),
        }
    }

    /// Check that a point addresses a leaf and sits on a char boundary inside it.
    pub fn check_point(&self, point: &Point) -> Result<(), PathError> {
        let leaf = self.leaf(&point.path)?;
        if point.offset > leaf.text.len() || !leaf.text.is_char_boundary(point.offset) {
            return Err(PathError::new(
                &point.path,
                format!("Offset {} is not a char boundary of the leaf", point.offset),
            ));
        }
        Ok(())
    }

    /// Every node path in document order (pre-order).
    pub fn paths(&self) -> Vec<Path> {
        fn walk(children: &[Node], path: &mut Path, out: &mut Vec<Path>) {
            for (ix, node) in children.iter().enumerate() {
                path.push(ix);
                out.push(path.clone());
                if let Node::Element(el) = node {
                    walk(&el.children, path, out);
                }
                path.pop();
            }
        }

        let mut out = Vec::new();
        walk(&self.children, &mut Vec::new(), &mut out);
        out
    }

    pub fn first_leaf_path(&self, from: &[usize]) -> Result<Path, PathError> {
        let mut path = from.to_vec();
        loop {
            match self.node(&path)? {
                Node::Text(_) => return Ok(path),
                Node::Element(el) if !el.children.is_empty() => path.push(0),
                Node::Element(_) => return Err(PathError::new(from, "Element has no leaves")),
            }
        }
    }

    pub fn last_leaf_path(&self, from: &[usize]) -> Result<Path, PathError> {
        let mut path = from.to_vec();
        loop {
            match self.node(&path)? {
                Node::Text(_) => return Ok(path),
                Node::Element(el) if !el.children.is_empty() => path.push(el.children.len() - 1),
                Node::Element(_) => return Err(PathError::new(from, "Element has no leaves")),
            }
        }
    }

    pub fn start_point(&self) -> Option<Point> {
        self.first_leaf_path(&[0]).ok().map(|path| Point::new(path, 0))
    }

    /// `(start, end)` points spanned by a location.
    pub fn span(&self, at: &Location) -> Result<(Point, Point), PathError> {
        match at {
            Location::Range(range) => Ok(range.ordered()),
            Location::Path(path) => {
                let first = self.first_leaf_path(path)?;
                let last = self.last_leaf_path(path)?;
                let end_offset = self.leaf(&last)?.text.len();
                Ok((Point::new(first, 0), Point::new(last, end_offset)))
            }
        }
    }

    /// Paths of every node touched by the span from `start` to `end`: the
    /// ancestors of `start`, and every node after it up to and including `end`.
    pub fn paths_between(&self, start: &[usize], end: &[usize]) -> Vec<Path> {
        self.paths()
            .into_iter()
            .filter(|p| {
                path::is_ancestor_or_equal(p, start)
                    || (path::compare(p, start).is_gt() && path::compare(p, end).is_le())
            })
            .collect()
    }

    pub fn paths_at(&self, at: &Location) -> Result<Vec<Path>, PathError> {
        let (start, end) = self.span(at)?;
        Ok(self.paths_between(&start.path, &end.path))
    }

    /// Nearest element ancestor of a leaf path.
    pub fn block_of(&self, leaf_path: &[usize]) -> Result<(Path, &ElementNode), PathError> {
        let block = path::parent(leaf_path)?;
        let el = self.element(&block)?;
        Ok((block, el))
    }
}
