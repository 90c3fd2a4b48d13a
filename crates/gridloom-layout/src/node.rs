//! Arena-backed grid tree.
//!
//! A [`GridTree`] owns every node in a single map keyed by [`NodeId`]. Child
//! order lives in each [`NodeRecord`]; parent links are plain back-references
//! used for traversal only. Cloning a tree copies the whole arena and keeps
//! every handle valid in the copy, which is what lets interactive sessions
//! swap a live tree for a clone without re-resolving their references.
//!
//! Nodes can be detached: a detached subtree keeps its records (and handles)
//! in the arena with no parent until it is attached again or freed. Detached
//! fragments are invisible to traversal, serialization and equality.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};

pub const ATTR_ID: &str = "id";
pub const ATTR_TYPE: &str = "type";
pub const ATTR_NAME: &str = "name";
pub const ATTR_SPACE: &str = "space";
pub const ATTR_RELATIVE_SIZE: &str = "relativeSize";
pub const ATTR_HAS_PLACEHOLDERS: &str = "hasPlaceholders";
pub const ATTR_HAS_RESIZERS: &str = "hasResizers";
pub const ATTR_SURROUND: &str = "surround";
pub const ATTR_MODULE_INDEX: &str = "module-index";
pub const ATTR_COMPONENT: &str = "component";

/// Weight used when a row or cell carries no `relativeSize`.
pub const DEFAULT_RELATIVE_SIZE: f64 = 1.0;

/// Arena handle for one node.
///
/// `0` is reserved so handles are always non-zero. Handles are never reused
/// within a tree (or its clones).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Lowest valid handle.
    pub const MIN: Self = Self(1);

    /// Wrap a raw value, rejecting 0.
    #[must_use]
    pub const fn new(raw: u64) -> Option<Self> {
        if raw == 0 { None } else { Some(Self(raw)) }
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a cell holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellType {
    Module,
    Grid,
    Placeholder,
}

impl CellType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Grid => "grid",
            Self::Placeholder => "placeholder",
        }
    }

    /// Parse the `type` attribute of a cell.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "module" => Ok(Self::Module),
            "grid" => Ok(Self::Grid),
            "placeholder" => Ok(Self::Placeholder),
            other => Err(LayoutError::invalid_type(format!(
                "cell type must be module, grid or placeholder, got {other:?}"
            ))),
        }
    }
}

/// Direction a resizer bar runs in.
///
/// Resizers between rows are horizontal bars, resizers between cells are
/// vertical ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizerOrientation {
    Horizontal,
    Vertical,
}

impl ResizerOrientation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "horizontal" => Ok(Self::Horizontal),
            "vertical" => Ok(Self::Vertical),
            other => Err(LayoutError::invalid_type(format!(
                "resizer type must be horizontal or vertical, got {other:?}"
            ))),
        }
    }
}

/// Node payload variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// The root grid (`type="mainGrid"`).
    Grid,
    /// A band of cells; placeholder rows only exist while dragging.
    Row { placeholder: bool },
    Cell { cell_type: CellType },
    Resizer { orientation: ResizerOrientation },
    /// Leaf attribute bag describing a module instance.
    Content,
}

impl NodeKind {
    pub const ROW: Self = Self::Row { placeholder: false };
    pub const PLACEHOLDER_ROW: Self = Self::Row { placeholder: true };
    pub const MODULE_CELL: Self = Self::Cell {
        cell_type: CellType::Module,
    };
    pub const GRID_CELL: Self = Self::Cell {
        cell_type: CellType::Grid,
    };
    pub const PLACEHOLDER_CELL: Self = Self::Cell {
        cell_type: CellType::Placeholder,
    };

    /// Element name in the text form.
    #[must_use]
    pub const fn element(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::Row { .. } => "row",
            Self::Cell { .. } => "cell",
            Self::Resizer { .. } => "resizer",
            Self::Content => "content",
        }
    }

    /// Value of the derived `type` attribute, if the kind has one.
    #[must_use]
    pub const fn type_attr(self) -> Option<&'static str> {
        match self {
            Self::Grid => Some("mainGrid"),
            Self::Row { placeholder: true } => Some("placeholder"),
            Self::Row { placeholder: false } | Self::Content => None,
            Self::Cell { cell_type } => Some(cell_type.as_str()),
            Self::Resizer { orientation } => Some(orientation.as_str()),
        }
    }

    /// Root grid or grid cell: the node holds rows.
    #[must_use]
    pub const fn is_grid_kind(self) -> bool {
        matches!(
            self,
            Self::Grid
                | Self::Cell {
                    cell_type: CellType::Grid
                }
        )
    }

    #[must_use]
    pub const fn is_row(self) -> bool {
        matches!(self, Self::Row { .. })
    }

    #[must_use]
    pub const fn is_cell(self) -> bool {
        matches!(self, Self::Cell { .. })
    }

    #[must_use]
    pub const fn is_resizer(self) -> bool {
        matches!(self, Self::Resizer { .. })
    }

    #[must_use]
    pub const fn is_module_cell(self) -> bool {
        matches!(
            self,
            Self::Cell {
                cell_type: CellType::Module
            }
        )
    }

    #[must_use]
    pub const fn is_placeholder_cell(self) -> bool {
        matches!(
            self,
            Self::Cell {
                cell_type: CellType::Placeholder
            }
        )
    }

    #[must_use]
    pub const fn cell_type(self) -> Option<CellType> {
        match self {
            Self::Cell { cell_type } => Some(cell_type),
            _ => None,
        }
    }
}

/// One node in the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
    /// String-keyed attributes; `type` is derived from `kind` and never stored.
    pub attrs: BTreeMap<String, String>,
}

impl NodeRecord {
    fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            parent: None,
            kind,
            children: Vec::new(),
            attrs: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.attr(key) == Some("true")
    }
}

/// Owned grid tree.
#[derive(Debug, Clone)]
pub struct GridTree {
    root: NodeId,
    next_node: NodeId,
    id_seq: u64,
    nodes: BTreeMap<NodeId, NodeRecord>,
}

impl GridTree {
    /// Build a minimal root grid with no rows.
    #[must_use]
    pub fn new(name: impl Into<String>, space: impl Into<String>) -> Self {
        let mut tree = Self::with_root();
        let root = tree.root;
        if let Some(record) = tree.nodes.get_mut(&root) {
            record.attrs.insert(ATTR_NAME.to_string(), name.into());
            record.attrs.insert(ATTR_SPACE.to_string(), space.into());
        }
        tree
    }

    /// Bare root grid without name or spacing, used by the parser.
    pub(crate) fn with_root() -> Self {
        let root = NodeId::MIN;
        let mut nodes = BTreeMap::new();
        nodes.insert(root, NodeRecord::new(root, NodeKind::Grid));
        Self {
            root,
            next_node: root.next(),
            id_seq: 0,
            nodes,
        }
    }

    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Grid name (the `name` attribute of the root).
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.nodes.get(&self.root).and_then(|root| root.attr(ATTR_NAME))
    }

    /// Look up a node record.
    pub fn node(&self, id: NodeId) -> Result<&NodeRecord> {
        self.nodes
            .get(&id)
            .ok_or(LayoutError::NodeDoesNotExist { node: id })
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeRecord> {
        self.nodes
            .get_mut(&id)
            .ok_or(LayoutError::NodeDoesNotExist { node: id })
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn kind(&self, id: NodeId) -> Result<NodeKind> {
        Ok(self.node(id)?.kind)
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(&self.node(id)?.children)
    }

    /// Children that are not resizers.
    pub fn content_children(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        for &child in self.children(id)? {
            if !self.kind(child)?.is_resizer() {
                out.push(child);
            }
        }
        Ok(out)
    }

    /// Position of `id` among its parent's children.
    pub fn index_in_parent(&self, id: NodeId) -> Result<Option<usize>> {
        let Some(parent) = self.parent(id)? else {
            return Ok(None);
        };
        Ok(self.children(parent)?.iter().position(|&child| child == id))
    }

    pub fn previous_sibling(&self, id: NodeId) -> Result<Option<NodeId>> {
        let (Some(parent), Some(index)) = (self.parent(id)?, self.index_in_parent(id)?) else {
            return Ok(None);
        };
        if index == 0 {
            return Ok(None);
        }
        Ok(self.children(parent)?.get(index - 1).copied())
    }

    pub fn next_sibling(&self, id: NodeId) -> Result<Option<NodeId>> {
        let (Some(parent), Some(index)) = (self.parent(id)?, self.index_in_parent(id)?) else {
            return Ok(None);
        };
        Ok(self.children(parent)?.get(index + 1).copied())
    }

    /// Whether `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> Result<bool> {
        let mut current = id;
        loop {
            if current == self.root {
                return Ok(true);
            }
            match self.parent(current)? {
                Some(parent) => current = parent,
                None => return Ok(false),
            }
        }
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> Result<bool> {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return Ok(true);
            }
            current = self.parent(id)?;
        }
        Ok(false)
    }

    // ---- attributes ---------------------------------------------------------

    /// Read an attribute. On structural nodes `type` is derived from the
    /// node kind; on content leaves it is an ordinary parameter.
    pub fn attr(&self, id: NodeId, key: &str) -> Result<Option<&str>> {
        let record = self.node(id)?;
        if key == ATTR_TYPE && record.kind != NodeKind::Content {
            return Ok(record.kind.type_attr());
        }
        Ok(record.attr(key))
    }

    /// Write an attribute. A structural node's `type` cannot be written this
    /// way; use [`GridTree::set_kind`].
    pub fn set_attr(&mut self, id: NodeId, key: &str, value: impl Into<String>) -> Result<()> {
        if key == ATTR_TYPE && self.node(id)?.kind != NodeKind::Content {
            return Err(LayoutError::invalid_type(
                "the type attribute is derived from the node kind",
            ));
        }
        self.node_mut(id)?
            .attrs
            .insert(key.to_string(), value.into());
        Ok(())
    }

    pub fn remove_attr(&mut self, id: NodeId, key: &str) -> Result<Option<String>> {
        Ok(self.node_mut(id)?.attrs.remove(key))
    }

    pub fn flag(&self, id: NodeId, key: &str) -> Result<bool> {
        Ok(self.node(id)?.flag(key))
    }

    /// Set a boolean attribute; `false` removes it.
    pub fn set_flag(&mut self, id: NodeId, key: &str, value: bool) -> Result<()> {
        if value {
            self.set_attr(id, key, "true")
        } else {
            self.remove_attr(id, key).map(|_| ())
        }
    }

    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) -> Result<()> {
        self.node_mut(id)?.kind = kind;
        Ok(())
    }

    /// The `id` attribute (distinct from the arena handle).
    pub fn id_attr(&self, id: NodeId) -> Result<Option<&str>> {
        Ok(self.node(id)?.attr(ATTR_ID))
    }

    pub fn relative_size(&self, id: NodeId) -> Result<f64> {
        Ok(self
            .node(id)?
            .attr(ATTR_RELATIVE_SIZE)
            .and_then(|raw| raw.parse::<f64>().ok())
            .unwrap_or(DEFAULT_RELATIVE_SIZE))
    }

    pub fn set_relative_size(&mut self, id: NodeId, size: f64) -> Result<()> {
        self.set_attr(id, ATTR_RELATIVE_SIZE, size.to_string())
    }

    pub fn module_index(&self, id: NodeId) -> Result<Option<usize>> {
        Ok(self
            .node(id)?
            .attr(ATTR_MODULE_INDEX)
            .and_then(|raw| raw.parse::<usize>().ok()))
    }

    #[must_use]
    pub fn has_placeholders(&self) -> bool {
        self.flag(self.root, ATTR_HAS_PLACEHOLDERS).unwrap_or(false)
    }

    #[must_use]
    pub fn has_resizers(&self) -> bool {
        self.flag(self.root, ATTR_HAS_RESIZERS).unwrap_or(false)
    }

    // ---- structure ----------------------------------------------------------

    /// Allocate a new detached node.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = self.next_node;
        self.next_node = id.next();
        self.nodes.insert(id, NodeRecord::new(id, kind));
        id
    }

    /// Allocate a detached content leaf holding the given attributes.
    pub fn create_content<I, K, V>(&mut self, attrs: I) -> NodeId
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let id = self.create(NodeKind::Content);
        if let Some(record) = self.nodes.get_mut(&id) {
            record.attrs.extend(
                attrs
                    .into_iter()
                    .map(|(key, value)| (key.into(), value.into())),
            );
        }
        id
    }

    /// Insert a detached `child` under `parent`, before `before` or at the end.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    ) -> Result<()> {
        if self.parent(child)?.is_some() || child == self.root {
            return Err(LayoutError::inconsistency(format!(
                "node {child} is already attached"
            )));
        }
        if self.is_ancestor_or_self(child, parent)? {
            return Err(LayoutError::inconsistency(format!(
                "cannot insert {child} under its own descendant {parent}"
            )));
        }
        let index = match before {
            Some(before) => self
                .children(parent)?
                .iter()
                .position(|&existing| existing == before)
                .ok_or_else(|| {
                    LayoutError::inconsistency(format!(
                        "node {before} is not a child of {parent}"
                    ))
                })?,
            None => self.children(parent)?.len(),
        };
        self.node_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    /// Unlink `id` from its parent; the subtree stays in the arena.
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        let Some(parent) = self.parent(id)? else {
            return Ok(());
        };
        self.node_mut(parent)?.children.retain(|&child| child != id);
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    /// Detach and drop a whole subtree from the arena.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        if id == self.root {
            return Err(LayoutError::invalid_type("the root grid cannot be removed"));
        }
        self.detach(id)?;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(record) = self.nodes.remove(&current) {
                stack.extend(record.children);
            }
        }
        Ok(())
    }

    /// Move every child of `from` to the end of `to`'s children.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        let moved = std::mem::take(&mut self.node_mut(from)?.children);
        for &child in &moved {
            self.node_mut(child)?.parent = Some(to);
        }
        self.node_mut(to)?.children.extend(moved);
        Ok(())
    }

    /// Replace `old` by the nodes in `replacements`, in place.
    ///
    /// `old` ends up detached; each replacement must be detached beforehand.
    pub fn splice(&mut self, old: NodeId, replacements: &[NodeId]) -> Result<()> {
        let parent = self.parent(old)?.ok_or_else(|| {
            LayoutError::inconsistency(format!("node {old} has no parent to splice into"))
        })?;
        for &replacement in replacements {
            if self.parent(replacement)?.is_some() {
                return Err(LayoutError::inconsistency(format!(
                    "splice replacement {replacement} is still attached"
                )));
            }
        }
        let index = self.index_in_parent(old)?.ok_or_else(|| {
            LayoutError::inconsistency(format!("node {old} is not listed under {parent}"))
        })?;
        let children = &mut self.node_mut(parent)?.children;
        children.remove(index);
        for (offset, &replacement) in replacements.iter().enumerate() {
            children.insert(index + offset, replacement);
        }
        for &replacement in replacements {
            self.node_mut(replacement)?.parent = Some(parent);
        }
        self.node_mut(old)?.parent = None;
        Ok(())
    }

    /// Nodes reachable from `start`, in document (pre-)order, `start` first.
    pub fn descendants(&self, start: NodeId) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let record = self.node(id)?;
            out.push(id);
            stack.extend(record.children.iter().rev().copied());
        }
        Ok(out)
    }

    /// Module cells of the attached tree in document order.
    #[must_use]
    pub fn module_cells(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .unwrap_or_default()
            .into_iter()
            .filter(|&id| self.nodes.get(&id).is_some_and(|n| n.kind.is_module_cell()))
            .collect()
    }

    /// Find an attached node by its `id` attribute.
    #[must_use]
    pub fn find_by_id_attr(&self, value: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .unwrap_or_default()
            .into_iter()
            .find(|&id| {
                self.nodes
                    .get(&id)
                    .is_some_and(|record| record.attr(ATTR_ID) == Some(value))
            })
    }

    /// The content leaf held by a module (or filled placeholder) cell.
    pub fn content_of(&self, cell: NodeId) -> Result<Option<NodeId>> {
        for &child in self.children(cell)? {
            if self.kind(child)? == NodeKind::Content {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }

    /// Number of records in the arena, detached fragments included.
    #[must_use]
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn next_id_seq(&mut self) -> u64 {
        self.id_seq = self.id_seq.saturating_add(1);
        self.id_seq
    }

    fn subtree_eq(&self, id: NodeId, other: &Self, other_id: NodeId) -> bool {
        let (Some(left), Some(right)) = (self.nodes.get(&id), other.nodes.get(&other_id)) else {
            return false;
        };
        left.kind == right.kind
            && left.attrs == right.attrs
            && left.children.len() == right.children.len()
            && left
                .children
                .iter()
                .zip(&right.children)
                .all(|(&a, &b)| self.subtree_eq(a, other, b))
    }
}

/// Structural equality from the root: kinds, attributes and child order.
impl PartialEq for GridTree {
    fn eq(&self, other: &Self) -> bool {
        self.subtree_eq(self.root, other, other.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_row() -> (GridTree, NodeId, NodeId) {
        let mut tree = GridTree::new("foo", "5px");
        let row = tree.create(NodeKind::ROW);
        tree.append_child(tree.root(), row).expect("append row");
        let cell = tree.create(NodeKind::MODULE_CELL);
        tree.append_child(row, cell).expect("append cell");
        (tree, row, cell)
    }

    #[test]
    fn new_grid_carries_name_and_space() {
        let tree = GridTree::new("foo", "5px");
        assert_eq!(tree.name(), Some("foo"));
        assert_eq!(tree.attr(tree.root(), ATTR_SPACE).unwrap(), Some("5px"));
        assert_eq!(tree.attr(tree.root(), ATTR_TYPE).unwrap(), Some("mainGrid"));
        assert!(tree.children(tree.root()).unwrap().is_empty());
    }

    #[test]
    fn type_attribute_is_read_only() {
        let (mut tree, _, cell) = tree_with_row();
        assert_eq!(tree.attr(cell, ATTR_TYPE).unwrap(), Some("module"));
        let err = tree.set_attr(cell, ATTR_TYPE, "grid").unwrap_err();
        assert!(matches!(err, LayoutError::InvalidType { .. }));
    }

    #[test]
    fn content_type_is_a_plain_parameter() {
        let mut tree = GridTree::new("form", "0");
        let content = tree.create_content([(ATTR_COMPONENT, "Input"), (ATTR_TYPE, "password")]);
        assert_eq!(tree.attr(content, ATTR_TYPE).unwrap(), Some("password"));
        tree.set_attr(content, ATTR_TYPE, "email").unwrap();
        assert_eq!(tree.attr(content, ATTR_TYPE).unwrap(), Some("email"));
        assert_eq!(tree.remove_attr(content, ATTR_TYPE).unwrap().as_deref(), Some("email"));
    }

    #[test]
    fn siblings_follow_child_order() {
        let (mut tree, row, first) = tree_with_row();
        let second = tree.create(NodeKind::MODULE_CELL);
        tree.append_child(row, second).unwrap();
        assert_eq!(tree.next_sibling(first).unwrap(), Some(second));
        assert_eq!(tree.previous_sibling(second).unwrap(), Some(first));
        assert_eq!(tree.previous_sibling(first).unwrap(), None);
        assert_eq!(tree.index_in_parent(second).unwrap(), Some(1));
    }

    #[test]
    fn clone_shares_nothing_and_keeps_handles() {
        let (tree, _, cell) = tree_with_row();
        let mut copy = tree.clone();
        copy.set_relative_size(cell, 3.0).unwrap();
        assert_eq!(tree.relative_size(cell).unwrap(), DEFAULT_RELATIVE_SIZE);
        assert_eq!(copy.relative_size(cell).unwrap(), 3.0);
        assert_ne!(tree, copy);
    }

    #[test]
    fn detached_fragment_is_ignored_by_equality() {
        let (tree, _, cell) = tree_with_row();
        let mut copy = tree.clone();
        let stray = copy.create_content([("component", "Text")]);
        assert!(!copy.is_attached(stray).unwrap());
        assert_eq!(tree, copy);
        copy.detach(cell).unwrap();
        assert_ne!(tree, copy);
    }

    #[test]
    fn remove_frees_whole_subtree() {
        let (mut tree, row, cell) = tree_with_row();
        let content = tree.create_content([("component", "Text")]);
        tree.append_child(cell, content).unwrap();
        tree.remove(row).unwrap();
        assert!(!tree.contains(cell));
        assert!(!tree.contains(content));
        assert_eq!(tree.arena_len(), 1);
    }

    #[test]
    fn insert_before_foreign_sibling_is_inconsistent() {
        let (mut tree, row, _) = tree_with_row();
        let other_row = tree.create(NodeKind::ROW);
        let cell = tree.create(NodeKind::MODULE_CELL);
        let err = tree.insert_before(row, cell, Some(other_row)).unwrap_err();
        assert!(matches!(err, LayoutError::Inconsistency { .. }));
    }

    #[test]
    fn cannot_insert_under_own_descendant() {
        let (mut tree, row, cell) = tree_with_row();
        tree.detach(row).unwrap();
        let err = tree.append_child(cell, row).unwrap_err();
        assert!(matches!(err, LayoutError::Inconsistency { .. }));
    }

    #[test]
    fn splice_replaces_in_place() {
        let (mut tree, row, cell) = tree_with_row();
        let a = tree.create(NodeKind::MODULE_CELL);
        let b = tree.create(NodeKind::MODULE_CELL);
        tree.splice(cell, &[a, b]).unwrap();
        assert_eq!(tree.children(row).unwrap(), &[a, b]);
        assert_eq!(tree.parent(cell).unwrap(), None);
        assert_eq!(tree.parent(b).unwrap(), Some(row));
    }

    #[test]
    fn unknown_handle_reports_missing_node() {
        let tree = GridTree::new("foo", "5px");
        let ghost = NodeId::new(99).unwrap();
        assert_eq!(
            tree.kind(ghost).unwrap_err(),
            LayoutError::NodeDoesNotExist { node: ghost }
        );
    }
}
