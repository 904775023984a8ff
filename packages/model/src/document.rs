//! # Document Tree
//!
//! Rooted, ordered tree of elements and text. The root element is named
//! `$root` and always carries `NodeId::ROOT`.
//!
//! Lookups walk the tree; nothing holds references across mutations. Only the
//! crate's operations get mutable access, so every change goes through a
//! `Writer` and is recorded.

use crate::error::{ModelError, ModelResult};
use crate::node::{Element, Node, NodeId};
use crate::position::{Path, Position, Range};
use crate::visitor::Visitor;

pub const ROOT_NAME: &str = "$root";

/// Sequential id allocator for elements within a document
#[derive(Debug, Clone)]
pub struct IdGenerator {
    count: u64,
}

impl IdGenerator {
    /// Ids start after `NodeId::ROOT`
    pub fn new() -> Self {
        Self { count: 0 }
    }

    /// Generate next sequential ID
    pub fn new_id(&mut self) -> NodeId {
        self.count += 1;
        NodeId(self.count)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    root: Element,
    ids: IdGenerator,
}

impl Document {
    pub fn new() -> Self {
        Self {
            root: Element::new(NodeId::ROOT, ROOT_NAME),
            ids: IdGenerator::new(),
        }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub(crate) fn allocate_id(&mut self) -> NodeId {
        self.ids.new_id()
    }

    pub fn node_by_path(&self, path: &Path) -> Option<&Node> {
        let (first, rest) = path.indices().split_first()?;
        let mut node = self.root.children.get(*first)?;
        for index in rest {
            node = node.as_element()?.children.get(*index)?;
        }
        Some(node)
    }

    /// Element at `path`; the empty path is the root
    pub fn element_by_path(&self, path: &Path) -> ModelResult<&Element> {
        if path.is_root() {
            return Ok(&self.root);
        }

        self.node_by_path(path)
            .and_then(Node::as_element)
            .ok_or_else(|| ModelError::InvalidPath(path.clone()))
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.root.find(id)
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.root.find_mut(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Current path of the element with `id`
    pub fn path_of(&self, id: NodeId) -> Option<Path> {
        fn search(element: &Element, id: NodeId, path: &mut Vec<usize>) -> bool {
            if element.id == id {
                return true;
            }

            for (index, child) in element.children.iter().enumerate() {
                if let Node::Element(child) = child {
                    path.push(index);
                    if search(child, id, path) {
                        return true;
                    }
                    path.pop();
                }
            }

            false
        }

        let mut path = Vec::new();
        search(&self.root, id, &mut path).then(|| Path::new(path))
    }

    /// Resolve a position to the parent id and a concrete offset
    pub fn resolve_position(&self, position: &Position) -> ModelResult<(NodeId, usize)> {
        let parent = self.element_by_path(&position.parent)?;
        let offset = position.offset.resolve(parent.child_count());

        if offset > parent.child_count() {
            return Err(ModelError::InvalidOffset {
                parent: parent.id,
                offset,
                len: parent.child_count(),
            });
        }

        Ok((parent.id, offset))
    }

    /// Resolve a range to the parent id and concrete `[start, end)` offsets
    pub fn resolve_range(&self, range: &Range) -> ModelResult<(NodeId, usize, usize)> {
        let parent = self.element_by_path(&range.parent)?;
        let end = range.end.resolve(parent.child_count());

        if range.start > end || end > parent.child_count() {
            return Err(ModelError::InvalidOffset {
                parent: parent.id,
                offset: end.max(range.start),
                len: parent.child_count(),
            });
        }

        Ok((parent.id, range.start, end))
    }

    /// Walk the whole tree in document order
    pub fn walk<'doc, V: Visitor<'doc>>(&'doc self, visitor: &mut V) {
        visitor.visit_element(&self.root);
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
