//! # Writer
//!
//! Mutation handle bound to the active batch. It is the only way to change
//! the document: every method turns into one or more `Operation`s, each
//! recorded with its inverse and reported to the differ.
//!
//! Path-based methods (`insert`, `remove`, `wrap`, ...) resolve their
//! positions against the document at call time. Id-based methods
//! (`insert_into`, `wrap_children`, ...) are what post-fixers use, since they
//! already know the element they are repairing.

use crate::differ::Differ;
use crate::document::Document;
use crate::error::{ModelError, ModelResult};
use crate::history::OperationBatch;
use crate::node::{Element, Node, NodeId, Text};
use crate::operation::Operation;
use crate::position::{Position, Range};
use crate::schema::Schema;
use tracing::trace;

/// Operations and changes accumulated by one batch
#[derive(Debug, Default)]
pub struct Transaction {
    pub(crate) batch: OperationBatch,
    pub(crate) differ: Differ,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    pub fn differ(&self) -> &Differ {
        &self.differ
    }

    /// Revert everything applied so far, newest first
    pub fn rollback(self, doc: &mut Document) -> ModelResult<()> {
        self.batch.revert(doc)
    }

    pub(crate) fn into_batch(self) -> OperationBatch {
        self.batch
    }
}

pub struct Writer<'a> {
    document: &'a mut Document,
    schema: &'a Schema,
    transaction: &'a mut Transaction,
}

impl<'a> Writer<'a> {
    pub fn new(document: &'a mut Document, schema: &'a Schema, transaction: &'a mut Transaction) -> Self {
        Self {
            document,
            schema,
            transaction,
        }
    }

    pub fn document(&self) -> &Document {
        &*self.document
    }

    pub fn schema(&self) -> &Schema {
        self.schema
    }

    /// Apply an operation and record it in the batch
    pub fn apply(&mut self, operation: Operation) -> ModelResult<()> {
        let inverse = operation.to_inverse(self.document)?;
        self.transaction.differ.record(&operation, self.document);
        operation.apply(self.document)?;

        trace!(operation = operation.name(), "Applied operation");
        self.transaction.batch.push(operation, inverse);
        Ok(())
    }

    /// Fresh id for an element created outside the writer (e.g. by a parser)
    pub fn allocate_id(&mut self) -> NodeId {
        self.document.allocate_id()
    }

    /// Create a detached element with a fresh id
    pub fn create_element(&mut self, name: impl Into<String>) -> Element {
        Element::new(self.document.allocate_id(), name)
    }

    pub fn create_text(&self, data: impl Into<String>) -> Text {
        Text::new(data)
    }

    pub fn insert(&mut self, node: impl Into<Node>, position: &Position) -> ModelResult<()> {
        let (parent, offset) = self.document.resolve_position(position)?;
        self.insert_into(parent, offset, vec![node.into()])
    }

    /// Create and insert an empty element, returning its id
    pub fn insert_element(&mut self, name: impl Into<String>, position: &Position) -> ModelResult<NodeId> {
        let element = self.create_element(name);
        let id = element.id;
        self.insert(element, position)?;
        Ok(id)
    }

    pub fn insert_text(&mut self, data: impl Into<String>, position: &Position) -> ModelResult<()> {
        self.insert(Text::new(data), position)
    }

    pub fn remove(&mut self, range: &Range) -> ModelResult<()> {
        let (parent, start, end) = self.document.resolve_range(range)?;
        self.remove_children(parent, start, end)
    }

    /// Move a range to `position`, which is read before the range is detached
    pub fn move_range(&mut self, range: &Range, position: &Position) -> ModelResult<()> {
        let (source, start, end) = self.document.resolve_range(range)?;
        let (target, offset) = self.document.resolve_position(position)?;
        self.move_children(source, start, end, target, offset)
    }

    /// Wrap a range in a new element, returning the wrapper's id
    pub fn wrap(&mut self, range: &Range, name: impl Into<String>) -> ModelResult<NodeId> {
        let (parent, start, end) = self.document.resolve_range(range)?;
        self.wrap_children(parent, start, end, name)
    }

    pub fn insert_into(&mut self, parent: NodeId, offset: usize, nodes: Vec<Node>) -> ModelResult<()> {
        if nodes.is_empty() {
            return Ok(());
        }

        self.apply(Operation::Insert {
            parent,
            offset,
            nodes,
        })
    }

    pub fn insert_element_into(
        &mut self,
        parent: NodeId,
        offset: usize,
        name: impl Into<String>,
    ) -> ModelResult<NodeId> {
        let element = self.create_element(name);
        let id = element.id;
        self.insert_into(parent, offset, vec![element.into()])?;
        Ok(id)
    }

    pub fn remove_children(&mut self, parent: NodeId, start: usize, end: usize) -> ModelResult<()> {
        if start == end {
            return Ok(());
        }

        self.apply(Operation::Remove {
            parent,
            offset: start,
            count: Self::span(parent, start, end)?,
        })
    }

    /// Move children `[start, end)` of `source` to `offset` in `target`;
    /// `offset` is read before the children are detached
    pub fn move_children(
        &mut self,
        source: NodeId,
        start: usize,
        end: usize,
        target: NodeId,
        offset: usize,
    ) -> ModelResult<()> {
        let count = Self::span(source, start, end)?;
        if count == 0 {
            return Ok(());
        }

        let target_offset = if source == target {
            if offset <= start {
                offset
            } else if offset >= end {
                offset - count
            } else {
                // Moving a range into itself leaves it where it is
                return Ok(());
            }
        } else {
            offset
        };

        self.apply(Operation::Move {
            source,
            offset: start,
            count,
            target,
            target_offset,
        })
    }

    /// Insert a new element at `start` and move `[start, end)` inside it,
    /// preserving order and content
    pub fn wrap_children(
        &mut self,
        parent: NodeId,
        start: usize,
        end: usize,
        name: impl Into<String>,
    ) -> ModelResult<NodeId> {
        let count = Self::span(parent, start, end)?;
        let wrapper = self.insert_element_into(parent, start, name)?;

        if count > 0 {
            self.apply(Operation::Move {
                source: parent,
                offset: start + 1,
                count,
                target: wrapper,
                target_offset: 0,
            })?;
        }

        Ok(wrapper)
    }

    pub fn set_attribute(
        &mut self,
        node: NodeId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> ModelResult<()> {
        self.apply(Operation::SetAttribute {
            node,
            key: key.into(),
            value: Some(value.into()),
        })
    }

    pub fn remove_attribute(&mut self, node: NodeId, key: impl Into<String>) -> ModelResult<()> {
        self.apply(Operation::SetAttribute {
            node,
            key: key.into(),
            value: None,
        })
    }

    fn span(parent: NodeId, start: usize, end: usize) -> ModelResult<usize> {
        end.checked_sub(start).ok_or(ModelError::InvalidOffset {
            parent,
            offset: start,
            len: end,
        })
    }
}
