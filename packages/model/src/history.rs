//! # History
//!
//! Committed batches, kept so they can be undone and redone.
//!
//! - A batch holds every operation of one `Model::change` call, including
//!   post-fixer corrections, so one undo reverts edit and fix together
//! - Inverses are computed before each operation is applied and kept in
//!   application order
//! - Undo applies the inverses newest first and moves the batch to the redo stack
//! - Redo reapplies the original operations
//! - New batches clear the redo stack

use crate::document::Document;
use crate::error::ModelResult;
use crate::operation::Operation;

/// A group of operations that are undone/redone together
#[derive(Debug, Clone, Default)]
pub struct OperationBatch {
    /// The operations in this batch (in application order)
    pub operations: Vec<Operation>,

    /// Inverse of each operation, in application order
    pub inverses: Vec<Operation>,

    /// Shown by `Model::undo_description`
    pub description: Option<String>,
}

impl OperationBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an applied operation and its inverse
    pub fn push(&mut self, operation: Operation, inverse: Operation) {
        self.operations.push(operation);
        self.inverses.push(inverse);
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Apply the inverses newest first, restoring the state before the batch
    pub fn revert(&self, doc: &mut Document) -> ModelResult<()> {
        for inverse in self.inverses.iter().rev() {
            inverse.apply(doc)?;
        }
        Ok(())
    }

    /// Reapply the operations
    pub fn replay(&self, doc: &mut Document) -> ModelResult<()> {
        for operation in &self.operations {
            operation.apply(doc)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct UndoStack {
    /// Committed batches (most recent last)
    undo_stack: Vec<OperationBatch>,

    /// Undone batches (most recent last)
    redo_stack: Vec<OperationBatch>,

    /// Oldest batches are dropped past this many; 0 keeps all
    max_levels: usize,
}

impl UndoStack {
    /// Keeps the last 100 batches
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
        }
    }

    /// Push a committed batch
    pub fn push(&mut self, batch: OperationBatch) {
        if batch.is_empty() {
            return;
        }

        self.undo_stack.push(batch);

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        // New action invalidates future
        self.redo_stack.clear();
    }

    /// Undo the most recent batch
    pub fn undo(&mut self, doc: &mut Document) -> ModelResult<bool> {
        let Some(batch) = self.undo_stack.pop() else {
            return Ok(false);
        };

        batch.revert(doc)?;
        self.redo_stack.push(batch);
        Ok(true)
    }

    /// Redo the most recently undone batch
    pub fn redo(&mut self, doc: &mut Document) -> ModelResult<bool> {
        let Some(batch) = self.redo_stack.pop() else {
            return Ok(false);
        };

        batch.replay(doc)?;
        self.undo_stack.push(batch);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Description of the batch `undo` would revert
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|batch| batch.description.as_deref())
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Element, Node, NodeId};

    fn insert_text(doc: &Document, data: &str) -> OperationBatch {
        let op = Operation::Insert {
            parent: NodeId::ROOT,
            offset: 0,
            nodes: vec![Node::text(data)],
        };
        let inverse = op.to_inverse(doc).unwrap();

        let mut batch = OperationBatch::new();
        batch.push(op, inverse);
        batch
    }

    #[test]
    fn test_undo_stack_creation() {
        let stack = UndoStack::new();
        assert_eq!(stack.undo_levels(), 0);
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_undo_and_redo() {
        let mut doc = Document::new();
        let mut stack = UndoStack::new();

        let batch = insert_text(&doc, "foo").with_description("Type foo");
        batch.replay(&mut doc).unwrap();
        stack.push(batch);
        assert_eq!(stack.undo_description(), Some("Type foo"));

        assert!(stack.undo(&mut doc).unwrap());
        assert!(doc.root().is_empty());
        assert_eq!(stack.redo_levels(), 1);

        assert!(stack.redo(&mut doc).unwrap());
        assert_eq!(doc.root().text_content(), "foo");
        assert!(!stack.redo(&mut doc).unwrap());
    }

    #[test]
    fn test_revert_runs_inverses_newest_first() {
        let mut doc = Document::new();
        let mut batch = OperationBatch::new();

        // The second operation depends on the first, so order matters on revert
        let paragraph = Element::new(NodeId(1), "paragraph");
        let operations = [
            Operation::Insert {
                parent: NodeId::ROOT,
                offset: 0,
                nodes: vec![paragraph.into()],
            },
            Operation::Insert {
                parent: NodeId(1),
                offset: 0,
                nodes: vec![Node::text("foo")],
            },
        ];
        for op in operations {
            let inverse = op.to_inverse(&doc).unwrap();
            op.apply(&mut doc).unwrap();
            batch.push(op, inverse);
        }

        assert_eq!(batch.inverses[0], Operation::Remove { parent: NodeId::ROOT, offset: 0, count: 1 });
        assert_eq!(batch.inverses[1], Operation::Remove { parent: NodeId(1), offset: 0, count: 1 });

        batch.revert(&mut doc).unwrap();
        assert!(doc.root().is_empty());
    }

    #[test]
    fn test_new_batch_clears_redo() {
        let mut doc = Document::new();
        let mut stack = UndoStack::new();

        let first = insert_text(&doc, "a");
        first.replay(&mut doc).unwrap();
        stack.push(first);
        stack.undo(&mut doc).unwrap();
        assert_eq!(stack.redo_levels(), 1);

        let second = insert_text(&doc, "b");
        second.replay(&mut doc).unwrap();
        stack.push(second);
        assert_eq!(stack.redo_levels(), 0);
    }

    #[test]
    fn test_max_levels_enforced() {
        let mut doc = Document::new();
        let mut stack = UndoStack::with_max_levels(2);

        for data in ["a", "b", "c"] {
            let batch = insert_text(&doc, data);
            batch.replay(&mut doc).unwrap();
            stack.push(batch);
        }

        assert_eq!(stack.undo_levels(), 2);
    }

    #[test]
    fn test_empty_batches_are_not_recorded() {
        let mut stack = UndoStack::new();
        stack.push(OperationBatch::new());
        assert!(!stack.can_undo());
    }
}
