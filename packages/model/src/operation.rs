//! # Operations
//!
//! Low-level, invertible tree operations. Every change a `Writer` makes is
//! one of these, which is what lets a batch be rolled back or undone.
//!
//! ## Operation Semantics
//!
//! ### Insert
//! - Inserts nodes at a child offset; elements keep the ids they carry
//! - Fails if an inserted element id is already in the document
//!
//! ### Remove
//! - Removes a flat run of children and everything below them
//! - The inverse re-inserts the exact removed nodes, ids included
//!
//! ### Move
//! - Detaches a run of children, then inserts it at `target_offset`,
//!   interpreted after the detach
//! - Fails if the target is inside one of the moved nodes
//!
//! ### SetAttribute
//! - `None` removes the attribute

use crate::document::Document;
use crate::error::{ModelError, ModelResult};
use crate::node::{Element, Node, NodeId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Operation {
    Insert {
        parent: NodeId,
        offset: usize,
        nodes: Vec<Node>,
    },

    Remove {
        parent: NodeId,
        offset: usize,
        count: usize,
    },

    #[serde(rename_all = "camelCase")]
    Move {
        source: NodeId,
        offset: usize,
        count: usize,
        target: NodeId,
        target_offset: usize,
    },

    SetAttribute {
        node: NodeId,
        key: String,
        value: Option<String>,
    },
}

impl Operation {
    /// Apply operation to the document with validation
    pub fn apply(&self, doc: &mut Document) -> ModelResult<()> {
        self.validate(doc)?;

        match self {
            Operation::Insert { parent, offset, nodes } => {
                let parent = Self::element_mut(doc, *parent)?;
                parent.children.splice(*offset..*offset, nodes.iter().cloned());
                Ok(())
            }

            Operation::Remove { parent, offset, count } => {
                let parent = Self::element_mut(doc, *parent)?;
                parent.children.drain(*offset..*offset + *count);
                Ok(())
            }

            Operation::Move { source, offset, count, target, target_offset } => {
                let moved: Vec<Node> = Self::element_mut(doc, *source)?
                    .children
                    .drain(*offset..*offset + *count)
                    .collect();

                let target = Self::element_mut(doc, *target)?;
                target.children.splice(*target_offset..*target_offset, moved);
                Ok(())
            }

            Operation::SetAttribute { node, key, value } => {
                let element = doc
                    .element_mut(*node)
                    .ok_or(ModelError::NodeNotFound(*node))?;

                match value {
                    Some(value) => {
                        element.attributes.insert(key.clone(), value.clone());
                    }
                    None => {
                        element.attributes.remove(key);
                    }
                }
                Ok(())
            }
        }
    }

    /// Create the inverse operation; must be called before `apply`
    pub fn to_inverse(&self, doc: &Document) -> ModelResult<Operation> {
        self.validate(doc)?;

        match self {
            Operation::Insert { parent, offset, nodes } => Ok(Operation::Remove {
                parent: *parent,
                offset: *offset,
                count: nodes.len(),
            }),

            Operation::Remove { parent, offset, count } => {
                let element = Self::element(doc, *parent)?;
                Ok(Operation::Insert {
                    parent: *parent,
                    offset: *offset,
                    nodes: element.children[*offset..*offset + *count].to_vec(),
                })
            }

            Operation::Move { source, offset, count, target, target_offset } => Ok(Operation::Move {
                source: *target,
                offset: *target_offset,
                count: *count,
                target: *source,
                target_offset: *offset,
            }),

            Operation::SetAttribute { node, key, .. } => {
                let element = doc.element(*node).ok_or(ModelError::NodeNotFound(*node))?;
                Ok(Operation::SetAttribute {
                    node: *node,
                    key: key.clone(),
                    value: element.attributes.get(key).cloned(),
                })
            }
        }
    }

    /// Validate without applying
    pub fn validate(&self, doc: &Document) -> ModelResult<()> {
        match self {
            Operation::Insert { parent, offset, nodes } => {
                let element = Self::element(doc, *parent)?;
                Self::check_offset(element, *offset)?;

                for node in nodes {
                    if let Node::Element(inserted) = node {
                        Self::check_not_present(doc, inserted)?;
                    }
                }

                Ok(())
            }

            Operation::Remove { parent, offset, count } => {
                let element = Self::element(doc, *parent)?;
                Self::check_offset(element, *offset + *count)
            }

            Operation::Move { source, offset, count, target, target_offset } => {
                let source_element = Self::element(doc, *source)?;
                Self::check_offset(source_element, *offset + *count)?;

                let moved = &source_element.children[*offset..*offset + *count];
                if moved
                    .iter()
                    .filter_map(Node::as_element)
                    .any(|element| element.contains(*target))
                {
                    return Err(ModelError::CycleDetected);
                }

                let target_element = Self::element(doc, *target)?;
                let len_after_detach = if source == target {
                    target_element.child_count() - *count
                } else {
                    target_element.child_count()
                };

                if *target_offset > len_after_detach {
                    return Err(ModelError::InvalidOffset {
                        parent: *target,
                        offset: *target_offset,
                        len: len_after_detach,
                    });
                }

                Ok(())
            }

            Operation::SetAttribute { node, .. } => {
                doc.element(*node).ok_or(ModelError::NodeNotFound(*node))?;
                Ok(())
            }
        }
    }

    /// Get a debug name for this operation
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Insert { .. } => "insert",
            Operation::Remove { .. } => "remove",
            Operation::Move { .. } => "move",
            Operation::SetAttribute { .. } => "setAttribute",
        }
    }

    fn element(doc: &Document, id: NodeId) -> ModelResult<&Element> {
        doc.element(id).ok_or(ModelError::ParentNotFound(id))
    }

    fn element_mut(doc: &mut Document, id: NodeId) -> ModelResult<&mut Element> {
        doc.element_mut(id).ok_or(ModelError::ParentNotFound(id))
    }

    fn check_offset(element: &Element, offset: usize) -> ModelResult<()> {
        if offset > element.child_count() {
            return Err(ModelError::InvalidOffset {
                parent: element.id,
                offset,
                len: element.child_count(),
            });
        }
        Ok(())
    }

    fn check_not_present(doc: &Document, element: &Element) -> ModelResult<()> {
        if doc.contains(element.id) {
            return Err(ModelError::DuplicateId(element.id));
        }

        for child in element.children.iter().filter_map(Node::as_element) {
            Self::check_not_present(doc, child)?;
        }

        Ok(())
    }
}
