//! # Change-Set Summary
//!
//! The differ watches operations as the writer applies them and records the
//! structural changes they make: what was inserted where, which parents lost
//! children, which attributes changed. Post-fixers receive a `ChangeSet`
//! snapshot of everything recorded in the current batch.
//!
//! Parent names are captured at record time. A parent may be removed later in
//! the same batch, so consumers must still check the node is in the document
//! before acting on it.

use crate::document::Document;
use crate::node::{Node, NodeId};
use crate::operation::Operation;
use serde::{Deserialize, Serialize};

/// What was inserted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChangedNode {
    Element { id: NodeId, name: String },
    Text { len: usize },
}

impl ChangedNode {
    fn from_node(node: &Node) -> Self {
        match node {
            Node::Element(element) => ChangedNode::Element {
                id: element.id,
                name: element.name.clone(),
            },
            Node::Text(text) => ChangedNode::Text { len: text.len() },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Change {
    #[serde(rename_all = "camelCase")]
    Insert {
        parent: NodeId,
        parent_name: String,
        offset: usize,
        node: ChangedNode,
    },

    #[serde(rename_all = "camelCase")]
    Remove {
        parent: NodeId,
        parent_name: String,
        offset: usize,
        count: usize,
    },

    Attribute { node: NodeId, key: String },
}

impl Change {
    /// Parent whose child list this change touched
    pub fn parent(&self) -> Option<(NodeId, &str)> {
        match self {
            Change::Insert { parent, parent_name, .. } | Change::Remove { parent, parent_name, .. } => {
                Some((*parent, parent_name.as_str()))
            }
            Change::Attribute { .. } => None,
        }
    }
}

/// Changes recorded in one batch, in application order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new(changes: Vec<Change>) -> Self {
        Self { changes }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Inserted elements as `(id, name)`
    pub fn inserted_elements(&self) -> impl Iterator<Item = (NodeId, &str)> {
        self.changes.iter().filter_map(|change| match change {
            Change::Insert {
                node: ChangedNode::Element { id, name },
                ..
            } => Some((*id, name.as_str())),
            _ => None,
        })
    }

    /// Parents that had text inserted directly into them
    pub fn inserted_text(&self) -> impl Iterator<Item = (NodeId, &str)> {
        self.changes.iter().filter_map(|change| match change {
            Change::Insert {
                parent,
                parent_name,
                node: ChangedNode::Text { .. },
                ..
            } => Some((*parent, parent_name.as_str())),
            _ => None,
        })
    }

    /// Parents that lost children
    pub fn removals(&self) -> impl Iterator<Item = (NodeId, &str)> {
        self.changes.iter().filter_map(|change| match change {
            Change::Remove { parent, parent_name, .. } => Some((*parent, parent_name.as_str())),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Differ {
    changes: Vec<Change>,
}

impl Differ {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `operation`; call before it is applied so names resolve
    pub fn record(&mut self, operation: &Operation, doc: &Document) {
        match operation {
            Operation::Insert { parent, offset, nodes } => {
                self.record_insert(doc, *parent, *offset, nodes.iter());
            }

            Operation::Remove { parent, offset, count } => {
                self.changes.push(Change::Remove {
                    parent: *parent,
                    parent_name: Self::name_of(doc, *parent),
                    offset: *offset,
                    count: *count,
                });
            }

            Operation::Move { source, offset, count, target, target_offset } => {
                self.changes.push(Change::Remove {
                    parent: *source,
                    parent_name: Self::name_of(doc, *source),
                    offset: *offset,
                    count: *count,
                });

                if let Some(element) = doc.element(*source) {
                    let moved = element.children.iter().skip(*offset).take(*count);
                    self.record_insert(doc, *target, *target_offset, moved);
                }
            }

            Operation::SetAttribute { node, key, .. } => {
                self.changes.push(Change::Attribute {
                    node: *node,
                    key: key.clone(),
                });
            }
        }
    }

    fn record_insert<'a>(
        &mut self,
        doc: &Document,
        parent: NodeId,
        offset: usize,
        nodes: impl Iterator<Item = &'a Node>,
    ) {
        let parent_name = Self::name_of(doc, parent);
        for (index, node) in nodes.enumerate() {
            self.changes.push(Change::Insert {
                parent,
                parent_name: parent_name.clone(),
                offset: offset + index,
                node: ChangedNode::from_node(node),
            });
        }
    }

    fn name_of(doc: &Document, id: NodeId) -> String {
        doc.element(id)
            .map(|element| element.name.clone())
            .unwrap_or_default()
    }

    /// Snapshot of everything recorded so far
    pub fn change_set(&self) -> ChangeSet {
        ChangeSet::new(self.changes.clone())
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}
