//! # Wrapping Policy
//!
//! Decides how to repair one table cell.
//!
//! 1. No children → insert an empty `paragraph`
//! 2. Only valid block children → nothing to do
//! 3. Otherwise every maximal run of children a `paragraph` accepts (text,
//!    inline elements) gets wrapped in its own new `paragraph`. Block children
//!    between runs stay where they are and are never merged into a wrapper.
//!
//! Children that neither the cell nor a `paragraph` accepts (a `listItem`
//! outside its list, unregistered elements) are left in place and end the
//! current run, since wrapping them would only move the violation. A cell
//! left without any block child gets an empty `paragraph` in front.
//!
//! A cell emptied by a removal is handled by rule 1 like a newly inserted one.

use serde::{Deserialize, Serialize};
use trellis_model::{Element, Node, NodeId, Schema, PARAGRAPH};

/// Corrective edit for a single cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Correction {
    /// Insert an empty paragraph as the cell's first child
    InsertParagraph { cell: NodeId },

    /// Wrap children `[offset, offset + count)` in a new paragraph
    WrapInParagraph {
        cell: NodeId,
        offset: usize,
        count: usize,
    },
}

impl Correction {
    pub fn cell(&self) -> NodeId {
        match self {
            Correction::InsertParagraph { cell } | Correction::WrapInParagraph { cell, .. } => *cell,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Stays as a direct child
    Valid,
    /// Goes into a wrapper paragraph
    Wrap,
    /// Accepted neither by the cell nor by a paragraph
    Stray,
}

/// Whether `child` can stay as a direct child of `cell`
pub fn is_valid_cell_child(cell: &Element, child: &Node, schema: &Schema) -> bool {
    match child {
        Node::Text(_) => false,
        Node::Element(element) => {
            schema.is_block(&element.name) && schema.check_child(&cell.name, child)
        }
    }
}

fn placement(cell: &Element, child: &Node, schema: &Schema) -> Placement {
    if is_valid_cell_child(cell, child, schema) {
        Placement::Valid
    } else if schema.check_child(PARAGRAPH, child) {
        Placement::Wrap
    } else {
        Placement::Stray
    }
}

/// Corrections needed to make `cell` valid.
///
/// Wraps are listed right to left, so applying them in order never shifts
/// the offset of one still to be applied. A paragraph insertion for a cell
/// with no block child comes last, since it shifts everything.
pub fn plan_cell(cell: &Element, schema: &Schema) -> Vec<Correction> {
    if cell.is_empty() {
        return vec![Correction::InsertParagraph { cell: cell.id }];
    }

    let mut runs = Vec::new();
    let mut run_start = None;
    let mut has_block = false;

    for (index, child) in cell.children.iter().enumerate() {
        match placement(cell, child, schema) {
            Placement::Wrap => {
                run_start.get_or_insert(index);
            }
            other => {
                has_block |= other == Placement::Valid;
                if let Some(start) = run_start.take() {
                    runs.push((start, index));
                }
            }
        }
    }

    if let Some(start) = run_start {
        runs.push((start, cell.child_count()));
    }

    let mut corrections: Vec<Correction> = runs
        .into_iter()
        .rev()
        .map(|(start, end)| Correction::WrapInParagraph {
            cell: cell.id,
            offset: start,
            count: end - start,
        })
        .collect();

    if !has_block && corrections.is_empty() {
        corrections.push(Correction::InsertParagraph { cell: cell.id });
    }

    corrections
}
