//! # Table Cell Content Post-Fixer
//!
//! Keeps every `tableCell` holding block content after each batch.
//!
//! ## Design
//!
//! `compute_corrections` is a pure function of the batch's change-set and the
//! current document. It collects the cells the batch could have broken:
//!
//! - cells that were inserted, directly or inside an inserted table or row
//! - cells that had children inserted (text included) or removed
//!
//! Candidates are deduplicated by id, cells no longer in the document are
//! skipped, and the rest are planned in document order so the resulting
//! history is the same on every run. `TableCellContentPostFixer` is the thin
//! adapter that applies the corrections through the writer.
//!
//! A valid cell yields no corrections, so a second pass over the same batch
//! is a no-op and the post-fixer loop terminates.

use crate::editing::TABLE_CELL;
use crate::wrapping::{plan_cell, Correction};
use std::collections::HashSet;
use tracing::{debug, instrument};
use trellis_model::{
    walk_element, Change, ChangeSet, ChangedNode, Document, Element, ModelResult, NodeId,
    PostFixer, Schema, Visitor, Writer, PARAGRAPH,
};

/// Collects `tableCell` ids below (and including) the visited element
#[derive(Default)]
struct CellCollector {
    cells: Vec<NodeId>,
}

impl<'doc> Visitor<'doc> for CellCollector {
    fn visit_element(&mut self, element: &'doc Element) {
        if element.name == TABLE_CELL {
            self.cells.push(element.id);
        }
        walk_element(self, element);
    }
}

/// Picks the candidate cells out of the document, in document order
struct OrderedCells<'doc, 'a> {
    candidates: &'a HashSet<NodeId>,
    found: Vec<&'doc Element>,
}

impl<'doc, 'a> Visitor<'doc> for OrderedCells<'doc, 'a> {
    fn visit_element(&mut self, element: &'doc Element) {
        if self.found.len() == self.candidates.len() {
            return;
        }
        if element.name == TABLE_CELL && self.candidates.contains(&element.id) {
            self.found.push(element);
        }
        walk_element(self, element);
    }
}

fn affected_cells(changes: &ChangeSet, document: &Document) -> HashSet<NodeId> {
    let mut cells = HashSet::new();

    for change in changes.iter() {
        if let Some((parent, parent_name)) = change.parent() {
            if parent_name == TABLE_CELL {
                cells.insert(parent);
            }
        }

        if let Change::Insert {
            node: ChangedNode::Element { id, .. },
            ..
        } = change
        {
            // Skip elements removed again later in the batch
            if let Some(element) = document.element(*id) {
                let mut collector = CellCollector::default();
                collector.visit_element(element);
                cells.extend(collector.cells);
            }
        }
    }

    cells
}

/// Corrections needed to restore the cell invariant after `changes`
pub fn compute_corrections(changes: &ChangeSet, document: &Document, schema: &Schema) -> Vec<Correction> {
    let candidates = affected_cells(changes, document);
    if candidates.is_empty() {
        return Vec::new();
    }

    let mut ordered = OrderedCells {
        candidates: &candidates,
        found: Vec::new(),
    };
    document.walk(&mut ordered);

    ordered
        .found
        .into_iter()
        .flat_map(|cell| plan_cell(cell, schema))
        .collect()
}

/// Apply corrections in order; returns how many were applied
pub fn apply_corrections(corrections: &[Correction], writer: &mut Writer<'_>) -> ModelResult<usize> {
    for correction in corrections {
        match correction {
            Correction::InsertParagraph { cell } => {
                writer.insert_element_into(*cell, 0, PARAGRAPH)?;
            }
            Correction::WrapInParagraph { cell, offset, count } => {
                writer.wrap_children(*cell, *offset, offset + count, PARAGRAPH)?;
            }
        }
        debug!(?correction, "Applied table cell correction");
    }

    Ok(corrections.len())
}

#[derive(Debug, Default)]
pub struct TableCellContentPostFixer;

impl TableCellContentPostFixer {
    pub const NAME: &'static str = "table-cell-content";

    pub fn new() -> Self {
        Self
    }
}

impl PostFixer for TableCellContentPostFixer {
    fn name(&self) -> &str {
        Self::NAME
    }

    #[instrument(skip_all, fields(changes = changes.len()))]
    fn fix(&self, changes: &ChangeSet, writer: &mut Writer<'_>) -> ModelResult<bool> {
        let corrections = compute_corrections(changes, writer.document(), writer.schema());
        if corrections.is_empty() {
            return Ok(false);
        }

        let applied = apply_corrections(&corrections, writer)?;
        debug!(applied, "Fixed table cell content");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::{register_schema, TABLE, TABLE_ROW};
    use trellis_model::{parse_data, Node, Transaction};

    struct Fixture {
        document: Document,
        schema: Schema,
    }

    impl Fixture {
        /// Loads `source` without running any post-fixer
        fn new(source: &str) -> Self {
            let mut schema = Schema::new();
            schema.register_paragraph();
            register_schema(&mut schema);

            let mut document = Document::new();
            {
                let mut transaction = Transaction::new();
                let mut writer = Writer::new(&mut document, &schema, &mut transaction);
                let nodes = parse_data(source, || writer.allocate_id()).unwrap();
                writer.insert_into(NodeId::ROOT, 0, nodes).unwrap();
            }

            Self { document, schema }
        }

        fn element_at(&self, path: [usize; 3]) -> &Element {
            self.document
                .element_by_path(&trellis_model::Path::from(path))
                .unwrap()
        }
    }

    fn insert_change(parent: &Element, offset: usize, node: ChangedNode) -> Change {
        Change::Insert {
            parent: parent.id,
            parent_name: parent.name.clone(),
            offset,
            node,
        }
    }

    #[test]
    fn test_inserted_table_marks_all_its_cells() {
        let fixture = Fixture::new(
            "<table><tableRow><tableCell></tableCell><tableCell></tableCell></tableRow></table>",
        );
        let table = fixture.document.root().children[0].as_element().unwrap();
        let changes = ChangeSet::new(vec![insert_change(
            fixture.document.root(),
            0,
            ChangedNode::Element { id: table.id, name: TABLE.to_string() },
        )]);

        let corrections = compute_corrections(&changes, &fixture.document, &fixture.schema);

        let first = fixture.element_at([0, 0, 0]).id;
        let second = fixture.element_at([0, 0, 1]).id;
        assert_eq!(
            corrections,
            vec![
                Correction::InsertParagraph { cell: first },
                Correction::InsertParagraph { cell: second },
            ]
        );
    }

    #[test]
    fn test_untouched_cells_are_ignored() {
        let fixture = Fixture::new(
            "<table><tableRow><tableCell></tableCell></tableRow><tableRow><tableCell></tableCell></tableRow></table>",
        );
        let row = fixture.document.element_by_path(&trellis_model::Path::from([0, 1])).unwrap();
        let changes = ChangeSet::new(vec![insert_change(
            fixture.document.root().children[0].as_element().unwrap(),
            1,
            ChangedNode::Element { id: row.id, name: TABLE_ROW.to_string() },
        )]);

        let corrections = compute_corrections(&changes, &fixture.document, &fixture.schema);
        let second = fixture.element_at([0, 1, 0]).id;
        assert_eq!(corrections, vec![Correction::InsertParagraph { cell: second }]);
    }

    #[test]
    fn test_valid_cells_yield_nothing() {
        let fixture = Fixture::new(
            "<table><tableRow><tableCell><paragraph>foo</paragraph></tableCell></tableRow></table>",
        );
        let cell = fixture.element_at([0, 0, 0]);
        let changes = ChangeSet::new(vec![
            insert_change(cell, 0, ChangedNode::Text { len: 3 }),
            Change::Remove {
                parent: cell.id,
                parent_name: TABLE_CELL.to_string(),
                offset: 1,
                count: 1,
            },
        ]);

        assert!(compute_corrections(&changes, &fixture.document, &fixture.schema).is_empty());
    }

    #[test]
    fn test_removed_cells_are_skipped() {
        let fixture = Fixture::new("<paragraph></paragraph>");
        let changes = ChangeSet::new(vec![Change::Remove {
            parent: NodeId(77),
            parent_name: TABLE_CELL.to_string(),
            offset: 0,
            count: 1,
        }]);

        assert!(compute_corrections(&changes, &fixture.document, &fixture.schema).is_empty());
    }

    #[test]
    fn test_cells_processed_in_document_order() {
        let fixture = Fixture::new(
            "<table><tableRow><tableCell>a</tableCell><tableCell>b</tableCell></tableRow></table>",
        );
        let first = fixture.element_at([0, 0, 0]);
        let second = fixture.element_at([0, 0, 1]);

        // Changes arrive second cell first
        let changes = ChangeSet::new(vec![
            insert_change(second, 0, ChangedNode::Text { len: 1 }),
            insert_change(first, 0, ChangedNode::Text { len: 1 }),
        ]);

        let corrections = compute_corrections(&changes, &fixture.document, &fixture.schema);
        let cells: Vec<NodeId> = corrections.iter().map(Correction::cell).collect();
        assert_eq!(cells, vec![first.id, second.id]);
    }

    #[test]
    fn test_post_fixer_is_idempotent() {
        let mut fixture = Fixture::new(
            "<table><tableRow><tableCell>foo<paragraph>bar</paragraph>baz</tableCell></tableRow></table>",
        );
        let cell = fixture.element_at([0, 0, 0]).clone();
        let changes = ChangeSet::new(vec![insert_change(&cell, 0, ChangedNode::Text { len: 3 })]);

        let fixer = TableCellContentPostFixer::new();
        let mut transaction = Transaction::new();
        let mut writer = Writer::new(&mut fixture.document, &fixture.schema, &mut transaction);

        assert!(fixer.fix(&changes, &mut writer).unwrap());
        assert!(!fixer.fix(&changes, &mut writer).unwrap());

        let cell = writer.document().element(cell.id).unwrap();
        let texts: Vec<String> = cell
            .children
            .iter()
            .filter_map(Node::as_element)
            .map(Element::text_content)
            .collect();
        assert_eq!(texts, vec!["foo", "bar", "baz"]);
    }
}
