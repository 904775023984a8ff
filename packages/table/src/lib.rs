//! # Trellis Table
//!
//! Table editing support for the Trellis model: schema for `table`,
//! `tableRow` and `tableCell`, plus the post-fixer that keeps every cell
//! holding block content.
//!
//! ## Cell content invariant
//!
//! After every batch, each `tableCell` has at least one child and every
//! direct child is a block element:
//!
//! ```text
//! <tableCell></tableCell>               → <tableCell><paragraph></paragraph></tableCell>
//! <tableCell>foo<paragraph>bar</paragraph>baz</tableCell>
//!     → <tableCell><paragraph>foo</paragraph><paragraph>bar</paragraph><paragraph>baz</paragraph></tableCell>
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use trellis_model::{set_data, get_data, Model, Schema};
//! use trellis_table::TableEditing;
//!
//! let mut schema = Schema::new();
//! schema.register_paragraph();
//! let mut model = Model::with_schema(schema);
//! let table_editing = TableEditing::init(&mut model);
//!
//! set_data(&mut model, "<table><tableRow><tableCell></tableCell></tableRow></table>")?;
//! assert_eq!(
//!     get_data(&model),
//!     "<table><tableRow><tableCell><paragraph></paragraph></tableCell></tableRow></table>"
//! );
//!
//! table_editing.destroy(&mut model);
//! ```

mod cell_content;
mod editing;
mod wrapping;

pub use cell_content::{apply_corrections, compute_corrections, TableCellContentPostFixer};
pub use editing::{register_schema, TableEditing, TABLE, TABLE_CELL, TABLE_ROW};
pub use wrapping::{is_valid_cell_child, plan_cell, Correction};
