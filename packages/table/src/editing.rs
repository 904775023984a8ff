//! Table editing feature: schema registration and post-fixer lifecycle.

use crate::cell_content::TableCellContentPostFixer;
use tracing::{debug, warn};
use trellis_model::{ItemDefinition, ItemKind, Model, PostFixerHandle, Schema, PARAGRAPH, ROOT_NAME};

pub const TABLE: &str = "table";
pub const TABLE_ROW: &str = "tableRow";
pub const TABLE_CELL: &str = "tableCell";

/// Register `table`, `tableRow` and `tableCell`, plus `paragraph` when it is
/// missing or not a block.
///
/// Cells accept whatever the root accepts, which means block content but
/// never bare text. The cell fixer writes paragraphs, so they must count as
/// valid cell content or its own output would be wrapped again.
pub fn register_schema(schema: &mut Schema) {
    if !schema.is_block(PARAGRAPH) {
        if schema.is_registered(PARAGRAPH) {
            warn!("Replacing non-block paragraph definition");
        }
        schema.register_paragraph();
    }

    schema.register(TABLE, ItemDefinition::new(ItemKind::Block).allow_in(ROOT_NAME));
    schema.register(TABLE_ROW, ItemDefinition::new(ItemKind::Container).allow_in(TABLE));
    schema.register(
        TABLE_CELL,
        ItemDefinition::new(ItemKind::Limit)
            .allow_in(TABLE_ROW)
            .allow_content_of(ROOT_NAME),
    );
}

/// Table support attached to a model
#[derive(Debug)]
pub struct TableEditing {
    cell_content_fixer: PostFixerHandle,
}

impl TableEditing {
    /// Register the table schema and post-fixers on `model`
    pub fn init(model: &mut Model) -> Self {
        register_schema(model.schema_mut());
        let cell_content_fixer = model.register_post_fixer(Box::new(TableCellContentPostFixer::new()));
        debug!("Table editing initialized");

        Self { cell_content_fixer }
    }

    /// Deregister the post-fixers; returns false if they were already gone
    pub fn destroy(self, model: &mut Model) -> bool {
        model.deregister_post_fixer(self.cell_content_fixer)
    }
}
