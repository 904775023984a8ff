//! # Schema
//!
//! Registry of element definitions: what kind of item each name is and where
//! it may appear.
//!
//! The schema is advisory. The writer accepts any structure so that
//! transiently invalid states (text typed straight into a table cell, a cell
//! emptied by a removal) can exist long enough for post-fixers to repair them.
//! Post-fixers consult the schema to decide what is valid and only produce
//! structure it accepts.

use crate::document::ROOT_NAME;
use crate::node::Node;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const PARAGRAPH: &str = "paragraph";

/// Generic parent name meaning "any block element"
const ANY_BLOCK: &str = "$block";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    /// Holds other structure (`$root`, `table`, `tableRow`)
    Container,
    /// Block-level element (`paragraph`)
    Block,
    /// Container that isolates its content from outside (`tableCell`)
    Limit,
    /// Inline content
    Inline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDefinition {
    pub kind: ItemKind,

    /// Parent names this item may be a child of
    #[serde(default)]
    pub allow_in: Vec<String>,

    /// Accept every child that is allowed in this other item
    #[serde(default)]
    pub allow_content_of: Option<String>,

    /// Accept text children
    #[serde(default)]
    pub allow_text: bool,
}

impl ItemDefinition {
    pub fn new(kind: ItemKind) -> Self {
        Self {
            kind,
            allow_in: Vec::new(),
            allow_content_of: None,
            allow_text: false,
        }
    }

    pub fn allow_in(mut self, parent: impl Into<String>) -> Self {
        self.allow_in.push(parent.into());
        self
    }

    pub fn allow_content_of(mut self, item: impl Into<String>) -> Self {
        self.allow_content_of = Some(item.into());
        self
    }

    pub fn allow_text(mut self) -> Self {
        self.allow_text = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    items: HashMap<String, ItemDefinition>,
}

impl Schema {
    /// Schema with only the root registered
    pub fn new() -> Self {
        let mut items = HashMap::new();
        items.insert(ROOT_NAME.to_string(), ItemDefinition::new(ItemKind::Container));
        Self { items }
    }

    /// Register or replace an item definition
    pub fn register(&mut self, name: impl Into<String>, definition: ItemDefinition) {
        self.items.insert(name.into(), definition);
    }

    /// Register the `paragraph` block, allowed wherever root content is
    pub fn register_paragraph(&mut self) {
        self.register(
            PARAGRAPH,
            ItemDefinition::new(ItemKind::Block).allow_in(ROOT_NAME).allow_text(),
        );
    }

    pub fn definition(&self, name: &str) -> Option<&ItemDefinition> {
        self.items.get(name)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    pub fn is_block(&self, name: &str) -> bool {
        self.kind(name) == Some(ItemKind::Block)
    }

    pub fn is_limit(&self, name: &str) -> bool {
        self.kind(name) == Some(ItemKind::Limit)
    }

    pub fn kind(&self, name: &str) -> Option<ItemKind> {
        self.items.get(name).map(|definition| definition.kind)
    }

    /// Whether `child` may be a direct child of an element named `parent`
    pub fn check_child(&self, parent: &str, child: &Node) -> bool {
        let Some(parent_definition) = self.items.get(parent) else {
            return false;
        };

        match child {
            Node::Text(_) => parent_definition.allow_text,
            Node::Element(element) => {
                let Some(child_definition) = self.items.get(&element.name) else {
                    return false;
                };

                child_definition.allow_in.iter().any(|allowed| {
                    allowed == parent
                        || parent_definition.allow_content_of.as_deref() == Some(allowed.as_str())
                        || (allowed == ANY_BLOCK && parent_definition.kind == ItemKind::Block)
                })
            }
        }
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}
