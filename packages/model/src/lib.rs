//! # Trellis Model
//!
//! Editable document tree with transactional batches, post-fixers and undo.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Model::change(|writer| ...)                 │
//! │  - Writer applies invertible operations     │
//! │  - Differ records what changed              │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ post_fixer::fixed_point                     │
//! │  - Re-runs every registered post-fixer      │
//! │    until a full pass changes nothing        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ history: edit + corrections = one undo step │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Writer is the only mutation path**: every change is an operation with
//!    a recorded inverse
//! 2. **All-or-nothing batches**: a failing batch is rolled back completely
//! 3. **Identity by value**: nodes are addressed by `NodeId` or by paths
//!    resolved at call time, never by retained references
//!
//! ## Usage
//!
//! ```rust,ignore
//! use trellis_model::{Model, Path, Position, Schema};
//!
//! let mut schema = Schema::new();
//! schema.register_paragraph();
//!
//! let mut model = Model::with_schema(schema);
//! model.change(|writer| {
//!     writer.insert_element("paragraph", &Position::at(Path::root(), 0))?;
//!     Ok(())
//! })?;
//!
//! model.undo()?;
//! ```

mod config;
mod data;
mod differ;
mod document;
mod error;
mod history;
mod model;
mod node;
mod operation;
mod position;
mod post_fixer;
mod schema;
mod visitor;
mod writer;

pub use config::ModelConfig;
pub use data::{get_data, parse_data, set_data, stringify};
pub use differ::{Change, ChangeSet, ChangedNode, Differ};
pub use document::{Document, IdGenerator, ROOT_NAME};
pub use error::{ConfigError, DataError, DataResult, ModelError, ModelResult};
pub use history::{OperationBatch, UndoStack};
pub use model::Model;
pub use node::{Attributes, Element, Node, NodeId, Text, TEXT_NAME};
pub use operation::Operation;
pub use position::{Offset, Path, Position, Range};
pub use post_fixer::{
    fixed_point, post_fixer_fn, FnPostFixer, PostFixer, PostFixerHandle, PostFixerRegistry,
};
pub use schema::{ItemDefinition, ItemKind, Schema, PARAGRAPH};
pub use visitor::{walk_element, walk_node, Visitor};
pub use writer::{Transaction, Writer};
