//! # Model
//!
//! Owns the document, schema, post-fixers and history, and runs batches.
//!
//! ## Lifecycle of a batch
//!
//! ```text
//! change(f) → f(writer) → fixed_point(post-fixers) → commit
//!                 ↓ error            ↓ error
//!              rollback           rollback
//! ```
//!
//! A committed batch (edit + every post-fixer correction) becomes a single
//! undo step. A failed batch leaves the document exactly as it was.

use crate::config::ModelConfig;
use crate::document::Document;
use crate::error::ModelResult;
use crate::history::UndoStack;
use crate::post_fixer::{fixed_point, PostFixer, PostFixerHandle, PostFixerRegistry};
use crate::schema::Schema;
use crate::writer::{Transaction, Writer};
use tracing::{debug, error, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchKind {
    /// Recorded in history
    Default,
    /// Not recorded (data loading)
    Transparent,
}

#[derive(Debug)]
pub struct Model {
    document: Document,
    schema: Schema,
    post_fixers: PostFixerRegistry,
    history: UndoStack,
    config: ModelConfig,

    /// Current version number (increments on each committed batch, undo and redo)
    pub version: u64,
}

impl Model {
    pub fn new(schema: Schema, config: ModelConfig) -> Self {
        Self {
            document: Document::new(),
            schema,
            post_fixers: PostFixerRegistry::new(),
            history: UndoStack::with_max_levels(config.history_depth),
            config,
            version: 0,
        }
    }

    pub fn with_schema(schema: Schema) -> Self {
        Self::new(schema, ModelConfig::default())
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn schema_mut(&mut self) -> &mut Schema {
        &mut self.schema
    }

    pub fn register_post_fixer(&mut self, fixer: Box<dyn PostFixer>) -> PostFixerHandle {
        self.post_fixers.register(fixer)
    }

    pub fn deregister_post_fixer(&mut self, handle: PostFixerHandle) -> bool {
        self.post_fixers.deregister(handle)
    }

    /// Run an undoable batch
    pub fn change<T, F>(&mut self, f: F) -> ModelResult<T>
    where
        F: FnOnce(&mut Writer<'_>) -> ModelResult<T>,
    {
        self.run_batch(BatchKind::Default, None, f)
    }

    /// Run an undoable batch with a history description
    pub fn change_with_description<T, F>(&mut self, description: &str, f: F) -> ModelResult<T>
    where
        F: FnOnce(&mut Writer<'_>) -> ModelResult<T>,
    {
        self.run_batch(BatchKind::Default, Some(description), f)
    }

    /// Run a batch that is not recorded in history
    pub fn change_transparent<T, F>(&mut self, f: F) -> ModelResult<T>
    where
        F: FnOnce(&mut Writer<'_>) -> ModelResult<T>,
    {
        self.run_batch(BatchKind::Transparent, None, f)
    }

    #[instrument(skip(self, f), fields(version = self.version))]
    fn run_batch<T, F>(&mut self, kind: BatchKind, description: Option<&str>, f: F) -> ModelResult<T>
    where
        F: FnOnce(&mut Writer<'_>) -> ModelResult<T>,
    {
        let mut transaction = Transaction::new();

        match self.apply_batch(&mut transaction, f) {
            Ok(value) => {
                self.commit(kind, description, transaction);
                Ok(value)
            }
            Err(err) => {
                warn!(error = %err, "Batch failed, rolling back");
                if let Err(rollback_err) = transaction.rollback(&mut self.document) {
                    error!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    fn apply_batch<T, F>(&mut self, transaction: &mut Transaction, f: F) -> ModelResult<T>
    where
        F: FnOnce(&mut Writer<'_>) -> ModelResult<T>,
    {
        let value = {
            let mut writer = Writer::new(&mut self.document, &self.schema, transaction);
            f(&mut writer)?
        };

        let passes = fixed_point(
            &self.post_fixers,
            &mut self.document,
            &self.schema,
            transaction,
            &self.config,
        )?;
        debug!(passes, changes = transaction.differ().len(), "Post-fixers converged");

        Ok(value)
    }

    fn commit(&mut self, kind: BatchKind, description: Option<&str>, transaction: Transaction) {
        if transaction.is_empty() {
            return;
        }

        self.version += 1;

        if kind == BatchKind::Default {
            let mut batch = transaction.into_batch();
            batch.description = description.map(str::to_string);
            debug!(operations = batch.len(), version = self.version, "Committed batch");
            self.history.push(batch);
        }
    }

    /// Undo the most recent batch
    pub fn undo(&mut self) -> ModelResult<bool> {
        let undone = self.history.undo(&mut self.document)?;
        if undone {
            self.version += 1;
        }
        Ok(undone)
    }

    /// Redo the most recently undone batch
    pub fn redo(&mut self) -> ModelResult<bool> {
        let redone = self.history.redo(&mut self.document)?;
        if redone {
            self.version += 1;
        }
        Ok(redone)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_levels(&self) -> usize {
        self.history.undo_levels()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.history.undo_description()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
