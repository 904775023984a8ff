//! # Post-Fixer System
//!
//! Post-fixers repair structural invariants after a batch of changes.
//!
//! ## Design
//!
//! After the user callback of `Model::change` returns, the registered
//! post-fixers run in registration order. Each one sees the cumulative
//! change-set of the batch (including corrections made by fixers before it)
//! and writes its corrections into the same batch. Passes repeat until a full
//! pass reports no change, so the batch reaches a fixed point before it is
//! committed.
//!
//! Post-fixers are:
//! - **Idempotent**: a state they consider valid produces no corrections
//! - **Cooperative**: none may assume it is the last or only fixer to run
//! - **Local**: they only touch the document through the writer

use crate::config::ModelConfig;
use crate::differ::ChangeSet;
use crate::document::Document;
use crate::error::{ModelError, ModelResult};
use crate::schema::Schema;
use crate::writer::{Transaction, Writer};
use tracing::{debug, instrument};

pub trait PostFixer: std::fmt::Debug {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Inspect the batch's changes, write corrections, and report whether
    /// anything was changed
    fn fix(&self, changes: &ChangeSet, writer: &mut Writer<'_>) -> ModelResult<bool>;
}

/// Post-fixer backed by a closure
pub struct FnPostFixer<F> {
    name: String,
    callback: F,
}

impl<F> std::fmt::Debug for FnPostFixer<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnPostFixer").field("name", &self.name).finish()
    }
}

impl<F> PostFixer for FnPostFixer<F>
where
    F: Fn(&ChangeSet, &mut Writer<'_>) -> ModelResult<bool>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn fix(&self, changes: &ChangeSet, writer: &mut Writer<'_>) -> ModelResult<bool> {
        (self.callback)(changes, writer)
    }
}

pub fn post_fixer_fn<F>(name: impl Into<String>, callback: F) -> FnPostFixer<F>
where
    F: Fn(&ChangeSet, &mut Writer<'_>) -> ModelResult<bool>,
{
    FnPostFixer {
        name: name.into(),
        callback,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PostFixerHandle(u64);

/// Ordered set of registered post-fixers
#[derive(Debug, Default)]
pub struct PostFixerRegistry {
    fixers: Vec<(PostFixerHandle, Box<dyn PostFixer>)>,
    next_handle: u64,
}

impl PostFixerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, fixer: Box<dyn PostFixer>) -> PostFixerHandle {
        self.next_handle += 1;
        let handle = PostFixerHandle(self.next_handle);
        debug!(fixer = fixer.name(), "Registering post-fixer");
        self.fixers.push((handle, fixer));
        handle
    }

    /// Remove a post-fixer; returns false if the handle is unknown
    pub fn deregister(&mut self, handle: PostFixerHandle) -> bool {
        let before = self.fixers.len();
        self.fixers.retain(|(registered, _)| *registered != handle);
        self.fixers.len() != before
    }

    pub fn len(&self) -> usize {
        self.fixers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn PostFixer> {
        self.fixers.iter().map(|(_, fixer)| fixer.as_ref())
    }
}

/// Run all post-fixers until a full pass changes nothing.
///
/// Returns the number of passes that made corrections. Only those count
/// against `max_post_fixer_passes`; the final pass that changes nothing is
/// always allowed. Exceeding the cap means some fixer keeps undoing another's
/// work, which is reported as an error and the caller rolls the batch back.
#[instrument(skip_all, fields(fixers = registry.len()))]
pub fn fixed_point(
    registry: &PostFixerRegistry,
    document: &mut Document,
    schema: &Schema,
    transaction: &mut Transaction,
    config: &ModelConfig,
) -> ModelResult<usize> {
    let mut passes = 0;

    loop {
        let mut changed = false;

        for fixer in registry.iter() {
            let changes = transaction.differ().change_set();
            let mut writer = Writer::new(document, schema, transaction);

            let fixed = fixer.fix(&changes, &mut writer).map_err(|source| ModelError::PostFixer {
                name: fixer.name().to_string(),
                source: Box::new(source),
            })?;

            if fixed {
                debug!(fixer = fixer.name(), pass = passes + 1, "Post-fixer applied corrections");
                changed = true;
            }
        }

        if !changed {
            return Ok(passes);
        }

        passes += 1;
        if passes > config.max_post_fixer_passes {
            return Err(ModelError::PostFixersDidNotConverge { passes });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeId;
    use crate::position::{Path, Position};
    use std::cell::Cell;

    fn run(registry: &PostFixerRegistry, config: &ModelConfig) -> (Document, ModelResult<usize>) {
        let mut document = Document::new();
        let schema = Schema::new();
        let mut transaction = Transaction::new();
        let result = fixed_point(registry, &mut document, &schema, &mut transaction, config);
        (document, result)
    }

    #[test]
    fn test_registry_register_and_deregister() {
        let mut registry = PostFixerRegistry::new();
        let handle = registry.register(Box::new(post_fixer_fn("noop", |_, _| Ok(false))));
        assert_eq!(registry.len(), 1);

        assert!(registry.deregister(handle));
        assert!(!registry.deregister(handle));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_no_fixers_converges_immediately() {
        let (_, result) = run(&PostFixerRegistry::new(), &ModelConfig::default());
        assert_eq!(result, Ok(0));
    }

    #[test]
    fn test_reruns_until_no_corrections() {
        let mut registry = PostFixerRegistry::new();
        let calls = std::rc::Rc::new(Cell::new(0));
        let counter = calls.clone();

        // Fills the root up to three children, one per pass
        registry.register(Box::new(post_fixer_fn("fill", move |_, writer| {
            counter.set(counter.get() + 1);
            if writer.document().root().child_count() < 3 {
                writer.insert_text("x", &Position::at_end(Path::root()))?;
                return Ok(true);
            }
            Ok(false)
        })));

        let (document, result) = run(&registry, &ModelConfig::default());
        assert_eq!(result, Ok(3));
        assert_eq!(document.root().child_count(), 3);
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn test_later_fixer_sees_earlier_corrections() {
        let mut registry = PostFixerRegistry::new();
        registry.register(Box::new(post_fixer_fn("first", |changes, writer| {
            if changes.is_empty() {
                writer.insert_text("a", &Position::at_end(Path::root()))?;
                return Ok(true);
            }
            Ok(false)
        })));

        let seen = std::rc::Rc::new(Cell::new(0));
        let observed = seen.clone();
        registry.register(Box::new(post_fixer_fn("second", move |changes, _| {
            observed.set(observed.get().max(changes.len()));
            Ok(false)
        })));

        let (_, result) = run(&registry, &ModelConfig::default());
        assert_eq!(result, Ok(1));
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn test_non_converging_fixers_are_reported() {
        let mut registry = PostFixerRegistry::new();
        registry.register(Box::new(post_fixer_fn("forever", |_, writer| {
            writer.insert_text("x", &Position::at(Path::root(), 0))?;
            Ok(true)
        })));

        let config = ModelConfig {
            max_post_fixer_passes: 5,
            ..ModelConfig::default()
        };
        let (_, result) = run(&registry, &config);
        assert_eq!(result, Err(ModelError::PostFixersDidNotConverge { passes: 6 }));
    }

    #[test]
    fn test_single_pass_cap_allows_one_correction() {
        let mut registry = PostFixerRegistry::new();
        registry.register(Box::new(post_fixer_fn("once", |_, writer| {
            if writer.document().root().is_empty() {
                writer.insert_text("x", &Position::at(Path::root(), 0))?;
                return Ok(true);
            }
            Ok(false)
        })));

        let config = ModelConfig {
            max_post_fixer_passes: 1,
            ..ModelConfig::default()
        };
        let (document, result) = run(&registry, &config);
        assert_eq!(result, Ok(1));
        assert_eq!(document.root().text_content(), "x");
    }

    #[test]
    fn test_fixer_errors_carry_fixer_name() {
        let mut registry = PostFixerRegistry::new();
        registry.register(Box::new(post_fixer_fn("broken", |_, writer| {
            writer.remove_children(NodeId(99), 0, 1)?;
            Ok(true)
        })));

        let (_, result) = run(&registry, &ModelConfig::default());
        assert_eq!(
            result,
            Err(ModelError::PostFixer {
                name: "broken".to_string(),
                source: Box::new(ModelError::ParentNotFound(NodeId(99))),
            })
        );
    }
}
