//! Error types for the model

use crate::node::NodeId;
use crate::position::Path;
use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

pub type DataResult<T> = Result<T, DataError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Parent not found: {0}")]
    ParentNotFound(NodeId),

    #[error("No element at path {0}")]
    InvalidPath(Path),

    #[error("Offset {offset} out of bounds in {parent} ({len} children)")]
    InvalidOffset {
        parent: NodeId,
        offset: usize,
        len: usize,
    },

    #[error("Node {0} is already in the document")]
    DuplicateId(NodeId),

    #[error("Would create cycle")]
    CycleDetected,

    #[error("Post-fixers did not converge after {passes} passes")]
    PostFixersDidNotConverge { passes: usize },

    #[error("Post-fixer '{name}' failed: {source}")]
    PostFixer {
        name: String,
        #[source]
        source: Box<ModelError>,
    },

    #[error("Data error: {0}")]
    Data(#[from] DataError),
}

/// Errors raised while reading the markup data format
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Unexpected token at {pos}: expected {expected}, found {found}")]
    UnexpectedToken {
        pos: usize,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of input at {pos}")]
    UnexpectedEof { pos: usize },

    #[error("Mismatched closing tag at {pos}: expected </{expected}>, found </{found}>")]
    MismatchedClosingTag {
        pos: usize,
        expected: String,
        found: String,
    },

    #[error("Lexer error at {pos}")]
    LexerError { pos: usize },
}

impl DataError {
    pub fn unexpected_token(pos: usize, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedToken {
            pos,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unexpected_eof(pos: usize) -> Self {
        Self::UnexpectedEof { pos }
    }

    pub fn mismatched_closing_tag(
        pos: usize,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::MismatchedClosingTag {
            pos,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn lexer_error(pos: usize) -> Self {
        Self::LexerError { pos }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}
