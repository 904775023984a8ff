//! Paths, positions and ranges.
//!
//! These are plain values resolved against the document when a writer method
//! is called. They are never cached across batches because the tree shifts
//! underneath them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Child indices from the root down to a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<usize>);

impl Path {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn child(&self, index: usize) -> Path {
        let mut indices = self.0.clone();
        indices.push(index);
        Path(indices)
    }

    /// Parent path and this node's index in it; `None` for the root
    pub fn split_last(&self) -> Option<(Path, usize)> {
        let (last, rest) = self.0.split_last()?;
        Some((Path(rest.to_vec()), *last))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<Vec<usize>> for Path {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl From<&[usize]> for Path {
    fn from(indices: &[usize]) -> Self {
        Self(indices.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Path {
    fn from(indices: [usize; N]) -> Self {
        Self(indices.to_vec())
    }
}

/// Child offset inside a parent; `End` resolves to the child count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Offset {
    At(usize),
    End,
}

impl Offset {
    pub fn resolve(self, len: usize) -> usize {
        match self {
            Offset::At(offset) => offset,
            Offset::End => len,
        }
    }
}

/// Insertion point: an offset inside the element at `parent`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub parent: Path,
    pub offset: Offset,
}

impl Position {
    pub fn at(parent: impl Into<Path>, offset: usize) -> Self {
        Self {
            parent: parent.into(),
            offset: Offset::At(offset),
        }
    }

    pub fn at_end(parent: impl Into<Path>) -> Self {
        Self {
            parent: parent.into(),
            offset: Offset::End,
        }
    }

    /// Position right after the node at `path`. The root has no siblings,
    /// so a root path yields the end of the root.
    pub fn after(path: impl Into<Path>) -> Self {
        let path = path.into();
        match path.split_last() {
            Some((parent, index)) => Self::at(parent, index + 1),
            None => Self::at_end(Path::root()),
        }
    }

    pub fn before(path: impl Into<Path>) -> Self {
        let path = path.into();
        match path.split_last() {
            Some((parent, index)) => Self::at(parent, index),
            None => Self::at(Path::root(), 0),
        }
    }
}

/// Flat range of children `[start, end)` inside one parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub parent: Path,
    pub start: usize,
    pub end: Offset,
}

impl Range {
    pub fn new(parent: impl Into<Path>, start: usize, end: usize) -> Self {
        Self {
            parent: parent.into(),
            start,
            end: Offset::At(end),
        }
    }

    /// All children of the element at `path`
    pub fn in_element(path: impl Into<Path>) -> Self {
        Self {
            parent: path.into(),
            start: 0,
            end: Offset::End,
        }
    }

    /// Just the node at `path`
    pub fn on(path: impl Into<Path>) -> Option<Self> {
        let (parent, index) = path.into().split_last()?;
        Some(Self::new(parent, index, index + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_after_node() {
        let position = Position::after([0, 0]);
        assert_eq!(position.parent, Path::from([0]));
        assert_eq!(position.offset, Offset::At(1));
    }

    #[test]
    fn test_range_on_root_is_none() {
        assert!(Range::on(Path::root()).is_none());
        assert_eq!(Range::on([0, 2]), Some(Range::new([0], 2, 3)));
    }

    #[test]
    fn test_offset_end_resolves_to_len() {
        assert_eq!(Offset::End.resolve(4), 4);
        assert_eq!(Offset::At(1).resolve(4), 1);
    }

    #[test]
    fn test_path_display() {
        assert_eq!(Path::from([0, 1, 2]).to_string(), "[0, 1, 2]");
    }
}
