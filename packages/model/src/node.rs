//! Document tree nodes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name the schema and the data format use for text nodes
pub const TEXT_NAME: &str = "$text";

pub type Attributes = BTreeMap<String, String>;

/// Stable element identity, allocated by the document and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node is either an element or a run of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Element(Element),
    Text(Text),
}

impl Node {
    pub fn text(data: impl Into<String>) -> Self {
        Node::Text(Text::new(data))
    }

    /// Element name, or `$text` for text nodes
    pub fn name(&self) -> &str {
        match self {
            Node::Element(element) => &element.name,
            Node::Text(_) => TEXT_NAME,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn element_id(&self) -> Option<NodeId> {
        self.as_element().map(|element| element.id)
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}

/// Named element with attributes and ordered children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    /// Whether `id` is this element or one of its descendants
    pub fn contains(&self, id: NodeId) -> bool {
        self.find(id).is_some()
    }

    /// Find this element or a descendant by id
    pub fn find(&self, id: NodeId) -> Option<&Element> {
        if self.id == id {
            return Some(self);
        }

        self.children
            .iter()
            .filter_map(Node::as_element)
            .find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        if self.id == id {
            return Some(self);
        }

        self.children
            .iter_mut()
            .filter_map(Node::as_element_mut)
            .find_map(|child| child.find_mut(id))
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self) -> String {
        let mut content = String::new();
        for child in &self.children {
            match child {
                Node::Text(text) => content.push_str(&text.data),
                Node::Element(element) => content.push_str(&element.text_content()),
            }
        }
        content
    }
}

/// Run of characters with optional formatting attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub data: String,
    #[serde(default)]
    pub attributes: Attributes,
}

impl Text {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            attributes: Attributes::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.data.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        let mut paragraph = Element::new(NodeId(2), "paragraph");
        paragraph.children.push(Node::text("foo"));

        Element::new(NodeId(1), "tableCell").with_children(vec![
            paragraph.into(),
            Text::new("bar").with_attribute("bold", "true").into(),
        ])
    }

    #[test]
    fn test_find_descendant() {
        let cell = sample();
        assert_eq!(cell.find(NodeId(2)).map(|e| e.name.as_str()), Some("paragraph"));
        assert!(cell.contains(NodeId(1)));
        assert!(!cell.contains(NodeId(3)));
    }

    #[test]
    fn test_text_content_concatenates_in_order() {
        assert_eq!(sample().text_content(), "foobar");
    }

    #[test]
    fn test_node_names() {
        let cell = sample();
        assert_eq!(cell.children[0].name(), "paragraph");
        assert_eq!(cell.children[1].name(), TEXT_NAME);
        assert!(cell.children[1].is_text());
    }

    #[test]
    fn test_node_serialization() {
        let node = Node::from(sample());
        let json = serde_json::to_string(&node).unwrap();
        let deserialized: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(node, deserialized);
    }
}
