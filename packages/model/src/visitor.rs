use crate::node::{Element, Node, Text};

/// Read-only pre-order traversal of the document tree.
///
/// The defaults descend into every element; implementors override the hooks
/// they care about and call `walk_element` to keep descending.
pub trait Visitor<'doc>: Sized {
    fn visit_element(&mut self, element: &'doc Element) {
        walk_element(self, element);
    }

    fn visit_text(&mut self, _text: &'doc Text) {
        // Leaf node, no children to walk
    }
}

pub fn walk_element<'doc, V: Visitor<'doc>>(visitor: &mut V, element: &'doc Element) {
    for child in &element.children {
        walk_node(visitor, child);
    }
}

pub fn walk_node<'doc, V: Visitor<'doc>>(visitor: &mut V, node: &'doc Node) {
    match node {
        Node::Element(element) => visitor.visit_element(element),
        Node::Text(text) => visitor.visit_text(text),
    }
}
