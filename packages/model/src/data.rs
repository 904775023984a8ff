//! # Markup Data Format
//!
//! Compact textual view of model content, used to load fixtures and to
//! inspect results:
//!
//! ```text
//! <table><tableRow><tableCell><paragraph>foo</paragraph></tableCell></tableRow></table>
//! ```
//!
//! - Elements are `<name key="value">...</name>` or `<name/>`
//! - Plain characters are text nodes
//! - Text with attributes is `<$text bold="true">...</$text>`
//!
//! There is no escaping: text cannot contain `<` or `>`, attribute values
//! cannot contain `"` or `>`.

use crate::error::{DataError, DataResult, ModelResult};
use crate::model::Model;
use crate::node::{Attributes, Element, Node, NodeId, Text, TEXT_NAME};
use crate::position::{Path, Range};
use logos::Logos;

/// Tokens outside of tags
#[derive(Logos, Debug, Clone, PartialEq)]
enum ContentToken<'src> {
    #[token("</")]
    CloseTagStart,

    #[token("<")]
    OpenTagStart,

    #[regex(r"[^<>]+", |lex| lex.slice())]
    Text(&'src str),
}

/// Tokens between `<` and `>`
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
enum TagToken<'src> {
    #[regex(r"[$a-zA-Z_][a-zA-Z0-9_:-]*", |lex| lex.slice())]
    Name(&'src str),

    #[token("=")]
    Equals,

    #[regex(r#""[^"]*""#, |lex| { let slice = lex.slice(); &slice[1..slice.len() - 1] })]
    Value(&'src str),

    #[token("/")]
    Slash,
}

#[derive(Debug, PartialEq)]
struct Tag<'src> {
    name: &'src str,
    attributes: Attributes,
    self_closing: bool,
}

enum Frame {
    Element(Element),
    Text(Attributes, String),
}

struct Parser<'src, F> {
    source: &'src str,
    allocate_id: F,
    stack: Vec<Frame>,
    nodes: Vec<Node>,
}

impl<'src, F> Parser<'src, F>
where
    F: FnMut() -> NodeId,
{
    fn parse(mut self) -> DataResult<Vec<Node>> {
        let mut lexer = ContentToken::lexer(self.source);

        while let Some(token) = lexer.next() {
            let span = lexer.span();
            let token = token.map_err(|_| DataError::lexer_error(span.start))?;

            match token {
                ContentToken::Text(data) => self.push_text(data),
                ContentToken::OpenTagStart | ContentToken::CloseTagStart => {
                    let interior_start = span.end;
                    let interior_len = self.source[interior_start..]
                        .find('>')
                        .ok_or_else(|| DataError::unexpected_eof(self.source.len()))?;
                    let tag = parse_tag(
                        &self.source[interior_start..interior_start + interior_len],
                        interior_start,
                    )?;

                    // Skip the tag interior and its closing '>'
                    lexer.bump(interior_len + 1);

                    if token == ContentToken::CloseTagStart {
                        self.close(tag, span.start)?;
                    } else {
                        self.open(tag, span.start)?;
                    }
                }
            }
        }

        match self.stack.last() {
            Some(_) => Err(DataError::unexpected_eof(self.source.len())),
            None => Ok(self.nodes),
        }
    }

    fn push_text(&mut self, data: &str) {
        match self.stack.last_mut() {
            Some(Frame::Text(_, buffer)) => buffer.push_str(data),
            Some(Frame::Element(element)) => element.children.push(Node::text(data)),
            None => self.nodes.push(Node::text(data)),
        }
    }

    fn push_node(&mut self, node: Node, pos: usize) -> DataResult<()> {
        match self.stack.last_mut() {
            Some(Frame::Text(..)) => Err(DataError::unexpected_token(pos, "text", node.name())),
            Some(Frame::Element(element)) => {
                element.children.push(node);
                Ok(())
            }
            None => {
                self.nodes.push(node);
                Ok(())
            }
        }
    }

    fn open(&mut self, tag: Tag<'_>, pos: usize) -> DataResult<()> {
        if tag.name == TEXT_NAME {
            if tag.self_closing {
                return Err(DataError::unexpected_token(pos, "text content", "/>"));
            }
            if matches!(self.stack.last(), Some(Frame::Text(..))) {
                return Err(DataError::unexpected_token(pos, "text", TEXT_NAME));
            }
            self.stack.push(Frame::Text(tag.attributes, String::new()));
            return Ok(());
        }

        let mut element = Element::new((self.allocate_id)(), tag.name);
        element.attributes = tag.attributes;

        if tag.self_closing {
            self.push_node(element.into(), pos)
        } else {
            if matches!(self.stack.last(), Some(Frame::Text(..))) {
                return Err(DataError::unexpected_token(pos, "text", tag.name));
            }
            self.stack.push(Frame::Element(element));
            Ok(())
        }
    }

    fn close(&mut self, tag: Tag<'_>, pos: usize) -> DataResult<()> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| DataError::unexpected_token(pos, "content", format!("</{}>", tag.name)))?;

        let node = match frame {
            Frame::Element(element) => {
                if element.name != tag.name {
                    return Err(DataError::mismatched_closing_tag(pos, element.name, tag.name));
                }
                Node::Element(element)
            }
            Frame::Text(attributes, data) => {
                if tag.name != TEXT_NAME {
                    return Err(DataError::mismatched_closing_tag(pos, TEXT_NAME, tag.name));
                }
                Node::Text(Text { data, attributes })
            }
        };

        self.push_node(node, pos)
    }
}

/// Parse a tag interior such as `tableCell colspan="2"` or `paragraph/`.
/// `offset` is the interior's position in the whole source.
fn parse_tag<'src>(interior: &'src str, offset: usize) -> DataResult<Tag<'src>> {
    let mut lexer = TagToken::lexer(interior);
    let mut next = || -> DataResult<Option<(TagToken<'src>, usize)>> {
        match lexer.next() {
            None => Ok(None),
            Some(Ok(token)) => Ok(Some((token, offset + lexer.span().start))),
            Some(Err(())) => Err(DataError::lexer_error(offset + lexer.span().start)),
        }
    };

    let name = match next()? {
        Some((TagToken::Name(name), _)) => name,
        Some((token, pos)) => return Err(DataError::unexpected_token(pos, "tag name", format!("{:?}", token))),
        None => return Err(DataError::unexpected_token(offset, "tag name", ">")),
    };

    let mut attributes = Attributes::new();
    let mut self_closing = false;

    while let Some((token, pos)) = next()? {
        match token {
            TagToken::Name(key) => {
                match next()? {
                    Some((TagToken::Equals, _)) => {}
                    Some((other, pos)) => {
                        return Err(DataError::unexpected_token(pos, "=", format!("{:?}", other)))
                    }
                    None => return Err(DataError::unexpected_token(offset + interior.len(), "=", ">")),
                }
                match next()? {
                    Some((TagToken::Value(value), _)) => {
                        attributes.insert(key.to_string(), value.to_string());
                    }
                    Some((other, pos)) => {
                        return Err(DataError::unexpected_token(pos, "quoted value", format!("{:?}", other)))
                    }
                    None => {
                        return Err(DataError::unexpected_token(offset + interior.len(), "quoted value", ">"))
                    }
                }
            }
            TagToken::Slash => {
                self_closing = true;
                if let Some((other, pos)) = next()? {
                    return Err(DataError::unexpected_token(pos, ">", format!("{:?}", other)));
                }
            }
            other => return Err(DataError::unexpected_token(pos, "attribute", format!("{:?}", other))),
        }
    }

    Ok(Tag {
        name,
        attributes,
        self_closing,
    })
}

/// Parse markup into detached nodes; `allocate_id` supplies element ids
pub fn parse_data<F>(source: &str, allocate_id: F) -> DataResult<Vec<Node>>
where
    F: FnMut() -> NodeId,
{
    Parser {
        source,
        allocate_id,
        stack: Vec::new(),
        nodes: Vec::new(),
    }
    .parse()
}

/// Render nodes to markup
pub fn stringify(nodes: &[Node]) -> String {
    let mut output = String::new();
    for node in nodes {
        write_node(node, &mut output);
    }
    output
}

fn write_node(node: &Node, output: &mut String) {
    match node {
        Node::Text(text) if text.attributes.is_empty() => output.push_str(&text.data),
        Node::Text(text) => {
            write_open_tag(TEXT_NAME, &text.attributes, output);
            output.push_str(&text.data);
            write_close_tag(TEXT_NAME, output);
        }
        Node::Element(element) => {
            write_open_tag(&element.name, &element.attributes, output);
            for child in &element.children {
                write_node(child, output);
            }
            write_close_tag(&element.name, output);
        }
    }
}

fn write_open_tag(name: &str, attributes: &Attributes, output: &mut String) {
    output.push('<');
    output.push_str(name);
    for (key, value) in attributes {
        output.push(' ');
        output.push_str(key);
        output.push_str("=\"");
        output.push_str(value);
        output.push('"');
    }
    output.push('>');
}

fn write_close_tag(name: &str, output: &mut String) {
    output.push_str("</");
    output.push_str(name);
    output.push('>');
}

/// Markup of the whole root content
pub fn get_data(model: &Model) -> String {
    stringify(&model.document().root().children)
}

/// Replace the root content with parsed markup.
///
/// Runs as a transparent batch, so post-fixers repair the loaded content, and
/// clears history since earlier steps no longer apply.
pub fn set_data(model: &mut Model, source: &str) -> ModelResult<()> {
    model.change_transparent(|writer| {
        let nodes = parse_data(source, || writer.allocate_id())?;
        writer.remove(&Range::in_element(Path::root()))?;
        writer.insert_into(NodeId::ROOT, 0, nodes)
    })?;

    model.clear_history();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::IdGenerator;
    use crate::schema::Schema;

    fn parse(source: &str) -> DataResult<Vec<Node>> {
        let mut ids = IdGenerator::new();
        parse_data(source, || ids.new_id())
    }

    #[test]
    fn test_parse_nested_elements() {
        let nodes = parse("<table><tableRow><tableCell><paragraph>foo</paragraph></tableCell></tableRow></table>")
            .unwrap();

        assert_eq!(nodes.len(), 1);
        let table = nodes[0].as_element().unwrap();
        assert_eq!(table.name, "table");
        assert_eq!(table.id, NodeId(1));
        assert_eq!(table.text_content(), "foo");
    }

    #[test]
    fn test_parse_text_directly_in_cell() {
        let nodes = parse("<tableCell>foo<paragraph>bar</paragraph>baz</tableCell>").unwrap();
        let cell = nodes[0].as_element().unwrap();

        assert_eq!(cell.child_count(), 3);
        assert!(cell.children[0].is_text());
        assert_eq!(cell.children[1].name(), "paragraph");
        assert!(cell.children[2].is_text());
    }

    #[test]
    fn test_parse_attributes_and_self_closing() {
        let nodes = parse(r#"<table headingRows="1"><tableRow/></table>"#).unwrap();
        let table = nodes[0].as_element().unwrap();

        assert_eq!(table.attributes.get("headingRows").map(String::as_str), Some("1"));
        assert_eq!(table.children[0].name(), "tableRow");
        assert!(table.children[0].as_element().unwrap().is_empty());
    }

    #[test]
    fn test_parse_attributed_text() {
        let nodes = parse(r#"<paragraph>a<$text bold="true">b</$text></paragraph>"#).unwrap();
        let paragraph = nodes[0].as_element().unwrap();
        let bold = paragraph.children[1].as_text().unwrap();

        assert_eq!(bold.data, "b");
        assert_eq!(bold.attributes.get("bold").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_stringify_matches_source() {
        let source = r#"<table headingRows="1"><tableRow><tableCell><paragraph>a<$text bold="true">b</$text></paragraph></tableCell></tableRow></table>"#;
        assert_eq!(stringify(&parse(source).unwrap()), source);
    }

    #[test]
    fn test_stringify_empty_element_uses_explicit_close() {
        assert_eq!(stringify(&parse("<paragraph/>").unwrap()), "<paragraph></paragraph>");
    }

    #[test]
    fn test_mismatched_closing_tag() {
        let result = parse("<tableCell></tableRow>");
        assert_eq!(
            result,
            Err(DataError::mismatched_closing_tag(11, "tableCell", "tableRow"))
        );
    }

    #[test]
    fn test_unclosed_element() {
        assert_eq!(parse("<paragraph>foo"), Err(DataError::unexpected_eof(14)));
    }

    #[test]
    fn test_unterminated_tag() {
        assert_eq!(parse("<paragraph"), Err(DataError::unexpected_eof(10)));
    }

    #[test]
    fn test_stray_closing_tag() {
        assert!(matches!(parse("</paragraph>"), Err(DataError::UnexpectedToken { pos: 0, .. })));
    }

    #[test]
    fn test_attribute_without_value() {
        assert!(matches!(
            parse("<table headingRows></table>"),
            Err(DataError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_set_data_replaces_content_and_clears_history() {
        let mut schema = Schema::new();
        schema.register_paragraph();
        let mut model = Model::with_schema(schema);

        model
            .change(|writer| writer.insert_text("x", &crate::position::Position::at(Path::root(), 0)))
            .unwrap();
        assert!(model.can_undo());

        set_data(&mut model, "<paragraph>foo</paragraph><paragraph>bar</paragraph>").unwrap();
        assert_eq!(get_data(&model), "<paragraph>foo</paragraph><paragraph>bar</paragraph>");
        assert!(!model.can_undo());
    }

    #[test]
    fn test_set_data_error_keeps_previous_content() {
        let mut model = Model::with_schema(Schema::new());
        set_data(&mut model, "<paragraph>foo</paragraph>").unwrap();

        let result = set_data(&mut model, "<paragraph>bar");
        assert!(result.is_err());
        assert_eq!(get_data(&model), "<paragraph>foo</paragraph>");
    }
}
