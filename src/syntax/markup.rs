//! Template block sub-parser: builds an ordered markup tree.
//!
//! The reader is configured to be tolerant of HTML-like input: end-name
//! checks are disabled, unmatched closing tags are dropped, and elements
//! left open at the end of input are closed implicitly. Attribute
//! insertion order and child source order are preserved since consumers
//! that re-serialize depend on both.

use crate::syntax::SyntaxError;
use compact_str::CompactString;
use quick_xml::{Reader, events::BytesStart, events::Event};

/// Tag name that always marks a client-side island.
pub const RSX_CLIENT_TAG_NAME: &str = "rsx";

/// Element id of the embedded server props script in rendered output.
pub const RSX_SERVER_PROPS_ID: &str = "__rsx_script__";

/// Attribute directives that turn any element into a client island.
pub const CLIENT_DIRECTIVES: &[&str] = &[
    "client:load",
    "client:idle",
    "client:visible",
    "client:media",
    "client:only",
];

/// Directive replacing an element's content with raw markup.
pub const SET_HTML_DIRECTIVE: &str = "set:html";
/// Directive replacing an element's content with escaped text.
pub const SET_TEXT_DIRECTIVE: &str = "set:text";

/// A parsed template block.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupTree {
    pub roots: Vec<MarkupNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkupNode {
    Element(MarkupElement),
    Text(String),
    Comment(String),
}

/// Element with attributes in insertion order and children in source
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupElement {
    pub name: CompactString,
    pub attrs: Vec<(CompactString, String)>,
    pub children: Vec<MarkupNode>,
}

impl MarkupElement {
    /// First value of the named attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The first `client:*` directive present on this element.
    pub fn client_directive(&self) -> Option<&str> {
        self.attrs
            .iter()
            .map(|(key, _)| key.as_str())
            .find(|key| CLIENT_DIRECTIVES.contains(key))
    }

    /// Whether this element is hydrated on the client, either through
    /// the dedicated tag name or a `client:*` directive.
    pub fn is_island(&self) -> bool {
        self.name == RSX_CLIENT_TAG_NAME || self.client_directive().is_some()
    }
}

impl MarkupTree {
    /// All client islands in the tree, in document order.
    pub fn islands(&self) -> Vec<&MarkupElement> {
        fn walk<'a>(nodes: &'a [MarkupNode], out: &mut Vec<&'a MarkupElement>) {
            for node in nodes {
                if let MarkupNode::Element(element) = node {
                    if element.is_island() {
                        out.push(element);
                    }
                    walk(&element.children, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.roots, &mut out);
        out
    }
}

#[inline]
fn create_markup_reader(content: &[u8]) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(content);
    reader.config_mut().trim_text(false);
    reader.config_mut().enable_all_checks(false);
    reader
}

fn element_from(elem: &BytesStart<'_>) -> MarkupElement {
    let name = CompactString::from(String::from_utf8_lossy(elem.name().as_ref()).as_ref());
    let mut attrs = Vec::new();
    // html_attributes tolerates bare and unquoted attributes, which the
    // client directives rely on
    for attr in elem.html_attributes().flatten() {
        let key = CompactString::from(String::from_utf8_lossy(attr.key.as_ref()).as_ref());
        let value = attr
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        attrs.push((key, value));
    }
    MarkupElement {
        name,
        attrs,
        children: Vec::new(),
    }
}

fn push_node(stack: &mut [MarkupElement], roots: &mut Vec<MarkupNode>, node: MarkupNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}

/// Parse a template block into a [`MarkupTree`].
///
/// Errors carry a span at the reader's failure position, relative to
/// `source`. Whitespace-only text nodes are skipped.
pub fn parse(source: &str) -> Result<MarkupTree, SyntaxError> {
    let mut reader = create_markup_reader(source.as_bytes());
    let mut roots = Vec::new();
    let mut stack: Vec<MarkupElement> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(elem)) => stack.push(element_from(&elem)),
            Ok(Event::Empty(elem)) => {
                let element = element_from(&elem);
                push_node(&mut stack, &mut roots, MarkupNode::Element(element));
            }
            Ok(Event::End(elem)) => {
                let qname = elem.name();
                let name = String::from_utf8_lossy(qname.as_ref());
                // Close the innermost matching open element; a closing
                // tag with no open counterpart is dropped.
                let Some(matching) = stack.iter().rposition(|open| open.name == name.as_ref())
                else {
                    continue;
                };
                while stack.len() > matching + 1 {
                    let implicit = stack.pop().expect("stack length checked");
                    push_node(&mut stack, &mut roots, MarkupNode::Element(implicit));
                }
                let element = stack.pop().expect("matching index in range");
                push_node(&mut stack, &mut roots, MarkupNode::Element(element));
            }
            Ok(Event::Text(text)) => {
                let content = text
                    .unescape()
                    .map(|t| t.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&text).into_owned());
                if !content.trim().is_empty() {
                    push_node(&mut stack, &mut roots, MarkupNode::Text(content));
                }
            }
            Ok(Event::CData(data)) => {
                let content = String::from_utf8_lossy(&data).into_owned();
                push_node(&mut stack, &mut roots, MarkupNode::Text(content));
            }
            Ok(Event::Comment(comment)) => {
                let content = String::from_utf8_lossy(&comment).into_owned();
                push_node(&mut stack, &mut roots, MarkupNode::Comment(content));
            }
            Ok(Event::Eof) => break,
            // Declarations and processing instructions carry nothing the
            // tree consumers use
            Ok(_) => {}
            Err(e) => {
                let pos = reader.error_position() as usize;
                return Err(SyntaxError::new(
                    pos..pos,
                    format!("markup parse error: {e}"),
                ));
            }
        }
    }

    // Elements still open at end of input are closed implicitly
    while let Some(element) = stack.pop() {
        push_node(&mut stack, &mut roots, MarkupNode::Element(element));
    }

    Ok(MarkupTree { roots })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_element(tree: &MarkupTree) -> &MarkupElement {
        tree.roots
            .iter()
            .find_map(|node| match node {
                MarkupNode::Element(element) => Some(element),
                _ => None,
            })
            .expect("tree should contain an element")
    }

    #[test]
    fn test_attribute_insertion_order_preserved() {
        let tree = parse(r#"<div b="2" a="1" c="3"></div>"#).unwrap();
        let div = first_element(&tree);
        let keys: Vec<&str> = div.attrs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_child_source_order_preserved() {
        let tree = parse("<ul><li>one</li><li>two</li><li>three</li></ul>").unwrap();
        let ul = first_element(&tree);
        assert_eq!(ul.children.len(), 3);
        for (child, expected) in ul.children.iter().zip(["one", "two", "three"]) {
            match child {
                MarkupNode::Element(li) => {
                    assert_eq!(li.name, "li");
                    assert_eq!(li.children, vec![MarkupNode::Text(expected.to_string())]);
                }
                other => panic!("expected element, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_nested_elements_and_text() {
        let tree = parse("<main><h1>Title</h1><p>Body <b>bold</b> tail</p></main>").unwrap();
        let main = first_element(&tree);
        assert_eq!(main.name, "main");
        assert_eq!(main.children.len(), 2);

        match &main.children[1] {
            MarkupNode::Element(p) => {
                assert_eq!(p.children.len(), 3);
                assert!(matches!(&p.children[0], MarkupNode::Text(t) if t == "Body "));
                assert!(matches!(&p.children[1], MarkupNode::Element(b) if b.name == "b"));
                assert!(matches!(&p.children[2], MarkupNode::Text(t) if t == " tail"));
            }
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn test_self_closing_element() {
        let tree = parse(r#"<div><img src="a.png"/></div>"#).unwrap();
        let div = first_element(&tree);
        match &div.children[0] {
            MarkupNode::Element(img) => {
                assert_eq!(img.name, "img");
                assert_eq!(img.attr("src"), Some("a.png"));
                assert!(img.children.is_empty());
            }
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn test_unmatched_closing_tag_dropped() {
        let tree = parse("<div>text</span></div>").unwrap();
        assert_eq!(tree.roots.len(), 1);
        let div = first_element(&tree);
        assert_eq!(div.children, vec![MarkupNode::Text("text".to_string())]);
    }

    #[test]
    fn test_unclosed_elements_closed_implicitly() {
        let tree = parse("<div><span>hi").unwrap();
        let div = first_element(&tree);
        assert_eq!(div.name, "div");
        match &div.children[0] {
            MarkupNode::Element(span) => {
                assert_eq!(span.name, "span");
                assert_eq!(span.children, vec![MarkupNode::Text("hi".to_string())]);
            }
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn test_entities_unescaped_in_text() {
        let tree = parse("<p>a &amp; b</p>").unwrap();
        let p = first_element(&tree);
        assert_eq!(p.children, vec![MarkupNode::Text("a & b".to_string())]);
    }

    #[test]
    fn test_malformed_input_reports_position() {
        let source = "<div><!-- never closed";
        let err = parse(source).unwrap_err();
        assert!(err.message.contains("markup parse error"));
        assert!(err.span.start <= source.len());
    }

    #[test]
    fn test_comment_node() {
        let tree = parse("<div><!-- note --></div>").unwrap();
        let div = first_element(&tree);
        assert_eq!(div.children.len(), 1);
        assert!(matches!(&div.children[0], MarkupNode::Comment(c) if c.contains("note")));
    }

    #[test]
    fn test_islands_by_tag_and_directive() {
        let tree = parse(
            r#"<main><rsx src="counter"></rsx><div client:visible>lazy</div><p>static</p></main>"#,
        )
        .unwrap();
        let islands = tree.islands();
        assert_eq!(islands.len(), 2);
        assert_eq!(islands[0].name, "rsx");
        assert!(islands[0].is_island());
        assert_eq!(islands[1].client_directive(), Some("client:visible"));
    }

    #[test]
    fn test_directive_constants() {
        assert!(CLIENT_DIRECTIVES.contains(&"client:load"));
        assert!(CLIENT_DIRECTIVES.contains(&"client:only"));
        assert_eq!(SET_HTML_DIRECTIVE, "set:html");
        assert_eq!(SET_TEXT_DIRECTIVE, "set:text");
    }
}
