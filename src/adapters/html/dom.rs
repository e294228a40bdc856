//! HTML5 parsing and document-order traversal of the parsed tree.

use scraper::node::{Element, Node};
use scraper::Html;

/// Elements whose content never reaches the document.
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "template", "title", "textarea", "noscript",
];

/// Receives elements and text in document order.
pub trait NodeVisitor {
    fn open_element(&mut self, element: &Element);
    fn close_element(&mut self, name: &str);
    /// Text with character references already resolved.
    fn text(&mut self, text: &str);
}

/// Parses editor markup as an HTML body fragment. Misnested and unclosed
/// tags are repaired by the HTML5 tree builder.
pub fn parse(html: &str) -> Html {
    Html::parse_fragment(html)
}

enum Visit<'a, N> {
    Enter(N),
    Leave(&'a Element),
}

/// Walks the fragment depth-first without recursion. Comments, doctypes
/// and skipped elements are not reported.
pub fn walk(fragment: &Html, visitor: &mut impl NodeVisitor) {
    let mut stack: Vec<Visit<'_, _>> = fragment
        .root_element()
        .children()
        .rev()
        .map(Visit::Enter)
        .collect();

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Leave(element) => visitor.close_element(element.name()),
            Visit::Enter(node) => match node.value() {
                Node::Text(text) => visitor.text(text),
                Node::Element(element) => {
                    if SKIPPED_ELEMENTS.contains(&element.name()) {
                        continue;
                    }
                    visitor.open_element(element);
                    stack.push(Visit::Leave(element));
                    stack.extend(node.children().rev().map(Visit::Enter));
                }
                _ => {}
            },
        }
    }
}
