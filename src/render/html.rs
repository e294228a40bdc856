use crate::core::ast::{BlockNode, DocumentAst, InlineNode, ListKind};
use crate::mapping;
use crate::render::{escape_html_attr, escape_html_text, Renderer};

/// Writes a document tree as editor HTML, one block per line.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlRenderer;

impl HtmlRenderer {
    fn render_block(block: &BlockNode, out: &mut String) {
        match block {
            BlockNode::Heading { level, content } => {
                let level = (*level).clamp(1, 6);
                out.push_str(&format!("<h{}>", level));
                Self::render_inline(content, out);
                out.push_str(&format!("</h{}>", level));
            }
            BlockNode::Paragraph { alignment, content } => {
                match mapping::alignment_css(*alignment) {
                    Some(align) => out.push_str(&format!("<p style=\"text-align:{}\">", align)),
                    None => out.push_str("<p>"),
                }
                Self::render_inline(content, out);
                out.push_str("</p>");
            }
            BlockNode::List { kind, items } => {
                let tag = match kind {
                    ListKind::Ordered => "ol",
                    ListKind::Unordered => "ul",
                };
                out.push_str(&format!("<{}>\n", tag));
                for item in items {
                    out.push_str("<li>");
                    Self::render_inline(item, out);
                    out.push_str("</li>\n");
                }
                out.push_str(&format!("</{}>", tag));
            }
            BlockNode::Table { rows } => {
                out.push_str("<table>\n");
                for row in rows {
                    out.push_str("<tr>");
                    for cell in &row.cells {
                        let tag = if cell.header { "th" } else { "td" };
                        out.push_str(&format!("<{}>", tag));
                        Self::render_inline(&cell.content, out);
                        out.push_str(&format!("</{}>", tag));
                    }
                    out.push_str("</tr>\n");
                }
                out.push_str("</table>");
            }
            BlockNode::BlockQuote(content) => {
                out.push_str("<blockquote>");
                Self::render_inline(content, out);
                out.push_str("</blockquote>");
            }
            BlockNode::CodeBlock(code) => {
                out.push_str("<pre><code>");
                out.push_str(&escape_html_text(code));
                out.push_str("</code></pre>");
            }
            BlockNode::Rule => out.push_str("<hr>"),
        }
    }

    fn render_inline(nodes: &[InlineNode], out: &mut String) {
        for node in nodes {
            match node {
                InlineNode::Text(text) => out.push_str(&escape_html_text(text)),
                InlineNode::Styled { style, children } => {
                    let tag = mapping::inline_tag(*style).html;
                    out.push_str(&format!("<{}>", tag));
                    Self::render_inline(children, out);
                    out.push_str(&format!("</{}>", tag));
                }
                InlineNode::Link { href, children } => {
                    let href = href.as_deref().unwrap_or("#");
                    out.push_str(&format!("<a href=\"{}\">", escape_html_attr(href)));
                    Self::render_inline(children, out);
                    out.push_str("</a>");
                }
                InlineNode::LineBreak => out.push_str("<br>"),
                InlineNode::Image(image) => out.push_str(&format!(
                    "<img src=\"{}\" alt=\"image\" style=\"max-width: 100%; height: auto;\" />",
                    image.data_uri()
                )),
            }
        }
    }
}

impl Renderer for HtmlRenderer {
    fn render(&self, document: &DocumentAst) -> String {
        let mut out = String::new();
        for block in &document.blocks {
            if !out.is_empty() {
                out.push('\n');
            }
            Self::render_block(block, &mut out);
        }
        out
    }
}
