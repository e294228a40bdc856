use crate::core::ast::{BlockNode, DocumentAst, InlineNode, ListKind, TableRow};
use crate::mapping::{self, BULLET};
use crate::picture::encode_picture;
use crate::render::{escape_rtf_text, Renderer};
use crate::ConvertOptions;

/// Writes a document tree as an RTF 1.x document.
///
/// Every paragraph opens with `\pard` and closes with `\par`, and every
/// group opened for a run is closed before the paragraph ends.
#[derive(Debug, Clone, Copy)]
pub struct RtfRenderer<'a> {
    options: &'a ConvertOptions,
}

impl<'a> RtfRenderer<'a> {
    pub fn new(options: &'a ConvertOptions) -> Self {
        Self { options }
    }

    fn render_block(&self, block: &BlockNode, out: &mut String) {
        match block {
            BlockNode::Heading { level, content } => {
                let sig = mapping::heading_signature(&self.options.headings, *level);
                out.push_str(&format!(
                    "\\pard\\sb{}\\sa{}{{\\b\\fs{} ",
                    sig.space_before, sig.space_after, sig.font_size
                ));
                self.render_inline(content, out);
                out.push_str("}\\par\n");
            }
            BlockNode::Paragraph { alignment, content } => {
                out.push_str("\\pard");
                out.push_str(mapping::PARAGRAPH_SPACING);
                if let Some(control) = mapping::alignment_control(*alignment) {
                    out.push_str(control);
                }
                out.push(' ');
                self.render_inline(content, out);
                out.push_str("\\par\n");
            }
            BlockNode::List { kind, items } => {
                for (i, item) in items.iter().enumerate() {
                    let marker = match kind {
                        ListKind::Ordered => format!("{}.", i + 1),
                        ListKind::Unordered => escape_rtf_text(&BULLET.to_string()),
                    };
                    out.push_str("\\pard");
                    out.push_str(mapping::LIST_ITEM_PARAGRAPH);
                    out.push_str(&format!("{{\\pntext\\f0 {}\\tab}}", marker));
                    self.render_inline(item, out);
                    out.push_str("\\par\n");
                }
            }
            BlockNode::Table { rows } => {
                for row in rows.iter().filter(|row| !row.cells.is_empty()) {
                    self.render_row(row, out);
                }
            }
            BlockNode::BlockQuote(content) => {
                out.push_str("\\pard");
                out.push_str(mapping::QUOTE_PARAGRAPH);
                out.push('{');
                out.push_str(mapping::QUOTE_RUN);
                out.push(' ');
                self.render_inline(content, out);
                out.push_str("}\\par\n");
            }
            BlockNode::CodeBlock(code) => {
                out.push_str("\\pard");
                out.push_str(mapping::CODE_BLOCK_PARAGRAPH);
                out.push('{');
                out.push_str(mapping::inline_tag(crate::core::ast::InlineStyle::Code).rtf);
                out.push(' ');
                out.push_str(&escape_rtf_text(code));
                out.push_str("}\\par\n");
            }
            BlockNode::Rule => {
                out.push_str("\\pard");
                out.push_str(mapping::RULE_PARAGRAPH);
                out.push_str("\\par\n");
            }
        }
    }

    fn render_row(&self, row: &TableRow, out: &mut String) {
        out.push_str(mapping::TABLE_ROW);
        for i in 0..row.cells.len() {
            out.push_str(mapping::TABLE_CELL_BORDERS);
            let right_edge = mapping::TABLE_CELL_WIDTH.saturating_mul(i as i32 + 1);
            out.push_str(&format!("\\cellx{}", right_edge));
        }
        out.push('\n');
        for cell in &row.cells {
            out.push_str("\\pard\\intbl ");
            if cell.header {
                out.push_str("{\\b ");
                self.render_inline(&cell.content, out);
                out.push('}');
            } else {
                self.render_inline(&cell.content, out);
            }
            out.push_str("\\cell\n");
        }
        out.push_str("\\row\n");
    }

    fn render_inline(&self, nodes: &[InlineNode], out: &mut String) {
        for node in nodes {
            match node {
                InlineNode::Text(text) => out.push_str(&escape_rtf_text(text)),
                InlineNode::Styled { style, children } => {
                    out.push('{');
                    out.push_str(mapping::inline_tag(*style).rtf);
                    out.push(' ');
                    self.render_inline(children, out);
                    out.push('}');
                }
                InlineNode::Link {
                    href: Some(href),
                    children,
                } => {
                    let target = escape_rtf_text(&href.replace('"', "%22"));
                    out.push_str(&format!(
                        "{{\\field{{\\*\\fldinst{{HYPERLINK \"{}\"}}}}{{\\fldrslt{{{} ",
                        target,
                        mapping::LINK_RUN
                    ));
                    self.render_inline(children, out);
                    out.push_str("}}}");
                }
                InlineNode::Link {
                    href: None,
                    children,
                } => {
                    out.push('{');
                    out.push_str(mapping::LINK_RUN);
                    out.push(' ');
                    self.render_inline(children, out);
                    out.push('}');
                }
                InlineNode::LineBreak => out.push_str("\\line "),
                InlineNode::Image(image) => {
                    out.push_str(&encode_picture(image, &self.options.image));
                }
            }
        }
    }
}

impl Renderer for RtfRenderer<'_> {
    fn render(&self, document: &DocumentAst) -> String {
        let mut out = String::from(mapping::RTF_PREAMBLE);
        for block in &document.blocks {
            self.render_block(block, &mut out);
        }
        out.push_str(mapping::RTF_CLOSING);
        out
    }
}
