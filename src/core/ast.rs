use crate::picture::ImageBlock;

/// Document tree shared by both conversion directions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentAst {
    pub blocks: Vec<BlockNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockNode {
    Heading { level: u8, content: Vec<InlineNode> },
    Paragraph { alignment: Alignment, content: Vec<InlineNode> },
    List { kind: ListKind, items: Vec<Vec<InlineNode>> },
    Table { rows: Vec<TableRow> },
    BlockQuote(Vec<InlineNode>),
    CodeBlock(String),
    Rule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Ordered,
    Unordered,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableCell {
    pub header: bool,
    pub content: Vec<InlineNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InlineNode {
    Text(String),
    Styled {
        style: InlineStyle,
        children: Vec<InlineNode>,
    },
    Link {
        href: Option<String>,
        children: Vec<InlineNode>,
    },
    LineBreak,
    Image(ImageBlock),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InlineStyle {
    Bold,
    Italic,
    Underline,
    Strike,
    Subscript,
    Superscript,
    Code,
}

impl BlockNode {
    pub fn paragraph(content: Vec<InlineNode>) -> Self {
        BlockNode::Paragraph {
            alignment: Alignment::Left,
            content,
        }
    }
}

/// Concatenated text of a run of inline nodes; line breaks become `\n`.
pub fn plain_text(nodes: &[InlineNode]) -> String {
    let mut out = String::new();
    push_plain_text(nodes, &mut out);
    out
}

fn push_plain_text(nodes: &[InlineNode], out: &mut String) {
    for node in nodes {
        match node {
            InlineNode::Text(text) => out.push_str(text),
            InlineNode::Styled { children, .. } | InlineNode::Link { children, .. } => {
                push_plain_text(children, out)
            }
            InlineNode::LineBreak => out.push('\n'),
            InlineNode::Image(_) => {}
        }
    }
}

/// True when the nodes carry neither visible text nor an image.
pub fn is_blank(nodes: &[InlineNode]) -> bool {
    nodes.iter().all(|node| match node {
        InlineNode::Text(text) => text.trim().is_empty(),
        InlineNode::Styled { children, .. } | InlineNode::Link { children, .. } => {
            is_blank(children)
        }
        InlineNode::LineBreak => true,
        InlineNode::Image(_) => false,
    })
}

/// Strips whitespace at both ends of an inline run, dropping nodes that
/// become empty.
pub fn trim_inline(nodes: &mut Vec<InlineNode>) {
    trim_start(nodes);
    trim_end(nodes);
}

fn trim_start(nodes: &mut Vec<InlineNode>) {
    while let Some(first) = nodes.first_mut() {
        match first {
            InlineNode::Text(text) => {
                let trimmed = text.trim_start();
                if trimmed.is_empty() {
                    nodes.remove(0);
                    continue;
                }
                *text = trimmed.to_string();
            }
            InlineNode::Styled { children, .. } | InlineNode::Link { children, .. } => {
                trim_start(children);
                if children.is_empty() {
                    nodes.remove(0);
                    continue;
                }
            }
            InlineNode::LineBreak => {
                nodes.remove(0);
                continue;
            }
            InlineNode::Image(_) => {}
        }
        break;
    }
}

fn trim_end(nodes: &mut Vec<InlineNode>) {
    while let Some(last) = nodes.last_mut() {
        match last {
            InlineNode::Text(text) => {
                let len = text.trim_end().len();
                if len == 0 {
                    nodes.pop();
                    continue;
                }
                text.truncate(len);
            }
            InlineNode::Styled { children, .. } | InlineNode::Link { children, .. } => {
                trim_end(children);
                if children.is_empty() {
                    nodes.pop();
                    continue;
                }
            }
            InlineNode::LineBreak => {
                nodes.pop();
                continue;
            }
            InlineNode::Image(_) => {}
        }
        break;
    }
}

/// Unwraps every style not in `allowed` (and every link), keeping the text.
pub fn retain_styles(nodes: Vec<InlineNode>, allowed: &[InlineStyle]) -> Vec<InlineNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            InlineNode::Styled { style, children } => {
                let children = retain_styles(children, allowed);
                if allowed.contains(&style) {
                    out.push(InlineNode::Styled { style, children });
                } else {
                    out.extend(children);
                }
            }
            InlineNode::Link { children, .. } => out.extend(retain_styles(children, allowed)),
            other => out.push(other),
        }
    }
    out
}
