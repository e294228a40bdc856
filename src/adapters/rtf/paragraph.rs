//! Paragraph classification - turns collected RTF paragraphs into blocks.

use crate::core::ast::{
    is_blank, retain_styles, trim_inline, Alignment, BlockNode, DocumentAst, InlineNode,
    InlineStyle, ListKind, TableCell, TableRow,
};
use crate::mapping::{self, BULLET, CODE_BLOCK_SPACING, LINK_COLOR, QUOTE_COLOR, QUOTE_INDENT};
use crate::picture::ImageBlock;
use crate::ConvertOptions;
use regex::Regex;
use std::sync::OnceLock;

/// Character formatting in effect for a run of text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct CharProps {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub subscript: bool,
    pub superscript: bool,
    pub font: i32,
    pub font_size: Option<i32>,
    pub color: i32,
}

/// Paragraph formatting, reset by `\pard`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct ParaProps {
    pub alignment: Alignment,
    pub left_indent: i32,
    pub right_indent: i32,
    pub first_indent: i32,
    pub space_before: Option<i32>,
    pub space_after: Option<i32>,
    pub in_table: bool,
    pub border_bottom: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct TextRun {
    pub text: String,
    pub chars: CharProps,
    /// Font resolved as monospace through the font table.
    pub monospace: bool,
    /// Target of the enclosing `HYPERLINK` field result.
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Piece {
    Run(TextRun),
    LineBreak,
    Image(ImageBlock),
}

/// Content of the paragraph being read.
#[derive(Debug, Default)]
pub(super) struct Paragraph {
    pub pieces: Vec<Piece>,
    /// Text of a `{\pntext ...}` or `{\listtext ...}` group.
    pub marker: Option<String>,
    /// Numbering style from a `{\*\pn ...}` definition.
    pub numbering: Option<ListKind>,
}

impl Paragraph {
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty() && self.marker.is_none() && self.numbering.is_none()
    }
}

/// One classified paragraph or table row, in document order.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Flat {
    Block(BlockNode),
    Item(ListKind, Vec<InlineNode>),
    Row(TableRow),
}

pub(super) fn classify(
    paragraph: Paragraph,
    props: &ParaProps,
    options: &ConvertOptions,
) -> Option<Flat> {
    let Paragraph {
        mut pieces,
        marker,
        numbering,
    } = paragraph;
    let has_image = pieces.iter().any(|piece| matches!(piece, Piece::Image(_)));
    let text = pieces_text(&pieces);
    let trimmed = text.trim();

    if trimmed.is_empty() && !has_image {
        return props.border_bottom.then_some(Flat::Block(BlockNode::Rule));
    }
    if !has_image && text_rule().is_match(trimmed) {
        return Some(Flat::Block(BlockNode::Rule));
    }

    let list_kind = match (marker.as_deref(), numbering) {
        (Some(marker), _) if !marker.trim().is_empty() => Some(marker_kind(marker)),
        (_, Some(kind)) => Some(kind),
        (Some(_), None) => Some(ListKind::Unordered),
        (None, None) => take_literal_marker(&mut pieces, props),
    };
    if let Some(kind) = list_kind {
        let content = build_inline(&pieces);
        return (!is_blank(&content)).then_some(Flat::Item(kind, content));
    }

    if !has_image {
        if let Some(level) = heading_level(&pieces, props, options) {
            let pieces = map_runs(pieces, |run| {
                run.chars.bold = false;
                run.chars.font_size = None;
            });
            return Some(Flat::Block(BlockNode::Heading {
                level,
                content: build_inline(&pieces),
            }));
        }
    }

    if is_quote(&pieces, props) {
        let pieces = map_runs(pieces, |run| {
            run.chars.italic = false;
            if run.chars.color == QUOTE_COLOR {
                run.chars.color = 0;
            }
        });
        return Some(Flat::Block(BlockNode::BlockQuote(build_inline(&pieces))));
    }

    if is_code_block(&pieces, props) {
        let code = pieces_text(&pieces).trim_matches('\n').to_string();
        return Some(Flat::Block(BlockNode::CodeBlock(code)));
    }

    let content = build_inline(&pieces);
    (!is_blank(&content)).then_some(Flat::Block(BlockNode::Paragraph {
        alignment: props.alignment,
        content,
    }))
}

/// Cell content keeps bold and italic only.
pub(super) fn table_cell(pieces: &[Piece]) -> TableCell {
    TableCell {
        header: false,
        content: retain_styles(
            build_inline(pieces),
            &[InlineStyle::Bold, InlineStyle::Italic],
        ),
    }
}

/// Merges consecutive list items of one kind and consecutive table rows.
pub(super) fn regroup(flat: Vec<Flat>) -> DocumentAst {
    let mut blocks: Vec<BlockNode> = Vec::new();
    for entry in flat {
        match entry {
            Flat::Block(block) => blocks.push(block),
            Flat::Item(kind, content) => {
                if let Some(BlockNode::List { kind: last, items }) = blocks.last_mut() {
                    if *last == kind {
                        items.push(content);
                        continue;
                    }
                }
                blocks.push(BlockNode::List {
                    kind,
                    items: vec![content],
                });
            }
            Flat::Row(row) => {
                if let Some(BlockNode::Table { rows }) = blocks.last_mut() {
                    rows.push(row);
                    continue;
                }
                blocks.push(BlockNode::Table { rows: vec![row] });
            }
        }
    }
    DocumentAst { blocks }
}

fn text_rule() -> &'static Regex {
    static RULE: OnceLock<Regex> = OnceLock::new();
    RULE.get_or_init(|| Regex::new(r"^[-\x{2014}_]{3,}$").expect("valid regex"))
}

fn pieces_text(pieces: &[Piece]) -> String {
    let mut out = String::new();
    for piece in pieces {
        match piece {
            Piece::Run(run) => out.push_str(&run.text),
            Piece::LineBreak => out.push('\n'),
            Piece::Image(_) => {}
        }
    }
    out
}

fn marker_kind(marker: &str) -> ListKind {
    if marker.trim().starts_with(|c: char| c.is_ascii_digit()) {
        ListKind::Ordered
    } else {
        ListKind::Unordered
    }
}

/// Detects a list marker typed into the paragraph text, such as `1.\tab`
/// or `\bullet\tab`, and strips it.
fn take_literal_marker(pieces: &mut [Piece], props: &ParaProps) -> Option<ListKind> {
    let Some(Piece::Run(run)) = pieces.first_mut() else {
        return None;
    };
    let text = run.text.trim_start_matches(' ');
    let hanging = props.first_indent < 0;

    let (kind, rest) = if let Some(rest) = text.strip_prefix(BULLET) {
        (ListKind::Unordered, rest)
    } else if hanging {
        let digits = text.len() - text.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let after = &text[digits..];
        if digits > 0 && (after.starts_with('.') || after.starts_with(')')) {
            (ListKind::Ordered, &after[1..])
        } else if props.left_indent > 0 && text.starts_with('\t') {
            (ListKind::Unordered, text)
        } else {
            return None;
        }
    } else {
        return None;
    };

    let rest = rest.strip_prefix('\t')?.to_string();
    run.text = rest;
    Some(kind)
}

fn visible_runs(pieces: &[Piece]) -> impl Iterator<Item = &TextRun> {
    pieces.iter().filter_map(|piece| match piece {
        Piece::Run(run) if !run.text.trim().is_empty() => Some(run),
        _ => None,
    })
}

/// True when there is at least one visible run and every one satisfies
/// `pred`.
fn all_runs(pieces: &[Piece], pred: impl Fn(&TextRun) -> bool) -> bool {
    let mut any = false;
    for run in visible_runs(pieces) {
        if !pred(run) {
            return false;
        }
        any = true;
    }
    any
}

fn heading_level(pieces: &[Piece], props: &ParaProps, options: &ConvertOptions) -> Option<u8> {
    let mut size = None;
    for run in visible_runs(pieces) {
        if !run.chars.bold {
            return None;
        }
        let font_size = run.chars.font_size?;
        match size {
            None => size = Some(font_size),
            Some(existing) if existing != font_size => return None,
            Some(_) => {}
        }
    }
    mapping::heading_for_signature(
        &options.headings,
        size?,
        props.space_before,
        props.space_after,
    )
}

/// Link runs inside a quote keep the link colour instead of the quote grey.
fn is_quote(pieces: &[Piece], props: &ParaProps) -> bool {
    props.left_indent == QUOTE_INDENT
        && props.right_indent == QUOTE_INDENT
        && all_runs(pieces, |run| {
            run.chars.italic && (run.chars.color == QUOTE_COLOR || is_link_run(run))
        })
}

fn is_link_run(run: &TextRun) -> bool {
    run.link.is_some() || (run.chars.underline && run.chars.color == LINK_COLOR)
}

fn is_code_block(pieces: &[Piece], props: &ParaProps) -> bool {
    props.space_before == Some(CODE_BLOCK_SPACING)
        && props.space_after == Some(CODE_BLOCK_SPACING)
        && props.left_indent == 0
        && !pieces.iter().any(|piece| matches!(piece, Piece::Image(_)))
        && all_runs(pieces, |run| run.monospace)
}

fn map_runs(pieces: Vec<Piece>, f: impl Fn(&mut TextRun)) -> Vec<Piece> {
    pieces
        .into_iter()
        .map(|mut piece| {
            if let Piece::Run(run) = &mut piece {
                f(run);
            }
            piece
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
struct FormattedSegment {
    text: String,
    is_bold: bool,
    is_italic: bool,
    has_underline: bool,
    has_strike: bool,
    is_subscript: bool,
    is_superscript: bool,
    is_code: bool,
    /// `Some(None)` marks link styling without a known target.
    link: Option<Option<String>>,
}

impl FormattedSegment {
    fn from_run(run: &TextRun) -> Self {
        let styled_as_link = run.chars.underline && run.chars.color == LINK_COLOR;
        let link = match &run.link {
            Some(target) => Some(Some(target.clone())),
            None if styled_as_link => Some(None),
            None => None,
        };
        Self {
            text: run.text.clone(),
            is_bold: run.chars.bold,
            is_italic: run.chars.italic,
            has_underline: run.chars.underline && link.is_none(),
            has_strike: run.chars.strike,
            is_subscript: run.chars.subscript,
            is_superscript: run.chars.superscript,
            is_code: run.monospace,
            link,
        }
    }

    fn same_format(&self, other: &Self) -> bool {
        self.is_bold == other.is_bold
            && self.is_italic == other.is_italic
            && self.has_underline == other.has_underline
            && self.has_strike == other.has_strike
            && self.is_subscript == other.is_subscript
            && self.is_superscript == other.is_superscript
            && self.is_code == other.is_code
            && self.link == other.link
    }

    fn into_node(self) -> InlineNode {
        let mut node = InlineNode::Text(self.text);
        let layers = [
            (self.is_code, InlineStyle::Code),
            (self.is_subscript, InlineStyle::Subscript),
            (self.is_superscript, InlineStyle::Superscript),
            (self.has_strike, InlineStyle::Strike),
            (self.has_underline, InlineStyle::Underline),
            (self.is_italic, InlineStyle::Italic),
            (self.is_bold, InlineStyle::Bold),
        ];
        for (on, style) in layers {
            if on {
                node = InlineNode::Styled {
                    style,
                    children: vec![node],
                };
            }
        }
        node
    }
}

enum Segment {
    Text(FormattedSegment),
    LineBreak,
    Image(ImageBlock),
}

fn merge_segments(pieces: &[Piece]) -> Vec<Segment> {
    let mut merged: Vec<Segment> = Vec::new();
    for piece in pieces {
        match piece {
            Piece::Run(run) => {
                let seg = FormattedSegment::from_run(run);
                if let Some(Segment::Text(last)) = merged.last_mut() {
                    if last.same_format(&seg) {
                        last.text.push_str(&seg.text);
                        continue;
                    }
                }
                merged.push(Segment::Text(seg));
            }
            Piece::LineBreak => merged.push(Segment::LineBreak),
            Piece::Image(image) => merged.push(Segment::Image(image.clone())),
        }
    }
    merged
}

/// Collapses whitespace across segment boundaries; non-breaking spaces
/// are kept.
fn collapse_whitespace(segments: &mut Vec<Segment>) {
    let mut prev_space = true;
    for seg in segments.iter_mut() {
        match seg {
            Segment::Text(formatted) => {
                let mut out = String::with_capacity(formatted.text.len());
                for ch in formatted.text.chars() {
                    if ch.is_whitespace() && ch != '\u{a0}' {
                        if !prev_space {
                            out.push(' ');
                        }
                        prev_space = true;
                    } else {
                        out.push(ch);
                        prev_space = false;
                    }
                }
                formatted.text = out;
            }
            Segment::LineBreak => prev_space = true,
            Segment::Image(_) => prev_space = false,
        }
    }
    segments.retain(|seg| !matches!(seg, Segment::Text(formatted) if formatted.text.is_empty()));
}

pub(super) fn build_inline(pieces: &[Piece]) -> Vec<InlineNode> {
    let mut segments = merge_segments(pieces);
    collapse_whitespace(&mut segments);

    let mut out = Vec::new();
    let mut open_link: Option<(Option<String>, Vec<InlineNode>)> = None;

    for seg in segments {
        let (target, node) = match seg {
            Segment::Text(mut formatted) => {
                let target = formatted.link.take();
                (target, formatted.into_node())
            }
            Segment::LineBreak => (None, InlineNode::LineBreak),
            Segment::Image(image) => (None, InlineNode::Image(image)),
        };
        match target {
            Some(href) => {
                let continues = matches!(&open_link, Some((current, _)) if *current == href);
                if continues {
                    if let Some((_, children)) = &mut open_link {
                        children.push(node);
                    }
                } else {
                    close_link(&mut out, open_link.take());
                    open_link = Some((href, vec![node]));
                }
            }
            None => {
                close_link(&mut out, open_link.take());
                out.push(node);
            }
        }
    }
    close_link(&mut out, open_link.take());

    trim_inline(&mut out);
    out
}

fn close_link(out: &mut Vec<InlineNode>, link: Option<(Option<String>, Vec<InlineNode>)>) {
    if let Some((href, children)) = link {
        out.push(InlineNode::Link { href, children });
    }
}
