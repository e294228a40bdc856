use super::dom::{self, NodeVisitor};
use crate::adapters::AstExtractor;
use crate::converter::ConversionContext;
use crate::core::ast::{
    is_blank, plain_text, trim_inline, Alignment, BlockNode, DocumentAst, InlineNode, InlineStyle,
    ListKind, TableCell, TableRow,
};
use crate::mapping;
use scraper::node::Element;

/// Reads editor HTML into a document tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlExtractor;

impl AstExtractor for HtmlExtractor {
    fn extract(&self, input: &str, context: &mut ConversionContext<'_>) -> DocumentAst {
        let fragment = dom::parse(input);
        let mut builder = TreeBuilder::new(context);
        dom::walk(&fragment, &mut builder);
        builder.finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Paragraph(Alignment),
    Heading(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Frame {
    Style(InlineStyle),
    Link(Option<String>),
}

/// Inline content of the block being built, with the open inline elements.
#[derive(Debug, Default)]
struct InlineStack {
    root: Vec<InlineNode>,
    open: Vec<(Frame, Vec<InlineNode>)>,
}

impl InlineStack {
    fn current(&mut self) -> &mut Vec<InlineNode> {
        match self.open.last_mut() {
            Some((_, children)) => children,
            None => &mut self.root,
        }
    }

    fn push(&mut self, node: InlineNode) {
        self.current().push(node);
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let current = self.current();
        if let Some(InlineNode::Text(last)) = current.last_mut() {
            last.push_str(text);
        } else {
            current.push(InlineNode::Text(text.to_string()));
        }
    }

    fn open(&mut self, frame: Frame) {
        self.open.push((frame, Vec::new()));
    }

    /// Closes the innermost frame accepted by `matches` and every frame
    /// opened after it. Returns false when no such frame is open.
    fn close(&mut self, matches: impl Fn(&Frame) -> bool) -> bool {
        let Some(pos) = self.open.iter().rposition(|(frame, _)| matches(frame)) else {
            return false;
        };
        while self.open.len() > pos {
            self.fold_top();
        }
        true
    }

    fn fold_top(&mut self) {
        if let Some((frame, children)) = self.open.pop() {
            if children.is_empty() {
                return;
            }
            let node = match frame {
                Frame::Style(style) => InlineNode::Styled { style, children },
                Frame::Link(href) => InlineNode::Link { href, children },
            };
            self.current().push(node);
        }
    }

    fn take(&mut self) -> Vec<InlineNode> {
        while !self.open.is_empty() {
            self.fold_top();
        }
        std::mem::take(&mut self.root)
    }
}

#[derive(Debug)]
struct ListBuilder {
    kind: ListKind,
    items: Vec<Vec<InlineNode>>,
    current: Option<Vec<InlineNode>>,
}

impl ListBuilder {
    fn new(kind: ListKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
            current: None,
        }
    }

    fn append(&mut self, content: Vec<InlineNode>) {
        match &mut self.current {
            Some(item) => {
                if !item.is_empty() {
                    item.push(InlineNode::LineBreak);
                }
                item.extend(content);
            }
            None => self.current = Some(content),
        }
    }

    fn close_item(&mut self) {
        if let Some(item) = self.current.take() {
            if !is_blank(&item) {
                self.items.push(item);
            }
        }
    }

    /// Items collected so far as a list block.
    fn drain(&mut self) -> Option<BlockNode> {
        self.close_item();
        if self.items.is_empty() {
            return None;
        }
        Some(BlockNode::List {
            kind: self.kind,
            items: std::mem::take(&mut self.items),
        })
    }
}

#[derive(Debug, Default)]
struct TableBuilder {
    rows: Vec<TableRow>,
    row: Option<TableRow>,
    cell: Option<TableCell>,
}

impl TableBuilder {
    fn append(&mut self, content: Vec<InlineNode>) {
        let cell = self.cell.get_or_insert_with(TableCell::default);
        if !cell.content.is_empty() {
            cell.content.push(InlineNode::LineBreak);
        }
        cell.content.extend(content);
    }

    fn open_cell(&mut self, header: bool) {
        self.close_cell();
        self.cell = Some(TableCell {
            header,
            content: Vec::new(),
        });
    }

    fn close_cell(&mut self) {
        if let Some(cell) = self.cell.take() {
            self.row.get_or_insert_with(TableRow::default).cells.push(cell);
        }
    }

    fn open_row(&mut self) {
        self.close_row();
        self.row = Some(TableRow::default());
    }

    fn close_row(&mut self) {
        self.close_cell();
        if let Some(row) = self.row.take() {
            if !row.cells.is_empty() {
                self.rows.push(row);
            }
        }
    }

    fn finish(mut self) -> Option<BlockNode> {
        self.close_row();
        if self.rows.is_empty() {
            return None;
        }
        Some(BlockNode::Table { rows: self.rows })
    }
}

struct TreeBuilder<'c, 'a> {
    context: &'c mut ConversionContext<'a>,
    blocks: Vec<BlockNode>,
    block: BlockKind,
    inline: InlineStack,
    quote_depth: usize,
    pre_depth: usize,
    lists: Vec<ListBuilder>,
    table: Option<TableBuilder>,
}

impl<'c, 'a> TreeBuilder<'c, 'a> {
    fn new(context: &'c mut ConversionContext<'a>) -> Self {
        Self {
            context,
            blocks: Vec::new(),
            block: BlockKind::Paragraph(Alignment::Left),
            inline: InlineStack::default(),
            quote_depth: 0,
            pre_depth: 0,
            lists: Vec::new(),
            table: None,
        }
    }

    fn start_tag(&mut self, tag: &Element) {
        let name = tag.name();

        if let Some(level) = mapping::heading_level_for_tag(name) {
            self.flush_inline();
            self.block = BlockKind::Heading(level);
            return;
        }
        if let Some(style) = mapping::inline_style_for_tag(name) {
            if !(style == InlineStyle::Code && self.pre_depth > 0) {
                self.inline.open(Frame::Style(style));
            }
            return;
        }

        match name {
            "p" | "div" => {
                self.flush_inline();
                self.block = BlockKind::Paragraph(mapping::alignment_from_style(
                    tag.attr("style").unwrap_or_default(),
                ));
            }
            "blockquote" => {
                self.flush_inline();
                self.quote_depth += 1;
            }
            "pre" => {
                self.flush_inline();
                self.pre_depth += 1;
            }
            "br" => {
                if self.pre_depth > 0 {
                    self.inline.push_text("\n");
                } else {
                    self.inline.push(InlineNode::LineBreak);
                }
            }
            "hr" => {
                self.flush_inline();
                if self.table.is_none() {
                    self.emit_pending_lists();
                    self.blocks.push(BlockNode::Rule);
                }
            }
            "img" => self.image(tag),
            "a" => {
                let href = tag
                    .attr("href")
                    .map(str::trim)
                    .filter(|href| !href.is_empty())
                    .map(str::to_string);
                self.inline.open(Frame::Link(href));
            }
            "ul" | "ol" => {
                self.flush_inline();
                if self.table.is_none() {
                    self.emit_pending_lists();
                    let kind = if name == "ol" {
                        ListKind::Ordered
                    } else {
                        ListKind::Unordered
                    };
                    self.lists.push(ListBuilder::new(kind));
                }
            }
            "li" => {
                self.flush_inline();
                if self.table.is_none() {
                    if self.lists.is_empty() {
                        self.lists.push(ListBuilder::new(ListKind::Unordered));
                    }
                    if let Some(list) = self.lists.last_mut() {
                        list.close_item();
                        list.current = Some(Vec::new());
                    }
                }
            }
            "table" => {
                self.flush_inline();
                if self.table.is_none() {
                    self.emit_pending_lists();
                    self.table = Some(TableBuilder::default());
                }
            }
            "tr" => {
                self.flush_inline();
                if let Some(table) = &mut self.table {
                    table.open_row();
                }
            }
            "td" | "th" => {
                self.flush_inline();
                if let Some(table) = &mut self.table {
                    table.open_cell(name == "th");
                }
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, name: &str) {
        if mapping::heading_level_for_tag(name).is_some() {
            self.flush_inline();
            self.block = BlockKind::Paragraph(Alignment::Left);
            return;
        }
        if let Some(style) = mapping::inline_style_for_tag(name) {
            self.inline.close(|frame| *frame == Frame::Style(style));
            return;
        }

        match name {
            "p" | "div" => {
                self.flush_inline();
                self.block = BlockKind::Paragraph(Alignment::Left);
            }
            "a" => {
                self.inline.close(|frame| matches!(frame, Frame::Link(_)));
            }
            "blockquote" => {
                self.flush_inline();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            "pre" => {
                self.flush_inline();
                self.pre_depth = self.pre_depth.saturating_sub(1);
            }
            "ul" | "ol" => {
                self.flush_inline();
                if self.table.is_none() {
                    if let Some(block) = self.lists.pop().and_then(|mut list| list.drain()) {
                        self.blocks.push(block);
                    }
                }
            }
            "li" => {
                self.flush_inline();
                if self.table.is_none() {
                    if let Some(list) = self.lists.last_mut() {
                        list.close_item();
                    }
                }
            }
            "table" => {
                self.flush_inline();
                if let Some(block) = self.table.take().and_then(TableBuilder::finish) {
                    self.blocks.push(block);
                }
            }
            "tr" => {
                self.flush_inline();
                if let Some(table) = &mut self.table {
                    table.close_row();
                }
            }
            "td" | "th" => {
                self.flush_inline();
                if let Some(table) = &mut self.table {
                    table.close_cell();
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.pre_depth > 0 {
            self.inline.push_text(text);
        } else {
            self.inline.push_text(&collapse_whitespace(text));
        }
    }

    fn image(&mut self, tag: &Element) {
        let Some(src) = tag.attr("src").map(str::trim).filter(|src| !src.is_empty()) else {
            self.context.record("image without src dropped".to_string());
            return;
        };
        if let Some(image) = self.context.resolve_image(src) {
            self.inline.push(InlineNode::Image(image));
        }
    }

    /// Moves the pending inline content into the innermost open container.
    fn flush_inline(&mut self) {
        let mut content = self.inline.take();
        if self.pre_depth == 0 {
            trim_inline(&mut content);
        }
        if is_blank(&content) {
            return;
        }

        if let Some(table) = &mut self.table {
            table.append(content);
            return;
        }
        if let Some(list) = self.lists.last_mut() {
            list.append(content);
            return;
        }

        let block = if self.pre_depth > 0 {
            BlockNode::CodeBlock(plain_text(&content).trim_matches('\n').to_string())
        } else if self.quote_depth > 0 {
            BlockNode::BlockQuote(content)
        } else {
            match self.block {
                BlockKind::Paragraph(alignment) => BlockNode::Paragraph { alignment, content },
                BlockKind::Heading(level) => BlockNode::Heading { level, content },
            }
        };
        self.blocks.push(block);
    }

    /// Emits the items of every open list so far. Nested lists come out as
    /// sibling lists in document order.
    fn emit_pending_lists(&mut self) {
        for list in &mut self.lists {
            if let Some(block) = list.drain() {
                self.blocks.push(block);
            }
        }
    }

    fn finish(mut self) -> DocumentAst {
        self.flush_inline();
        if let Some(block) = self.table.take().and_then(TableBuilder::finish) {
            self.blocks.push(block);
        }
        // Inner lists are pending behind the outer ones' emitted items.
        while let Some(mut list) = self.lists.pop() {
            if let Some(block) = list.drain() {
                self.blocks.push(block);
            }
        }
        DocumentAst {
            blocks: self.blocks,
        }
    }
}

impl NodeVisitor for TreeBuilder<'_, '_> {
    fn open_element(&mut self, element: &Element) {
        self.start_tag(element);
    }

    fn close_element(&mut self, name: &str) {
        self.end_tag(name);
    }

    fn text(&mut self, text: &str) {
        TreeBuilder::text(self, text);
    }
}

/// Collapses runs of HTML whitespace to one space. Non-breaking spaces
/// are content and survive.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picture::DataUriResolver;
    use crate::ConvertOptions;
    use pretty_assertions::assert_eq;

    fn extract(html: &str) -> (DocumentAst, Vec<String>) {
        let options = ConvertOptions::default();
        let resolver = DataUriResolver;
        let mut context = ConversionContext::new(&options, &resolver);
        let doc = HtmlExtractor.extract(html, &mut context);
        (doc, context.take_diagnostics())
    }

    fn text(s: &str) -> InlineNode {
        InlineNode::Text(s.to_string())
    }

    fn styled(style: InlineStyle, children: Vec<InlineNode>) -> InlineNode {
        InlineNode::Styled { style, children }
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let (doc, _) = extract("<h2>Title</h2>\n<p style=\"text-align: center\">a <b>b</b></p>");
        assert_eq!(
            doc.blocks,
            vec![
                BlockNode::Heading {
                    level: 2,
                    content: vec![text("Title")],
                },
                BlockNode::Paragraph {
                    alignment: Alignment::Center,
                    content: vec![text("a "), styled(InlineStyle::Bold, vec![text("b")])],
                },
            ]
        );
    }

    #[test]
    fn test_whitespace_collapses_outside_pre() {
        let (doc, _) = extract("<p>  a \n\n  b  </p><pre>x  \n  y</pre>");
        assert_eq!(
            doc.blocks,
            vec![
                BlockNode::paragraph(vec![text("a b")]),
                BlockNode::CodeBlock("x  \n  y".to_string()),
            ]
        );
    }

    #[test]
    fn test_entities_decode_after_tags() {
        let (doc, _) = extract("<p>&lt;b&gt; &amp; &nbsp;x</p>");
        assert_eq!(
            doc.blocks,
            vec![BlockNode::paragraph(vec![text("<b> & \u{a0}x")])]
        );
    }

    #[test]
    fn test_lists_and_stray_items() {
        let (doc, _) = extract("<ol><li>one</li><li><p>two</p><p>more</p></li></ol><li>loose</li>");
        assert_eq!(
            doc.blocks,
            vec![
                BlockNode::List {
                    kind: ListKind::Ordered,
                    items: vec![
                        vec![text("one")],
                        vec![text("two"), InlineNode::LineBreak, text("more")],
                    ],
                },
                BlockNode::List {
                    kind: ListKind::Unordered,
                    items: vec![vec![text("loose")]],
                },
            ]
        );
    }

    #[test]
    fn test_nested_list_flattens_in_order() {
        let (doc, _) = extract("<ul><li>a<ol><li>b</li></ol></li><li>c</li></ul>");
        assert_eq!(
            doc.blocks,
            vec![
                BlockNode::List {
                    kind: ListKind::Unordered,
                    items: vec![vec![text("a")]],
                },
                BlockNode::List {
                    kind: ListKind::Ordered,
                    items: vec![vec![text("b")]],
                },
                BlockNode::List {
                    kind: ListKind::Unordered,
                    items: vec![vec![text("c")]],
                },
            ]
        );
    }

    #[test]
    fn test_table_rows_and_header_cells() {
        let (doc, _) = extract(
            "<table><thead><tr><th>H</th></tr></thead><tbody><tr><td>a</td><td><i>b</i></td></tr></tbody></table>",
        );
        assert_eq!(
            doc.blocks,
            vec![BlockNode::Table {
                rows: vec![
                    TableRow {
                        cells: vec![TableCell {
                            header: true,
                            content: vec![text("H")],
                        }],
                    },
                    TableRow {
                        cells: vec![
                            TableCell {
                                header: false,
                                content: vec![text("a")],
                            },
                            TableCell {
                                header: false,
                                content: vec![styled(InlineStyle::Italic, vec![text("b")])],
                            },
                        ],
                    },
                ],
            }]
        );
    }

    #[test]
    fn test_links_quotes_and_rules() {
        let (doc, _) = extract(
            "<p><a href=\"https://example.com\">site</a> <a>bare</a></p><blockquote>q</blockquote><hr/>",
        );
        assert_eq!(
            doc.blocks,
            vec![
                BlockNode::paragraph(vec![
                    InlineNode::Link {
                        href: Some("https://example.com".to_string()),
                        children: vec![text("site")],
                    },
                    text(" "),
                    InlineNode::Link {
                        href: None,
                        children: vec![text("bare")],
                    },
                ]),
                BlockNode::BlockQuote(vec![text("q")]),
                BlockNode::Rule,
            ]
        );
    }

    #[test]
    fn test_unresolvable_image_is_dropped_with_diagnostic() {
        let (doc, diagnostics) = extract("<p>a<img src=\"/nowhere/pic.png\">b</p><p><img></p>");
        assert_eq!(doc.blocks, vec![BlockNode::paragraph(vec![text("ab")])]);
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_unclosed_formatting_carries_into_next_paragraph() {
        let (doc, _) = extract("<p><b>bold<p>still bold</b> plain");
        assert_eq!(
            doc.blocks,
            vec![
                BlockNode::paragraph(vec![styled(InlineStyle::Bold, vec![text("bold")])]),
                BlockNode::paragraph(vec![
                    styled(InlineStyle::Bold, vec![text("still bold")]),
                    text(" plain"),
                ]),
            ]
        );
    }

    #[test]
    fn test_misnested_block_inside_inline() {
        let (doc, _) = extract("<b><p>x</b></p><p><i>a<b>b</i>c</b></p>");
        assert_eq!(
            doc.blocks,
            vec![
                BlockNode::paragraph(vec![styled(InlineStyle::Bold, vec![text("x")])]),
                BlockNode::paragraph(vec![
                    styled(
                        InlineStyle::Italic,
                        vec![text("a"), styled(InlineStyle::Bold, vec![text("b")])],
                    ),
                    styled(InlineStyle::Bold, vec![text("c")]),
                ]),
            ]
        );
    }

    #[test]
    fn test_full_document_head_is_ignored() {
        let (doc, _) = extract(
            "<!DOCTYPE html><html><head><title>Page</title><style>p{}</style></head>\
             <body><p>body</p></body></html>",
        );
        assert_eq!(doc.blocks, vec![BlockNode::paragraph(vec![text("body")])]);
    }

    #[test]
    fn test_spans_and_unknown_tags_are_unwrapped() {
        let (doc, _) = extract("<p><span style=\"color:red\">red</span> <font>x</font></p>");
        assert_eq!(doc.blocks, vec![BlockNode::paragraph(vec![text("red x")])]);
    }
}
