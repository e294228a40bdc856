//! Token interpreter - tracks group state and collects paragraphs.

use super::lexer::RtfToken;
use super::paragraph::{self, CharProps, Flat, ParaProps, Paragraph, Piece, TextRun};
use crate::converter::ConversionContext;
use crate::core::ast::{Alignment, ListKind, TableCell, TableRow};
use crate::mapping::CODE_FONT;
use crate::picture::{decode_picture, PictureGroup};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Destination {
    Body,
    Skip,
    FontTable,
    Picture,
    FieldInstruction,
    ListText,
    ListDefinition,
}

/// Destinations whose content never reaches the output.
const SKIPPED_DESTINATIONS: &[&str] = &[
    "colortbl",
    "stylesheet",
    "info",
    "header",
    "headerl",
    "headerr",
    "headerf",
    "footer",
    "footerl",
    "footerr",
    "footerf",
    "footnote",
    "annotation",
    "listtable",
    "listoverridetable",
    "revtbl",
    "rsidtbl",
    "filetbl",
    "object",
    "nonshppict",
    "xmlnstbl",
    "themedata",
    "colorschememapping",
    "latentstyles",
    "datastore",
    "generator",
    "pgdsctbl",
];

/// Destinations behind `\*` that are read rather than skipped.
const READ_STARRED: &[&str] = &["fldinst", "shppict", "pn"];

#[derive(Debug, Clone)]
struct GroupState {
    chars: CharProps,
    destination: Destination,
    /// Fallback characters after `\uN`, set by `\ucN`.
    unicode_skip: usize,
    link: Option<String>,
    /// Set by `\*` until the next control word.
    ignorable: bool,
    opens_field: bool,
    opens_picture: bool,
}

impl Default for GroupState {
    fn default() -> Self {
        Self {
            chars: CharProps::default(),
            destination: Destination::Body,
            unicode_skip: 1,
            link: None,
            ignorable: false,
            opens_field: false,
            opens_picture: false,
        }
    }
}

#[derive(Debug, Default)]
struct FontEntry {
    index: i32,
    name: String,
    modern: bool,
}

pub(super) struct RtfReader<'c, 'a> {
    context: &'c mut ConversionContext<'a>,
    current: GroupState,
    saved: Vec<GroupState>,
    props: ParaProps,
    paragraph: Paragraph,
    /// Content of earlier paragraphs in the open table cell.
    cell: Vec<Piece>,
    row: Vec<TableCell>,
    output: Vec<Flat>,
    /// Instruction text of each open field, innermost last.
    fields: Vec<String>,
    picture: Option<PictureGroup>,
    font_entry: Option<FontEntry>,
    /// Monospace font indexes, once a font table has been read.
    monospace: Option<HashSet<i32>>,
    pending_skip: usize,
    pending_high: Option<u32>,
}

impl<'c, 'a> RtfReader<'c, 'a> {
    pub fn new(context: &'c mut ConversionContext<'a>) -> Self {
        Self {
            context,
            current: GroupState::default(),
            saved: Vec::new(),
            props: ParaProps::default(),
            paragraph: Paragraph::default(),
            cell: Vec::new(),
            row: Vec::new(),
            output: Vec::new(),
            fields: Vec::new(),
            picture: None,
            font_entry: None,
            monospace: None,
            pending_skip: 0,
            pending_high: None,
        }
    }

    pub fn feed(&mut self, token: RtfToken<'_>) {
        match token {
            RtfToken::GroupStart => {
                self.pending_skip = 0;
                self.group_start();
            }
            RtfToken::GroupEnd => {
                self.pending_skip = 0;
                self.group_end();
            }
            RtfToken::ControlWord { name, param } => {
                self.pending_skip = 0;
                self.control_word(name, param);
            }
            RtfToken::ControlSymbol(ch) => {
                if self.pending_skip > 0 {
                    self.pending_skip -= 1;
                } else {
                    self.control_symbol(ch);
                }
            }
            RtfToken::HexByte(byte) => {
                if self.pending_skip > 0 {
                    self.pending_skip -= 1;
                } else {
                    let raw = [byte];
                    let (decoded, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(&raw);
                    self.emit(&decoded);
                }
            }
            RtfToken::Binary(bytes) => {
                if self.current.destination == Destination::Picture {
                    if let Some(picture) = &mut self.picture {
                        picture.hex.push_str(&hex::encode(bytes));
                    }
                }
            }
            RtfToken::Text(text) => {
                let text = self.consume_fallback(text);
                if !text.is_empty() {
                    self.emit(text);
                }
            }
        }
    }

    pub fn finish(mut self) -> Vec<Flat> {
        if self.props.in_table || !self.row.is_empty() || !self.cell.is_empty() {
            if !self.paragraph.pieces.is_empty() {
                self.end_cell();
            }
            self.end_row();
        }
        if !self.paragraph.is_empty() {
            self.end_paragraph();
        }
        self.output
    }

    fn group_start(&mut self) {
        let mut child = self.current.clone();
        child.ignorable = false;
        child.opens_field = false;
        child.opens_picture = false;
        if child.destination == Destination::Picture {
            child.destination = Destination::Skip;
        }
        let parent = std::mem::replace(&mut self.current, child);
        self.saved.push(parent);
    }

    fn group_end(&mut self) {
        let Some(parent) = self.saved.pop() else {
            return;
        };
        let ended = std::mem::replace(&mut self.current, parent);
        if ended.destination == Destination::FontTable {
            self.finish_font_entry();
        }
        if ended.opens_picture {
            self.finish_picture();
        }
        if ended.opens_field {
            self.fields.pop();
        }
    }

    fn control_word(&mut self, name: &str, param: Option<i32>) {
        if self.current.ignorable {
            self.current.ignorable = false;
            if !READ_STARRED.contains(&name) {
                self.current.destination = Destination::Skip;
                return;
            }
        }

        match self.current.destination {
            Destination::Skip => {}
            Destination::FontTable => self.font_table_word(name, param),
            Destination::Picture => self.picture_word(name, param),
            Destination::ListDefinition => self.list_definition_word(name),
            Destination::FieldInstruction | Destination::ListText => self.text_word(name, param),
            Destination::Body => {
                if !self.destination_word(name) {
                    self.body_word(name, param);
                }
            }
        }
    }

    fn control_symbol(&mut self, ch: char) {
        match ch {
            '*' => self.current.ignorable = true,
            '\\' | '{' | '}' => self.emit(ch.encode_utf8(&mut [0u8; 4])),
            '~' => self.emit("\u{a0}"),
            '_' => self.emit("-"),
            _ => {}
        }
    }

    /// Handles words that switch the destination of the current group.
    fn destination_word(&mut self, name: &str) -> bool {
        match name {
            "fonttbl" => {
                self.current.destination = Destination::FontTable;
                self.monospace.get_or_insert_with(HashSet::new);
            }
            "pict" => {
                self.current.destination = Destination::Picture;
                self.current.opens_picture = true;
                self.picture = Some(PictureGroup::default());
            }
            "field" => {
                self.current.opens_field = true;
                self.fields.push(String::new());
            }
            "fldinst" => self.current.destination = Destination::FieldInstruction,
            "fldrslt" => {
                self.current.link = self.fields.last().and_then(|inst| hyperlink_target(inst));
            }
            "pntext" | "listtext" => {
                self.current.destination = Destination::ListText;
                self.paragraph.marker = Some(String::new());
            }
            "pn" => self.current.destination = Destination::ListDefinition,
            "shppict" => {}
            _ if SKIPPED_DESTINATIONS.contains(&name) => {
                self.current.destination = Destination::Skip;
            }
            _ => return false,
        }
        true
    }

    fn body_word(&mut self, name: &str, param: Option<i32>) {
        if apply_char_word(&mut self.current.chars, name, param) {
            return;
        }
        match name {
            "par" | "sect" | "page" => self.end_paragraph(),
            "pard" => self.props = ParaProps::default(),
            "line" => self.paragraph.pieces.push(Piece::LineBreak),
            "ql" => self.props.alignment = Alignment::Left,
            "qc" => self.props.alignment = Alignment::Center,
            "qr" => self.props.alignment = Alignment::Right,
            "qj" => self.props.alignment = Alignment::Justify,
            "li" => self.props.left_indent = param.unwrap_or(0),
            "ri" => self.props.right_indent = param.unwrap_or(0),
            "fi" => self.props.first_indent = param.unwrap_or(0),
            "sb" => self.props.space_before = param,
            "sa" => self.props.space_after = param,
            "intbl" => self.props.in_table = true,
            "brdrb" => self.props.border_bottom = true,
            "cell" => self.end_cell(),
            "row" => self.end_row(),
            _ => self.text_word(name, param),
        }
    }

    /// Words that produce characters, valid in any text destination.
    fn text_word(&mut self, name: &str, param: Option<i32>) {
        match name {
            "u" => self.unicode(param.unwrap_or(0)),
            "uc" => self.current.unicode_skip = param.unwrap_or(1).max(0) as usize,
            _ => {
                if let Some(text) = special_char(name) {
                    self.emit(text);
                }
            }
        }
    }

    fn font_table_word(&mut self, name: &str, param: Option<i32>) {
        match name {
            "f" => {
                self.finish_font_entry();
                self.font_entry = Some(FontEntry {
                    index: param.unwrap_or(0),
                    ..FontEntry::default()
                });
            }
            "fmodern" => {
                if let Some(entry) = &mut self.font_entry {
                    entry.modern = true;
                }
            }
            _ => self.text_word(name, param),
        }
    }

    fn finish_font_entry(&mut self) {
        let Some(entry) = self.font_entry.take() else {
            return;
        };
        let name = entry.name.to_ascii_lowercase();
        let monospace = entry.modern
            || ["courier", "mono", "consolas"]
                .iter()
                .any(|hint| name.contains(hint));
        if monospace {
            self.monospace
                .get_or_insert_with(HashSet::new)
                .insert(entry.index);
        }
    }

    fn picture_word(&mut self, name: &str, param: Option<i32>) {
        let Some(picture) = &mut self.picture else {
            return;
        };
        match name {
            "picw" => picture.width = param,
            "pich" => picture.height = param,
            "picwgoal" => picture.goal_width = param,
            "pichgoal" => picture.goal_height = param,
            _ if is_blip(name) => picture.blip = Some(name.to_string()),
            _ => {}
        }
    }

    fn list_definition_word(&mut self, name: &str) {
        match name {
            "pnlvlblt" => self.paragraph.numbering = Some(ListKind::Unordered),
            "pndec" | "pnucrm" | "pnlcrm" | "pnucltr" | "pnlcltr" => {
                self.paragraph.numbering = Some(ListKind::Ordered)
            }
            _ => {}
        }
    }

    fn finish_picture(&mut self) {
        let Some(group) = self.picture.take() else {
            return;
        };
        match decode_picture(&group, &self.context.options().image) {
            Ok(image) => self.paragraph.pieces.push(Piece::Image(image)),
            Err(e) => {
                log::warn!("Dropping embedded picture: {e}");
                self.context.record(format!("picture dropped: {e}"));
            }
        }
    }

    fn unicode(&mut self, param: i32) {
        let unit = (param & 0xFFFF) as u32;
        match unit {
            0xD800..=0xDBFF => self.pending_high = Some(unit),
            0xDC00..=0xDFFF => {
                if let Some(high) = self.pending_high.take() {
                    let code = 0x10000 + ((high - 0xD800) << 10) + (unit - 0xDC00);
                    if let Some(ch) = char::from_u32(code) {
                        self.emit(ch.encode_utf8(&mut [0u8; 4]));
                    }
                }
            }
            _ => {
                self.pending_high = None;
                if let Some(ch) = char::from_u32(unit) {
                    self.emit(ch.encode_utf8(&mut [0u8; 4]));
                }
            }
        }
        self.pending_skip = self.current.unicode_skip;
    }

    /// Drops the fallback characters that follow a `\uN` escape.
    fn consume_fallback<'t>(&mut self, text: &'t str) -> &'t str {
        if self.pending_skip == 0 {
            return text;
        }
        match text.char_indices().nth(self.pending_skip) {
            Some((idx, _)) => {
                self.pending_skip = 0;
                &text[idx..]
            }
            None => {
                self.pending_skip = self.pending_skip.saturating_sub(text.chars().count());
                ""
            }
        }
    }

    /// Routes text to the current destination.
    fn emit(&mut self, text: &str) {
        match self.current.destination {
            Destination::Body => self.push_text(text),
            Destination::FieldInstruction => {
                if let Some(instruction) = self.fields.last_mut() {
                    instruction.push_str(text);
                }
            }
            Destination::ListText => {
                if let Some(marker) = &mut self.paragraph.marker {
                    marker.push_str(text);
                }
            }
            Destination::Picture => {
                if let Some(picture) = &mut self.picture {
                    picture.hex.push_str(text);
                }
            }
            Destination::FontTable => {
                if let Some(entry) = &mut self.font_entry {
                    entry.name.push_str(text);
                    if text.contains(';') {
                        self.finish_font_entry();
                    }
                }
            }
            Destination::Skip | Destination::ListDefinition => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        let chars = &self.current.chars;
        let link = &self.current.link;
        if let Some(Piece::Run(run)) = self.paragraph.pieces.last_mut() {
            if run.chars == *chars && run.link == *link {
                run.text.push_str(text);
                return;
            }
        }
        let monospace = match &self.monospace {
            Some(fonts) => fonts.contains(&chars.font),
            None => chars.font == CODE_FONT,
        };
        self.paragraph.pieces.push(Piece::Run(TextRun {
            text: text.to_string(),
            chars: chars.clone(),
            monospace,
            link: link.clone(),
        }));
    }

    fn end_paragraph(&mut self) {
        let paragraph = std::mem::take(&mut self.paragraph);
        if self.props.in_table {
            self.cell.extend(paragraph.pieces);
            self.cell.push(Piece::LineBreak);
            return;
        }
        let options = self.context.options();
        if let Some(flat) = paragraph::classify(paragraph, &self.props, options) {
            self.output.push(flat);
        }
    }

    fn end_cell(&mut self) {
        let paragraph = std::mem::take(&mut self.paragraph);
        let mut pieces = std::mem::take(&mut self.cell);
        pieces.extend(paragraph.pieces);
        self.row.push(paragraph::table_cell(&pieces));
    }

    fn end_row(&mut self) {
        if !self.paragraph.pieces.is_empty() {
            self.end_cell();
        }
        self.cell.clear();
        self.props.in_table = false;
        if !self.row.is_empty() {
            let cells = std::mem::take(&mut self.row);
            self.output.push(Flat::Row(TableRow { cells }));
        }
    }
}

/// Applies a character formatting word. Returns false for other words.
fn apply_char_word(chars: &mut CharProps, name: &str, param: Option<i32>) -> bool {
    let on = param != Some(0);
    match name {
        "plain" => *chars = CharProps::default(),
        "b" => chars.bold = on,
        "i" => chars.italic = on,
        "ul" | "uld" | "uldb" | "ulw" | "uldash" | "ulth" => chars.underline = on,
        "ulnone" => chars.underline = false,
        "strike" | "striked" => chars.strike = on,
        "sub" => {
            chars.subscript = on;
            chars.superscript = false;
        }
        "super" => {
            chars.superscript = on;
            chars.subscript = false;
        }
        "nosupersub" => {
            chars.subscript = false;
            chars.superscript = false;
        }
        "f" => chars.font = param.unwrap_or(0),
        "fs" => chars.font_size = param,
        "cf" => chars.color = param.unwrap_or(0),
        _ => return false,
    }
    true
}

fn is_blip(name: &str) -> bool {
    name.ends_with("blip")
        || matches!(
            name,
            "wmetafile" | "pmmetafile" | "macpict" | "dibitmap" | "wbitmap"
        )
}

fn special_char(name: &str) -> Option<&'static str> {
    let text = match name {
        "tab" => "\t",
        "bullet" => "\u{2022}",
        "emdash" => "\u{2014}",
        "endash" => "\u{2013}",
        "lquote" => "\u{2018}",
        "rquote" => "\u{2019}",
        "ldblquote" => "\u{201c}",
        "rdblquote" => "\u{201d}",
        "emspace" | "enspace" | "qmspace" => " ",
        _ => return None,
    };
    Some(text)
}

/// Target of a `HYPERLINK` field instruction.
fn hyperlink_target(instruction: &str) -> Option<String> {
    static HYPERLINK: OnceLock<Regex> = OnceLock::new();
    let re = HYPERLINK.get_or_init(|| {
        Regex::new(r#"(?i)HYPERLINK\s+(?:\\l\s+)?(?:"([^"]*)"|(\S+))"#).expect("valid regex")
    });
    let caps = re.captures(instruction)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().trim().to_string())
        .filter(|target| !target.is_empty())
}
