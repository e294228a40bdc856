//! Mapping tables between HTML tags, document nodes and RTF control words.
//!
//! The encoder reads these tables to expand nodes and the decoder reads the
//! same tables to recognize them again, so a change here moves both
//! directions together.

use crate::core::ast::{Alignment, InlineStyle};
use regex::Regex;
use std::sync::OnceLock;

/// Spacing and size that identify a heading level in RTF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingSignature {
    pub level: u8,
    /// `\sbN`, twips.
    pub space_before: i32,
    /// `\saN`, twips.
    pub space_after: i32,
    /// `\fsN`, half-points.
    pub font_size: i32,
}

impl HeadingSignature {
    const fn new(level: u8, space_before: i32, space_after: i32, font_size: i32) -> Self {
        Self {
            level,
            space_before,
            space_after,
            font_size,
        }
    }
}

pub const DEFAULT_HEADINGS: [HeadingSignature; 6] = [
    HeadingSignature::new(1, 240, 120, 48),
    HeadingSignature::new(2, 200, 100, 36),
    HeadingSignature::new(3, 160, 80, 32),
    HeadingSignature::new(4, 120, 60, 28),
    HeadingSignature::new(5, 100, 50, 26),
    HeadingSignature::new(6, 80, 40, 24),
];

/// Document header: charset, font table (proportional + monospace) and a
/// color table with default, black, link blue and quote gray.
pub const RTF_PREAMBLE: &str = concat!(
    r"{\rtf1\ansi\ansicpg1252\deff0",
    "\n",
    r"{\fonttbl{\f0\fswiss\fcharset0 Calibri;}{\f1\fmodern\fcharset0 Courier New;}}",
    "\n",
    r"{\colortbl ;\red0\green0\blue0;\red0\green0\blue255;\red128\green128\blue128;}",
    "\n",
    r"\viewkind4\uc1\pard\sa200\sl276\slmult1\f0\fs22",
    "\n",
);

pub const RTF_CLOSING: &str = "}";

/// Spacing of an ordinary body paragraph.
pub const PARAGRAPH_SPACING: &str = r"\sa200\sl276\slmult1";

pub const QUOTE_PARAGRAPH: &str = r"\li720\ri720\sb120\sa120";
pub const QUOTE_RUN: &str = r"\i\cf3";
pub const QUOTE_INDENT: i32 = 720;

pub const CODE_BLOCK_PARAGRAPH: &str = r"\sb120\sa120";
pub const CODE_BLOCK_SPACING: i32 = 120;

pub const RULE_PARAGRAPH: &str = r"\brdrb\brdrs\brdrw10\brsp20";

pub const LIST_ITEM_PARAGRAPH: &str = r"\li720\fi-360";
pub const BULLET: char = '\u{2022}';

pub const LINK_RUN: &str = r"\ul\cf2";

pub const TABLE_ROW: &str = concat!(
    r"\trowd\trgaph70\trleft-70",
    r"\trbrdrt\brdrs\brdrw10\trbrdrl\brdrs\brdrw10",
    r"\trbrdrb\brdrs\brdrw10\trbrdrr\brdrs\brdrw10",
);
pub const TABLE_CELL_BORDERS: &str = concat!(
    r"\clbrdrt\brdrw10\brdrs\clbrdrl\brdrw10\brdrs",
    r"\clbrdrb\brdrw10\brdrs\clbrdrr\brdrw10\brdrs",
);
pub const TABLE_CELL_WIDTH: i32 = 3000;

/// Color table index of hyperlinks.
pub const LINK_COLOR: i32 = 2;
/// Color table index of block quotes.
pub const QUOTE_COLOR: i32 = 3;
/// Font table index of the monospace font.
pub const CODE_FONT: i32 = 1;
pub const CODE_FONT_SIZE: i32 = 20;

/// One inline style: the HTML tags that produce it, the tag written back
/// on decode and the RTF group controls.
#[derive(Debug, Clone, Copy)]
pub struct InlineTag {
    pub style: InlineStyle,
    pub html: &'static str,
    pub html_aliases: &'static [&'static str],
    pub rtf: &'static str,
}

pub const INLINE_TAGS: &[InlineTag] = &[
    InlineTag {
        style: InlineStyle::Bold,
        html: "strong",
        html_aliases: &["b", "strong"],
        rtf: r"\b",
    },
    InlineTag {
        style: InlineStyle::Italic,
        html: "em",
        html_aliases: &["i", "em"],
        rtf: r"\i",
    },
    InlineTag {
        style: InlineStyle::Underline,
        html: "u",
        html_aliases: &["u", "ins"],
        rtf: r"\ul",
    },
    InlineTag {
        style: InlineStyle::Strike,
        html: "s",
        html_aliases: &["s", "strike", "del"],
        rtf: r"\strike",
    },
    InlineTag {
        style: InlineStyle::Subscript,
        html: "sub",
        html_aliases: &["sub"],
        rtf: r"\sub",
    },
    InlineTag {
        style: InlineStyle::Superscript,
        html: "sup",
        html_aliases: &["sup"],
        rtf: r"\super",
    },
    InlineTag {
        style: InlineStyle::Code,
        html: "code",
        html_aliases: &["code"],
        rtf: r"\f1\fs20",
    },
];

pub fn inline_style_for_tag(name: &str) -> Option<InlineStyle> {
    INLINE_TAGS
        .iter()
        .find(|tag| tag.html_aliases.contains(&name))
        .map(|tag| tag.style)
}

pub fn inline_tag(style: InlineStyle) -> &'static InlineTag {
    // Every InlineStyle variant has an entry.
    INLINE_TAGS
        .iter()
        .find(|tag| tag.style == style)
        .unwrap_or(&INLINE_TAGS[0])
}

pub fn heading_level_for_tag(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Looks up the heading signature for a level, clamping to 1..=6.
pub fn heading_signature(headings: &[HeadingSignature; 6], level: u8) -> &HeadingSignature {
    let idx = usize::from(level.clamp(1, 6)) - 1;
    &headings[idx]
}

/// Heading level whose font size, `\sb` and `\sa` all match. Bold text at
/// a heading size without the spacing pair stays a paragraph.
pub fn heading_for_signature(
    headings: &[HeadingSignature; 6],
    font_size: i32,
    space_before: Option<i32>,
    space_after: Option<i32>,
) -> Option<u8> {
    headings
        .iter()
        .find(|sig| {
            sig.font_size == font_size
                && space_before == Some(sig.space_before)
                && space_after == Some(sig.space_after)
        })
        .map(|sig| sig.level)
}

/// Alignment declared in an inline `style` attribute.
pub fn alignment_from_style(style: &str) -> Alignment {
    static TEXT_ALIGN: OnceLock<Regex> = OnceLock::new();
    let re = TEXT_ALIGN.get_or_init(|| {
        Regex::new(r"(?i)text-align\s*:\s*(left|center|right|justify)").expect("valid regex")
    });
    match re
        .captures(style)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
        .as_deref()
    {
        Some("center") => Alignment::Center,
        Some("right") => Alignment::Right,
        Some("justify") => Alignment::Justify,
        _ => Alignment::Left,
    }
}

pub fn alignment_control(alignment: Alignment) -> Option<&'static str> {
    match alignment {
        Alignment::Left => None,
        Alignment::Center => Some(r"\qc"),
        Alignment::Right => Some(r"\qr"),
        Alignment::Justify => Some(r"\qj"),
    }
}

pub fn alignment_css(alignment: Alignment) -> Option<&'static str> {
    match alignment {
        Alignment::Left => None,
        Alignment::Center => Some("center"),
        Alignment::Right => Some("right"),
        Alignment::Justify => Some("justify"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_aliases_resolve_to_one_style() {
        assert_eq!(inline_style_for_tag("b"), Some(InlineStyle::Bold));
        assert_eq!(inline_style_for_tag("strong"), Some(InlineStyle::Bold));
        assert_eq!(inline_style_for_tag("del"), Some(InlineStyle::Strike));
        assert_eq!(inline_style_for_tag("span"), None);
        assert_eq!(inline_tag(InlineStyle::Superscript).rtf, r"\super");
    }

    #[test]
    fn test_heading_signature_lookup() {
        assert_eq!(
            heading_for_signature(&DEFAULT_HEADINGS, 36, Some(200), Some(100)),
            Some(2)
        );
        assert_eq!(
            heading_for_signature(&DEFAULT_HEADINGS, 36, Some(240), Some(100)),
            None
        );
        assert_eq!(
            heading_for_signature(&DEFAULT_HEADINGS, 22, Some(200), Some(100)),
            None
        );
    }

    #[test]
    fn test_heading_size_without_spacing_is_not_heading() {
        // Word processors write bold body text at \fs24, the h6 size.
        assert_eq!(heading_for_signature(&DEFAULT_HEADINGS, 24, None, None), None);
        assert_eq!(heading_for_signature(&DEFAULT_HEADINGS, 24, Some(80), None), None);
        assert_eq!(
            heading_for_signature(&DEFAULT_HEADINGS, 24, Some(80), Some(40)),
            Some(6)
        );
    }

    #[test]
    fn test_alignment_from_style() {
        assert_eq!(
            alignment_from_style("color: red; text-align: Center;"),
            Alignment::Center
        );
        assert_eq!(alignment_from_style("text-align:justify"), Alignment::Justify);
        assert_eq!(alignment_from_style("margin: 0"), Alignment::Left);
    }

    #[test]
    fn test_preamble_is_balanced() {
        let opens = RTF_PREAMBLE.matches('{').count();
        let closes = RTF_PREAMBLE.matches('}').count();
        assert_eq!(opens, closes + 1);
    }
}
