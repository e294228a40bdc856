//! RTF tokenizer.

/// Longest control word name accepted before the word is cut off.
const MAX_WORD_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RtfToken<'a> {
    GroupStart,
    GroupEnd,
    ControlWord { name: &'a str, param: Option<i32> },
    ControlSymbol(char),
    /// `\'hh` escape.
    HexByte(u8),
    /// Payload of a `\binN` control word.
    Binary(&'a [u8]),
    Text(&'a str),
}

/// Splits an RTF document into tokens. Bare CR and LF are dropped; a
/// backslash before a line break is read as `\par`.
pub fn tokenize(input: &str) -> Vec<RtfToken<'_>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'{' => {
                tokens.push(RtfToken::GroupStart);
                pos += 1;
            }
            b'}' => {
                tokens.push(RtfToken::GroupEnd);
                pos += 1;
            }
            b'\r' | b'\n' => pos += 1,
            b'\\' => pos = read_control(input, pos + 1, &mut tokens),
            _ => {
                let start = pos;
                while pos < bytes.len() && !matches!(bytes[pos], b'\\' | b'{' | b'}' | b'\r' | b'\n')
                {
                    pos += 1;
                }
                tokens.push(RtfToken::Text(&input[start..pos]));
            }
        }
    }
    tokens
}

/// Reads the control sequence after a backslash and returns the position
/// following it.
fn read_control<'a>(input: &'a str, mut pos: usize, tokens: &mut Vec<RtfToken<'a>>) -> usize {
    let bytes = input.as_bytes();
    let Some(&first) = bytes.get(pos) else {
        return pos;
    };

    if first.is_ascii_alphabetic() {
        let start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() && pos - start < MAX_WORD_LEN {
            pos += 1;
        }
        let name = &input[start..pos];

        let param_start = pos;
        if bytes.get(pos) == Some(&b'-') {
            pos += 1;
        }
        let digits_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        let param = if pos > digits_start {
            Some(parse_param(&input[param_start..pos]))
        } else {
            pos = param_start;
            None
        };
        if bytes.get(pos) == Some(&b' ') {
            pos += 1;
        }

        tokens.push(RtfToken::ControlWord { name, param });

        if name == "bin" {
            let len = param.unwrap_or(0).max(0) as usize;
            let mut end = pos.saturating_add(len).min(bytes.len());
            while !input.is_char_boundary(end) {
                end += 1;
            }
            tokens.push(RtfToken::Binary(&bytes[pos..end]));
            pos = end;
        }
        return pos;
    }

    if first == b'\'' {
        let hex = input.get(pos + 1..pos + 3);
        if let Some(value) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
            tokens.push(RtfToken::HexByte(value));
            return pos + 3;
        }
        tokens.push(RtfToken::ControlSymbol('\''));
        return pos + 1;
    }

    if first == b'\r' || first == b'\n' {
        tokens.push(RtfToken::ControlWord {
            name: "par",
            param: None,
        });
        return pos + 1;
    }

    match input[pos..].chars().next() {
        Some(ch) => {
            tokens.push(RtfToken::ControlSymbol(ch));
            pos + ch.len_utf8()
        }
        None => pos,
    }
}

fn parse_param(raw: &str) -> i32 {
    match raw.parse::<i64>() {
        Ok(value) => value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
        // Only digit runs long enough to overflow i64 land here.
        Err(_) if raw.starts_with('-') => i32::MIN,
        Err(_) => i32::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(name: &str, param: Option<i32>) -> RtfToken<'_> {
        RtfToken::ControlWord { name, param }
    }

    #[test]
    fn test_words_symbols_and_text() {
        let tokens = tokenize("{\\rtf1\\b0 Hi\\par\n\\{x\\'e9}");
        assert_eq!(
            tokens,
            vec![
                RtfToken::GroupStart,
                word("rtf", Some(1)),
                word("b", Some(0)),
                RtfToken::Text("Hi"),
                word("par", None),
                RtfToken::ControlSymbol('{'),
                RtfToken::Text("x"),
                RtfToken::HexByte(0xe9),
                RtfToken::GroupEnd,
            ]
        );
    }

    #[test]
    fn test_negative_parameter_and_space_delimiter() {
        let tokens = tokenize("\\fi-360 \\u-10179?");
        assert_eq!(
            tokens,
            vec![
                word("fi", Some(-360)),
                word("u", Some(-10179)),
                RtfToken::Text("?"),
            ]
        );
    }

    #[test]
    fn test_escaped_newline_is_par() {
        assert_eq!(
            tokenize("a\\\nb"),
            vec![RtfToken::Text("a"), word("par", None), RtfToken::Text("b")]
        );
    }

    #[test]
    fn test_bin_payload_is_opaque() {
        let tokens = tokenize("\\bin3 {}\\x");
        assert_eq!(
            tokens,
            vec![
                word("bin", Some(3)),
                RtfToken::Binary(b"{}\\"),
                RtfToken::Text("x"),
            ]
        );
    }

    #[test]
    fn test_huge_parameter_saturates() {
        assert_eq!(
            tokenize("\\fs99999999999999999999999"),
            vec![word("fs", Some(i32::MAX))]
        );
    }

    #[test]
    fn test_trailing_backslash_is_ignored() {
        assert_eq!(tokenize("x\\"), vec![RtfToken::Text("x")]);
    }
}
