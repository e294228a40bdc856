/// Escapes a double-quoted attribute value.
pub fn escape_html_attr(value: &str) -> String {
    html_escape::encode_double_quoted_attribute(value).into_owned()
}

/// Escapes element text; non-breaking spaces are written as `&nbsp;`.
pub fn escape_html_text(value: &str) -> String {
    html_escape::encode_text(value).replace('\u{a0}', "&nbsp;")
}

/// Escapes literal text for an RTF body.
///
/// Characters above 127 become `\uN?` with `N` the UTF-16 code unit as a
/// signed 16-bit value, so astral characters produce a surrogate pair.
pub fn escape_rtf_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let mut units = [0u16; 2];
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '{' => escaped.push_str("\\{"),
            '}' => escaped.push_str("\\}"),
            '\t' => escaped.push_str("\\tab "),
            '\n' => escaped.push_str("\\line "),
            c if c.is_control() => {}
            c if (c as u32) > 127 => {
                for unit in c.encode_utf16(&mut units).iter() {
                    escaped.push_str(&format!("\\u{}?", *unit as i16));
                }
            }
            c => escaped.push(c),
        }
    }
    escaped
}
