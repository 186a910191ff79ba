//! HTML text helpers

/// Escape a value for use inside a double- or single-quoted attribute
///
/// Also safe for element text. After escaping, the value contains no `<`,
/// so it can never be read back as citation markup.
pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Turn newlines into `<br>` line breaks, keeping the newline itself
pub fn nl2br(value: &str) -> String {
    value.replace("\r\n", "\n").replace('\n', "<br>\n")
}
