//! Citation tag scanner
//!
//! Splits text into literal runs, opening tags and closing tags. Recognized
//! forms (tag names are case-sensitive):
//!
//! ```text
//! <fa a=NUM>            <pa a=NUM>
//! <fa a=NUM p=PAGE ...> <pa a=NUM p=PAGE ...>
//! </fa>                 </pa>
//! ```
//!
//! `a=` must be the first attribute. `p=` is only recognized directly after
//! it; anything else up to the closing `>` is ignored. The scan is a single
//! forward pass, no backtracking over the input.

use serde::{Deserialize, Serialize};

/// Citation tag flavour: `fa` (full) or `pa` (partial)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Full,
    Partial,
}

impl TagKind {
    pub fn tag_name(&self) -> &'static str {
        match self {
            TagKind::Full => "fa",
            TagKind::Partial => "pa",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            TagKind::Full => 0,
            TagKind::Partial => 1,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "fa" => Some(TagKind::Full),
            "pa" => Some(TagKind::Partial),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OpenTag<'a> {
    pub kind: TagKind,
    pub number: &'a str,
    pub page: Option<&'a str>,
    /// The tag exactly as written
    pub raw: &'a str,
    /// Byte offset of the tag in the scanned input
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    Text(&'a str),
    Open(OpenTag<'a>),
    Close { kind: TagKind, raw: &'a str },
}

/// Length of the leading run of attribute-value characters
fn value_len(s: &str) -> usize {
    s.find(|c: char| c.is_whitespace() || c == '>')
        .unwrap_or(s.len())
}

fn whitespace_len(s: &str) -> usize {
    s.find(|c: char| !c.is_whitespace()).unwrap_or(s.len())
}

/// Parse an opening tag at the start of `s`, returning it and its length
fn parse_open(s: &str, offset: usize) -> Option<(OpenTag<'_>, usize)> {
    let kind = TagKind::from_name(s.get(1..3)?)?;
    let mut pos = 3;

    let ws = whitespace_len(&s[pos..]);
    if ws == 0 {
        return None;
    }
    pos += ws;

    if !s[pos..].starts_with("a=") {
        return None;
    }
    pos += 2;
    let len = value_len(&s[pos..]);
    if len == 0 {
        return None;
    }
    let number = &s[pos..pos + len];
    pos += len;

    let mut page = None;
    let ws = whitespace_len(&s[pos..]);
    if ws > 0 && s[pos + ws..].starts_with("p=") {
        let start = pos + ws + 2;
        let len = value_len(&s[start..]);
        if len > 0 {
            page = Some(&s[start..start + len]);
            pos = start + len;
        }
    }

    let end = pos + s[pos..].find('>')? + 1;
    Some((
        OpenTag {
            kind,
            number,
            page,
            raw: &s[..end],
            offset,
        },
        end,
    ))
}

fn parse_close(s: &str) -> Option<(TagKind, usize)> {
    let rest = s.strip_prefix("</")?;
    let kind = TagKind::from_name(rest.get(..2)?)?;
    rest[2..].starts_with('>').then_some((kind, 5))
}

/// Iterator over the tokens of one input string
pub(crate) struct Tokens<'a> {
    input: &'a str,
    pos: usize,
    /// Position of the last `>`; no opening tag can start after it
    last_gt: Option<usize>,
}

impl<'a> Tokens<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            last_gt: input.rfind('>'),
        }
    }

    fn tag_at(&self, at: usize) -> Option<(Token<'a>, usize)> {
        let s = &self.input[at..];
        if !s.starts_with('<') {
            return None;
        }
        if let Some((kind, len)) = parse_close(s) {
            return Some((
                Token::Close {
                    kind,
                    raw: &s[..len],
                },
                len,
            ));
        }
        if self.last_gt.map_or(true, |gt| gt < at) {
            return None;
        }
        parse_open(s, at).map(|(tag, len)| (Token::Open(tag), len))
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if self.pos >= self.input.len() {
            return None;
        }

        if let Some((token, len)) = self.tag_at(self.pos) {
            self.pos += len;
            return Some(token);
        }

        let start = self.pos;
        let rest = &self.input[start..];
        let end = rest
            .match_indices('<')
            .map(|(i, _)| start + i)
            .filter(|&i| i > start)
            .find(|&i| self.tag_at(i).is_some())
            .unwrap_or(self.input.len());

        self.pos = end;
        Some(Token::Text(&self.input[start..end]))
    }
}
