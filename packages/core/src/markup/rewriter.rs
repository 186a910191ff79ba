//! Citation Markup Rewriter
//!
//! Replaces every matched `<fa ...>...</fa>` / `<pa ...>...</pa>` pair with
//! an annotated span:
//!
//! ```text
//! <span class="annotated-text" title="FOOTNOTE" data-annotation="NUM"><sup class="annotation-number">NUM</sup>[CONTENT]</span>
//! ```
//!
//! # Matching
//!
//! Tags nest. A closing tag pairs with the nearest open tag of the same kind;
//! open tags left unclosed between the two are not citations. Each span is
//! produced when its closing tag is reached, so inner citations are already
//! rewritten by the time their container wraps them.
//!
//! Citation tags that never pair up are neutralized by escaping every `<`
//! in their raw text.
//! Together with escaped attribute values this means the output contains no
//! citation markup at all, so rewriting is idempotent.

use crate::markup::html::escape_attribute;
use crate::markup::resolver::AnnotationTable;
use crate::markup::scanner::{OpenTag, TagKind, Token, Tokens};
use serde::{Deserialize, Serialize};

/// Label/name value that marks a structural placeholder node
pub const PSEUDO_SENTINEL: &str = "pseudo";

/// True when a label or name field holds the placeholder sentinel
pub fn is_pseudo(value: &str) -> bool {
    value.eq_ignore_ascii_case(PSEUDO_SENTINEL)
}

/// One citation found while rewriting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Footnote {
    pub number: String,
    pub page: Option<String>,
    /// Resolved footnote text, or the not-found message
    pub text: String,
    pub kind: TagKind,
    pub resolved: bool,
}

/// Rewritten text plus the footnotes it cites, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteOutput {
    pub text: String,
    pub footnotes: Vec<Footnote>,
}

impl RewriteOutput {
    /// Output for text that was not rewritten
    pub fn unchanged(text: &str) -> Self {
        Self {
            text: text.to_string(),
            footnotes: Vec::new(),
        }
    }
}

struct Frame<'a> {
    tag: OpenTag<'a>,
    out: String,
}

/// An unpaired tag's raw text can span a later tag, so every `<` in it is escaped
fn neutralize(raw: &str) -> String {
    raw.replace('<', "&lt;")
}

fn current<'s>(root: &'s mut String, stack: &'s mut [Frame<'_>]) -> &'s mut String {
    match stack.last_mut() {
        Some(frame) => &mut frame.out,
        None => root,
    }
}

/// Rewrites citation markup against one statute's annotation table
pub struct MarkupRewriter<'t> {
    table: &'t AnnotationTable,
}

impl<'t> MarkupRewriter<'t> {
    pub fn new(table: &'t AnnotationTable) -> Self {
        Self { table }
    }

    /// Rewrite `input` and report every citation encountered
    pub fn rewrite(&self, input: &str) -> RewriteOutput {
        let mut footnotes = Vec::new();
        let text = self.render(input, Some(&mut footnotes));
        RewriteOutput { text, footnotes }
    }

    /// Rewrite `input` without collecting footnotes
    pub fn rewrite_text(&self, input: &str) -> String {
        self.render(input, None)
    }

    /// Rewrite a label or name field, leaving the pseudo sentinel untouched
    pub fn rewrite_field(&self, value: &str) -> RewriteOutput {
        if is_pseudo(value) {
            return RewriteOutput::unchanged(value);
        }
        self.rewrite(value)
    }

    fn render(&self, input: &str, sink: Option<&mut Vec<Footnote>>) -> String {
        let mut root = String::with_capacity(input.len());
        let mut stack: Vec<Frame<'_>> = Vec::new();
        let mut open_counts = [0usize; 2];
        let mut found: Vec<(usize, Footnote)> = Vec::new();

        for token in Tokens::new(input) {
            match token {
                Token::Text(text) => current(&mut root, &mut stack).push_str(text),
                Token::Open(tag) => {
                    open_counts[tag.kind.index()] += 1;
                    stack.push(Frame {
                        tag,
                        out: String::new(),
                    });
                }
                Token::Close { kind, raw } => {
                    if open_counts[kind.index()] == 0 {
                        current(&mut root, &mut stack).push_str(&neutralize(raw));
                        continue;
                    }
                    // Unwind to the nearest open tag of this kind
                    while let Some(frame) = stack.pop() {
                        open_counts[frame.tag.kind.index()] -= 1;
                        let parent = current(&mut root, &mut stack);
                        if frame.tag.kind == kind {
                            let (span, footnote) = self.wrap(&frame.tag, &frame.out);
                            parent.push_str(&span);
                            if sink.is_some() {
                                found.push((frame.tag.offset, footnote));
                            }
                            break;
                        }
                        parent.push_str(&neutralize(frame.tag.raw));
                        parent.push_str(&frame.out);
                    }
                }
            }
        }

        // Unclosed tags stay as literal text
        while let Some(frame) = stack.pop() {
            let parent = current(&mut root, &mut stack);
            parent.push_str(&neutralize(frame.tag.raw));
            parent.push_str(&frame.out);
        }

        if let Some(sink) = sink {
            found.sort_by_key(|(offset, _)| *offset);
            sink.extend(found.into_iter().map(|(_, footnote)| footnote));
        }

        root
    }

    fn wrap(&self, tag: &OpenTag<'_>, inner: &str) -> (String, Footnote) {
        let (text, resolved) = match self.table.lookup(tag.number, tag.page) {
            Some(footnote) => (footnote.to_string(), true),
            None => (format!("Annotation {} not found", tag.number), false),
        };
        let number = escape_attribute(tag.number);

        let span = format!(
            r#"<span class="annotated-text" title="{}" data-annotation="{}"><sup class="annotation-number">{}</sup>[{}]</span>"#,
            escape_attribute(&text),
            number,
            number,
            inner
        );

        let footnote = Footnote {
            number: tag.number.to_string(),
            page: tag.page.map(str::to_string),
            text,
            kind: tag.kind,
            resolved,
        };
        (span, footnote)
    }
}
