//! Citation Markup
//!
//! Statute text cites footnotes inline with `<fa a=NUM [p=PAGE]>text</fa>`
//! (full) and `<pa ...>text</pa>` (partial) tags. This module resolves those
//! citations against the statute's annotation table and renders them as
//! annotated HTML spans.

mod html;
mod resolver;
mod rewriter;
mod scanner;


pub use html::{escape_attribute, nl2br};
pub use resolver::{AnnotationResolver, AnnotationSource, AnnotationTable};
pub use rewriter::{is_pseudo, Footnote, MarkupRewriter, RewriteOutput, PSEUDO_SENTINEL};
pub use scanner::TagKind;
