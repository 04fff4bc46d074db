//! Sub-parsers for the block kinds that carry structure.
//!
//! Script blocks go through a lexer + recursive-descent parser
//! ([`script`]), template blocks through a tolerant markup tree builder
//! ([`markup`]). Style and native blocks are pass-through text and have
//! no parser here.
//!
//! Both parsers are pure functions over text: AST out, or a
//! [`SyntaxError`] whose span is relative to the text they were handed.
//! Callers that extracted the text from a larger document rebase the
//! span with [`SyntaxError::rebase`].

pub mod markup;
pub mod script;

use std::ops::Range;
use thiserror::Error;

/// Byte range into the parsed text.
pub type Span = Range<usize>;

/// A parse failure from one of the sub-parsers.
///
/// Spans are byte offsets relative to whatever text the parser was
/// given. `suggestions` carries replacement candidates for the spanned
/// text when the parser recognized a likely misspelling; editor
/// tooling turns each one into a quick fix.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct SyntaxError {
    pub span: Span,
    pub message: String,
    pub suggestions: Vec<String>,
}

impl SyntaxError {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    /// Shift the span by `base` bytes, turning a block-relative span
    /// into a document-relative one.
    pub fn rebase(mut self, base: usize) -> Self {
        self.span = self.span.start + base..self.span.end + base;
        self
    }
}
