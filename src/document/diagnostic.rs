//! Structured, positioned problem reports attached to documents.
//!
//! A diagnostic never aborts anything: parse and extraction failures
//! degrade the affected block and land here, while siblings keep their
//! results. Spans are byte offsets into the whole source document.

use crate::syntax::{Span, SyntaxError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Hint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub span: Span,
    pub message: String,
    /// Replacement candidates for the spanned text; each becomes a
    /// quick-fix action in editor tooling.
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    pub fn error(span: Span, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            span,
            message: message.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn warning(span: Span, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            span,
            message: message.into(),
            suggestions: Vec::new(),
        }
    }
}

impl From<SyntaxError> for Diagnostic {
    fn from(err: SyntaxError) -> Self {
        Self {
            severity: Severity::Error,
            span: err.span,
            message: err.message,
            suggestions: err.suggestions,
        }
    }
}

/// Convert a byte offset into a 0-based (line, column) pair. Columns
/// count characters, not bytes.
pub fn line_col(source: &str, offset: usize) -> (u32, u32) {
    let clamped = offset.min(source.len());
    let mut line = 0u32;
    let mut col = 0u32;
    for (i, ch) in source.char_indices() {
        if i >= clamped {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// Convert a 0-based (line, column) pair back into a byte offset,
/// clamping past-the-end positions to the line or document end.
pub fn offset_at(source: &str, line: u32, column: u32) -> usize {
    let mut remaining = line;
    let mut line_start = 0usize;
    for (i, ch) in source.char_indices() {
        if remaining == 0 {
            break;
        }
        if ch == '\n' {
            remaining -= 1;
            line_start = i + 1;
        }
    }
    if remaining > 0 {
        return source.len();
    }

    let rest = &source[line_start..];
    let line_end = rest.find('\n').unwrap_or(rest.len());
    let line_text = &rest[..line_end];

    line_start
        + line_text
            .char_indices()
            .nth(column as usize)
            .map_or(line_text.len(), |(i, _)| i)
}
