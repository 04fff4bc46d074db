//! Open document tracking and language features.
//!
//! The service keeps its own parse of every open buffer: editors send
//! unsaved contents, so the compiler's on-disk snapshot may lag behind
//! what the user is looking at. Each sync event reparses the single
//! affected document and republishes its diagnostics.

use super::messages::{
    CodeAction, Hover, LspDiagnostic, MarkupContent, Position, PublishDiagnosticsParams, Range,
    SEVERITY_ERROR, SEVERITY_HINT, SEVERITY_WARNING, TextEdit, WorkspaceEdit,
};
use crate::{
    compiler::discover::routes_for,
    config::cfg,
    document::{self, Diagnostic, ParsedDocument, Severity, SourceFile, diagnostic},
    syntax::Span,
};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, LazyLock},
};

static DOCUMENTS: LazyLock<RwLock<FxHashMap<String, Arc<ParsedDocument>>>> =
    LazyLock::new(|| RwLock::new(FxHashMap::default()));

/// Strip the `file://` scheme from an editor URI.
fn uri_to_path(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri))
}

fn analyze(uri: &str, text: String, pages_dir: &Path) -> Arc<ParsedDocument> {
    let path = uri_to_path(uri);
    let routes = routes_for(&path, pages_dir).unwrap_or_default();
    Arc::new(document::parse_document(SourceFile::new(path, text, routes)))
}

/// (Re)parse an open buffer and compute the diagnostics to publish.
/// Serves both didOpen and didChange, which differ only in envelope.
pub fn refresh(uri: &str, text: String) -> PublishDiagnosticsParams {
    let doc = analyze(uri, text, &cfg().build.pages);
    let params = diagnostics_for(uri, &doc);
    DOCUMENTS.write().insert(uri.to_string(), doc);
    params
}

/// Drop a closed buffer. Returns the empty set that clears the
/// editor's markers.
pub fn close(uri: &str) -> PublishDiagnosticsParams {
    DOCUMENTS.write().remove(uri);
    PublishDiagnosticsParams {
        uri: uri.to_string(),
        diagnostics: Vec::new(),
    }
}

fn diagnostics_for(uri: &str, doc: &ParsedDocument) -> PublishDiagnosticsParams {
    let content = &doc.source.content;
    PublishDiagnosticsParams {
        uri: uri.to_string(),
        diagnostics: doc
            .diagnostics
            .iter()
            .map(|diag| to_lsp(diag, content))
            .collect(),
    }
}

fn to_lsp(diagnostic: &Diagnostic, content: &str) -> LspDiagnostic {
    LspDiagnostic {
        range: range_of(content, &diagnostic.span),
        severity: Some(match diagnostic.severity {
            Severity::Error => SEVERITY_ERROR,
            Severity::Warning => SEVERITY_WARNING,
            Severity::Hint => SEVERITY_HINT,
        }),
        message: diagnostic.message.clone(),
        source: Some("rsx".into()),
        data: (!diagnostic.suggestions.is_empty())
            .then(|| json!({"suggestions": diagnostic.suggestions})),
    }
}

fn range_of(content: &str, span: &Span) -> Range {
    let (line, character) = diagnostic::line_col(content, span.start);
    let start = Position { line, character };
    let (line, character) = diagnostic::line_col(content, span.end);
    Range {
        start,
        end: Position { line, character },
    }
}

/// Hover information for the block under the cursor.
pub fn hover(uri: &str, position: Position) -> Option<Hover> {
    let doc = DOCUMENTS.read().get(uri).cloned()?;
    hover_for(&doc, position)
}

fn hover_for(doc: &ParsedDocument, position: Position) -> Option<Hover> {
    let content = &doc.source.content;
    let offset = diagnostic::offset_at(content, position.line, position.character);
    let (label, status, span) = block_at(doc, offset)?;

    let mut value = format!("**{label} block**: {status}");
    if doc.is_page() {
        let routes: Vec<String> = doc
            .source
            .routes
            .iter()
            .map(|route| format!("`{route}`"))
            .collect();
        value.push_str(&format!("\n\nroutes: {}", routes.join(", ")));
    }

    Some(Hover {
        contents: MarkupContent::markdown(value),
        range: Some(range_of(content, &span)),
    })
}

fn block_at(doc: &ParsedDocument, offset: usize) -> Option<(&'static str, String, Span)> {
    let covers = |start: usize, text: &str| (start..start + text.len()).contains(&offset);

    if let Some(block) = &doc.native
        && covers(block.start, &block.text)
    {
        let span = block.start..block.start + block.text.len();
        return Some(("frontmatter", "passed through to the host".into(), span));
    }
    if let Some(block) = &doc.script
        && covers(block.start, &block.text)
    {
        let span = block.start..block.start + block.text.len();
        let status = match &block.ast {
            Some(module) => {
                let exported = module.exported_names();
                if exported.is_empty() {
                    "parses cleanly, no exports".to_string()
                } else {
                    format!("parses cleanly, exports {}", exported.join(", "))
                }
            }
            None => "has parse errors".to_string(),
        };
        return Some(("script", status, span));
    }
    if let Some(block) = &doc.template
        && covers(block.start, &block.text)
    {
        let span = block.start..block.start + block.text.len();
        let status = match &block.ast {
            Some(tree) => {
                let islands = tree.islands().len();
                if islands == 0 {
                    "parses cleanly".to_string()
                } else {
                    format!("parses cleanly, {islands} island(s)")
                }
            }
            None => "has parse errors".to_string(),
        };
        return Some(("template", status, span));
    }
    if let Some(block) = &doc.style
        && covers(block.start, &block.text)
    {
        let span = block.start..block.start + block.text.len();
        return Some(("style", "passed through verbatim".into(), span));
    }
    None
}

/// One quickfix per suggestion carried by a diagnostic in range.
pub fn code_actions(uri: &str, diagnostics: &[LspDiagnostic]) -> Vec<CodeAction> {
    let mut actions = Vec::new();
    for diagnostic in diagnostics {
        let suggestions = diagnostic
            .data
            .as_ref()
            .and_then(|data| data.get("suggestions"))
            .and_then(Value::as_array);
        let Some(suggestions) = suggestions else {
            continue;
        };

        for suggestion in suggestions.iter().filter_map(Value::as_str) {
            let mut changes = HashMap::new();
            changes.insert(
                uri.to_string(),
                vec![TextEdit {
                    range: diagnostic.range,
                    new_text: suggestion.to_string(),
                }],
            );
            actions.push(CodeAction {
                title: format!("Replace with `{suggestion}`"),
                kind: "quickfix",
                edit: WorkspaceEdit { changes },
            });
        }
    }
    actions
}
