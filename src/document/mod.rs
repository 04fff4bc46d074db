//! Document model: one source file, four optional block results.
//!
//! [`parse_document`] never fails. Each block that parses contributes
//! an AST; a block that does not keeps its text and records a
//! diagnostic. One failing block never affects its siblings, and one
//! failing document never affects another.

pub mod diagnostic;
pub mod extract;

pub use diagnostic::{Diagnostic, Severity};

use crate::syntax::{SyntaxError, markup, script};
use extract::extract;
use smallvec::SmallVec;
use std::path::{Path, PathBuf};

/// Route strings for one page. Pages always carry the extension-less
/// route plus its `.html` variant, so two slots cover the common case.
pub type Routes = SmallVec<[String; 2]>;

/// One file on disk before parsing.
///
/// `routes` is non-empty only for files classified as pages.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub dir: PathBuf,
    pub content: String,
    pub routes: Routes,
}

impl SourceFile {
    pub fn new(path: PathBuf, content: String, routes: Routes) -> Self {
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            path,
            dir,
            content,
            routes,
        }
    }
}

/// Native frontmatter block: pass-through text, reserved parser slot.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeBlock {
    pub text: String,
    pub start: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptBlock {
    pub text: String,
    pub start: usize,
    /// Present iff the text parsed successfully.
    pub ast: Option<script::ast::Module>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateBlock {
    pub text: String,
    pub start: usize,
    /// Present iff the text parsed successfully.
    pub ast: Option<markup::MarkupTree>,
}

/// Style block: pass-through text, no AST.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleBlock {
    pub text: String,
    pub start: usize,
}

/// A fully processed source file.
///
/// Replaced wholesale when the file changes; block results are never
/// mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub source: SourceFile,
    pub native: Option<NativeBlock>,
    pub script: Option<ScriptBlock>,
    pub template: Option<TemplateBlock>,
    pub style: Option<StyleBlock>,
    /// Collected per-document problems, spans relative to the whole
    /// document.
    pub diagnostics: Vec<Diagnostic>,
    /// Content hash, used to skip reparsing unchanged files on rescan.
    pub hash: u64,
}

impl ParsedDocument {
    pub fn is_page(&self) -> bool {
        !self.source.routes.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

/// Run one block's sub-parser, rebasing any failure into
/// whole-document coordinates and recording it.
///
/// Every sub-parser has the same shape, `parse(text) -> AST or
/// SyntaxError`; native and style blocks simply have none yet.
fn run_parser<T>(
    block: &extract::RawBlock,
    parse: fn(&str) -> Result<T, SyntaxError>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<T> {
    match parse(&block.text) {
        Ok(ast) => Some(ast),
        Err(err) => {
            diagnostics.push(Diagnostic::from(err.rebase(block.start)));
            None
        }
    }
}

/// Build a [`ParsedDocument`] from one source file.
///
/// Runs the block extractor, then each applicable sub-parser. Sub-parser
/// failures are rebased to document-relative spans and recorded, never
/// propagated.
pub fn parse_document(source: SourceFile) -> ParsedDocument {
    let blocks = extract(&source.content);
    let mut diagnostics = blocks.diagnostics;

    let native = blocks.native.map(|block| NativeBlock {
        text: block.text,
        start: block.start,
    });

    let script = blocks.script.map(|block| ScriptBlock {
        ast: run_parser(&block, script::parse, &mut diagnostics),
        text: block.text,
        start: block.start,
    });

    let template = blocks.template.map(|block| TemplateBlock {
        ast: run_parser(&block, markup::parse, &mut diagnostics),
        text: block.text,
        start: block.start,
    });

    let style = blocks.style.map(|block| StyleBlock {
        text: block.text,
        start: block.start,
    });

    let hash = crate::utils::hash::compute(source.content.as_bytes());

    ParsedDocument {
        source,
        native,
        script,
        template,
        style,
        diagnostics,
        hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn file(content: &str) -> SourceFile {
        SourceFile::new(
            PathBuf::from("/project/src/pages/about.rsx"),
            content.to_string(),
            smallvec!["/about".to_string(), "/about.html".to_string()],
        )
    }

    const ABOUT_RSX: &str = "---\ntitle = \"About\"\n---\n<script>\nexport let title = 'About us';\n</script>\n<template>\n<main><h1>hello</h1></main>\n</template>\n<style>\nmain { color: red; }\n</style>\n";

    #[test]
    fn test_full_document_all_blocks_parsed() {
        let doc = parse_document(file(ABOUT_RSX));

        assert!(doc.native.is_some());
        let script = doc.script.as_ref().unwrap();
        let module = script.ast.as_ref().unwrap();
        assert_eq!(module.exported_names(), vec!["title"]);

        let template = doc.template.as_ref().unwrap();
        assert!(template.ast.is_some());
        assert!(doc.style.is_some());
        assert!(doc.diagnostics.is_empty());
        assert!(doc.is_page());
    }

    #[test]
    fn test_malformed_script_downgrades_to_text_only() {
        let content = "<script>\nfn broken() { return 1;\n</script>\n<template>\n<p>fine</p>\n</template>\n";
        let doc = parse_document(file(content));

        let script = doc.script.as_ref().unwrap();
        assert_eq!(script.text, "fn broken() { return 1;");
        assert!(script.ast.is_none());

        // Sibling template still parses
        assert!(doc.template.as_ref().unwrap().ast.is_some());

        assert_eq!(doc.diagnostics.len(), 1);
        let diagnostic = &doc.diagnostics[0];
        assert_eq!(diagnostic.severity, Severity::Error);
        assert!(doc.has_errors());

        // Span is document-relative: inside the document and at or past
        // the script block's start
        assert!(diagnostic.span.start >= script.start);
        assert!(diagnostic.span.end <= content.len());
    }

    #[test]
    fn test_malformed_template_downgrades_to_text_only() {
        let content = "<template>\n<div><!-- never closed\n</template>\n";
        let doc = parse_document(file(content));

        let template = doc.template.as_ref().unwrap();
        assert_eq!(template.text, "<div><!-- never closed");
        assert!(template.ast.is_none());
        assert_eq!(doc.diagnostics.len(), 1);
        assert!(doc.diagnostics[0].message.contains("markup parse error"));
    }

    #[test]
    fn test_document_without_blocks() {
        let doc = parse_document(SourceFile::new(
            PathBuf::from("/project/src/notes.rsx"),
            "nothing recognizable here\n".to_string(),
            smallvec![],
        ));

        assert!(doc.native.is_none());
        assert!(doc.script.is_none());
        assert!(doc.template.is_none());
        assert!(doc.style.is_none());
        assert!(doc.diagnostics.is_empty());
        assert!(!doc.is_page());
    }

    #[test]
    fn test_suggestions_survive_into_diagnostics() {
        let content = "<script>\nlte x = 5;\n</script>\n";
        let doc = parse_document(file(content));

        assert_eq!(doc.diagnostics.len(), 1);
        assert_eq!(doc.diagnostics[0].suggestions, vec!["let".to_string()]);

        // The span covers `lte` in document coordinates
        let span = doc.diagnostics[0].span.clone();
        assert_eq!(&content[span], "lte");
    }

    #[test]
    fn test_source_dir_derived_from_path() {
        let source = SourceFile::new(
            PathBuf::from("/project/src/pages/blog/post.rsx"),
            String::new(),
            smallvec![],
        );
        assert_eq!(source.dir, PathBuf::from("/project/src/pages/blog"));
    }

    #[test]
    fn test_hash_tracks_content() {
        let a = parse_document(file(ABOUT_RSX));
        let b = parse_document(file(ABOUT_RSX));
        let c = parse_document(file("<template>\n<p>other</p>\n</template>\n"));
        assert_eq!(a.hash, b.hash);
        assert_ne!(a.hash, c.hash);
    }
}
