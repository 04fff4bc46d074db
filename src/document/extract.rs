//! Block extraction from composite source documents.
//!
//! A document carries up to four delimiter-bounded blocks: native
//! frontmatter between `---` sentinel lines, and `<script>`,
//! `<template>`, `<style>` tag pairs. Only the first occurrence of each
//! kind is recognized; repeats are ignored. Extraction itself never
//! fails — a missing delimiter pair just leaves that block absent, and
//! an opening delimiter without a matching close is reported as a
//! warning diagnostic instead of silently dropping content.

use crate::document::diagnostic::Diagnostic;
use regex::Regex;
use std::sync::LazyLock;

static NATIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)^---\r?\n(.*?)\n---\r?$").unwrap());
static NATIVE_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^---\r?\n").unwrap());

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<script[^>]*>\r?\n(.*?)\r?\n</script>").unwrap());
static SCRIPT_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<script[^>]*>\r?\n").unwrap());

static TEMPLATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<template[^>]*>\r?\n(.*?)\r?\n</template>").unwrap());
static TEMPLATE_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<template[^>]*>\r?\n").unwrap());

static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<style[^>]*>\r?\n(.*?)\r?\n</style>").unwrap());
static STYLE_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<style[^>]*>\r?\n").unwrap());

/// One extracted block: whitespace-trimmed text plus the byte offset of
/// that text within the enclosing document.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBlock {
    pub text: String,
    pub start: usize,
}

/// Result of running the extractor over one document.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExtractedBlocks {
    pub native: Option<RawBlock>,
    pub script: Option<RawBlock>,
    pub template: Option<RawBlock>,
    pub style: Option<RawBlock>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Extract the four block kinds from `source`.
pub fn extract(source: &str) -> ExtractedBlocks {
    let mut diagnostics = Vec::new();

    let native = extract_block(
        source,
        &NATIVE_RE,
        &NATIVE_OPEN_RE,
        "frontmatter",
        &mut diagnostics,
    );
    let script = extract_block(
        source,
        &SCRIPT_RE,
        &SCRIPT_OPEN_RE,
        "<script>",
        &mut diagnostics,
    );
    let template = extract_block(
        source,
        &TEMPLATE_RE,
        &TEMPLATE_OPEN_RE,
        "<template>",
        &mut diagnostics,
    );
    let style = extract_block(
        source,
        &STYLE_RE,
        &STYLE_OPEN_RE,
        "<style>",
        &mut diagnostics,
    );

    ExtractedBlocks {
        native,
        script,
        template,
        style,
        diagnostics,
    }
}

fn extract_block(
    source: &str,
    full: &Regex,
    open: &Regex,
    label: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<RawBlock> {
    if let Some(caps) = full.captures(source) {
        let m = caps.get(1)?;
        let trimmed = m.as_str().trim();
        // An empty block behaves the same as an absent one
        if trimmed.is_empty() {
            return None;
        }
        let lead = m.as_str().len() - m.as_str().trim_start().len();
        return Some(RawBlock {
            text: trimmed.to_string(),
            start: m.start() + lead,
        });
    }

    // No full delimiter pair. An opening delimiter on its own is the
    // classic silent-data-loss case, so flag it.
    if let Some(open_match) = open.find(source) {
        diagnostics.push(Diagnostic::warning(
            open_match.start()..open_match.end(),
            format!("unterminated {label} block: opening delimiter has no matching close"),
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::diagnostic::Severity;

    const ABOUT_RSX: &str = "---\ntitle = \"About\"\n---\n<script>\nexport let title = 'About us';\n</script>\n<template>\n<main><h1>hello</h1></main>\n</template>\n<style>\nmain { color: red; }\n</style>\n";

    #[test]
    fn test_all_four_blocks_extracted() {
        let blocks = extract(ABOUT_RSX);

        assert_eq!(blocks.native.as_ref().unwrap().text, "title = \"About\"");
        assert_eq!(
            blocks.script.as_ref().unwrap().text,
            "export let title = 'About us';"
        );
        assert_eq!(
            blocks.template.as_ref().unwrap().text,
            "<main><h1>hello</h1></main>"
        );
        assert_eq!(blocks.style.as_ref().unwrap().text, "main { color: red; }");
        assert!(blocks.diagnostics.is_empty());
    }

    #[test]
    fn test_block_text_is_verbatim_substring() {
        let blocks = extract(ABOUT_RSX);
        for block in [
            blocks.native.as_ref(),
            blocks.script.as_ref(),
            blocks.template.as_ref(),
            blocks.style.as_ref(),
        ] {
            let block = block.unwrap();
            assert_eq!(
                &ABOUT_RSX[block.start..block.start + block.text.len()],
                block.text
            );
        }
    }

    #[test]
    fn test_no_blocks_means_all_absent() {
        let blocks = extract("just some text\nwith no delimiters at all\n");
        assert_eq!(blocks, ExtractedBlocks::default());
    }

    #[test]
    fn test_first_occurrence_wins() {
        let source = "<script>\nlet first = 1;\n</script>\n<script>\nlet second = 2;\n</script>\n";
        let blocks = extract(source);
        assert_eq!(blocks.script.as_ref().unwrap().text, "let first = 1;");
    }

    #[test]
    fn test_opening_tag_attributes_ignored() {
        let source = "<script lang=\"ts\" setup>\nlet x = 1;\n</script>\n";
        let blocks = extract(source);
        assert_eq!(blocks.script.as_ref().unwrap().text, "let x = 1;");
    }

    #[test]
    fn test_crlf_delimiters() {
        let source = "---\r\na = 1\r\n---\r\n<template>\r\n<p>hi</p>\r\n</template>\r\n";
        let blocks = extract(source);
        assert_eq!(blocks.native.as_ref().unwrap().text, "a = 1");
        assert_eq!(blocks.template.as_ref().unwrap().text, "<p>hi</p>");
    }

    #[test]
    fn test_unterminated_script_flagged() {
        let source = "<script>\nlet x = 1;\n";
        let blocks = extract(source);
        assert!(blocks.script.is_none());
        assert_eq!(blocks.diagnostics.len(), 1);
        let diagnostic = &blocks.diagnostics[0];
        assert_eq!(diagnostic.severity, Severity::Warning);
        assert!(diagnostic.message.contains("unterminated <script> block"));
        assert_eq!(diagnostic.span, 0..9);
    }

    #[test]
    fn test_unterminated_frontmatter_flagged() {
        let source = "---\ntitle = \"x\"\nno closing sentinel\n";
        let blocks = extract(source);
        assert!(blocks.native.is_none());
        assert_eq!(blocks.diagnostics.len(), 1);
        assert!(blocks.diagnostics[0].message.contains("frontmatter"));
    }

    #[test]
    fn test_single_line_tag_pair_not_recognized() {
        // The grammar requires a newline after the opening delimiter
        let blocks = extract("<script>let x = 1;</script>\n");
        assert!(blocks.script.is_none());
        assert!(blocks.diagnostics.is_empty());
    }

    #[test]
    fn test_empty_block_behaves_as_absent() {
        let blocks = extract("<style>\n\n</style>\n");
        assert!(blocks.style.is_none());
        assert!(blocks.diagnostics.is_empty());
    }

    #[test]
    fn test_sentinel_must_start_line() {
        let source = "text --- more\nnot a block\n";
        let blocks = extract(source);
        assert!(blocks.native.is_none());
        assert!(blocks.diagnostics.is_empty());
    }

    #[test]
    fn test_trimming_preserves_inner_whitespace() {
        let source = "<template>\n\n  <div>  spaced  </div>\n\n</template>\n";
        let blocks = extract(source);
        let template = blocks.template.unwrap();
        assert_eq!(template.text, "<div>  spaced  </div>");
        assert_eq!(
            &source[template.start..template.start + template.text.len()],
            template.text
        );
    }
}
