//! Compile orchestration.
//!
//! Ties discovery, parsing, and routing together into an immutable
//! [`CompiledProject`] snapshot. The latest snapshot is published
//! through an `ArcSwap`, so the dev server and watcher always see
//! either the previous complete compile or the next one, never a
//! half-built state.

pub mod discover;

use crate::config::cfg;
use crate::document::{Diagnostic, ParsedDocument, SourceFile, parse_document};
use crate::log;
use crate::syntax::markup::RSX_SERVER_PROPS_ID;
use crate::utils::hash;
use anyhow::{Context, Result, anyhow, bail};
use arc_swap::ArcSwap;
use discover::ProjectContext;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        Arc, LazyLock,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

/// One complete compile of the project.
///
/// Every route variant of a page maps to the same parsed document, and
/// a document with parse errors is still present with its diagnostics
/// attached.
#[derive(Debug, Default)]
pub struct CompiledProject {
    pub root: PathBuf,
    pub output: PathBuf,
    pub pages: Vec<Arc<ParsedDocument>>,
    pub components: Vec<Arc<ParsedDocument>>,
    routes: FxHashMap<String, usize>,
}

impl CompiledProject {
    /// Resolve a request path to its page. Exact match only, no
    /// normalization beyond what the caller already did.
    pub fn resolve(&self, url: &str) -> Option<&Arc<ParsedDocument>> {
        self.routes.get(url).map(|&index| &self.pages[index])
    }

    pub fn diagnostic_count(&self) -> usize {
        self.pages
            .iter()
            .chain(self.components.iter())
            .map(|doc| doc.diagnostics.len())
            .sum()
    }
}

/// Latest successfully published compile.
static PROJECT: LazyLock<ArcSwap<CompiledProject>> =
    LazyLock::new(|| ArcSwap::from_pointee(CompiledProject::default()));

/// Current project snapshot.
#[inline]
pub fn project() -> Arc<CompiledProject> {
    PROJECT.load_full()
}

/// Resolve a URL against the current snapshot.
pub fn resolve(url: &str) -> Option<Arc<ParsedDocument>> {
    PROJECT.load().resolve(url).cloned()
}

/// Parse every discovered file and assemble the route table.
///
/// Documents whose content hash matches `previous` are reused instead
/// of reparsed. Infallible past discovery: parse failures for
/// individual blocks are recorded as document diagnostics and never
/// abort the compile.
pub fn compile(context: ProjectContext, previous: &CompiledProject) -> CompiledProject {
    let ProjectContext {
        root,
        output,
        pages,
        components,
        ..
    } = context;

    let known: FxHashMap<&Path, &Arc<ParsedDocument>> = previous
        .pages
        .iter()
        .chain(previous.components.iter())
        .map(|doc| (doc.source.path.as_path(), doc))
        .collect();

    let (mut pages, components) = rayon::join(
        || {
            pages
                .into_par_iter()
                .map(|file| parse_or_reuse(file, &known))
                .collect::<Vec<_>>()
        },
        || {
            components
                .into_par_iter()
                .map(|file| parse_or_reuse(file, &known))
                .collect::<Vec<_>>()
        },
    );

    // First discovered page wins a contested route; the loser keeps its
    // other routes and gets a warning it can surface in the editor.
    let mut routes: FxHashMap<String, usize> = FxHashMap::default();
    for index in 0..pages.len() {
        for route in pages[index].source.routes.clone() {
            if let Some(&winner) = routes.get(&route) {
                let winner_path = pages[winner].source.path.display().to_string();
                let message = format!("route `{route}` is already taken by {winner_path}");
                log!("warn"; "{}: {message}", pages[index].source.path.display());
                Arc::make_mut(&mut pages[index])
                    .diagnostics
                    .push(Diagnostic::warning(0..0, message));
            } else {
                routes.insert(route, index);
            }
        }
    }

    CompiledProject {
        root,
        output,
        pages,
        components,
        routes,
    }
}

/// Reuse the previous parse when the content hash and routes both
/// match; otherwise parse from scratch. Stale route-collision warnings
/// are dropped on reuse since the route table is rebuilt every compile.
fn parse_or_reuse(
    file: SourceFile,
    known: &FxHashMap<&Path, &Arc<ParsedDocument>>,
) -> Arc<ParsedDocument> {
    if let Some(&prev) = known.get(file.path.as_path())
        && prev.hash == hash::compute(file.content.as_bytes())
        && prev.source.routes == file.routes
    {
        let mut doc = Arc::clone(prev);
        if doc.diagnostics.iter().any(is_route_collision) {
            Arc::make_mut(&mut doc)
                .diagnostics
                .retain(|diagnostic| !is_route_collision(diagnostic));
        }
        return doc;
    }
    Arc::new(parse_document(file))
}

/// Warnings added by the route table pass, as opposed to parse
/// diagnostics that belong to the document itself.
fn is_route_collision(diagnostic: &Diagnostic) -> bool {
    diagnostic.message.starts_with("route `")
        && diagnostic.message.contains("` is already taken by ")
}

/// Discover, parse, and publish a fresh snapshot.
///
/// The previous snapshot stays live until the new one is complete; an
/// unreadable project root leaves it untouched.
pub fn initialize() -> Result<Arc<CompiledProject>> {
    let started = Instant::now();
    let config = cfg();

    let context = discover::discover(&config)?;
    let previous = PROJECT.load();
    let project = Arc::new(compile(context, &previous));

    log!(
        "parse";
        "{} pages, {} components, {} diagnostics in {:.0?}",
        project.pages.len(),
        project.components.len(),
        project.diagnostic_count(),
        started.elapsed()
    );

    PROJECT.store(project.clone());
    Ok(project)
}

/// Full batch build: compile the project and materialize every page
/// under the output directory.
pub fn build() -> Result<()> {
    let started = Instant::now();
    let config = cfg();
    let output = &config.build.output;

    ensure_output(output, config.build.clean)?;
    let project = initialize()?;

    let has_error = AtomicBool::new(false);
    let result: Result<()> = project.pages.par_iter().try_for_each(|page| {
        if has_error.load(Ordering::Relaxed) {
            return Err(anyhow!("Aborted"));
        }
        write_page(page, output).map_err(|err| {
            if !has_error.swap(true, Ordering::Relaxed) {
                log!("error"; "{}: {err:#}", page.source.path.display());
            }
            anyhow!("Aborted")
        })
    });
    if result.is_err() {
        bail!("build failed");
    }

    let islands: usize = project
        .pages
        .iter()
        .filter_map(|page| page.template.as_ref()?.ast.as_ref())
        .map(|tree| tree.islands().len())
        .sum();
    log!(
        "build";
        "wrote {} pages ({islands} islands) in {:.0?}",
        project.pages.len(),
        started.elapsed()
    );
    Ok(())
}

fn ensure_output(output: &Path, clean: bool) -> Result<()> {
    if clean && output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clear output directory {}", output.display()))?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory {}", output.display()))
}

/// Render a page to its response body: the template text verbatim, or
/// an empty string when the page has no template. Never fails, even
/// for documents full of diagnostics.
pub fn render_page(doc: &ParsedDocument) -> &str {
    doc.template
        .as_ref()
        .map(|template| template.text.as_str())
        .unwrap_or("")
}

/// Page body as written to disk: the rendered template, preceded by the
/// embedded server-props script when the page carries a native block.
pub fn render_body(doc: &ParsedDocument) -> String {
    let template = render_page(doc);
    match &doc.native {
        Some(native) => format!(
            "<script type=\"application/rsx\" id=\"{RSX_SERVER_PROPS_ID}\">\n{}\n</script>\n{template}",
            native.text
        ),
        None => template.to_string(),
    }
}

/// Output file for a page: the `.html` route variant rooted at the
/// output directory.
fn output_path(doc: &ParsedDocument, output: &Path) -> Option<PathBuf> {
    let route = doc.source.routes.first()?;
    Some(output.join(format!("{}.html", route.trim_start_matches('/'))))
}

fn write_page(doc: &ParsedDocument, output: &Path) -> Result<()> {
    let Some(path) = output_path(doc, output) else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&path, render_body(doc))
        .with_context(|| format!("Failed to write {}", path.display()))
}
