//! File discovery and page/component classification.
//!
//! Walks the project root for source files, excluding the output and
//! cache directories, hidden directories, and dependency trees. A file
//! is a page iff its path is lexically under the configured pages
//! directory; everything else is a component. Discovery order is
//! sorted, so classification and route assignment are deterministic.

use crate::config::RsxConfig;
use crate::document::{Routes, SourceFile};
use crate::log;
use smallvec::smallvec;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Recognized source file extension.
pub const RSX_EXTENSION: &str = "rsx";

/// Directory names never worth walking into.
const IGNORED_DIRS: &[&str] = &["node_modules", "target"];

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("cannot read project root {0}")]
    RootUnreadable(PathBuf, #[source] std::io::Error),
}

/// Classified source file sets plus the path snapshot they were
/// discovered under.
#[derive(Debug, Clone, Default)]
pub struct ProjectContext {
    pub root: PathBuf,
    pub pages_dir: PathBuf,
    pub output: PathBuf,
    pub cache: PathBuf,
    pub pages: Vec<SourceFile>,
    pub components: Vec<SourceFile>,
}

/// Discover and classify every source file under the configured root.
///
/// Only an unreadable root is fatal. A file that cannot be read is
/// logged and skipped; it will be picked up again on the next rescan.
pub fn discover(config: &RsxConfig) -> Result<ProjectContext, DiscoveryError> {
    let root = config.get_root().to_path_buf();
    std::fs::read_dir(&root).map_err(|err| DiscoveryError::RootUnreadable(root.clone(), err))?;

    let pages_dir = config.build.pages.clone();
    let output = config.build.output.clone();
    let cache = config.build.cache.clone();

    let mut files: Vec<PathBuf> = WalkDir::new(&root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_excluded_dir(e.path(), &output, &cache))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|ext| ext == RSX_EXTENSION)
        })
        .map(walkdir::DirEntry::into_path)
        .collect();
    files.sort();

    let mut pages = Vec::new();
    let mut components = Vec::new();

    for path in files {
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                log!("warn"; "skipping {}: {err}", path.display());
                continue;
            }
        };
        match routes_for(&path, &pages_dir) {
            Some(routes) => pages.push(SourceFile::new(path, content, routes)),
            None => components.push(SourceFile::new(path, content, smallvec![])),
        }
    }

    Ok(ProjectContext {
        root,
        pages_dir,
        output,
        cache,
        pages,
        components,
    })
}

fn is_excluded_dir(path: &Path, output: &Path, cache: &Path) -> bool {
    if path == output || path == cache {
        return true;
    }
    match path.file_name().and_then(|name| name.to_str()) {
        Some(name) => name.starts_with('.') || IGNORED_DIRS.contains(&name),
        None => false,
    }
}

/// Derive the route pair for a page path, or `None` when the path is
/// not lexically under the pages directory.
///
/// Routes are built from path segments, so a sibling like
/// `src/pages.rsx` never classifies as a page and separators are
/// platform-independent. Every page gets the extension-less route and
/// its `.html` variant; both resolve to the same document.
pub fn routes_for(path: &Path, pages_dir: &Path) -> Option<Routes> {
    let rel = path.strip_prefix(pages_dir).ok()?;
    let stem = rel.with_extension("");

    let mut route = String::new();
    for component in stem.components() {
        route.push('/');
        route.push_str(&component.as_os_str().to_string_lossy());
    }
    if route.is_empty() {
        return None;
    }

    Some(smallvec![route.clone(), format!("{route}.html")])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn config_for(root: &Path) -> RsxConfig {
        let mut config = RsxConfig::default();
        config.set_root(root);
        config.build.pages = root.join("src/pages");
        config.build.output = root.join("dist");
        config.build.cache = root.join(".cache/rsx");
        config
    }

    #[test]
    fn test_routes_for_root_level_page() {
        let routes = routes_for(
            Path::new("/proj/src/pages/about.rsx"),
            Path::new("/proj/src/pages"),
        )
        .unwrap();
        assert_eq!(routes.as_slice(), ["/about", "/about.html"]);
    }

    #[test]
    fn test_routes_for_nested_page() {
        let routes = routes_for(
            Path::new("/proj/src/pages/blog/post.rsx"),
            Path::new("/proj/src/pages"),
        )
        .unwrap();
        assert_eq!(routes.as_slice(), ["/blog/post", "/blog/post.html"]);
    }

    #[test]
    fn test_routes_for_component_is_none() {
        assert!(
            routes_for(
                Path::new("/proj/src/components/button.rsx"),
                Path::new("/proj/src/pages"),
            )
            .is_none()
        );
    }

    #[test]
    fn test_pages_dir_sibling_is_not_a_page() {
        // Segment comparison, not string prefix comparison
        assert!(
            routes_for(Path::new("/proj/src/pages.rsx"), Path::new("/proj/src/pages")).is_none()
        );
    }

    #[test]
    fn test_discover_classifies_and_sorts() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        write(&root.join("src/pages/index.rsx"), "<template>\n<h1>home</h1>\n</template>\n");
        write(&root.join("src/pages/about.rsx"), "<template>\n<h1>about</h1>\n</template>\n");
        write(&root.join("src/pages/blog/post.rsx"), "<template>\n<p>post</p>\n</template>\n");
        write(&root.join("src/components/button.rsx"), "<template>\n<button>ok</button>\n</template>\n");
        write(&root.join("dist/stale.rsx"), "ignored");
        write(&root.join(".cache/rsx/tmp.rsx"), "ignored");
        write(&root.join("node_modules/pkg/x.rsx"), "ignored");

        let context = discover(&config_for(root)).unwrap();

        let page_names: Vec<_> = context
            .pages
            .iter()
            .map(|p| p.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(page_names, ["about.rsx", "post.rsx", "index.rsx"]);

        assert_eq!(context.components.len(), 1);
        assert!(context.components[0].routes.is_empty());

        assert_eq!(
            context.pages[0].routes.as_slice(),
            ["/about", "/about.html"]
        );
        assert_eq!(
            context.pages[1].routes.as_slice(),
            ["/blog/post", "/blog/post.html"]
        );
    }

    #[test]
    fn test_discover_skips_other_extensions() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(&root.join("src/pages/readme.md"), "# nope");
        write(&root.join("src/pages/home.rsx"), "x");

        let context = discover(&config_for(root)).unwrap();
        assert_eq!(context.pages.len(), 1);
        assert!(context.components.is_empty());
    }

    #[test]
    fn test_discover_unreadable_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone");
        let err = discover(&config_for(&missing)).unwrap_err();
        assert!(matches!(err, DiscoveryError::RootUnreadable(..)));
    }
}
