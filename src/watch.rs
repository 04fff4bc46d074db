//! File system watcher for live rebuilds.
//!
//! Watches the project root, batches rapid events with a debounce
//! window, and recompiles the in-memory snapshot when source files
//! change. A change to `rsx.toml` reloads configuration first, so a
//! moved pages directory is picked up by the rebuild that follows.
//!
//! A failed rebuild keeps the previous snapshot live; the server keeps
//! answering from it until a later rebuild succeeds.

use crate::{
    compiler::{self, discover::RSX_EXTENSION},
    config::{RsxConfig, cfg, reload_config},
    log,
};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

const DEBOUNCE_MS: u64 = 300;
const REBUILD_COOLDOWN_MS: u64 = 800;

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Paths worth reacting to: the config file and source documents, as
/// long as they are not inside the output or cache directories.
fn is_watch_worthy(path: &Path, config: &RsxConfig) -> bool {
    if path.starts_with(&config.build.output) || path.starts_with(&config.build.cache) {
        return false;
    }
    path == config.config_path
        || path.extension().is_some_and(|ext| ext == RSX_EXTENSION)
}

/// Format path relative to root for log display.
fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// Batches rapid file events with debouncing and rebuild cooldown.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
    last_rebuild: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
            last_rebuild: None,
        }
    }

    fn in_cooldown(&self) -> bool {
        self.last_rebuild
            .is_some_and(|t| t.elapsed() < Duration::from_millis(REBUILD_COOLDOWN_MS))
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        self.pending.drain().collect()
    }

    fn mark_rebuild(&mut self) {
        self.last_rebuild = Some(Instant::now());
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

/// Process a debounced batch. Returns true when a rebuild was
/// published (for cooldown tracking).
fn handle_changes(paths: &[PathBuf]) -> bool {
    if paths.is_empty() {
        return false;
    }

    let config = cfg();
    let root = config.get_root().to_path_buf();

    let mut reloaded = false;
    if paths.iter().any(|path| *path == config.config_path) {
        match reload_config() {
            Ok(true) => {
                reloaded = true;
                log!("watch"; "configuration reloaded");
            }
            Ok(false) => {}
            Err(err) => {
                log!("error"; "config reload failed: {err:#}");
                return false;
            }
        }
    }

    let triggers: Vec<String> = paths
        .iter()
        .filter(|path| path.extension().is_some_and(|ext| ext == RSX_EXTENSION))
        .map(|path| rel_path(path, &root))
        .collect();

    if triggers.is_empty() && !reloaded {
        return false;
    }
    if !triggers.is_empty() {
        log!("watch"; "{} changed, rebuilding...", triggers.join(", "));
    }

    match compiler::initialize() {
        Ok(_) => true,
        Err(err) => {
            // Previous snapshot stays live
            log!("error"; "rebuild failed: {err:#}");
            false
        }
    }
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

/// Start the blocking watch loop with debouncing and live rebuild.
pub fn watch_for_changes() -> Result<()> {
    let config = cfg();
    if !config.serve.watch {
        return Ok(());
    }

    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;

    let root = config.get_root().to_path_buf();
    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", root.display()))?;
    log!("watch"; "watching {}", root.display());

    let mut debouncer = Debouncer::new();

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(mut event)) if is_relevant(&event) && !debouncer.in_cooldown() => {
                // Re-read config per event so a reload moves the
                // exclusion boundaries too
                let config = cfg();
                event.paths.retain(|path| is_watch_worthy(path, &config));
                debouncer.add(event);
            }
            Ok(Err(err)) => log!("watch"; "error: {err}"),
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) if debouncer.ready() => {
                if handle_changes(&debouncer.take()) {
                    debouncer.mark_rebuild();
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::CreateKind;

    fn event_with(paths: &[&str]) -> Event {
        let mut event = Event::new(EventKind::Create(CreateKind::File));
        for path in paths {
            event = event.add_path(PathBuf::from(path));
        }
        event
    }

    #[test]
    fn test_temp_files_are_filtered() {
        assert!(is_temp_file(Path::new("/proj/src/pages/.about.rsx.swp")));
        assert!(is_temp_file(Path::new("/proj/src/pages/about.rsx~")));
        assert!(is_temp_file(Path::new("/proj/src/pages/about.rsx.bak")));
        assert!(!is_temp_file(Path::new("/proj/src/pages/about.rsx")));
    }

    #[test]
    fn test_watch_worthy_excludes_output_and_cache() {
        let mut config = RsxConfig::default();
        config.set_root(Path::new("/proj"));
        config.build.output = PathBuf::from("/proj/dist");
        config.build.cache = PathBuf::from("/proj/.cache/rsx");
        config.config_path = PathBuf::from("/proj/rsx.toml");

        assert!(is_watch_worthy(Path::new("/proj/src/pages/a.rsx"), &config));
        assert!(is_watch_worthy(Path::new("/proj/rsx.toml"), &config));
        assert!(!is_watch_worthy(Path::new("/proj/dist/a.rsx"), &config));
        assert!(!is_watch_worthy(
            Path::new("/proj/.cache/rsx/a.rsx"),
            &config
        ));
        assert!(!is_watch_worthy(Path::new("/proj/notes.md"), &config));
    }

    #[test]
    fn test_debouncer_batches_and_drains() {
        let mut debouncer = Debouncer::new();
        assert!(!debouncer.ready());

        debouncer.add(event_with(&["/proj/a.rsx", "/proj/b.rsx", "/proj/a.rsx"]));
        assert_eq!(debouncer.pending.len(), 2);
        // Events just arrived, still inside the debounce window
        assert!(!debouncer.ready());

        let taken = debouncer.take();
        assert_eq!(taken.len(), 2);
        assert!(debouncer.pending.is_empty());
    }

    #[test]
    fn test_debouncer_drops_temp_paths() {
        let mut debouncer = Debouncer::new();
        debouncer.add(event_with(&["/proj/.a.rsx.swp", "/proj/a.rsx~"]));
        assert!(debouncer.pending.is_empty());
    }

    #[test]
    fn test_debouncer_timeout_depends_on_pending() {
        let mut debouncer = Debouncer::new();
        assert_eq!(debouncer.timeout(), Duration::from_secs(60));

        debouncer.add(event_with(&["/proj/a.rsx"]));
        assert_eq!(debouncer.timeout(), Duration::from_millis(DEBOUNCE_MS));
    }

    #[test]
    fn test_cooldown_starts_at_mark() {
        let mut debouncer = Debouncer::new();
        assert!(!debouncer.in_cooldown());
        debouncer.mark_rebuild();
        assert!(debouncer.in_cooldown());
    }

    #[test]
    fn test_relevant_event_kinds() {
        use notify::event::{ModifyKind, RemoveKind};
        assert!(is_relevant(&Event::new(EventKind::Create(CreateKind::File))));
        assert!(is_relevant(&Event::new(EventKind::Modify(ModifyKind::Any))));
        assert!(is_relevant(&Event::new(EventKind::Remove(RemoveKind::File))));
        assert!(!is_relevant(&Event::new(EventKind::Access(
            notify::event::AccessKind::Any
        ))));
    }
}
