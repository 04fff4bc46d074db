//! Global config with atomic reload support.
//!
//! Uses `arc-swap` for lock-free reads and atomic config replacement.
//! This enables hot-reloading of `rsx.toml` during watch mode: rayon
//! workers and the server thread call [`cfg`] freely while the watcher
//! swaps in a new snapshot via [`reload_config`].
//!
//! # Usage
//!
//! ```ignore
//! use crate::config::cfg;
//!
//! let c = cfg();
//! compile_project(&c)?;  // Arc auto-derefs to &RsxConfig
//! ```

use super::RsxConfig;
use arc_swap::ArcSwap;
use std::sync::{Arc, LazyLock};

/// Global config storage with atomic replacement support.
///
/// Initialized with default config, then replaced with loaded config in main.
/// During watch mode, can be atomically replaced when rsx.toml changes.
pub static CONFIG: LazyLock<ArcSwap<RsxConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(RsxConfig::default()));

/// Get current config as `Arc<RsxConfig>`.
///
/// Returns an `Arc` that keeps the config alive. Thread-safe and wait-free.
/// The Arc auto-derefs to `&RsxConfig`, so call sites pass `&c` directly.
///
/// # Performance
///
/// Lock-free read via atomic load. Suitable for hot paths in rayon parallel contexts.
#[inline]
pub fn cfg() -> Arc<RsxConfig> {
    CONFIG.load_full()
}

/// Global hash of the current config file content.
static CONFIG_HASH: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

/// Replace config atomically (called when rsx.toml changes).
///
/// Reads CLI from current config to reload, ensuring consistent access.
/// The old config remains valid for any readers that loaded it before this call.
/// New readers will see the updated config.
///
/// Returns `true` if config was actually updated, `false` if content matches last load.
///
/// # Errors
///
/// Returns error if rsx.toml parsing fails.
pub fn reload_config() -> anyhow::Result<bool> {
    use std::fs;

    let c = cfg();
    let cli = c
        .cli
        .expect("CLI should be set in config during initialization");

    // Read raw content to check for changes.
    // config_path on the current config is already absolute.
    // If reading fails, bubble up error (file might be deleted temporarily).
    let content = fs::read_to_string(&c.config_path)?;

    let new_hash = crate::utils::hash::compute(content.as_bytes());

    // Check against cached hash
    let old_hash = CONFIG_HASH.load(std::sync::atomic::Ordering::Relaxed);
    if new_hash == old_hash {
        return Ok(false);
    }

    // Parse and update. The hash is only stored after a successful load, so
    // a transiently broken rsx.toml is retried on the next change event.
    let new_config = RsxConfig::load(cli)?;

    CONFIG.store(Arc::new(new_config));
    CONFIG_HASH.store(new_hash, std::sync::atomic::Ordering::Relaxed);

    Ok(true)
}

/// Initialize global config (called once at startup).
///
/// This replaces the default config with the loaded one.
#[inline]
pub fn init_config(config: RsxConfig) {
    use std::fs;

    // Initialize hash if file exists
    if config.config_path.exists()
        && let Ok(content) = fs::read_to_string(&config.config_path)
    {
        let hash = crate::utils::hash::compute(content.as_bytes());
        CONFIG_HASH.store(hash, std::sync::atomic::Ordering::Relaxed);
    }

    CONFIG.store(Arc::new(config));
}
