//! `[build]` section configuration.
//!
//! Paths used by discovery and page materialization. All paths are
//! normalized to absolute during CLI merge (see `update_with_cli`).

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in rsx.toml - project layout configuration.
///
/// # Example
/// ```toml
/// [build]
/// pages = "src/pages"   # Routable documents live here
/// output = "dist"       # Rendered pages land here
/// cache = ".cache/rsx"  # Parse cache location
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Pages directory. Documents under it are routable pages,
    /// documents outside it are components.
    #[serde(default = "defaults::build::pages")]
    #[educe(Default = defaults::build::pages())]
    pub pages: PathBuf,

    /// Build output directory. Excluded from discovery.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Cache directory. Excluded from discovery.
    #[serde(default = "defaults::build::cache")]
    #[educe(Default = defaults::build::cache())]
    pub cache: PathBuf,

    /// Clean output directory before each build.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,
}

#[cfg(test)]
mod tests {
    use super::super::RsxConfig;
    use std::path::PathBuf;

    #[test]
    fn test_build_config_defaults() {
        let config: RsxConfig = toml::from_str("").unwrap();

        assert_eq!(config.build.pages, PathBuf::from("src/pages"));
        assert_eq!(config.build.output, PathBuf::from("dist"));
        assert_eq!(config.build.cache, PathBuf::from(".cache/rsx"));
        assert!(!config.build.clean);
    }

    #[test]
    fn test_build_paths_custom() {
        let config = r#"
            [build]
            pages = "pages"
            output = "public"
            cache = "tmp/cache"
        "#;
        let config: RsxConfig = toml::from_str(config).unwrap();

        assert_eq!(config.build.pages, PathBuf::from("pages"));
        assert_eq!(config.build.output, PathBuf::from("public"));
        assert_eq!(config.build.cache, PathBuf::from("tmp/cache"));
    }

    #[test]
    fn test_build_clean_enabled() {
        let config = r#"
            [build]
            clean = true
        "#;
        let config: RsxConfig = toml::from_str(config).unwrap();
        assert!(config.build.clean);
    }

    #[test]
    fn test_unknown_field_rejection() {
        let config = r#"
            [build]
            unknown_field = "should_fail"
        "#;
        let result: Result<RsxConfig, _> = toml::from_str(config);

        assert!(result.is_err());
    }
}
