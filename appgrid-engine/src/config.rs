//! Engine configuration loaded with figment
//!
//! Sources, later overriding earlier:
//! 1. Built-in defaults
//! 2. `appgrid.toml` / `appgrid.yaml` / `appgrid.yml` / `appgrid.json` in the engine root
//! 3. Environment variables prefixed `APPGRID_` (e.g. `APPGRID_MAX_PAGE_LIMIT=50`)

use crate::error::Result;
use appgrid_fields::UnknownTypePolicy;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "APPGRID_";

/// Base name of the optional config file in the engine root
pub const CONFIG_FILE_STEM: &str = "appgrid";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Page size when a list query names none
    pub default_page_limit: usize,
    /// Upper bound on any requested page size
    pub max_page_limit: usize,
    /// Unknown field types: `fallback` to text, or `reject`
    pub unknown_field_types: UnknownTypePolicy,
    /// Write the activity log and per-record logs
    pub activity_log: bool,
    /// Writes naming a key with no field definition fail validation
    pub reject_unknown_keys: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_page_limit: 20,
            max_page_limit: 100,
            unknown_field_types: UnknownTypePolicy::Fallback,
            activity_log: true,
            reject_unknown_keys: true,
        }
    }
}

impl EngineConfig {
    /// Load configuration for an engine rooted at `root`
    pub fn load(root: &Path) -> Result<Self> {
        let config: EngineConfig = Self::figment(root).extract()?;
        debug!(?config, root = %root.display(), "engine configuration loaded");
        Ok(config)
    }

    /// The merged provider chain, exposed for callers layering their own sources
    pub fn figment(root: &Path) -> Figment {
        let file = |ext: &str| root.join(format!("{CONFIG_FILE_STEM}.{ext}"));
        Figment::new()
            .merge(Serialized::defaults(EngineConfig::default()))
            .merge(Toml::file(file("toml")))
            .merge(Yaml::file(file("yaml")))
            .merge(Yaml::file(file("yml")))
            .merge(Json::file(file("json")))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Clamp a requested page size into `1..=max_page_limit`
    pub fn page_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_limit)
            .clamp(1, self.max_page_limit.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_defaults_without_sources() {
        let temp = TempDir::new().unwrap();
        let config = EngineConfig::load(temp.path()).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    #[serial]
    fn test_file_overrides_defaults() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("appgrid.toml"),
            "max_page_limit = 50\nunknown_field_types = \"reject\"\n",
        )
        .unwrap();

        let config = EngineConfig::load(temp.path()).unwrap();
        assert_eq!(config.max_page_limit, 50);
        assert_eq!(config.unknown_field_types, UnknownTypePolicy::Reject);
        assert_eq!(config.default_page_limit, 20);
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("appgrid.yaml"), "activity_log: true\n").unwrap();

        std::env::set_var("APPGRID_ACTIVITY_LOG", "false");
        let config = EngineConfig::load(temp.path());
        std::env::remove_var("APPGRID_ACTIVITY_LOG");

        assert!(!config.unwrap().activity_log);
    }

    #[test]
    fn test_page_limit_clamped() {
        let config = EngineConfig::default();
        assert_eq!(config.page_limit(None), 20);
        assert_eq!(config.page_limit(Some(0)), 1);
        assert_eq!(config.page_limit(Some(500)), 100);
    }
}
