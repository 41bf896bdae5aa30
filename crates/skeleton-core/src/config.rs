//! User configuration
//!
//! Reads config.json from the skeleton config directory and combines it with
//! the environment and command line into the template search path.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths::Paths;

/// Environment variable holding extra template roots
pub const SEARCH_PATH_ENV: &str = "SKELETON_PATH";

/// Persisted user configuration (config.json)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Template roots searched after the command line and environment
    #[serde(default)]
    pub search_path: Vec<PathBuf>,
}

impl Config {
    /// Load config.json from the standard location, or defaults if absent
    pub fn load(paths: &Paths) -> Result<Self> {
        Self::load_from(&paths.config_file())
    }

    /// Load a config file, or defaults if it does not exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        tracing::debug!("Loaded config from {}", config_path.display());
        Ok(config)
    }

    /// Build the ordered template search path.
    ///
    /// Order: explicit roots, then entries of `env` (a platform path list,
    /// normally the value of `SKELETON_PATH`), then `search_path` from the
    /// config file, then the user templates directory. Repeated entries are
    /// kept at their first position.
    pub fn search_path(&self, explicit: &[PathBuf], env: Option<&OsStr>, paths: &Paths) -> Vec<PathBuf> {
        let from_env: Vec<PathBuf> = env
            .map(|value| std::env::split_paths(value).filter(|p| !p.as_os_str().is_empty()).collect())
            .unwrap_or_default();

        let mut roots: Vec<PathBuf> = Vec::new();
        let candidates = explicit
            .iter()
            .cloned()
            .chain(from_env)
            .chain(self.search_path.iter().cloned())
            .chain(std::iter::once(paths.templates()));

        for candidate in candidates {
            if !roots.contains(&candidate) {
                roots.push(candidate);
            }
        }

        roots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_search_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"search_path": ["/srv/skeletons"]}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.search_path, vec![PathBuf::from("/srv/skeletons")]);
    }

    #[test]
    fn test_invalid_config_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_search_path_order() {
        let paths = Paths::with_roots(PathBuf::from("/data"), PathBuf::from("/cfg"));
        let config = Config {
            search_path: vec![PathBuf::from("/from-config"), PathBuf::from("/cli")],
        };

        let env = std::env::join_paths([PathBuf::from("/env-a"), PathBuf::from("/env-b")]).unwrap();
        let roots = config.search_path(&[PathBuf::from("/cli")], Some(env.as_os_str()), &paths);

        assert_eq!(
            roots,
            vec![
                PathBuf::from("/cli"),
                PathBuf::from("/env-a"),
                PathBuf::from("/env-b"),
                PathBuf::from("/from-config"),
                PathBuf::from("/data/templates"),
            ]
        );
    }

    #[test]
    fn test_search_path_without_env() {
        let paths = Paths::with_roots(PathBuf::from("/data"), PathBuf::from("/cfg"));
        let roots = Config::default().search_path(&[], None, &paths);
        assert_eq!(roots, vec![PathBuf::from("/data/templates")]);
    }
}
