//! Standard paths used by the skeleton tool

use std::path::PathBuf;

/// Name of the per-target variables file
pub const SKELVARS_FILE: &str = ".skelvars";

/// Standard skeleton paths
#[derive(Debug, Clone)]
pub struct Paths {
    /// Data directory (~/.local/share/skeleton)
    pub data: PathBuf,
    /// Config directory (~/.config/skeleton)
    pub config: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        let data = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("skeleton");

        let config = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("skeleton");

        Self { data, config }
    }

    /// Build paths rooted somewhere else (for testing)
    pub fn with_roots(data: PathBuf, config: PathBuf) -> Self {
        Self { data, config }
    }

    /// User templates directory, always last on the search path
    pub fn templates(&self) -> PathBuf {
        self.data.join("templates")
    }

    /// Location of config.json
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.json")
    }
}
