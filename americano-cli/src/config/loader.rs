use super::types::AmericanoConfig;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use toml::{Table, Value};

pub struct ConfigLoader;

/// One config file in the merge order
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLayer {
    /// "user" or "project"
    pub name: &'static str,
    pub path: PathBuf,
}

impl ConfigLayer {
    pub fn new(name: &'static str, path: impl Into<PathBuf>) -> Self {
        Self {
            name,
            path: path.into(),
        }
    }

    /// Whether the file is present and will be merged
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<AmericanoConfig> {
        Self::load_layers(&Self::layers())
    }

    /// Config layers, lowest precedence first
    pub fn layers() -> Vec<ConfigLayer> {
        let mut layers = Vec::with_capacity(2);
        if let Some(user_path) = Self::user_config_path() {
            layers.push(ConfigLayer::new("user", user_path));
        }
        layers.push(ConfigLayer::new("project", Self::project_config_path()));
        layers
    }

    /// Merge the given layers in order, skipping missing files
    pub fn load_layers(layers: &[ConfigLayer]) -> Result<AmericanoConfig> {
        let mut raw = Table::new();
        for layer in layers {
            if let Some(table) = Self::read_layer(&layer.path)? {
                raw = Self::merge_raw(raw, table);
            }
        }
        Self::finalize(raw)
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "americano").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with AMERICANO_PROJECT_CONFIG_DIR env var
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("AMERICANO_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".americano/config.toml")
        }
    }

    /// Read one layer, `None` if the file does not exist
    fn read_layer(path: &Path) -> Result<Option<Table>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let table = contents
            .parse::<Table>()
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(table))
    }

    /// Merge two raw configs (overlay keys override base, nested tables merge key by key)
    fn merge_raw(mut base: Table, overlay: Table) -> Table {
        for (key, value) in overlay {
            let merged = match (base.remove(&key), value) {
                (Some(Value::Table(base_table)), Value::Table(overlay_table)) => {
                    Value::Table(Self::merge_raw(base_table, overlay_table))
                }
                (_, value) => value,
            };
            base.insert(key, merged);
        }
        base
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: Table) -> Result<AmericanoConfig> {
        Value::Table(raw)
            .try_into()
            .context("invalid americano configuration")
    }

    /// Load config from a specific path (for testing)
    #[cfg(test)]
    pub fn load_from_path(path: &Path) -> Result<AmericanoConfig> {
        Self::finalize(Self::read_layer(path)?.unwrap_or_default())
    }
}
