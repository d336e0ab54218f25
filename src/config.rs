//! Connection configuration - TOML-backed factory settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for opening sessions against a database: endpoint, credentials,
/// and pool sizing. Drivers are free to ignore fields that do not apply
/// (the in-memory backend ignores all of them).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrmConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_pool_size")]
    pub max_pool_size: usize,
}

fn default_pool_size() -> usize {
    10
}

impl Default for OrmConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: None,
            password: None,
            max_pool_size: default_pool_size(),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("tinyorm.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<OrmConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: OrmConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &OrmConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
