//! Configuration management for doxidx

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::index::query::{MatchMode, MatchPolicy};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub search: SearchConfig,
    pub index: IndexConfig,
    #[serde(skip)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub mode: MatchMode,
    pub case_sensitive: bool,
    pub empty_query_matches_all: bool,
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Where to look when no index path is given on the command line.
    pub default_path: String,
}

impl SearchConfig {
    pub fn policy(&self) -> MatchPolicy {
        MatchPolicy {
            mode: self.mode,
            case_sensitive: self.case_sensitive,
            empty_matches_all: self.empty_query_matches_all,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search: SearchConfig {
                mode: MatchMode::Prefix,
                case_sensitive: false,
                empty_query_matches_all: true,
                limit: 10,
            },
            index: IndexConfig {
                default_path: "search".to_string(),
            },
            verbose: false,
        }
    }
}

/// Get the configuration file path
fn config_path() -> Result<PathBuf> {
    let config_dir = directories::ProjectDirs::from("com", "doxidx", "doxidx")
        .context("Failed to determine config directory")?
        .config_dir()
        .to_path_buf();

    Ok(config_dir.join("config.toml"))
}

/// Load configuration from file or use defaults
pub fn load_config(custom_path: Option<&str>) -> Result<Config> {
    let path = if let Some(p) = custom_path {
        PathBuf::from(p)
    } else {
        config_path()?
    };

    if path.exists() {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {:?}", path))?;
        Ok(config)
    } else {
        Ok(Config::default())
    }
}

/// Initialize configuration file with defaults
pub fn init_config() -> Result<()> {
    let path = config_path()?;

    if path.exists() {
        println!("Configuration file already exists at {:?}", path);
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {:?}", parent))?;
    }

    let default_config = Config::default();
    let content = toml::to_string_pretty(&default_config)
        .context("Failed to serialize default config")?;

    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write config to {:?}", path))?;

    println!("Configuration initialized at {:?}", path);
    Ok(())
}

/// Show current configuration
pub fn show_config(config: &Config) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .context("Failed to serialize config")?;
    println!("{}", content);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = Config::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        let reparsed: Config = toml::from_str(&rendered).unwrap();

        assert_eq!(reparsed.search.mode, MatchMode::Prefix);
        assert_eq!(reparsed.search.limit, 10);
        assert!(reparsed.search.empty_query_matches_all);
        assert_eq!(reparsed.index.default_path, "search");
    }

    #[test]
    fn load_config_reads_custom_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[search]\nmode = \"fuzzy\"\ncase_sensitive = true\nempty_query_matches_all = false\nlimit = 3\n\n[index]\ndefault_path = \"docs/search\"\n",
        )
        .unwrap();

        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.search.mode, MatchMode::Fuzzy);
        assert!(config.search.case_sensitive);
        assert_eq!(config.search.limit, 3);
        assert_eq!(config.index.default_path, "docs/search");
    }
}
