use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
}

/// Graph storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    /// Directory where per-graph SQLite databases are created.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Loader tuning configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    /// Maximum document nesting depth accepted by the recursive loader.
    /// Documents nested deeper than this are rejected.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            graph: GraphConfig::default(),
            loader: LoaderConfig::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./graphs")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_depth() -> usize {
    crate::graph::loader::DEFAULT_MAX_DEPTH
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in GRAPHLD_CONFIG environment variable
    /// 2. ./config.toml in current directory
    ///
    /// Falls back to defaults when no config file exists; graphs are created
    /// at ad-hoc paths, so a config file is optional for CLI use.
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignore errors - file is optional)
        let _ = dotenv::dotenv();

        let config_path = std::env::var("GRAPHLD_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        if !config_path.exists() {
            log::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Config::default());
        }

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .context("Failed to parse config.toml")?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.loader.max_depth == 0 {
            anyhow::bail!("loader.max_depth must be greater than 0");
        }

        if self.graph.data_dir.as_os_str().is_empty() {
            anyhow::bail!("graph.data_dir must not be empty");
        }

        Ok(())
    }

    /// Get the directory where graph databases live
    pub fn data_dir(&self) -> &Path {
        &self.graph.data_dir
    }

    /// Get the loader recursion depth limit
    pub fn max_depth(&self) -> usize {
        self.loader.max_depth
    }
}
