use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub delegate: DelegateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DelegateConfig {
    /// Wire a language-model delegate into the pipeline
    #[serde(default)]
    pub enabled: bool,

    /// Delegate base URL; falls back to the built-in default
    pub base_url: Option<String>,

    /// Delegate model name
    pub model: Option<String>,
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load from an explicit path, creating a default file if absent
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Config::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(config_path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to its default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(config_path, toml_string)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Could not determine home directory")?;

        Ok(home.join(".talentlens").join("config.toml"))
    }

    /// Effective delegate base URL
    pub fn delegate_url(&self) -> &str {
        self.delegate
            .base_url
            .as_deref()
            .unwrap_or(crate::delegate::ollama::DEFAULT_OLLAMA_URL)
    }

    /// Effective delegate model
    pub fn delegate_model(&self) -> &str {
        self.delegate
            .model
            .as_deref()
            .unwrap_or(crate::delegate::ollama::DEFAULT_MODEL)
    }
}
