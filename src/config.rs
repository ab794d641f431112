use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::calendar::WeekLayout;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default)]
    pub week_layout: WeekLayout,
    /// Pre-fills the author of notes and the uploader of files.
    #[serde(default)]
    pub default_author: Option<String>,
    /// Where downloaded attachments are written.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            week_layout: WeekLayout::default(),
            default_author: None,
            download_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config at {}", path.display()))?;
                return Self::parse(&contents);
            }
        }

        let mut config = Config::default();
        if let Ok(url) = std::env::var("UNICAL_SERVER_URL") {
            config.server_url = url;
        }
        config.default_author = std::env::var("UNICAL_AUTHOR").ok();
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).with_context(|| "Failed to parse config.toml")
    }

    pub fn generate_default() -> Result<PathBuf> {
        let path = Self::config_path()
            .with_context(|| "Could not determine config directory")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let default = Config {
            default_author: Some("Студент".into()),
            ..Config::default()
        };

        let toml_str = toml::to_string_pretty(&default)?;
        std::fs::write(&path, toml_str)?;
        Ok(path)
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("unical").join("config.toml"))
    }
}
