//! Glossa configuration file handling

use anyhow::{Context, Result};
use glossa_i18n::{CatalogDirFetcher, TranslationsConfig, TranslationsOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "glossa.toml";

/// Top-level configuration (glossa.toml)
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GlossaConfig {
    #[serde(default)]
    pub translations: TranslationsConfig,
    #[serde(default)]
    pub catalogs: CatalogsConfig,
    /// Directory the config was loaded from; relative paths resolve against it
    #[serde(skip)]
    root: PathBuf,
}

/// Where dictionaries come from
#[derive(Debug, Deserialize, Serialize)]
pub struct CatalogsConfig {
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
    /// Artificial delay added to every fetch
    #[serde(default)]
    pub latency_ms: u64,
}

fn default_dir() -> PathBuf {
    PathBuf::from("langs")
}

impl Default for CatalogsConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            latency_ms: 0,
        }
    }
}

impl GlossaConfig {
    /// Load configuration from a directory (looks for glossa.toml) or a file
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let config_path = if path.is_file() {
            path.to_path_buf()
        } else {
            path.join(CONFIG_FILE)
        };

        if !config_path.exists() {
            anyhow::bail!(
                "No {} found in {}. Run `glossa init` to create one.",
                CONFIG_FILE,
                path.display()
            );
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let mut config: GlossaConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;
        config.root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(config)
    }

    /// Default configuration with English as the starting language
    pub fn new() -> Self {
        Self {
            translations: TranslationsConfig {
                default_lang: Some("en".into()),
                ..TranslationsConfig::default()
            },
            ..Self::default()
        }
    }

    /// Catalog directory, resolved against the config file's location
    pub fn catalog_dir(&self) -> PathBuf {
        self.root.join(&self.catalogs.dir)
    }

    pub fn fetcher(&self) -> CatalogDirFetcher {
        CatalogDirFetcher::new(self.catalog_dir())
            .with_latency(Duration::from_millis(self.catalogs.latency_ms))
    }

    pub fn options(&self) -> TranslationsOptions {
        TranslationsOptions::from_config(self.translations.clone())
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
