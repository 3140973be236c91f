use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::language::LanguageCode;

/// Called synchronously with the requested code on every switch
pub type SwitchCallback = Arc<dyn Fn(&LanguageCode) + Send + Sync>;

/// Called when a fetch fails
pub type ErrorCallback = Arc<dyn Fn(&LanguageCode, &FetchError) + Send + Sync>;

/// Serializable middleware settings (the `[translations]` table)
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct TranslationsConfig {
    /// Keep fetched dictionaries for the rest of the session
    #[serde(default = "default_true")]
    pub cache: bool,
    /// On a cache hit, show the cached dictionary and refetch it in the
    /// background
    #[serde(default)]
    pub update_cache_on_switch: bool,
    /// Language to switch to when a host starts up
    #[serde(default)]
    pub default_lang: Option<LanguageCode>,
}

fn default_true() -> bool {
    true
}

impl Default for TranslationsConfig {
    fn default() -> Self {
        Self {
            cache: true,
            update_cache_on_switch: false,
            default_lang: None,
        }
    }
}

/// Middleware configuration: settings plus callbacks
#[derive(Clone, Default)]
pub struct TranslationsOptions {
    pub config: TranslationsConfig,
    pub switch_callback: Option<SwitchCallback>,
    pub error_callback: Option<ErrorCallback>,
}

impl TranslationsOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: TranslationsConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn cache(mut self, cache: bool) -> Self {
        self.config.cache = cache;
        self
    }

    pub fn update_cache_on_switch(mut self, update: bool) -> Self {
        self.config.update_cache_on_switch = update;
        self
    }

    pub fn switch_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&LanguageCode) + Send + Sync + 'static,
    {
        self.switch_callback = Some(Arc::new(callback));
        self
    }

    pub fn error_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&LanguageCode, &FetchError) + Send + Sync + 'static,
    {
        self.error_callback = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for TranslationsOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationsOptions")
            .field("config", &self.config)
            .field("switch_callback", &self.switch_callback.is_some())
            .field("error_callback", &self.error_callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_when_fields_missing() {
        let config: TranslationsConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TranslationsConfig::default());
        assert!(config.cache);
        assert!(!config.update_cache_on_switch);
    }

    #[test]
    fn builder_sets_flags() {
        let options = TranslationsOptions::new()
            .cache(false)
            .update_cache_on_switch(true)
            .switch_callback(|_| {});
        assert!(!options.config.cache);
        assert!(options.config.update_cache_on_switch);
        assert!(options.switch_callback.is_some());
        assert!(options.error_callback.is_none());
    }
}
