//! Settings that merge config.toml defaults with values stored in the database.
//!
//! Config values serve as defaults; rows in `user_preferences` override them.
//! Writes always go to the database, never to the config file.
use std::collections::HashMap;

use anyhow::Result;
use secrecy::SecretString;

use crate::config::Config;
use crate::storage::Database;

/// Environment variable that overrides every other API key source.
pub const API_KEY_ENV: &str = "NEWSAPI_KEY";

/// Preference keys
pub const KEY_API_KEY: &str = "news.api_key";
pub const KEY_COUNTRY: &str = "headlines.country";
pub const KEY_CATEGORY: &str = "headlines.category";
pub const KEY_LANGUAGE: &str = "search.language";

// ============================================================================
// Settings
// ============================================================================

/// Merged settings: config.toml defaults + database overrides.
///
/// The API key is kept apart from the plain map as a [`SecretString`] so it
/// never shows up in `Debug` output or listings of ordinary preferences.
pub struct Settings {
    prefs: HashMap<String, String>,
    api_key: Option<SecretString>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("prefs", &self.prefs)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Settings {
    /// Load settings, reading the API key override from `NEWSAPI_KEY`.
    pub async fn load(config: &Config, db: &Database) -> Result<Self> {
        let env_key = std::env::var(API_KEY_ENV).ok();
        Self::load_with_env_key(config, db, env_key).await
    }

    /// Load settings with an explicit env-var value.
    ///
    /// API key precedence: env var, then the stored key, then `config.api_key`.
    /// Empty strings count as unset at every level.
    pub async fn load_with_env_key(
        config: &Config,
        db: &Database,
        env_key: Option<String>,
    ) -> Result<Self> {
        let mut prefs = Self::flatten_config(config);

        let mut stored_key = None;
        for (key, value) in db.get_all_preferences().await? {
            if key == KEY_API_KEY {
                stored_key = Some(value);
            } else {
                prefs.insert(key, value);
            }
        }

        let api_key = [env_key, stored_key, config.api_key.clone()]
            .into_iter()
            .flatten()
            .map(|k| k.trim().to_string())
            .find(|k| !k.is_empty())
            .map(SecretString::from);

        Ok(Self { prefs, api_key })
    }

    /// Settings from config only, for when the database is unavailable.
    pub fn from_config(config: &Config) -> Self {
        Self {
            prefs: Self::flatten_config(config),
            api_key: config
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(|k| SecretString::from(k.to_string())),
        }
    }

    /// Get a preference value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.prefs.get(key).map(String::as_str)
    }

    /// Persist a preference and update the in-memory copy.
    pub async fn set(&mut self, db: &Database, key: &str, value: &str) -> Result<()> {
        db.set_preference(key, value).await?;
        self.prefs.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Persist a new API key.
    pub async fn set_api_key(&mut self, db: &Database, key: &str) -> Result<()> {
        let key = key.trim();
        db.set_preference(KEY_API_KEY, key).await?;
        self.api_key = Some(SecretString::from(key.to_string()));
        Ok(())
    }

    // ========================================================================
    // Type-safe Accessors
    // ========================================================================

    pub fn api_key(&self) -> Option<&SecretString> {
        self.api_key.as_ref()
    }

    /// Country code for top headlines.
    pub fn country(&self) -> &str {
        self.get(KEY_COUNTRY).unwrap_or("us")
    }

    /// Category for top headlines; empty means unfiltered.
    pub fn category(&self) -> &str {
        self.get(KEY_CATEGORY).unwrap_or("general")
    }

    /// Language filter for searches; `all` means unfiltered.
    pub fn language(&self) -> &str {
        self.get(KEY_LANGUAGE).unwrap_or("all")
    }

    fn flatten_config(config: &Config) -> HashMap<String, String> {
        // api_key is deliberately absent: it lives in `Settings::api_key` only.
        HashMap::from([
            (KEY_COUNTRY.to_string(), config.country.clone()),
            (KEY_CATEGORY.to_string(), config.category.clone()),
            (KEY_LANGUAGE.to_string(), config.language.clone()),
        ])
    }
}
