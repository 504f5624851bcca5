//! Startup configuration loaded once from the environment.

use std::env;

use crate::errors::ShopError;

/// Fallback language when `LANG_DEFAULT` is not set.
pub const FALLBACK_DEFAULT_LANG: &str = "uz";

#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot credential
    pub bot_token: String,
    /// Postgres connection string
    pub database_url: String,
    /// Telegram user id of the single administrator
    pub admin_id: i64,
    /// Language used when a user has not picked one
    pub default_lang: String,
}

impl Config {
    /// Load configuration from process environment variables.
    /// Absence of any required value is a fatal startup error.
    pub fn from_env() -> Result<Self, ShopError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ShopError> {
        let require = |name: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ShopError::ConfigurationMissing(name.to_string()))
        };

        let bot_token = require("BOT_TOKEN")?;
        let database_url = require("DATABASE_URL")?;
        let admin_id = require("ADMIN_ID")?
            .parse::<i64>()
            .map_err(|_| ShopError::ConfigurationMissing("ADMIN_ID".to_string()))?;
        let default_lang =
            lookup("LANG_DEFAULT").unwrap_or_else(|| FALLBACK_DEFAULT_LANG.to_string());

        Ok(Config {
            bot_token,
            database_url,
            admin_id,
            default_lang,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_lookup(vars(&[
            ("BOT_TOKEN", "123:abc"),
            ("DATABASE_URL", "postgres://localhost/sweets"),
            ("ADMIN_ID", "42"),
            ("LANG_DEFAULT", "en"),
        ]))
        .unwrap();

        assert_eq!(config.admin_id, 42);
        assert_eq!(config.default_lang, "en");
    }

    #[test]
    fn test_default_language_falls_back() {
        let config = Config::from_lookup(vars(&[
            ("BOT_TOKEN", "123:abc"),
            ("DATABASE_URL", "postgres://localhost/sweets"),
            ("ADMIN_ID", "42"),
        ]))
        .unwrap();

        assert_eq!(config.default_lang, FALLBACK_DEFAULT_LANG);
    }

    #[test]
    fn test_missing_required_value_is_fatal() {
        let err = Config::from_lookup(vars(&[
            ("BOT_TOKEN", "123:abc"),
            ("ADMIN_ID", "42"),
        ]))
        .unwrap_err();

        assert_eq!(
            err,
            ShopError::ConfigurationMissing("DATABASE_URL".to_string())
        );
    }

    #[test]
    fn test_non_numeric_admin_id_is_rejected() {
        let err = Config::from_lookup(vars(&[
            ("BOT_TOKEN", "123:abc"),
            ("DATABASE_URL", "postgres://localhost/sweets"),
            ("ADMIN_ID", "not-a-number"),
        ]))
        .unwrap_err();

        assert_eq!(err, ShopError::ConfigurationMissing("ADMIN_ID".to_string()));
    }
}
