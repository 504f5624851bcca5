//! Fluent-based localization for the bot's user-facing strings.
//!
//! One resource file per language under `./locales/<lang>/main.ftl`.
//! Lookups fall back to the configured default language and finally echo
//! the key, so a missing translation never breaks a conversation.

use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, OnceLock};

use anyhow::Result;
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use tracing::warn;
use unic_langid::LanguageIdentifier;

/// Languages the storefront speaks.
pub const SUPPORTED_LANGUAGES: [&str; 3] = ["uz", "ru", "en"];

/// Localization manager holding one fluent bundle per supported language.
pub struct LocalizationManager {
    bundles: HashMap<String, Arc<FluentBundle<FluentResource>>>,
    default_lang: String,
}

impl LocalizationManager {
    /// Create a manager with bundles for every supported language.
    pub fn new(default_lang: &str) -> Result<Self> {
        let mut bundles = HashMap::new();

        for lang in SUPPORTED_LANGUAGES {
            let locale: LanguageIdentifier = lang.parse()?;
            let bundle = Self::create_bundle(&locale)?;
            bundles.insert(lang.to_string(), Arc::new(bundle));
        }

        let default_lang = if SUPPORTED_LANGUAGES.contains(&default_lang) {
            default_lang.to_string()
        } else {
            warn!(
                requested = %default_lang,
                fallback = %SUPPORTED_LANGUAGES[0],
                "Unsupported default language, falling back"
            );
            SUPPORTED_LANGUAGES[0].to_string()
        };

        Ok(Self {
            bundles,
            default_lang,
        })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(locale: &LanguageIdentifier) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // Messages here are plain text, isolation marks would leak into them
        bundle.set_use_isolating(false);

        let resource_path = format!("./locales/{locale}/main.ftl");
        if let Ok(content) = fs::read_to_string(&resource_path) {
            if let Ok(resource) = FluentResource::try_new(content) {
                let _ = bundle.add_resource(resource);
            }
        }

        Ok(bundle)
    }

    pub fn default_lang(&self) -> &str {
        &self.default_lang
    }

    pub fn is_language_supported(&self, lang: &str) -> bool {
        self.bundles.contains_key(lang)
    }

    /// Get a localized message in the requested language, falling back to
    /// the default language and then to a missing-translation marker.
    pub fn get_message_in_language(
        &self,
        key: &str,
        lang: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        if let Some(value) = self.format_in(lang, key, args) {
            return value;
        }
        if lang != self.default_lang {
            if let Some(value) = self.format_in(&self.default_lang, key, args) {
                return value;
            }
        }
        format!("Missing translation: {key}")
    }

    fn format_in(
        &self,
        lang: &str,
        key: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> Option<String> {
        let bundle = self
            .bundles
            .get(lang)
            .or_else(|| self.bundles.get(&self.default_lang))?;
        let message = bundle.get_message(key)?;
        let pattern = message.value()?;

        let mut value = String::new();
        if let Some(args) = args {
            let fluent_args =
                FluentArgs::from_iter(args.iter().map(|(k, v)| (*k, FluentValue::from(*v))));
            let _ = bundle.write_pattern(&mut value, pattern, Some(&fluent_args), &mut vec![]);
        } else {
            let _ = bundle.write_pattern(&mut value, pattern, None, &mut vec![]);
        }

        Some(value)
    }
}

/// Global localization instance, initialized once at startup.
static LOCALIZATION_MANAGER: OnceLock<LocalizationManager> = OnceLock::new();

/// Initialize the global localization manager. Re-initialization is a
/// no-op, which keeps parallel tests happy.
pub fn init_localization(default_lang: &str) -> Result<()> {
    let manager = LocalizationManager::new(default_lang)?;
    let _ = LOCALIZATION_MANAGER.set(manager);
    Ok(())
}

/// Get the global localization manager
pub fn get_localization_manager() -> &'static LocalizationManager {
    LOCALIZATION_MANAGER
        .get()
        .expect("Localization manager not initialized")
}

/// Get a localized message; `None` selects the default language.
pub fn t_lang(key: &str, lang: Option<&str>) -> String {
    let manager = get_localization_manager();
    let lang = lang.unwrap_or_else(|| manager.default_lang());
    manager.get_message_in_language(key, lang, None)
}

/// Get a localized message with arguments; `None` selects the default language.
pub fn t_args_lang(key: &str, args: &[(&str, &str)], lang: Option<&str>) -> String {
    let manager = get_localization_manager();
    let lang = lang.unwrap_or_else(|| manager.default_lang());
    let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
    manager.get_message_in_language(key, lang, Some(&args_map))
}
