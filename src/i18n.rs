use std::collections::HashMap;

use fluent_templates::{fluent_bundle::FluentValue, static_loader, Loader};
use tracing::warn;
use unic_langid::{langid, LanguageIdentifier};

static_loader! {
    static LOCALES = {
        locales: "./locales",
        fallback_language: "en",
        // Render arguments verbatim, without Unicode bidi isolation marks.
        customise: |bundle| bundle.set_use_isolating(false),
    };
}

const ENGLISH: LanguageIdentifier = langid!("en");
const RUSSIAN: LanguageIdentifier = langid!("ru");

/// Maps a Telegram-style language code ("en", "ru-RU", ...) to a catalog language.
/// Unknown or missing codes fall back to English.
pub fn lang_from_code(code: Option<&str>) -> LanguageIdentifier {
    let primary = code
        .and_then(|c| c.split(['-', '_']).next())
        .map(str::to_lowercase);

    match primary.as_deref() {
        Some("ru") => RUSSIAN,
        _ => ENGLISH,
    }
}

/// Every message the bot can send, with the arguments its template needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Text<'a> {
    StartNeedUsername,
    StartSuccess,
    Help,
    AddFilter,
    RemoveFilter,
    ShowFilter {
        filters: &'a str,
    },
    EmptyFilter,
    AddedFilter,
    RemovedFilter,
    Notify {
        initiator: &'a str,
    },
    NotifyGeo {
        initiator: &'a str,
        latitude: &'a str,
        longitude: &'a str,
    },
}

impl Text<'_> {
    /// Catalog key. Dotted keys address a Fluent attribute.
    pub fn key(&self) -> &'static str {
        match self {
            Text::StartNeedUsername => "start.need-username",
            Text::StartSuccess => "start.success",
            Text::Help => "help",
            Text::AddFilter => "add-filter",
            Text::RemoveFilter => "remove-filter",
            Text::ShowFilter { .. } => "show-filter",
            Text::EmptyFilter => "empty-filter",
            Text::AddedFilter => "added-filter",
            Text::RemovedFilter => "removed-filter",
            Text::Notify { .. } => "notify",
            Text::NotifyGeo { .. } => "notify.geo",
        }
    }

    fn args(&self) -> Vec<(&'static str, String)> {
        match self {
            Text::ShowFilter { filters } => vec![("filters", filters.to_string())],
            Text::Notify { initiator } => vec![("initiator", initiator.to_string())],
            Text::NotifyGeo {
                initiator,
                latitude,
                longitude,
            } => vec![
                ("initiator", initiator.to_string()),
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
            ],
            _ => Vec::new(),
        }
    }
}

/// Resolves a message to display text for a language.
pub trait Localizer: Send + Sync {
    fn render(&self, language_code: Option<&str>, text: &Text<'_>) -> String;
}

/// Localizer backed by the Fluent catalogs compiled in from `locales/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FluentLocalizer;

impl Localizer for FluentLocalizer {
    fn render(&self, language_code: Option<&str>, text: &Text<'_>) -> String {
        let lang = lang_from_code(language_code);
        let key = text.key();
        let args: HashMap<String, FluentValue> = text
            .args()
            .into_iter()
            .map(|(name, value)| (name.to_string(), FluentValue::from(value)))
            .collect();

        let rendered = if args.is_empty() {
            LOCALES.lookup(&lang, key)
        } else {
            LOCALES.lookup_with_args(&lang, key, &args)
        };

        rendered.unwrap_or_else(|| {
            warn!("Missing localization for key '{}' ({})", key, lang);
            key.to_string()
        })
    }
}
