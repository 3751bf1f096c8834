use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize;

/// Sentinel rule key meaning "replace the inner markup of every match".
pub const MARKUP_KEY: &str = "!html";

/// Locales shipped by default.
pub const SUPPORTED_LOCALES: &[&str] = &["zh-CN", "ja"];

#[derive(Debug, Error)]
pub enum LocaleError {
    #[error("parsing locale `{tag}`: {source}")]
    Parse {
        tag: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A declarative patch applied to every element matching `selector`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CssRule {
    pub selector: String,
    pub key: String,
    pub replacement: String,
}

/// What a [`CssRule`] writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideTarget<'a> {
    Markup,
    Attribute(&'a str),
}

impl CssRule {
    pub fn target(&self) -> OverrideTarget<'_> {
        if self.key == MARKUP_KEY {
            OverrideTarget::Markup
        } else {
            OverrideTarget::Attribute(&self.key)
        }
    }
}

/// Dictionary and override rules for one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Locale {
    #[serde(default)]
    pub css: Vec<CssRule>,
    #[serde(default)]
    pub dict: HashMap<String, String>,
}

impl Locale {
    /// The empty locale: the engine runs but nothing is substituted.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json(tag: &str, text: &str) -> Result<Self, LocaleError> {
        serde_json::from_str(text).map_err(|source| LocaleError::Parse {
            tag: tag.to_string(),
            source,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.css.is_empty() && self.dict.is_empty()
    }

    /// Translation for a raw page string, if the dictionary knows it.
    /// Empty translations count as missing.
    pub fn lookup(&self, raw: &str) -> Option<&str> {
        let key = normalize::for_lookup(raw);
        self.dict
            .get(&key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Dictionary keys that can never match because they are not in normalized form.
    pub fn unreachable_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .dict
            .keys()
            .filter(|key| normalize::for_lookup(key) != key.as_str())
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        keys
    }
}

/// The locale chosen for this page session.
#[derive(Debug, Clone)]
pub struct LocaleStore {
    language: String,
    resolved: Option<String>,
    locale: Locale,
}

impl LocaleStore {
    pub fn new(language: impl Into<String>, resolved: Option<String>, locale: Locale) -> Self {
        Self {
            language: language.into(),
            resolved,
            locale,
        }
    }

    /// A store for `language` that substitutes nothing.
    pub fn empty(language: impl Into<String>) -> Self {
        Self::new(language, None, Locale::empty())
    }

    /// Host language tag as detected, e.g. `zh-TW`.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Supported tag the host language mapped to.
    pub fn resolved(&self) -> Option<&str> {
        self.resolved.as_deref()
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn lookup(&self, raw: &str) -> Option<&str> {
        self.locale.lookup(raw)
    }

    pub fn rules(&self) -> &[CssRule] {
        &self.locale.css
    }
}

/// Map a host language tag onto one of `supported`.
///
/// Every Chinese variant (`zh`, `zh-TW`, `zh-HK`, ...) is served by `zh-CN`.
pub fn resolve_tag<'a, S: AsRef<str>>(language: &str, supported: &'a [S]) -> Option<&'a str> {
    let wanted = if language.starts_with("zh") {
        "zh-CN"
    } else {
        language
    };
    supported
        .iter()
        .map(AsRef::as_ref)
        .find(|tag| *tag == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chinese_variants_share_one_locale() {
        assert_eq!(resolve_tag("zh-TW", SUPPORTED_LOCALES), Some("zh-CN"));
        assert_eq!(resolve_tag("zh", SUPPORTED_LOCALES), Some("zh-CN"));
        assert_eq!(resolve_tag("ja", SUPPORTED_LOCALES), Some("ja"));
        assert_eq!(resolve_tag("ja-JP", SUPPORTED_LOCALES), None);
        assert_eq!(resolve_tag("en-US", SUPPORTED_LOCALES), None);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let locale = Locale::from_json("x", r#"{"dict": {"star": "星标"}}"#).unwrap();
        assert!(locale.css.is_empty());
        assert_eq!(locale.lookup("  Star "), Some("星标"));
    }

    #[test]
    fn empty_translation_is_a_miss() {
        let locale = Locale::from_json("x", r#"{"dict": {"fork": ""}}"#).unwrap();
        assert_eq!(locale.lookup("Fork"), None);
    }

    #[test]
    fn flags_unnormalized_keys() {
        let locale = Locale::from_json(
            "x",
            r#"{"dict": {"Sign in": "a", "sign in": "b", "two  spaces": "c"}}"#,
        )
        .unwrap();
        assert_eq!(locale.unreachable_keys(), vec!["Sign in", "two  spaces"]);
    }

    #[test]
    fn rule_targets() {
        let rule = CssRule {
            selector: ".x".into(),
            key: MARKUP_KEY.into(),
            replacement: "<b>x</b>".into(),
        };
        assert_eq!(rule.target(), OverrideTarget::Markup);
        let rule = CssRule {
            key: "title".into(),
            ..rule
        };
        assert_eq!(rule.target(), OverrideTarget::Attribute("title"));
    }
}
