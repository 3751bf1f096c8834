use std::borrow::Cow;

use tracing::{debug, info};

use crate::locale::{resolve_tag, Locale, LocaleError, LocaleStore};

/// === Embedded canon locales ===
pub const ZH_CN_JSON: &str = include_str!("../assets/zh-CN.json");
pub const JA_JSON: &str = include_str!("../assets/ja.json");

/// Return the embedded text for a known locale tag, if any.
pub fn default_locale_text(tag: &str) -> Option<&'static str> {
    match tag {
        "zh-CN" => Some(ZH_CN_JSON),
        "ja" => Some(JA_JSON),
        _ => None,
    }
}

/// Where locale documents come from. Acquisition and packaging belong to the host.
pub trait LocaleSource {
    fn locale_text(&self, tag: &str) -> Option<Cow<'_, str>>;
}

/// Serves the locales compiled into this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Embedded;

impl LocaleSource for Embedded {
    fn locale_text(&self, tag: &str) -> Option<Cow<'_, str>> {
        default_locale_text(tag).map(Cow::Borrowed)
    }
}

/// Build the store for `language`.
///
/// Unsupported languages, and supported ones the source has nothing for,
/// degrade to the empty locale. A document that fails to parse is an error.
pub fn load_store<S: AsRef<str>>(
    language: &str,
    supported: &[S],
    source: &dyn LocaleSource,
) -> Result<LocaleStore, LocaleError> {
    let Some(tag) = resolve_tag(language, supported) else {
        info!(language, "language not supported, running with the empty locale");
        return Ok(LocaleStore::empty(language));
    };

    let Some(text) = source.locale_text(tag) else {
        info!(language, tag, "no locale document available, running with the empty locale");
        return Ok(LocaleStore::empty(language));
    };

    let locale = Locale::from_json(tag, &text)?;
    debug!(
        tag,
        entries = locale.dict.len(),
        rules = locale.css.len(),
        "locale loaded"
    );
    Ok(LocaleStore::new(language, Some(tag.to_string()), locale))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::SUPPORTED_LOCALES;

    #[test]
    fn embedded_locales_parse_and_are_normalized() {
        for tag in SUPPORTED_LOCALES {
            let text = default_locale_text(tag).unwrap();
            let locale = Locale::from_json(tag, text).unwrap();
            assert!(!locale.dict.is_empty());
            assert!(locale.unreachable_keys().is_empty(), "{tag}");
        }
    }

    #[test]
    fn unsupported_language_gets_empty_store() {
        let store = load_store("fr-FR", SUPPORTED_LOCALES, &Embedded).unwrap();
        assert_eq!(store.language(), "fr-FR");
        assert!(store.resolved().is_none());
        assert!(store.locale().is_empty());
    }

    #[test]
    fn chinese_variant_loads_zh_cn() {
        let store = load_store("zh-TW", SUPPORTED_LOCALES, &Embedded).unwrap();
        assert_eq!(store.resolved(), Some("zh-CN"));
        assert_eq!(store.lookup("Sign in"), Some("登录"));
    }

    struct Broken;
    impl LocaleSource for Broken {
        fn locale_text(&self, _tag: &str) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed("{ not json"))
        }
    }

    #[test]
    fn corrupt_document_is_an_error() {
        let err = load_store("ja", SUPPORTED_LOCALES, &Broken).unwrap_err();
        assert!(err.to_string().contains("`ja`"));
    }
}
