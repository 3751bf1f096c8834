// Public modules so gh-i18n-core can use them
pub mod assets;
pub mod classify;
pub mod dom;
pub mod engine;
pub mod html;
pub mod locale;
pub mod normalize;
pub mod overrides;
pub mod reltime;
pub mod rewrite;
pub mod selector;
pub mod walker;
pub mod watcher;

pub use assets::{default_locale_text, load_store, Embedded, LocaleSource};
pub use classify::Policy;
pub use dom::{Document, MutationRecord, NodeId, ObserverOptions};
pub use engine::{BootReport, Engine};
pub use locale::{resolve_tag, CssRule, Locale, LocaleError, LocaleStore, SUPPORTED_LOCALES};
pub use normalize::for_lookup as normalize_key;
pub use overrides::{apply_overrides, OverrideReport};
pub use reltime::{RelativeTimeFormatter, Timeago};
pub use selector::{SelectorError, SelectorList};
pub use walker::{WalkStats, Walker};
pub use watcher::LiveWatcher;

/// --- Pure Rust API for gh-i18n-core ---
///
/// Translate a complete HTML page with the locale document `json_locale`.
///
/// `language` is resolved against [`SUPPORTED_LOCALES`] first; a page in an
/// unsupported language comes back untouched.
pub fn translate_html(
    json_locale: &str,
    language: &str,
    page: &str,
) -> Result<String, LocaleError> {
    let store = load_store(language, SUPPORTED_LOCALES, &Inline(json_locale))?;
    let policy = Policy::default();
    let formatter = Timeago::new();
    let mut doc = Document::parse(page);
    let engine = Engine::new(&store, &policy, &formatter);
    let (_, watcher) = engine.boot(&mut doc);
    watcher.disconnect(&mut doc);
    Ok(doc.to_html())
}

/// One caller-supplied document, served for whichever tag resolves.
struct Inline<'a>(&'a str);

impl LocaleSource for Inline<'_> {
    fn locale_text(&self, _tag: &str) -> Option<std::borrow::Cow<'_, str>> {
        Some(self.0.into())
    }
}

/// --- WASM entrypoint (only compiled for wasm32 with "wasm_guest") ---
#[cfg(all(target_arch = "wasm32", feature = "wasm_guest"))]
mod wasm_api {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen]
    pub fn normalize_key(raw: &str) -> String {
        super::normalize_key(raw)
    }

    #[wasm_bindgen]
    pub fn translate_page(json_locale: &str, language: &str, page: &str) -> String {
        super::translate_html(json_locale, language, page)
            .unwrap_or_else(|_| "Invalid locale JSON".to_string())
    }
}
