// src/services/locales.rs
//! Locale acquisition: which language the host speaks and where its locale
//! document comes from.

use anyhow::{Context, Result};
use lexicon::{default_locale_text, load_store, Locale, LocaleSource, LocaleStore, SelectorList};
use serde::Serialize;
use std::borrow::Cow;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::LocaleConfig;

/// Last resort when nothing else names a language.
pub const FALLBACK_LANGUAGE: &str = "en-US";

/// Reads `<tag>.json` from a directory; locales embedded in `lexicon` fill the gaps.
#[derive(Debug, Clone, Default)]
pub struct DirectoryLoader {
    dir: Option<PathBuf>,
}

impl DirectoryLoader {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }
}

impl LocaleSource for DirectoryLoader {
    fn locale_text(&self, tag: &str) -> Option<Cow<'_, str>> {
        if let Some(dir) = &self.dir {
            let path = dir.join(format!("{tag}.json"));
            match fs::read_to_string(&path) {
                Ok(text) => {
                    debug!(path = %path.display(), "locale read from disk");
                    return Some(Cow::Owned(text));
                }
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    debug!(path = %path.display(), "no locale file, trying embedded");
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "unreadable locale file, trying embedded");
                }
            }
        }
        default_locale_text(tag).map(Cow::Borrowed)
    }
}

/// Pick the host language: explicit flag, then config, then the OS, then `en-US`.
pub fn detect_language(cli: Option<&str>, cfg: &LocaleConfig) -> String {
    let picked = cli
        .map(str::to_string)
        .or_else(|| cfg.language.clone())
        .or_else(sys_locale::get_locale)
        .unwrap_or_else(|| FALLBACK_LANGUAGE.to_string());
    // POSIX-style tags (`zh_TW.UTF-8`) are reduced to `zh-TW`.
    let tag = picked.split('.').next().unwrap_or_default().replace('_', "-");
    if tag.is_empty() {
        FALLBACK_LANGUAGE.to_string()
    } else {
        tag
    }
}

/// Build the locale store for `language` according to `cfg`.
pub fn load_locale(cfg: &LocaleConfig, language: &str) -> Result<LocaleStore> {
    let loader = DirectoryLoader::new(cfg.resources_dir.clone());
    load_store(language, &cfg.supported, &loader)
        .with_context(|| format!("loading locale for language {language}"))
}

/// Health report for one locale document.
#[derive(Debug, Clone, Serialize)]
pub struct LocaleAudit {
    pub tag: String,
    pub entries: usize,
    pub rules: usize,
    /// Keys that can never be hit because they are not in lookup form.
    pub unreachable_keys: Vec<String>,
    /// Keys whose translation is empty and therefore never applied.
    pub empty_translations: Vec<String>,
    /// `(selector, error)` for override rules that will be skipped.
    pub invalid_selectors: Vec<(String, String)>,
}

impl LocaleAudit {
    pub fn is_clean(&self) -> bool {
        self.unreachable_keys.is_empty()
            && self.empty_translations.is_empty()
            && self.invalid_selectors.is_empty()
    }
}

pub fn audit_locale(tag: &str, source: &dyn LocaleSource) -> Result<LocaleAudit> {
    let text = source
        .locale_text(tag)
        .with_context(|| format!("no locale document for {tag}"))?;
    let locale = Locale::from_json(tag, &text)?;

    let mut empty_translations: Vec<String> = locale
        .dict
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(key, _)| key.clone())
        .collect();
    empty_translations.sort();

    let invalid_selectors = locale
        .css
        .iter()
        .filter_map(|rule| {
            SelectorList::parse(&rule.selector)
                .err()
                .map(|err| (rule.selector.clone(), err.to_string()))
        })
        .collect();

    Ok(LocaleAudit {
        tag: tag.to_string(),
        entries: locale.dict.len(),
        rules: locale.css.len(),
        unreachable_keys: locale
            .unreachable_keys()
            .into_iter()
            .map(str::to_string)
            .collect(),
        empty_translations,
        invalid_selectors,
    })
}
