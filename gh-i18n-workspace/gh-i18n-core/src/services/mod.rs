// src/services/mod.rs

pub mod locales;    // language detection + locale documents on disk
pub mod session;    // one page load, start to finish
pub mod translator; // description translation over HTTP

// Public API
pub use locales::{audit_locale, detect_language, load_locale, DirectoryLoader, LocaleAudit};
pub use session::{ActivePage, PageSession, SessionReport};
pub use translator::{
    HttpTransport, LogNotifier, Notifier, OnDemandTranslator, PendingTranslation,
    TranslationOutcome, TranslationResponse, TranslationTransport, TransportError,
};
