// src/services/session.rs
//! One page load: overrides first, then the translate affordance and the
//! initial walk, and finally the live watcher.

use anyhow::Result;
use chrono::{DateTime, Utc};
use lexicon::{Document, Engine, LiveWatcher, LocaleStore, OverrideReport, Policy, Timeago, WalkStats};
use serde::Serialize;
use tracing::info;

use crate::config::CoreConfig;
use crate::services::locales::load_locale;
use crate::services::translator::{
    Notifier, OnDemandTranslator, TranslationOutcome, TranslationTransport,
};

/// What happened to a page, serialisable for the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub language: String,
    pub resolved: Option<String>,
    pub started_at: DateTime<Utc>,
    pub overrides: OverrideReport,
    /// Regions that received the translate affordance.
    pub affordances: usize,
    pub initial: WalkStats,
    /// Rewrites made while processing mutation batches.
    pub live: WalkStats,
    pub batches: usize,
    pub translation: Option<TranslationOutcome>,
}

/// A page that has been started: the installed watcher plus its running report.
#[derive(Debug)]
pub struct ActivePage {
    watcher: LiveWatcher,
    report: SessionReport,
}

impl ActivePage {
    pub fn report(&self) -> &SessionReport {
        &self.report
    }

    pub fn watcher(&self) -> &LiveWatcher {
        &self.watcher
    }

    /// Stop watching and hand back the report.
    pub fn finish(self, doc: &mut Document) -> SessionReport {
        self.watcher.disconnect(doc);
        self.report
    }
}

/// Everything needed to localize pages for one language.
#[derive(Debug)]
pub struct PageSession {
    store: LocaleStore,
    policy: Policy,
    formatter: Timeago,
    translator: Option<OnDemandTranslator>,
    max_batches: usize,
}

impl PageSession {
    pub fn new(
        store: LocaleStore,
        policy: Policy,
        translator: Option<OnDemandTranslator>,
        max_batches: usize,
    ) -> Self {
        Self {
            store,
            policy,
            formatter: Timeago::new(),
            translator,
            max_batches,
        }
    }

    pub fn from_config(cfg: &CoreConfig, language: &str) -> Result<Self> {
        let store = load_locale(&cfg.locale, language)?;
        let translator = if cfg.translator.enabled {
            Some(OnDemandTranslator::from_config(&cfg.translator)?)
        } else {
            None
        };
        Ok(Self::new(
            store,
            cfg.policy.to_policy(),
            translator,
            cfg.watch.max_batches,
        ))
    }

    /// Measure relative times against `now` instead of the wall clock.
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.formatter = Timeago::at(now);
        self
    }

    pub fn store(&self) -> &LocaleStore {
        &self.store
    }

    pub fn translator(&self) -> Option<&OnDemandTranslator> {
        self.translator.as_ref()
    }

    fn engine(&self) -> Engine<'_> {
        Engine::new(&self.store, &self.policy, &self.formatter)
    }

    pub fn start(&self, doc: &mut Document) -> ActivePage {
        let engine = self.engine();
        let overrides = engine.apply_overrides(doc);
        let affordances = self
            .translator
            .as_ref()
            .map_or(0, |translator| translator.attach(doc));
        let initial = engine.translate_tree(doc);
        let watcher = engine.watch(doc);
        info!(
            language = self.store.language(),
            resolved = ?self.store.resolved(),
            "page session started"
        );
        ActivePage {
            watcher,
            report: SessionReport {
                language: self.store.language().to_string(),
                resolved: self.store.resolved().map(str::to_string),
                started_at: Utc::now(),
                overrides,
                affordances,
                initial,
                live: WalkStats::default(),
                batches: 0,
                translation: None,
            },
        }
    }

    /// Deliver pending mutation batches until the page settles.
    pub fn pump(&self, doc: &mut Document, page: &mut ActivePage) -> WalkStats {
        let engine = self.engine();
        let (batches, stats) = page
            .watcher
            .run_until_idle(doc, engine.walker(), self.max_batches);
        page.report.batches += batches;
        page.report.live.absorb(stats);
        stats
    }

    /// Press the translate affordance, then let the watcher see the result.
    pub fn translate_description(
        &self,
        doc: &mut Document,
        page: &mut ActivePage,
        transport: &dyn TranslationTransport,
        notifier: &dyn Notifier,
    ) -> Option<TranslationOutcome> {
        let translator = self.translator.as_ref()?;
        let outcome = translator.click(doc, transport, notifier);
        page.report.translation = Some(outcome);
        self.pump(doc, page);
        Some(outcome)
    }

    /// Parse, localize and serialize a saved page in one call.
    pub fn render(&self, markup: &str) -> (String, SessionReport) {
        let mut doc = Document::parse(markup);
        let mut page = self.start(&mut doc);
        self.pump(&mut doc, &mut page);
        let report = page.finish(&mut doc);
        (doc.to_html(), report)
    }
}
