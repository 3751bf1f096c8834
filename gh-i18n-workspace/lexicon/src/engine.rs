use serde::Serialize;
use tracing::info;

use crate::classify::Policy;
use crate::dom::Document;
use crate::locale::LocaleStore;
use crate::overrides::{apply_overrides, OverrideReport};
use crate::reltime::RelativeTimeFormatter;
use crate::walker::{WalkStats, Walker};
use crate::watcher::LiveWatcher;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BootReport {
    pub overrides: OverrideReport,
    pub initial: WalkStats,
}

/// The rewrite pipeline for one page, bound to one locale.
pub struct Engine<'a> {
    store: &'a LocaleStore,
    walker: Walker<'a>,
}

impl<'a> Engine<'a> {
    pub fn new(
        store: &'a LocaleStore,
        policy: &'a Policy,
        formatter: &'a dyn RelativeTimeFormatter,
    ) -> Self {
        Self {
            store,
            walker: Walker::new(store, policy, formatter),
        }
    }

    pub fn walker(&self) -> &Walker<'a> {
        &self.walker
    }

    /// Run the locale's CSS override rules once.
    pub fn apply_overrides(&self, doc: &mut Document) -> OverrideReport {
        let report = apply_overrides(doc, self.store.rules());
        info!(
            applied = report.applied,
            unmatched = report.unmatched,
            invalid = report.invalid,
            "css overrides applied"
        );
        report
    }

    /// One full pass over the body (or the whole document when there is none).
    pub fn translate_tree(&self, doc: &mut Document) -> WalkStats {
        let root = doc.body().unwrap_or_else(|| doc.root());
        let stats = self.walker.walk(doc, root);
        info!(
            texts = stats.texts,
            inputs = stats.inputs,
            relative_times = stats.relative_times,
            "initial pass done"
        );
        stats
    }

    pub fn watch(&self, doc: &mut Document) -> LiveWatcher {
        let root = doc.body().unwrap_or_else(|| doc.root());
        LiveWatcher::install(doc, root)
    }

    /// Overrides, then the initial pass, then the live watcher.
    pub fn boot(&self, doc: &mut Document) -> (BootReport, LiveWatcher) {
        let overrides = self.apply_overrides(doc);
        let initial = self.translate_tree(doc);
        let watcher = self.watch(doc);
        (BootReport { overrides, initial }, watcher)
    }
}
