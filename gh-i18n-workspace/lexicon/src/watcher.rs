//! Keeps content inserted after the initial pass translated.

use tracing::{debug, warn};

use crate::dom::{Document, NodeId, ObserverId, ObserverOptions};
use crate::walker::{WalkStats, Walker};

/// Options the watcher registers with: child lists, character data, whole subtree.
pub const WATCH_OPTIONS: ObserverOptions = ObserverOptions {
    child_list: true,
    character_data: true,
    attributes: false,
    subtree: true,
};

/// An installed mutation observer feeding added nodes to the walker.
#[derive(Debug)]
pub struct LiveWatcher {
    observer: ObserverId,
    root: NodeId,
}

impl LiveWatcher {
    pub fn install(doc: &mut Document, root: NodeId) -> Self {
        let observer = doc.observe(root, WATCH_OPTIONS);
        debug!(root = root.index(), "live watcher installed");
        Self { observer, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn has_pending(&self, doc: &Document) -> bool {
        doc.has_pending(self.observer)
    }

    /// Deliver one batch: every record queued so far, in order.
    ///
    /// Mutations made while handling the batch are queued for the next one.
    pub fn process_batch(&self, doc: &mut Document, walker: &Walker<'_>) -> WalkStats {
        let mut stats = WalkStats::default();
        for record in doc.take_records(self.observer) {
            for node in record.added_nodes() {
                stats.absorb(walker.walk_inserted(doc, *node));
            }
        }
        stats
    }

    /// Deliver batches until nothing is pending, at most `max_batches` of them.
    pub fn run_until_idle(
        &self,
        doc: &mut Document,
        walker: &Walker<'_>,
        max_batches: usize,
    ) -> (usize, WalkStats) {
        let mut stats = WalkStats::default();
        let mut batches = 0;
        while batches < max_batches && self.has_pending(doc) {
            stats.absorb(self.process_batch(doc, walker));
            batches += 1;
        }
        if self.has_pending(doc) {
            warn!(batches, "mutations still pending after batch limit");
        }
        (batches, stats)
    }

    pub fn disconnect(self, doc: &mut Document) {
        doc.disconnect(self.observer);
    }
}
