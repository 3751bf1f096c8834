use serde::Serialize;
use tracing::trace;

use crate::classify::Policy;
use crate::dom::{Document, NodeId, NodeKind};
use crate::locale::LocaleStore;
use crate::reltime::{self, RelativeTimeFormatter};
use crate::rewrite;

/// What one walk changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WalkStats {
    pub texts: usize,
    pub inputs: usize,
    pub relative_times: usize,
    pub pruned: usize,
}

impl WalkStats {
    pub fn absorb(&mut self, other: WalkStats) {
        self.texts += other.texts;
        self.inputs += other.inputs;
        self.relative_times += other.relative_times;
        self.pruned += other.pruned;
    }

    pub fn rewritten(&self) -> usize {
        self.texts + self.inputs + self.relative_times
    }
}

const TEMPLATE: &str = "TEMPLATE";

/// How a child is handled during a walk.
enum Route {
    Text,
    /// Inputs are leaves: their value or placeholder is rewritten, nothing below.
    Input,
    Descend,
    Ignore,
}

impl Route {
    fn of(doc: &Document, node: NodeId) -> Self {
        match doc.kind(node) {
            NodeKind::Text(_) => Route::Text,
            NodeKind::Element(el) if el.tag_name() == "INPUT" => Route::Input,
            // Inert content; a host page never renders it in place.
            NodeKind::Element(el) if el.tag_name() == TEMPLATE => Route::Ignore,
            NodeKind::Element(_) => Route::Descend,
            _ => Route::Ignore,
        }
    }
}

/// Routes every eligible node under a root to the matching rewriter.
pub struct Walker<'a> {
    store: &'a LocaleStore,
    policy: &'a Policy,
    formatter: &'a dyn RelativeTimeFormatter,
}

impl<'a> Walker<'a> {
    pub fn new(
        store: &'a LocaleStore,
        policy: &'a Policy,
        formatter: &'a dyn RelativeTimeFormatter,
    ) -> Self {
        Self {
            store,
            policy,
            formatter,
        }
    }

    pub fn policy(&self) -> &Policy {
        self.policy
    }

    /// Rewrite everything reachable from `node`.
    pub fn walk(&self, doc: &mut Document, node: NodeId) -> WalkStats {
        let mut stats = WalkStats::default();
        self.visit(doc, node, &mut stats);
        stats
    }

    fn visit(&self, doc: &mut Document, node: NodeId, stats: &mut WalkStats) {
        if !self.policy.admits(doc, node) {
            trace!(node = node.index(), "pruned");
            stats.pruned += 1;
            return;
        }

        let children = doc.children(node).to_vec();

        // A relative-time element is formatted as a unit; its children are never
        // visited. One without children is left alone.
        if !children.is_empty() && reltime::is_relative_time(doc, node) {
            if reltime::rewrite_relative_time(doc, node, self.store.language(), self.formatter) {
                stats.relative_times += 1;
            }
            return;
        }

        for child in children {
            self.route(doc, child, stats);
        }
    }

    fn route(&self, doc: &mut Document, node: NodeId, stats: &mut WalkStats) {
        match Route::of(doc, node) {
            Route::Text => {
                if rewrite::rewrite(doc, node, self.store) {
                    stats.texts += 1;
                }
            }
            Route::Input => {
                if rewrite::rewrite(doc, node, self.store) {
                    stats.inputs += 1;
                }
            }
            Route::Descend => self.visit(doc, node, stats),
            Route::Ignore => {}
        }
    }

    /// Give a node inserted after the initial pass the treatment it would have
    /// received had it been there from the start.
    ///
    /// Content landing inside a relative-time element re-formats that element.
    /// Content that already reads as the phrase is left alone, so the
    /// element's own rewrite does not loop.
    pub fn walk_inserted(&self, doc: &mut Document, node: NodeId) -> WalkStats {
        let mut stats = WalkStats::default();
        if self.policy.blocked_by_ancestor(doc, node) {
            stats.pruned += 1;
            return stats;
        }
        if doc
            .ancestors(node)
            .any(|a| doc.tag_name(a) == Some(TEMPLATE))
        {
            return stats;
        }
        let timed = doc
            .ancestors(node)
            .find(|a| reltime::is_relative_time(doc, *a));
        if let Some(element) = timed {
            if reltime::rewrite_relative_time(doc, element, self.store.language(), self.formatter) {
                stats.relative_times += 1;
            }
            return stats;
        }

        self.route(doc, node, &mut stats);
        stats
    }
}
