//! Which parts of a page may be rewritten.
//!
//! Rejection prunes the whole subtree: code views, rendered READMEs and
//! structured-data names are never touched.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::dom::{Document, Element, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Policy {
    /// Tag names as the host reports them (`CODE`, but `svg`).
    pub blocked_tags: BTreeSet<String>,
    pub blocked_ids: BTreeSet<String>,
    pub blocked_classes: BTreeSet<String>,
    /// Values of the space-separated `itemprop` attribute.
    pub blocked_itemprops: BTreeSet<String>,
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            blocked_tags: set(&[
                "CODE", "SCRIPT", "LINK", "IMG", "svg", "TABLE", "ARTICLE", "PRE",
            ]),
            blocked_ids: set(&["readme", "wiki-content"]),
            blocked_classes: set(&["CodeMirror", "css-truncate", "blob-code"]),
            blocked_itemprops: set(&["name"]),
        }
    }
}

impl Policy {
    /// Add every entry of `other` to this policy.
    pub fn extend(&mut self, other: Policy) {
        self.blocked_tags.extend(other.blocked_tags);
        self.blocked_ids.extend(other.blocked_ids);
        self.blocked_classes.extend(other.blocked_classes);
        self.blocked_itemprops.extend(other.blocked_itemprops);
    }

    /// Whether `node` and its descendants may be rewritten. Non-elements always may.
    pub fn admits(&self, doc: &Document, node: NodeId) -> bool {
        doc.element(node).map_or(true, |el| self.admits_element(el))
    }

    pub fn admits_element(&self, el: &Element) -> bool {
        if self.blocked_tags.contains(el.tag_name()) {
            return false;
        }
        if el.id().is_some_and(|id| self.blocked_ids.contains(id)) {
            return false;
        }
        if el.classes().any(|c| self.blocked_classes.contains(c)) {
            return false;
        }
        if let Some(itemprop) = el.attr("itemprop") {
            if itemprop
                .split(' ')
                .any(|prop| self.blocked_itemprops.contains(prop))
            {
                return false;
            }
        }
        true
    }

    /// Whether some ancestor of `node` prunes it from the walk.
    pub fn blocked_by_ancestor(&self, doc: &Document, node: NodeId) -> bool {
        doc.ancestors(node).any(|a| !self.admits(doc, a))
    }
}
