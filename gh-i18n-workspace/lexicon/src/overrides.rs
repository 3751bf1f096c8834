use serde::Serialize;
use tracing::{debug, warn};

use crate::dom::Document;
use crate::locale::{CssRule, OverrideTarget};
use crate::selector::SelectorList;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OverrideReport {
    /// Rules that touched at least one element.
    pub applied: usize,
    /// Rules whose selector matched nothing.
    pub unmatched: usize,
    /// Rules whose selector could not be parsed.
    pub invalid: usize,
    /// Elements written to across all rules.
    pub elements: usize,
}

/// Apply `rules` in order to whatever currently matches them.
///
/// Markup replacements are trusted, locale-authored HTML.
pub fn apply_overrides(doc: &mut Document, rules: &[CssRule]) -> OverrideReport {
    let mut report = OverrideReport::default();
    for rule in rules {
        let selector = match SelectorList::parse(&rule.selector) {
            Ok(selector) => selector,
            Err(err) => {
                warn!(selector = %rule.selector, error = %err, "skipping override rule");
                report.invalid += 1;
                continue;
            }
        };

        let matches = selector.select(doc);
        if matches.is_empty() {
            debug!(selector = %rule.selector, "override matched nothing");
            report.unmatched += 1;
            continue;
        }

        for node in &matches {
            match rule.target() {
                OverrideTarget::Markup => doc.set_inner_html(*node, &rule.replacement),
                OverrideTarget::Attribute(name) => {
                    doc.set_attribute(*node, name, &rule.replacement)
                }
            }
        }
        report.applied += 1;
        report.elements += matches.len();
    }
    report
}
