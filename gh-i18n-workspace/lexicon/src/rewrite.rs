use tracing::debug;

use crate::dom::{Document, NodeId};
use crate::locale::LocaleStore;
use crate::normalize;

/// The piece of a node the text rewriter reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Character data of a text node.
    Data,
    /// An attribute of an `<input>`: `value` for buttons, `placeholder` otherwise.
    Attribute(&'static str),
}

/// Field to rewrite for `node`, or `None` when the node carries no eligible text.
pub fn field_of(doc: &Document, node: NodeId) -> Option<Field> {
    if doc.is_text(node) {
        return Some(Field::Data);
    }
    let el = doc.element(node)?;
    if el.tag_name() != "INPUT" {
        return None;
    }
    let kind = el.attr("type").unwrap_or("text");
    if kind.eq_ignore_ascii_case("button") || kind.eq_ignore_ascii_case("submit") {
        Some(Field::Attribute("value"))
    } else {
        Some(Field::Attribute("placeholder"))
    }
}

fn read(doc: &Document, node: NodeId, field: Field) -> String {
    match field {
        Field::Data => doc.text(node).unwrap_or_default().to_string(),
        Field::Attribute(name) => doc.attr(node, name).unwrap_or_default().to_string(),
    }
}

/// Swap the trimmed text of `node` for its translation.
///
/// Surrounding whitespace is kept verbatim. A dictionary miss leaves the node
/// alone. Returns whether the node changed.
pub fn rewrite(doc: &mut Document, node: NodeId, store: &LocaleStore) -> bool {
    let Some(field) = field_of(doc, node) else {
        return false;
    };
    let current = read(doc, node, field);
    let Some((start, end)) = normalize::trimmed_span(&current) else {
        return false;
    };
    let Some(translated) = store.lookup(&current[start..end]) else {
        return false;
    };

    let mut next = String::with_capacity(current.len() + translated.len());
    next.push_str(&current[..start]);
    next.push_str(translated);
    next.push_str(&current[end..]);
    if next == current {
        return false;
    }

    debug!(source = &current[start..end], translated, "rewriting text");
    match field {
        Field::Data => doc.set_text(node, &next),
        Field::Attribute(name) => doc.set_attribute(node, name, &next),
    }
    true
}
