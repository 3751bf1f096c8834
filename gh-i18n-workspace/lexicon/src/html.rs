//! Bridge between html5ever's reference DOM and the arena [`Document`].
//!
//! Parsing goes through `markup5ever_rcdom` and is then copied into the
//! arena; serialization walks the arena directly.

use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, Namespace, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::dom::{Document, NodeId, NodeKind};

const HTML_NS: &str = "http://www.w3.org/1999/xhtml";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

pub fn parse_document(markup: &str) -> Document {
    let dom = html5ever::parse_document(RcDom::default(), ParseOpts::default()).one(markup);
    let mut doc = Document::new();
    let root = doc.root();
    for child in dom.document.children.borrow().iter() {
        if let Some(id) = import(&mut doc, child) {
            doc.adopt(root, id);
        }
    }
    doc
}

/// Parse `markup` as the content of a `<div>` and return the detached top-level nodes.
pub fn parse_fragment(doc: &mut Document, markup: &str) -> Vec<NodeId> {
    let context = QualName::new(None, Namespace::from(HTML_NS), LocalName::from("div"));
    let dom = html5ever::parse_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new())
        .one(markup);

    // The fragment parser wraps everything in a synthetic <html> element.
    let wrapper = dom.document.children.borrow().first().cloned();
    let Some(wrapper) = wrapper else {
        return Vec::new();
    };
    let top: Vec<Handle> = wrapper.children.borrow().clone();
    top.iter().filter_map(|h| import(doc, h)).collect()
}

fn import(doc: &mut Document, handle: &Handle) -> Option<NodeId> {
    let id = match &handle.data {
        NodeData::Document | NodeData::ProcessingInstruction { .. } => return None,
        NodeData::Doctype { name, .. } => doc.create_doctype(name),
        NodeData::Text { contents } => doc.create_text(&contents.borrow()),
        NodeData::Comment { contents } => doc.create_comment(contents),
        NodeData::Element { name, attrs, .. } => {
            let html = &*name.ns == HTML_NS;
            let id = doc.create_element_ns(&name.local, html);
            for attr in attrs.borrow().iter() {
                match &attr.name.prefix {
                    Some(prefix) => {
                        let qualified = format!("{}:{}", &**prefix, &*attr.name.local);
                        doc.push_attr(id, &qualified, &attr.value);
                    }
                    None => doc.push_attr(id, &attr.name.local, &attr.value),
                }
            }
            id
        }
    };

    // `<template>` content lives in a separate fragment; it becomes the
    // element's children here.
    let children: Vec<Handle> = match &handle.data {
        NodeData::Element {
            template_contents, ..
        } => match &*template_contents.borrow() {
            Some(content) => content.children.borrow().clone(),
            None => handle.children.borrow().clone(),
        },
        _ => handle.children.borrow().clone(),
    };
    for child in &children {
        if let Some(child_id) = import(doc, child) {
            doc.adopt(id, child_id);
        }
    }
    Some(id)
}

pub fn serialize_children(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    let raw = doc
        .element(id)
        .is_some_and(|el| el.is_html() && RAW_TEXT_ELEMENTS.contains(&el.local_name()));
    for child in doc.children(id) {
        write_node(doc, *child, raw, &mut out);
    }
    out
}

pub fn serialize_node(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, id, false, &mut out);
    out
}

fn write_node(doc: &Document, id: NodeId, raw_parent: bool, out: &mut String) {
    match doc.kind(id) {
        NodeKind::Document => {
            for child in doc.children(id) {
                write_node(doc, *child, false, out);
            }
        }
        NodeKind::Doctype(name) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        NodeKind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeKind::Text(text) if raw_parent => out.push_str(text),
        NodeKind::Text(text) => escape(text, false, out),
        NodeKind::Element(el) => {
            out.push('<');
            out.push_str(el.local_name());
            for (name, value) in el.attrs() {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape(value, true, out);
                out.push('"');
            }
            out.push('>');
            if el.is_html() && VOID_ELEMENTS.contains(&el.local_name()) {
                return;
            }
            out.push_str(&serialize_children(doc, id));
            out.push_str("</");
            out.push_str(el.local_name());
            out.push('>');
        }
    }
}

fn escape(text: &str, attr_mode: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            '"' if attr_mode => out.push_str("&quot;"),
            '<' if !attr_mode => out.push_str("&lt;"),
            '>' if !attr_mode => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}
