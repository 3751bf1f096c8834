//! Arena-based document tree with mutation observation.
//!
//! All nodes live in a flat `Vec<Node>` and are referenced by [`NodeId`].
//! Nodes are never freed: removing a node only detaches it, so ids handed
//! out in mutation records stay valid for the lifetime of the document.

use crate::html;

/// Index into the document's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Doctype(String),
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    local: String,
    tag_name: String,
    html: bool,
    attrs: Vec<(String, String)>,
}

impl Element {
    fn new(local: &str, html: bool) -> Self {
        let local = if html {
            local.to_ascii_lowercase()
        } else {
            local.to_string()
        };
        let tag_name = if html {
            local.to_ascii_uppercase()
        } else {
            local.clone()
        };
        Self {
            local,
            tag_name,
            html,
            attrs: Vec::new(),
        }
    }

    /// Tag name as the host DOM reports it: upper-case for HTML elements,
    /// verbatim for foreign content such as `svg`.
    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn local_name(&self) -> &str {
        &self.local
    }

    pub fn is_html(&self) -> bool {
        self.html
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|id| !id.is_empty())
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class")
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    fn set_attr(&mut self, name: &str, value: &str) -> bool {
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some((_, current)) if current.as_str() == value => false,
            Some((_, current)) => {
                *current = value.to_string();
                true
            }
            None => {
                self.attrs.push((name.to_string(), value.to_string()));
                true
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// What an observer wants to hear about, mirroring `MutationObserverInit`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserverOptions {
    pub child_list: bool,
    pub character_data: bool,
    pub attributes: bool,
    pub subtree: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    CharacterData {
        target: NodeId,
    },
    Attributes {
        target: NodeId,
        name: String,
    },
}

impl MutationRecord {
    pub fn target(&self) -> NodeId {
        match self {
            MutationRecord::ChildList { target, .. }
            | MutationRecord::CharacterData { target }
            | MutationRecord::Attributes { target, .. } => *target,
        }
    }

    pub fn added_nodes(&self) -> &[NodeId] {
        match self {
            MutationRecord::ChildList { added, .. } => added,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone)]
struct Observer {
    root: NodeId,
    options: ObserverOptions,
    queue: Vec<MutationRecord>,
}

impl Observer {
    fn wants(&self, record: &MutationRecord) -> bool {
        match record {
            MutationRecord::ChildList { .. } => self.options.child_list,
            MutationRecord::CharacterData { .. } => self.options.character_data,
            MutationRecord::Attributes { .. } => self.options.attributes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    observers: Vec<Option<Observer>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            observers: Vec::new(),
        }
    }

    /// Parse a complete HTML document.
    pub fn parse(markup: &str) -> Self {
        html::parse_document(markup)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Text(_))
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(Element::tag_name)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Ancestors from the parent upwards.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |n| self.parent(*n))
    }

    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// `id` and everything below it, in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|s| *s == id)?;
        siblings[..pos]
            .iter()
            .rev()
            .copied()
            .find(|s| self.element(*s).is_some())
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|s| *s == id)?;
        siblings[pos + 1..]
            .iter()
            .copied()
            .find(|s| self.element(*s).is_some())
    }

    fn find_child_element(&self, parent: NodeId, tag: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|c| self.tag_name(*c) == Some(tag))
    }

    /// The `<body>` element, if the document has one.
    pub fn body(&self) -> Option<NodeId> {
        let html = self.find_child_element(self.root(), "HTML")?;
        self.find_child_element(html, "BODY")
    }

    pub fn get_element_by_id(&self, wanted: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|n| self.element(*n).and_then(Element::id) == Some(wanted))
    }

    /// Concatenated text of the direct text children only.
    pub fn own_text(&self, id: NodeId) -> String {
        self.children(id)
            .iter()
            .filter_map(|c| self.text(*c))
            .collect()
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        html::serialize_children(self, id)
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        html::serialize_node(self, id)
    }

    /// Serialize the whole document.
    pub fn to_html(&self) -> String {
        html::serialize_children(self, self.root())
    }

    // ------------------------------------------------------------------
    // Node creation (detached, never observed)
    // ------------------------------------------------------------------

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Create a detached HTML element.
    pub fn create_element(&mut self, local: &str) -> NodeId {
        self.alloc(NodeKind::Element(Element::new(local, true)))
    }

    /// Create a detached element, foreign (`svg`, `math`) when `html` is false.
    pub fn create_element_ns(&mut self, local: &str, html: bool) -> NodeId {
        self.alloc(NodeKind::Element(Element::new(local, html)))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Comment(text.to_string()))
    }

    pub fn create_doctype(&mut self, name: &str) -> NodeId {
        self.alloc(NodeKind::Doctype(name.to_string()))
    }

    /// Attach without recording anything; only for building detached trees.
    pub(crate) fn adopt(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Set an attribute on a node that is not yet in the tree.
    pub(crate) fn push_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeKind::Element(el) = &mut self.nodes[id.0].kind {
            el.set_attr(name, value);
        }
    }

    // ------------------------------------------------------------------
    // Mutation (observed)
    // ------------------------------------------------------------------

    fn detach(&mut self, child: NodeId) {
        if let Some(old) = self.nodes[child.0].parent.take() {
            self.nodes[old.0].children.retain(|c| *c != child);
            self.queue(MutationRecord::ChildList {
                target: old,
                added: Vec::new(),
                removed: vec![child],
            });
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.append_children(parent, vec![child]);
    }

    /// Append several nodes, reported as one child-list record.
    pub fn append_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        if children.is_empty() {
            return;
        }
        for child in &children {
            self.detach(*child);
            self.nodes[child.0].parent = Some(parent);
            self.nodes[parent.0].children.push(*child);
        }
        self.queue(MutationRecord::ChildList {
            target: parent,
            added: children,
            removed: Vec::new(),
        });
    }

    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        self.detach(child);
        let pos = self.nodes[parent.0]
            .children
            .iter()
            .position(|c| *c == reference)
            .unwrap_or(self.nodes[parent.0].children.len());
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(pos, child);
        self.queue(MutationRecord::ChildList {
            target: parent,
            added: vec![child],
            removed: Vec::new(),
        });
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if self.parent(child) == Some(parent) {
            self.detach(child);
        }
    }

    /// Swap all children of `parent` for `children` in one record.
    pub fn replace_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        let removed = std::mem::take(&mut self.nodes[parent.0].children);
        for old in &removed {
            self.nodes[old.0].parent = None;
        }
        for child in &children {
            self.detach(*child);
            self.nodes[child.0].parent = Some(parent);
        }
        self.nodes[parent.0].children = children.clone();
        if removed.is_empty() && children.is_empty() {
            return;
        }
        self.queue(MutationRecord::ChildList {
            target: parent,
            added: children,
            removed,
        });
    }

    /// Replace the character data of a text or comment node.
    pub fn set_text(&mut self, id: NodeId, value: &str) {
        let changed = match &mut self.nodes[id.0].kind {
            NodeKind::Text(text) | NodeKind::Comment(text) if text.as_str() != value => {
                *text = value.to_string();
                true
            }
            _ => false,
        };
        if changed {
            self.queue(MutationRecord::CharacterData { target: id });
        }
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let changed = match &mut self.nodes[id.0].kind {
            NodeKind::Element(el) => el.set_attr(name, value),
            _ => false,
        };
        if changed {
            self.queue(MutationRecord::Attributes {
                target: id,
                name: name.to_string(),
            });
        }
    }

    /// Replace the children of `id` with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        let node = self.create_text(text);
        self.replace_children(id, vec![node]);
    }

    /// Replace the children of `id` with parsed `markup`.
    pub fn set_inner_html(&mut self, id: NodeId, markup: &str) {
        let nodes = html::parse_fragment(self, markup);
        self.replace_children(id, nodes);
    }

    /// Parse `markup` and append the result to `id`.
    pub fn append_html(&mut self, id: NodeId, markup: &str) -> Vec<NodeId> {
        let nodes = html::parse_fragment(self, markup);
        self.append_children(id, nodes.clone());
        nodes
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    pub fn observe(&mut self, root: NodeId, options: ObserverOptions) -> ObserverId {
        self.observers.push(Some(Observer {
            root,
            options,
            queue: Vec::new(),
        }));
        ObserverId(self.observers.len() - 1)
    }

    /// Drop the observer and anything it had queued.
    pub fn disconnect(&mut self, id: ObserverId) {
        if let Some(slot) = self.observers.get_mut(id.0) {
            *slot = None;
        }
    }

    /// Drain the records queued for `id`, oldest first.
    pub fn take_records(&mut self, id: ObserverId) -> Vec<MutationRecord> {
        self.observers
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .map(|obs| std::mem::take(&mut obs.queue))
            .unwrap_or_default()
    }

    pub fn has_pending(&self, id: ObserverId) -> bool {
        self.observers
            .get(id.0)
            .and_then(Option::as_ref)
            .is_some_and(|obs| !obs.queue.is_empty())
    }

    fn queue(&mut self, record: MutationRecord) {
        let target = record.target();
        let interested: Vec<usize> = self
            .observers
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|obs| (i, obs)))
            .filter(|(_, obs)| obs.wants(&record))
            .filter(|(_, obs)| {
                target == obs.root || (obs.options.subtree && self.contains(obs.root, target))
            })
            .map(|(i, _)| i)
            .collect();

        for i in interested {
            if let Some(obs) = self.observers[i].as_mut() {
                obs.queue.push(record.clone());
            }
        }
    }
}
