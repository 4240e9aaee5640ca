//! Arena-based HTML document tree.
//!
//! Nodes live in a flat arena addressed by [`NodeId`]; parent and child
//! links are indices, so detach and splice-replace are cheap index updates
//! and never invalidate other live node ids. Detached nodes simply stop
//! being reachable from the root; the arena reclaims nothing because a
//! document only lives for one page compile.

pub mod parse;
pub mod serialize;
pub mod transform;

pub use transform::{Action, transform};

/// Handle to a node in a [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// HTML void elements (childless by definition).
///
/// Parsed `<meta ...>` without a closing tag is accepted, and childless
/// void elements serialize as empty-element tags.
pub const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr",
];

pub fn is_void_tag(name: &str) -> bool {
    VOID_TAGS.contains(&name)
}

/// Node payload.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// The synthetic document root.
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
    Doctype(String),
}

/// Tag name plus ordered attribute list.
#[derive(Debug, Clone)]
pub struct ElementData {
    pub name: String,
    attrs: Vec<(String, String)>,
}

impl ElementData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(k, _)| k == name)
    }

    /// Set an attribute, replacing any existing value in place.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    /// Remove an attribute, returning its value if present.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let i = self.attrs.iter().position(|(k, _)| k == name)?;
        Some(self.attrs.remove(i).1)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// An HTML document tree backed by a node arena.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Create an empty document containing only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    // ------------------------------------------------------------------
    // Node creation
    // ------------------------------------------------------------------

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    pub fn create_element(&mut self, data: ElementData) -> NodeId {
        self.push(NodeData::Element(data))
    }

    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(content.into()))
    }

    pub fn create_comment(&mut self, content: impl Into<String>) -> NodeId {
        self.push(NodeData::Comment(content.into()))
    }

    pub fn create_doctype(&mut self, content: impl Into<String>) -> NodeId {
        self.push(NodeData::Doctype(content.into()))
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// A node is detached when it is not the root and has no parent.
    pub fn is_detached(&self, id: NodeId) -> bool {
        id != self.root() && self.nodes[id.0].parent.is_none()
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id.0].data {
            NodeData::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[id.0].data {
            NodeData::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Tag name if this node is an element.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    /// Concatenated content of this node's direct text children.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            if let NodeData::Text(text) = self.data(child) {
                out.push_str(text);
            }
        }
        out
    }

    /// Depth-first search for the first element with the given tag name.
    pub fn find_element(&self, from: NodeId, name: &str) -> Option<NodeId> {
        for &child in self.children(from) {
            if self.tag_name(child) == Some(name) {
                return Some(child);
            }
            if let Some(found) = self.find_element(child, name) {
                return Some(found);
            }
        }
        None
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Remove a node from its parent's child list and null its parent link.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Append a child, detaching it from any previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert a child at the given index, detaching it from any previous
    /// parent first.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
    }

    /// Splice replacement nodes into a node's position, detaching the
    /// original. No-op (with the original left in place) if the node has
    /// no parent.
    pub fn replace_with(&mut self, id: NodeId, replacements: Vec<NodeId>) {
        let Some(parent) = self.nodes[id.0].parent else {
            return;
        };
        let Some(index) = self.nodes[parent.0].children.iter().position(|&c| c == id) else {
            return;
        };
        self.replace_child_at(parent, index, replacements);
    }

    /// Replace the child at `index` with zero or more nodes.
    /// The original child is detached; replacements are re-parented.
    pub fn replace_child_at(&mut self, parent: NodeId, index: usize, replacements: Vec<NodeId>) {
        let old = self.nodes[parent.0].children[index];
        self.nodes[old.0].parent = None;
        for &repl in &replacements {
            self.detach(repl);
            self.nodes[repl.0].parent = Some(parent);
        }
        self.nodes[parent.0]
            .children
            .splice(index..=index, replacements);
    }

    /// Replace all children with a single text node holding `content`.
    pub fn set_text_children(&mut self, id: NodeId, content: impl Into<String>) {
        let old: Vec<NodeId> = self.nodes[id.0].children.drain(..).collect();
        for child in old {
            self.nodes[child.0].parent = None;
        }
        let text = self.create_text(content);
        self.append_child(id, text);
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
