//! Head deduplication across composed layouts.
//!
//! Nested layouts each emit their own `<head>`, so a composed page can
//! carry several. This pass removes every one of them, gathers their
//! children in document order, deduplicates by tag-specific identity key
//! (last occurrence wins, first occurrence's position is kept), and
//! reinserts a single canonical `<head>` as the first child of `<html>`.

use crate::error::PipelineError;
use crate::hash::fingerprint;
use crate::tree::{Action, Document, ElementData, NodeData, NodeId, transform};
use anyhow::Result;
use rustc_hash::FxHashMap;

/// Collapse all `<head>` elements into one, first child of `<html>`.
///
/// Fails with [`PipelineError::MissingHtmlRoot`] when the document has no
/// `<html>` element: that is a page-template contract violation.
pub fn dedupe_heads(doc: &mut Document, page: &str) -> Result<()> {
    let mut accumulator = HeadAccumulator::new();

    transform(doc, doc.root(), &mut |doc, id| {
        if doc.tag_name(id) == Some("head") {
            // Children stay live in the arena; only the wrapper goes
            for child in doc.children(id).to_vec() {
                let key = accumulator.identity_key(doc, child);
                accumulator.insert(key, child);
            }
            return Ok(Action::Remove);
        }
        Ok(Action::Continue)
    })?;

    let html = doc
        .find_element(doc.root(), "html")
        .ok_or_else(|| PipelineError::MissingHtmlRoot {
            page: page.to_string(),
        })?;

    let head = doc.create_element(ElementData::new("head"));
    for child in accumulator.into_children() {
        doc.append_child(head, child);
    }
    doc.insert_child(html, 0, head);

    Ok(())
}

// ============================================================================
// Accumulator
// ============================================================================

/// Insertion-ordered key → node map with overwrite-in-place semantics.
struct HeadAccumulator {
    entries: Vec<(String, NodeId)>,
    index: FxHashMap<String, usize>,
    /// Sequence counter for entries that never deduplicate.
    uniq: usize,
}

impl HeadAccumulator {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
            uniq: 0,
        }
    }

    /// Last write wins; the key keeps its original position because this
    /// is a value update, not a delete-and-reinsert.
    fn insert(&mut self, key: String, node: NodeId) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 = node,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, node));
            }
        }
    }

    fn into_children(self) -> impl Iterator<Item = NodeId> {
        self.entries.into_iter().map(|(_, node)| node)
    }

    /// Deduplication key for one head child. Keys that must never collide
    /// get a sequence number, so ordering among them is plain insertion
    /// order.
    fn identity_key(&mut self, doc: &Document, id: NodeId) -> String {
        let NodeData::Element(elem) = doc.data(id) else {
            return self.unique_key();
        };
        match elem.name.as_str() {
            "title" => "title".to_string(),
            "meta" => self.meta_key(elem),
            "link" => format!(
                "link[rel=\"{}\"][href=\"{}\"]",
                elem.attr("rel").unwrap_or_default(),
                elem.attr("href").unwrap_or_default()
            ),
            "script" => match elem.attr("src") {
                Some(src) => format!("script[src=\"{src}\"]"),
                None => format!("script/{}", fingerprint(&doc.text_content(id))),
            },
            "style" => format!("style/{}", fingerprint(&doc.text_content(id))),
            _ => self.unique_key(),
        }
    }

    fn meta_key(&mut self, elem: &ElementData) -> String {
        for attr in ["name", "charset", "property", "http-equiv"] {
            if let Some(value) = elem.attr(attr) {
                return format!("meta[{attr}=\"{value}\"]");
            }
        }
        // A meta with none of the identity attributes never dedupes
        self.unique_key()
    }

    fn unique_key(&mut self) -> String {
        self.uniq += 1;
        format!("#uniq:{}", self.uniq)
    }
}

// ============================================================================
// Tests
// ============================================================================
