//! Bundle data model: ordered chunk sets and per-page bundle maps.
//!
//! A *bundle* is a named, accumulated collection of CSS or JS source
//! fragments destined for one output file. Components contribute chunks
//! during rendering; insertion order is semantic (it determines output
//! concatenation order) and duplicate chunks coalesce, so both structures
//! here are insertion-ordered with set semantics.

pub mod reference;
pub mod registry;

pub use registry::BundleRegistry;

use rustc_hash::{FxHashMap, FxHashSet};

/// Which of the two per-page bundle namespaces a chunk belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleKind {
    Css,
    Js,
}

impl BundleKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Js => "js",
        }
    }
}

// ============================================================================
// OrderedSet
// ============================================================================

/// Insertion-ordered, deduplicating set of content chunks.
#[derive(Debug, Clone, Default)]
pub struct OrderedSet {
    items: Vec<String>,
    seen: FxHashSet<String>,
}

impl OrderedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a chunk, keeping the first occurrence's position.
    /// Returns `true` if the chunk was not already present.
    pub fn insert(&mut self, chunk: impl Into<String>) -> bool {
        let chunk = chunk.into();
        if self.seen.contains(&chunk) {
            return false;
        }
        self.seen.insert(chunk.clone());
        self.items.push(chunk);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Concatenate all chunks in insertion order with the given separator.
    pub fn joined(&self, separator: &str) -> String {
        self.items.join(separator)
    }
}

impl<S: Into<String>> FromIterator<S> for OrderedSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut set = Self::new();
        for item in iter {
            set.insert(item);
        }
        set
    }
}

// ============================================================================
// BundleMap
// ============================================================================

/// Insertion-ordered map from bundle name to its chunk set.
///
/// One exists per page render for CSS and one for JS; the global registry
/// holds the same shape accumulated across all pages of a build.
#[derive(Debug, Clone, Default)]
pub struct BundleMap {
    entries: Vec<(String, OrderedSet)>,
    index: FxHashMap<String, usize>,
}

impl BundleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk to the named bundle, creating the bundle on first use.
    /// No-op if the chunk is already present in that bundle.
    pub fn insert_chunk(&mut self, name: &str, chunk: impl Into<String>) {
        match self.index.get(name) {
            Some(&i) => {
                self.entries[i].1.insert(chunk);
            }
            None => {
                let mut set = OrderedSet::new();
                set.insert(chunk);
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push((name.to_string(), set));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&OrderedSet> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Bundle names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OrderedSet)> {
        self.entries.iter().map(|(name, set)| (name.as_str(), set))
    }

    /// Joined content of the named bundle, or `None` if absent.
    pub fn joined(&self, name: &str, separator: &str) -> Option<String> {
        self.get(name).map(|set| set.joined(separator))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
