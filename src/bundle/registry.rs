//! Global bundle registry: build-scoped accumulate-then-flush state.
//!
//! The registry collects every chunk registered while pages compile and is
//! read exactly once at build end by the finalizer. It is owned by the
//! pipeline and borrowed `&mut` into each page compile, never a global
//! static; `reset` runs at build start and on each watch-mode rebuild,
//! never mid-page.

use super::{BundleKind, BundleMap};

/// Per-build accumulation of bundle chunks, CSS and JS kept separate.
#[derive(Debug, Default)]
pub struct BundleRegistry {
    css: BundleMap,
    js: BundleMap,
}

impl BundleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append content to the named bundle's ordered set.
    /// No-op if the chunk is already present in that bundle.
    pub fn record_chunk(&mut self, kind: BundleKind, name: &str, chunk: &str) {
        self.map_mut(kind).insert_chunk(name, chunk);
    }

    /// Clear all bundles for both kinds.
    pub fn reset(&mut self) {
        self.css.clear();
        self.js.clear();
    }

    /// Joined content per bundle, in bundle-insertion order.
    ///
    /// Bundles whose joined content is whitespace-only are skipped, so no
    /// empty artifact is ever written. CSS chunks concatenate directly;
    /// JS chunks are newline-separated (each chunk is a block-scoped unit).
    pub fn flush(&self, kind: BundleKind) -> Vec<(String, String)> {
        let separator = Self::separator(kind);
        self.map(kind)
            .iter()
            .filter_map(|(name, set)| {
                let joined = set.joined(separator);
                if joined.trim().is_empty() {
                    None
                } else {
                    Some((name.to_string(), joined))
                }
            })
            .collect()
    }

    /// Whether the named bundle has any recorded chunks.
    pub fn contains(&self, kind: BundleKind, name: &str) -> bool {
        self.map(kind).contains(name)
    }

    /// Joined content of one bundle, if present.
    pub fn joined(&self, kind: BundleKind, name: &str) -> Option<String> {
        self.map(kind).joined(name, Self::separator(kind))
    }

    const fn separator(kind: BundleKind) -> &'static str {
        match kind {
            BundleKind::Css => "",
            BundleKind::Js => "\n",
        }
    }

    fn map(&self, kind: BundleKind) -> &BundleMap {
        match kind {
            BundleKind::Css => &self.css,
            BundleKind::Js => &self.js,
        }
    }

    fn map_mut(&mut self, kind: BundleKind) -> &mut BundleMap {
        match kind {
            BundleKind::Css => &mut self.css,
            BundleKind::Js => &mut self.js,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
