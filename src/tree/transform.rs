//! Generic depth-first mutation walker.
//!
//! The visitor runs pre-order on every reachable node and returns an
//! [`Action`]; REMOVE and REPLACE are applied immediately by splicing the
//! parent's live child list, with the iteration index adjusted so no
//! sibling is skipped or double-visited. Replacement nodes are not
//! re-visited (a replacement that produced more of itself would never
//! terminate). Visitor calls are strictly sequential, preserving external
//! side-effect order such as registry writes.

use super::{Document, NodeId};
use anyhow::Result;

/// What the visitor wants done with the node it was just shown.
#[derive(Debug)]
pub enum Action {
    /// Recurse into the node's children.
    Continue,
    /// Keep the node but do not descend.
    SkipChildren,
    /// Detach the node; its children are never visited.
    Remove,
    /// Splice zero or more nodes into this node's position and detach the
    /// original; its children are never visited.
    Replace(Vec<NodeId>),
}

/// Walk the subtree rooted at `node`, applying visitor actions in place.
///
/// A stale reference to an already-detached node is tolerated: it logs at
/// debug level and the call is a no-op.
pub fn transform<F>(doc: &mut Document, node: NodeId, visitor: &mut F) -> Result<()>
where
    F: FnMut(&mut Document, NodeId) -> Result<Action>,
{
    if doc.is_detached(node) {
        tracing::debug!(?node, "transform called on detached node, skipping");
        return Ok(());
    }

    match visitor(doc, node)? {
        Action::Remove => {
            doc.detach(node);
            Ok(())
        }
        Action::Replace(replacements) => {
            doc.replace_with(node, replacements);
            Ok(())
        }
        Action::SkipChildren => Ok(()),
        Action::Continue => walk_children(doc, node, visitor),
    }
}

fn walk_children<F>(doc: &mut Document, node: NodeId, visitor: &mut F) -> Result<()>
where
    F: FnMut(&mut Document, NodeId) -> Result<Action>,
{
    let mut i = 0;
    while i < doc.children(node).len() {
        let child = doc.children(node)[i];
        match visitor(doc, child)? {
            Action::Remove => {
                // Next sibling shifts into slot i; do not advance
                doc.detach(child);
            }
            Action::Replace(replacements) => {
                let spliced = replacements.len();
                doc.replace_child_at(node, i, replacements);
                i += spliced;
            }
            Action::SkipChildren => {
                i += 1;
            }
            Action::Continue => {
                walk_children(doc, child, visitor)?;
                i += 1;
            }
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
