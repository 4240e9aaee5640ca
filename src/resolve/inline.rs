//! Inline `<style>`/`<script>` placeholder substitution.

use super::ResolveCtx;
use crate::bundle::BundleKind;
use crate::bundle::reference::{WILDCARD_BUNDLE, placeholder_regex};
use crate::tree::{Action, Document, NodeId};
use anyhow::Result;

/// Attribute opting an inline block out of minification. Any value other
/// than `"false"` counts; the attribute never survives into output.
const OPT_OUT_ATTR: &str = "data-raw";

/// Chunk join separator when splicing a bundle's content into inline text.
pub(super) const fn chunk_separator(kind: BundleKind) -> &'static str {
    match kind {
        BundleKind::Css => "",
        // Each JS chunk is a block-scoped unit; keep statement boundaries
        BundleKind::Js => "\n",
    }
}

/// Resolve placeholders in an inline `<style>` or `<script>` body.
///
/// Named placeholders are substituted immediately; a wildcard placeholder
/// is left in place and the node deferred to the wildcard pass. Nodes that
/// end up empty (before or after substitution) are removed. Surviving
/// nodes are queued for deferred minification unless opted out.
pub(super) fn resolve_inline(
    doc: &mut Document,
    id: NodeId,
    ctx: &mut ResolveCtx,
    kind: BundleKind,
) -> Result<Action> {
    let opt_out = doc
        .element_mut(id)
        .and_then(|e| e.remove_attr(OPT_OUT_ATTR))
        .is_some_and(|value| value != "false");

    let source = doc.text_content(id);
    if source.trim().is_empty() {
        return Ok(Action::Remove);
    }

    let separator = chunk_separator(kind);
    let mut has_wildcard = false;
    let resolved = placeholder_regex().replace_all(&source, |caps: &regex::Captures| {
        let name = &caps[1];
        if name == WILDCARD_BUNDLE {
            // Substituted later, against the final unused-bundle set
            has_wildcard = true;
            return caps[0].to_string();
        }
        let joined = ctx.map(kind).joined(name, separator);
        match joined {
            Some(content) => {
                ctx.register(kind, name);
                ctx.mark_used(kind, name);
                content
            }
            None => {
                tracing::warn!(
                    page = ctx.page,
                    bundle = %name,
                    kind = kind.as_str(),
                    "inline placeholder references bundle not rendered on this page"
                );
                String::new()
            }
        }
    });

    if !has_wildcard && resolved.trim().is_empty() {
        return Ok(Action::Remove);
    }
    let resolved = resolved.into_owned();
    doc.set_text_children(id, resolved);

    let minify = ctx.minify && !opt_out;
    if has_wildcard {
        match kind {
            BundleKind::Css => ctx.wildcard_styles.push((id, minify)),
            BundleKind::Js => ctx.wildcard_inline_scripts.push((id, minify)),
        }
    } else if minify {
        match kind {
            BundleKind::Css => ctx.css_minify_queue.push(id),
            BundleKind::Js => ctx.js_minify_queue.push(id),
        }
    }

    Ok(Action::SkipChildren)
}
