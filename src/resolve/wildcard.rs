//! Wildcard bundle expansion against the final unused-bundle sets.

use super::ResolveCtx;
use super::inline::chunk_separator;
use crate::bundle::BundleKind;
use crate::bundle::reference::{
    WILDCARD_BUNDLE, css_output_path, js_output_path, placeholder_token,
};
use crate::tree::{Document, NodeId};

/// Expand every deferred wildcard node.
///
/// The unused sets are snapshotted once up front: a wildcard expansion
/// never consumes bundles, so several wildcards on one page all expand the
/// same set.
pub(super) fn expand_wildcards(doc: &mut Document, ctx: &mut ResolveCtx) {
    let unused_css = ctx.unused_css.clone();
    let unused_js = ctx.unused_js.clone();

    for id in std::mem::take(&mut ctx.wildcard_links) {
        expand_reference(doc, id, ctx, BundleKind::Css, &unused_css);
    }
    for id in std::mem::take(&mut ctx.wildcard_scripts) {
        expand_reference(doc, id, ctx, BundleKind::Js, &unused_js);
    }
    for (id, minify) in std::mem::take(&mut ctx.wildcard_styles) {
        substitute_inline(doc, id, ctx, BundleKind::Css, &unused_css, minify);
    }
    for (id, minify) in std::mem::take(&mut ctx.wildcard_inline_scripts) {
        substitute_inline(doc, id, ctx, BundleKind::Js, &unused_js, minify);
    }
}

/// Replace a wildcard `<link>`/`<script src>` with one element per unused
/// bundle with non-empty content. Replacements inherit the original
/// element's attributes, so preload/media/type markup carries over.
fn expand_reference(
    doc: &mut Document,
    id: NodeId,
    ctx: &mut ResolveCtx,
    kind: BundleKind,
    unused: &[String],
) {
    if doc.is_detached(id) {
        tracing::debug!(?id, "wildcard reference detached before expansion");
        return;
    }
    let Some(template) = doc.element(id).cloned() else {
        return;
    };

    let separator = chunk_separator(kind);
    let mut replacements = Vec::new();
    for name in unused {
        let Some(content) = ctx.map(kind).joined(name, separator) else {
            continue;
        };
        if content.trim().is_empty() {
            continue;
        }
        ctx.register(kind, name);

        let mut elem = template.clone();
        match kind {
            BundleKind::Css => elem.set_attr("href", css_output_path(name)),
            BundleKind::Js => elem.set_attr("src", js_output_path(name)),
        }
        replacements.push(doc.create_element(elem));
    }

    tracing::debug!(
        page = ctx.page,
        kind = kind.as_str(),
        count = replacements.len(),
        "expanded wildcard reference"
    );
    doc.replace_with(id, replacements);
}

/// Substitute the wildcard placeholder in a deferred inline node with the
/// combined content of all unused bundles, then detach if nothing remains.
fn substitute_inline(
    doc: &mut Document,
    id: NodeId,
    ctx: &mut ResolveCtx,
    kind: BundleKind,
    unused: &[String],
    minify: bool,
) {
    if doc.is_detached(id) {
        tracing::debug!(?id, "wildcard inline node detached before substitution");
        return;
    }

    let separator = chunk_separator(kind);
    let mut parts = Vec::new();
    for name in unused {
        let Some(content) = ctx.map(kind).joined(name, separator) else {
            continue;
        };
        if content.trim().is_empty() {
            continue;
        }
        ctx.register(kind, name);
        parts.push(content);
    }
    let combined = parts.join(separator);

    let token = placeholder_token(WILDCARD_BUNDLE);
    let resolved = doc.text_content(id).replace(&token, &combined);

    if resolved.trim().is_empty() {
        doc.detach(id);
        return;
    }
    doc.set_text_children(id, resolved);

    if minify {
        match kind {
            BundleKind::Css => ctx.css_minify_queue.push(id),
            BundleKind::Js => ctx.js_minify_queue.push(id),
        }
    }
}
