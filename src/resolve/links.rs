//! Named `<link href>` and `<script src>` bundle reference resolution.

use super::ResolveCtx;
use crate::bundle::BundleKind;
use crate::bundle::reference::{
    WILDCARD_BUNDLE, css_output_path, js_output_path, parse_reference,
};
use crate::error::PipelineError;
use crate::tree::{Action, Document, NodeId};
use anyhow::Result;

/// Resolve a `<link>` element whose `href` carries a bundle reference.
///
/// Only stylesheet links and style preloads are bundle candidates; every
/// other link passes through untouched, bundle-prefixed href or not. A
/// bundle href on a `<link>` without `rel` is a template bug and aborts
/// the page.
pub(super) fn resolve_link(
    doc: &mut Document,
    id: NodeId,
    ctx: &mut ResolveCtx,
) -> Result<Action> {
    let Some(elem) = doc.element(id) else {
        return Ok(Action::Continue);
    };
    let Some(name) = elem.attr("href").and_then(parse_reference) else {
        return Ok(Action::Continue);
    };
    let name = name.to_string();

    let Some(rel) = elem.attr("rel") else {
        return Err(PipelineError::MalformedReference {
            page: ctx.page.to_string(),
            detail: format!("<link> referencing bundle `{name}` has no rel attribute"),
        }
        .into());
    };

    let style_preload = rel == "preload" && elem.attr("as") == Some("style");
    if rel != "stylesheet" && !style_preload {
        return Ok(Action::Continue);
    }

    // Lazy preload: no onload handler swaps rel to stylesheet, so the
    // bundle is not consumed here and stays available to a wildcard.
    let lazy_preload = style_preload
        && !elem
            .attr("onload")
            .is_some_and(|handler| handler.contains("stylesheet"));

    if name == WILDCARD_BUNDLE {
        ctx.wildcard_links.push(id);
        return Ok(Action::SkipChildren);
    }

    if !ctx.css.contains(&name) {
        tracing::warn!(
            page = ctx.page,
            bundle = %name,
            "removing <link> to CSS bundle not rendered on this page"
        );
        return Ok(Action::Remove);
    }

    ctx.register(BundleKind::Css, &name);
    if !lazy_preload {
        ctx.mark_used(BundleKind::Css, &name);
    }
    if let Some(elem) = doc.element_mut(id) {
        elem.set_attr("href", css_output_path(&name));
    }
    Ok(Action::SkipChildren)
}

/// Resolve a `<script>` element whose `src` carries a bundle reference.
pub(super) fn resolve_script(
    doc: &mut Document,
    id: NodeId,
    ctx: &mut ResolveCtx,
) -> Result<Action> {
    let Some(name) = doc
        .element(id)
        .and_then(|e| e.attr("src"))
        .and_then(parse_reference)
    else {
        // External script; never descend into it
        return Ok(Action::SkipChildren);
    };
    let name = name.to_string();

    if name == WILDCARD_BUNDLE {
        ctx.wildcard_scripts.push(id);
        return Ok(Action::SkipChildren);
    }

    if !ctx.js.contains(&name) {
        tracing::warn!(
            page = ctx.page,
            bundle = %name,
            "removing <script> for JS bundle not rendered on this page"
        );
        return Ok(Action::Remove);
    }

    ctx.register(BundleKind::Js, &name);
    ctx.mark_used(BundleKind::Js, &name);
    if let Some(elem) = doc.element_mut(id) {
        elem.set_attr("src", js_output_path(&name));
    }
    Ok(Action::SkipChildren)
}
