//! Bundle resolution pass.
//!
//! Given a deduplicated document plus the page's rendered CSS/JS bundle
//! maps, this pass runs three stages in order:
//!
//! 1. a primary tree walk that resolves named `<link>`/`<script src>`
//!    references and inline `<style>`/`<script>` placeholders, deferring
//!    anything that names the wildcard bundle;
//! 2. a wildcard pass that expands deferred nodes against the final
//!    unused-bundle sets (snapshotted once, so every wildcard on a page
//!    sees the same set);
//! 3. a minification pass over queued inline nodes, content-hash cached,
//!    run last so minifiers only ever see fully substituted text.
//!
//! Every bundle that reaches output through any form is recorded into the
//! global registry; recording is idempotent so a bundle referenced both
//! by name and via wildcard lands in its output file exactly once.

mod inline;
mod links;
mod wildcard;

use crate::bundle::{BundleKind, BundleMap, BundleRegistry};
use crate::hash::content_hash;
use crate::minify::{CssMinifier, JsMinifier, JsMinifyOptions};
use crate::tree::{Action, Document, NodeId, transform};
use anyhow::Result;
use rustc_hash::FxHashMap;

/// Per-page state threaded through the resolution stages.
struct ResolveCtx<'a> {
    page: &'a str,
    css: &'a BundleMap,
    js: &'a BundleMap,
    registry: &'a mut BundleRegistry,
    /// Whether inline blocks are minified at all; when false nothing is
    /// ever queued for the minification stage.
    minify: bool,
    /// Bundle names rendered for this page, minus those explicitly
    /// referenced so far. What remains feeds the wildcard pass.
    unused_css: Vec<String>,
    unused_js: Vec<String>,
    wildcard_links: Vec<NodeId>,
    wildcard_scripts: Vec<NodeId>,
    /// Deferred inline nodes still holding a wildcard token, paired with
    /// whether they are eligible for minification afterwards.
    wildcard_styles: Vec<(NodeId, bool)>,
    wildcard_inline_scripts: Vec<(NodeId, bool)>,
    css_minify_queue: Vec<NodeId>,
    js_minify_queue: Vec<NodeId>,
}

impl ResolveCtx<'_> {
    fn map(&self, kind: BundleKind) -> &BundleMap {
        match kind {
            BundleKind::Css => self.css,
            BundleKind::Js => self.js,
        }
    }

    fn mark_used(&mut self, kind: BundleKind, name: &str) {
        let unused = match kind {
            BundleKind::Css => &mut self.unused_css,
            BundleKind::Js => &mut self.unused_js,
        };
        unused.retain(|n| n != name);
    }

    /// Record every chunk of the named bundle into the global registry.
    fn register(&mut self, kind: BundleKind, name: &str) {
        let map = match kind {
            BundleKind::Css => self.css,
            BundleKind::Js => self.js,
        };
        if let Some(set) = map.get(name) {
            for chunk in set.iter() {
                self.registry.record_chunk(kind, name, chunk);
            }
        }
    }
}

/// Resolve all bundle references in `doc` against the page's bundle maps,
/// recording used bundles into `registry` and, when `minify` is set,
/// minifying inline content.
#[allow(clippy::too_many_arguments)]
pub fn resolve_bundles(
    doc: &mut Document,
    page: &str,
    css: &BundleMap,
    js: &BundleMap,
    registry: &mut BundleRegistry,
    minify: bool,
    css_minifier: &dyn CssMinifier,
    js_minifier: &dyn JsMinifier,
) -> Result<()> {
    let mut ctx = ResolveCtx {
        page,
        css,
        js,
        registry,
        minify,
        unused_css: css.names().map(str::to_string).collect(),
        unused_js: js.names().map(str::to_string).collect(),
        wildcard_links: Vec::new(),
        wildcard_scripts: Vec::new(),
        wildcard_styles: Vec::new(),
        wildcard_inline_scripts: Vec::new(),
        css_minify_queue: Vec::new(),
        js_minify_queue: Vec::new(),
    };

    transform(doc, doc.root(), &mut |doc, id| dispatch(doc, id, &mut ctx))?;

    wildcard::expand_wildcards(doc, &mut ctx);

    minify_queued(
        doc,
        page,
        &ctx.css_minify_queue,
        &ctx.js_minify_queue,
        css_minifier,
        js_minifier,
    );

    Ok(())
}

fn dispatch(doc: &mut Document, id: NodeId, ctx: &mut ResolveCtx) -> Result<Action> {
    match doc.tag_name(id) {
        Some("link") => links::resolve_link(doc, id, ctx),
        Some("script") => {
            if doc.element(id).is_some_and(|e| e.has_attr("src")) {
                links::resolve_script(doc, id, ctx)
            } else {
                inline::resolve_inline(doc, id, ctx, BundleKind::Js)
            }
        }
        Some("style") => inline::resolve_inline(doc, id, ctx, BundleKind::Css),
        _ => Ok(Action::Continue),
    }
}

// ============================================================================
// Deferred minification
// ============================================================================

/// Minify queued inline nodes, last of the three stages.
///
/// Results are cached per page by content hash (kind-prefixed, so identical
/// CSS and JS text never collide), which makes repeated component output
/// cheap. A failure keeps the unminified content and logs a warning; an
/// empty result detaches the node post hoc.
fn minify_queued(
    doc: &mut Document,
    page: &str,
    css_queue: &[NodeId],
    js_queue: &[NodeId],
    css_minifier: &dyn CssMinifier,
    js_minifier: &dyn JsMinifier,
) {
    let mut cache: FxHashMap<String, String> = FxHashMap::default();

    for (idx, &id) in css_queue.iter().enumerate() {
        if doc.is_detached(id) {
            tracing::debug!(?id, "queued style detached before minification");
            continue;
        }
        let source = doc.text_content(id);
        let key = format!("css:{}", content_hash(&source));
        if let Some(hit) = cache.get(&key) {
            let hit = hit.clone();
            doc.set_text_children(id, hit);
            continue;
        }
        let filename = format!("{page}/inline-{idx}.css");
        match css_minifier.minify(&filename, &source) {
            Ok(minified) if minified.trim().is_empty() => doc.detach(id),
            Ok(minified) => {
                cache.insert(key, minified.clone());
                doc.set_text_children(id, minified);
            }
            Err(error) => {
                tracing::warn!(page, %error, "inline CSS minification failed, keeping original");
            }
        }
    }

    for (idx, &id) in js_queue.iter().enumerate() {
        if doc.is_detached(id) {
            tracing::debug!(?id, "queued script detached before minification");
            continue;
        }
        let source = doc.text_content(id);
        let key = format!("js:{}", content_hash(&source));
        if let Some(hit) = cache.get(&key) {
            let hit = hit.clone();
            doc.set_text_children(id, hit);
            continue;
        }
        let options = JsMinifyOptions::new(format!("{page}/inline-{idx}.js"));
        match js_minifier.minify(&source, &options) {
            Ok(output) if output.code.trim().is_empty() => doc.detach(id),
            Ok(output) => {
                cache.insert(key, output.code.clone());
                doc.set_text_children(id, output.code);
            }
            Err(error) => {
                tracing::warn!(page, %error, "inline JS minification failed, keeping original");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::minify::JsMinifyOutput;
    use crate::tree::parse::parse_html;
    use crate::tree::serialize::serialize;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Strips whitespace; counts invocations.
    #[derive(Default)]
    struct FakeCss {
        calls: AtomicUsize,
    }

    impl CssMinifier for FakeCss {
        fn minify(&self, _filename: &str, source: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(source.split_whitespace().collect())
        }
    }

    #[derive(Default)]
    struct FakeJs {
        calls: AtomicUsize,
    }

    impl JsMinifier for FakeJs {
        fn minify(&self, source: &str, options: &JsMinifyOptions) -> Result<JsMinifyOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let code = if options.minify {
                source.trim().to_string()
            } else {
                source.to_string()
            };
            Ok(JsMinifyOutput { code, map: None })
        }
    }

    struct FailingCss;

    impl CssMinifier for FailingCss {
        fn minify(&self, _filename: &str, _source: &str) -> Result<String> {
            Err(anyhow!("simulated minifier crash"))
        }
    }

    fn bundle_map(entries: &[(&str, &[&str])]) -> BundleMap {
        let mut map = BundleMap::new();
        for (name, chunks) in entries {
            for chunk in *chunks {
                map.insert_chunk(name, *chunk);
            }
        }
        map
    }

    fn resolve(
        html: &str,
        css: &BundleMap,
        js: &BundleMap,
    ) -> (String, BundleRegistry, usize, usize) {
        let mut doc = parse_html(html.as_bytes()).unwrap();
        let mut registry = BundleRegistry::new();
        let fake_css = FakeCss::default();
        let fake_js = FakeJs::default();
        resolve_bundles(
            &mut doc,
            "/test/",
            css,
            js,
            &mut registry,
            true,
            &fake_css,
            &fake_js,
        )
        .unwrap();
        (
            serialize(&doc).unwrap(),
            registry,
            fake_css.calls.load(Ordering::SeqCst),
            fake_js.calls.load(Ordering::SeqCst),
        )
    }

    #[test]
    fn test_named_link_rewritten_and_registered() {
        let css = bundle_map(&[("plant", &["h2{color:red}"])]);
        let (out, registry, _, _) = resolve(
            r#"<html><head><link rel="stylesheet" href="bundle:plant"/></head><body></body></html>"#,
            &css,
            &BundleMap::new(),
        );

        assert!(out.contains(r#"href="/css/plant.css""#));
        assert!(!out.contains("bundle:"));
        assert_eq!(
            registry.joined(BundleKind::Css, "plant").unwrap(),
            "h2{color:red}"
        );
    }

    #[test]
    fn test_ghost_script_removed_and_not_registered() {
        let (out, registry, _, _) = resolve(
            r#"<html><body><script src="bundle:ghost"></script></body></html>"#,
            &BundleMap::new(),
            &BundleMap::new(),
        );

        assert!(!out.contains("script"));
        assert!(!registry.contains(BundleKind::Js, "ghost"));
    }

    #[test]
    fn test_ordinary_link_and_script_untouched() {
        let html = r#"<html><head><link rel="stylesheet" href="/site.css"/><script src="https://cdn.example/x.js"></script></head><body></body></html>"#;
        let (out, _, _, _) = resolve(html, &BundleMap::new(), &BundleMap::new());
        assert_eq!(out, html);
    }

    #[test]
    fn test_non_stylesheet_link_passes_through() {
        let css = bundle_map(&[("plant", &["h2{color:red}"])]);
        let (out, registry, _, _) = resolve(
            r#"<html><head><link rel="icon" href="bundle:plant"/></head><body></body></html>"#,
            &css,
            &BundleMap::new(),
        );

        // Not a stylesheet candidate: href untouched, bundle not consumed
        assert!(out.contains(r#"<link rel="icon" href="bundle:plant"/>"#));
        assert!(!registry.contains(BundleKind::Css, "plant"));
    }

    #[test]
    fn test_non_stylesheet_link_with_unknown_bundle_kept() {
        let (out, _, _, _) = resolve(
            r#"<html><head><link rel="icon" href="bundle:ghost"/></head><body></body></html>"#,
            &BundleMap::new(),
            &BundleMap::new(),
        );

        assert!(out.contains(r#"<link rel="icon" href="bundle:ghost"/>"#));
    }

    #[test]
    fn test_non_candidate_link_leaves_bundle_for_wildcard() {
        let css = bundle_map(&[("plant", &["h2{color:red}"])]);
        let (out, _, _, _) = resolve(
            r#"<html><head><link rel="icon" href="bundle:plant"/><link rel="stylesheet" href="bundle:*"/></head><body></body></html>"#,
            &css,
            &BundleMap::new(),
        );

        assert!(out.contains(r#"<link rel="stylesheet" href="/css/plant.css"/>"#));
    }

    #[test]
    fn test_link_without_rel_is_fatal() {
        let mut doc =
            parse_html(br#"<html><head><link href="bundle:plant"/></head></html>"#).unwrap();
        let mut registry = BundleRegistry::new();
        let css = bundle_map(&[("plant", &["a{}"])]);
        let err = resolve_bundles(
            &mut doc,
            "/test/",
            &css,
            &BundleMap::new(),
            &mut registry,
            true,
            &FakeCss::default(),
            &FakeJs::default(),
        )
        .unwrap_err();

        let err = err.downcast::<PipelineError>().unwrap();
        assert!(matches!(err, PipelineError::MalformedReference { .. }));
    }

    #[test]
    fn test_inline_placeholder_substituted_and_minified() {
        let css = bundle_map(&[("plant", &["h2 { color: red }"])]);
        let (out, registry, css_calls, _) = resolve(
            "<html><head><style>/*@--BUNDLE--plant--@*/</style></head><body></body></html>",
            &css,
            &BundleMap::new(),
        );

        assert!(out.contains("<style>h2{color:red}</style>"));
        assert_eq!(css_calls, 1);
        assert_eq!(
            registry.joined(BundleKind::Css, "plant").unwrap(),
            "h2 { color: red }"
        );
    }

    #[test]
    fn test_inline_js_placeholder_joins_with_newline() {
        let js = bundle_map(&[("app", &["{let a=1}", "{let b=2}"] as &[&str])]);
        let (out, _, _, js_calls) = resolve(
            "<html><body><script>/*@--BUNDLE--app--@*/</script></body></html>",
            &BundleMap::new(),
            &js,
        );

        assert!(out.contains("{let a=1}\n{let b=2}"));
        assert_eq!(js_calls, 1);
    }

    #[test]
    fn test_data_raw_skips_minification_and_is_stripped() {
        let css = bundle_map(&[("plant", &["h2 { color: red }"])]);
        let (out, _, css_calls, _) = resolve(
            r#"<html><head><style data-raw="true">/*@--BUNDLE--plant--@*/</style></head><body></body></html>"#,
            &css,
            &BundleMap::new(),
        );

        assert!(out.contains("<style>h2 { color: red }</style>"));
        assert!(!out.contains("data-raw"));
        assert_eq!(css_calls, 0);
    }

    #[test]
    fn test_unknown_placeholder_resolves_empty_and_removes_node() {
        let (out, registry, css_calls, _) = resolve(
            "<html><head><style>/*@--BUNDLE--ghost--@*/</style></head><body></body></html>",
            &BundleMap::new(),
            &BundleMap::new(),
        );

        assert!(!out.contains("style"));
        assert!(!registry.contains(BundleKind::Css, "ghost"));
        assert_eq!(css_calls, 0);
    }

    #[test]
    fn test_empty_style_removed() {
        let (out, _, css_calls, _) = resolve(
            "<html><head><style>   \n </style></head><body></body></html>",
            &BundleMap::new(),
            &BundleMap::new(),
        );
        assert!(!out.contains("style"));
        assert_eq!(css_calls, 0);
    }

    #[test]
    fn test_minify_cache_reuses_identical_content() {
        let css = bundle_map(&[("a", &["p { margin: 0 }"]), ("b", &["p { margin: 0 }"])]);
        let (out, _, css_calls, _) = resolve(
            "<html><head>\
             <style>/*@--BUNDLE--a--@*/</style>\
             <style>/*@--BUNDLE--b--@*/</style>\
             </head><body></body></html>",
            &css,
            &BundleMap::new(),
        );

        assert_eq!(out.matches("<style>p{margin:0}</style>").count(), 2);
        assert_eq!(css_calls, 1, "identical content minifies once");
    }

    #[test]
    fn test_minify_disabled_keeps_inline_content() {
        let mut doc = parse_html(
            b"<html><head><style>/*@--BUNDLE--plant--@*/</style></head><body></body></html>",
        )
        .unwrap();
        let mut registry = BundleRegistry::new();
        let css = bundle_map(&[("plant", &["h2 { color: red }"])]);
        let fake_css = FakeCss::default();
        resolve_bundles(
            &mut doc,
            "/test/",
            &css,
            &BundleMap::new(),
            &mut registry,
            false,
            &fake_css,
            &FakeJs::default(),
        )
        .unwrap();

        let out = serialize(&doc).unwrap();
        // Placeholders still resolve; the content just stays unminified
        assert!(out.contains("<style>h2 { color: red }</style>"));
        assert_eq!(fake_css.calls.load(Ordering::SeqCst), 0);
        assert!(registry.contains(BundleKind::Css, "plant"));
    }

    #[test]
    fn test_minifier_failure_keeps_unminified_content() {
        let mut doc = parse_html(
            b"<html><head><style>h2 { color: red }</style></head><body></body></html>",
        )
        .unwrap();
        let mut registry = BundleRegistry::new();
        resolve_bundles(
            &mut doc,
            "/test/",
            &BundleMap::new(),
            &BundleMap::new(),
            &mut registry,
            true,
            &FailingCss,
            &FakeJs::default(),
        )
        .unwrap();

        let out = serialize(&doc).unwrap();
        assert!(out.contains("<style>h2 { color: red }</style>"));
    }

    #[test]
    fn test_wildcard_link_expands_to_unused_bundles() {
        let css = bundle_map(&[
            ("main", &["body{margin:0}"] as &[&str]),
            ("extra", &["aside{float:left}"]),
            ("hero", &["h1{font-size:3rem}"]),
        ]);
        let (out, registry, _, _) = resolve(
            r#"<html><head><link rel="stylesheet" href="bundle:main"/><link rel="stylesheet" href="bundle:*"/></head><body></body></html>"#,
            &css,
            &BundleMap::new(),
        );

        // main was explicitly referenced, so the wildcard covers the rest
        assert!(out.contains(r#"href="/css/main.css""#));
        assert!(out.contains(r#"href="/css/extra.css""#));
        assert!(out.contains(r#"href="/css/hero.css""#));
        assert_eq!(out.matches("<link").count(), 3);
        assert!(registry.contains(BundleKind::Css, "extra"));
        assert!(registry.contains(BundleKind::Css, "hero"));
    }

    #[test]
    fn test_wildcard_skips_empty_content_bundles() {
        let css = bundle_map(&[("real", &["a{}"] as &[&str]), ("blank", &["   "])]);
        let (out, registry, _, _) = resolve(
            r#"<html><head><link rel="stylesheet" href="bundle:*"/></head><body></body></html>"#,
            &css,
            &BundleMap::new(),
        );

        assert!(out.contains(r#"href="/css/real.css""#));
        assert!(!out.contains("blank"));
        assert!(!registry.contains(BundleKind::Css, "blank"));
    }

    #[test]
    fn test_wildcard_with_nothing_unused_removes_node() {
        let css = bundle_map(&[("main", &["a{}"])]);
        let (out, _, _, _) = resolve(
            r#"<html><head><link rel="stylesheet" href="bundle:main"/><link rel="stylesheet" href="bundle:*"/></head><body></body></html>"#,
            &css,
            &BundleMap::new(),
        );

        assert_eq!(out.matches("<link").count(), 1);
    }

    #[test]
    fn test_lazy_preload_stays_eligible_for_wildcard() {
        let css = bundle_map(&[("plant", &["h2{color:red}"])]);
        let (out, _, _, _) = resolve(
            r#"<html><head><link rel="preload" as="style" href="bundle:plant"/><link rel="stylesheet" href="bundle:*"/></head><body></body></html>"#,
            &css,
            &BundleMap::new(),
        );

        // The preload is rewritten but does not consume the bundle, so the
        // wildcard still emits a stylesheet link for it
        assert!(out.contains(r#"rel="preload" as="style" href="/css/plant.css""#));
        assert!(out.contains(r#"rel="stylesheet" href="/css/plant.css""#));
    }

    #[test]
    fn test_preload_with_onload_swap_consumes_bundle() {
        let css = bundle_map(&[("plant", &["h2{color:red}"])]);
        let (out, _, _, _) = resolve(
            r#"<html><head><link rel="preload" as="style" onload="this.rel='stylesheet'" href="bundle:plant"/><link rel="stylesheet" href="bundle:*"/></head><body></body></html>"#,
            &css,
            &BundleMap::new(),
        );

        assert_eq!(out.matches("/css/plant.css").count(), 1);
    }

    #[test]
    fn test_wildcard_script_expands() {
        let js = bundle_map(&[
            ("search", &["{search()}"] as &[&str]),
            ("nav", &["{nav()}"]),
        ]);
        let (out, registry, _, _) = resolve(
            r#"<html><body><script type="module" src="bundle:*"></script></body></html>"#,
            &BundleMap::new(),
            &js,
        );

        assert!(out.contains(r#"src="/js/search.js""#));
        assert!(out.contains(r#"src="/js/nav.js""#));
        // Replacements inherit the original element's attributes
        assert_eq!(out.matches(r#"type="module""#).count(), 2);
        assert!(registry.contains(BundleKind::Js, "search"));
    }

    #[test]
    fn test_wildcard_inline_style_substitutes_combined_content() {
        let css = bundle_map(&[
            ("a", &["a { color: blue }"] as &[&str]),
            ("b", &["b { font-weight: bold }"]),
        ]);
        let (out, registry, css_calls, _) = resolve(
            "<html><head><style>/*@--BUNDLE--*--@*/</style></head><body></body></html>",
            &css,
            &BundleMap::new(),
        );

        assert!(out.contains("<style>a{color:blue}b{font-weight:bold}</style>"));
        assert_eq!(css_calls, 1, "wildcard styles minify after substitution");
        assert!(registry.contains(BundleKind::Css, "a"));
        assert!(registry.contains(BundleKind::Css, "b"));
    }

    #[test]
    fn test_wildcard_inline_script_substitutes_combined_content() {
        let js = bundle_map(&[
            ("a", &["{let a=1}"] as &[&str]),
            ("b", &["{let b=2}"]),
        ]);
        let (out, registry, _, js_calls) = resolve(
            "<html><body><script>/*@--BUNDLE--*--@*/</script></body></html>",
            &BundleMap::new(),
            &js,
        );

        assert!(out.contains("<script>{let a=1}\n{let b=2}</script>"));
        assert_eq!(js_calls, 1, "wildcard scripts minify after substitution");
        assert!(registry.contains(BundleKind::Js, "a"));
        assert!(registry.contains(BundleKind::Js, "b"));
    }

    #[test]
    fn test_wildcard_inline_style_empty_detaches() {
        let (out, _, _, _) = resolve(
            "<html><head><style>/*@--BUNDLE--*--@*/</style></head><body></body></html>",
            &BundleMap::new(),
            &BundleMap::new(),
        );
        assert!(!out.contains("style"));
    }

    #[test]
    fn test_multiple_wildcards_see_same_snapshot() {
        let css = bundle_map(&[("x", &["x{}"])]);
        let (out, _, _, _) = resolve(
            r#"<html><head><link rel="stylesheet" href="bundle:*"/><link rel="stylesheet" href="bundle:*"/></head><body></body></html>"#,
            &css,
            &BundleMap::new(),
        );

        // Both expand the same unused set; neither consumes it
        assert_eq!(out.matches(r#"href="/css/x.css""#).count(), 2);
    }
}
