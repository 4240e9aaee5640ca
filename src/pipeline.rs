//! Per-page compile driver and build lifecycle hooks.
//!
//! The orchestrator owns one [`AssetPipeline`] per build process and calls
//! it in three phases: `on_build_start` once (and again on each watch-mode
//! rebuild), `compile_page` once per rendered page, and `on_build_end`
//! once after the last page. The registry is plain owned state borrowed
//! into each compile call, so page compiles must be serialized by the
//! caller; the finalizer parallelizes internally.

use crate::bundle::{BundleMap, BundleRegistry};
use crate::config::BundleConfig;
use crate::finalize::flush_bundles;
use crate::head::dedupe_heads;
use crate::minify::{CssMinifier, JsMinifier, LightningCss, MinifyJs};
use crate::resolve::resolve_bundles;
use crate::tree::parse::parse_html;
use crate::tree::serialize::serialize;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// One rendered page, as handed over by the page renderer.
#[derive(Debug, Clone)]
pub struct PageRender {
    /// Canonical page URL, used in diagnostics and synthetic filenames.
    pub url: String,
    /// Rendered HTML, before any bundling passes.
    pub html: String,
    /// CSS bundles the page's components contributed while rendering.
    pub css: BundleMap,
    /// JS bundles, same lifecycle as `css`.
    pub js: BundleMap,
}

/// The asset-bundling pipeline for one build process.
pub struct AssetPipeline<C = LightningCss, J = MinifyJs>
where
    C: CssMinifier,
    J: JsMinifier,
{
    config: BundleConfig,
    registry: BundleRegistry,
    css_minifier: C,
    js_minifier: J,
    /// Source directory captured at build start, for diagnostics.
    input_dir: Option<PathBuf>,
}

impl AssetPipeline {
    /// Pipeline with the production minifier backends.
    pub fn new(config: BundleConfig) -> Self {
        Self::with_minifiers(config, LightningCss, MinifyJs)
    }
}

impl<C: CssMinifier, J: JsMinifier> AssetPipeline<C, J> {
    pub fn with_minifiers(config: BundleConfig, css_minifier: C, js_minifier: J) -> Self {
        Self {
            config,
            registry: BundleRegistry::new(),
            css_minifier,
            js_minifier,
            input_dir: None,
        }
    }

    /// Build-start hook: resets the registry. Watch-mode rebuilds call
    /// this again so stale bundles from the previous pass never leak.
    pub fn on_build_start(&mut self, input_dir: &Path) {
        self.registry.reset();
        self.input_dir = Some(input_dir.to_path_buf());
        tracing::debug!(input = %input_dir.display(), "bundle registry reset");
    }

    /// Run the full per-page pass: parse, dedupe heads, resolve bundles,
    /// serialize. Registers the page's used bundles as a side effect.
    pub fn compile_page(&mut self, page: &PageRender) -> Result<String> {
        let mut doc = parse_html(page.html.as_bytes())
            .with_context(|| format!("failed to parse page `{}`", page.url))?;

        dedupe_heads(&mut doc, &page.url)?;
        resolve_bundles(
            &mut doc,
            &page.url,
            &page.css,
            &page.js,
            &mut self.registry,
            self.config.minify,
            &self.css_minifier,
            &self.js_minifier,
        )?;

        serialize(&doc).with_context(|| format!("failed to serialize page `{}`", page.url))
    }

    /// Build-end hook: flush the accumulated registry to output files.
    pub fn on_build_end(&self) -> Result<()> {
        flush_bundles(
            &self.registry,
            &self.config,
            &self.css_minifier,
            &self.js_minifier,
        )
    }

    pub fn registry(&self) -> &BundleRegistry {
        &self.registry
    }

    /// Input directory captured by the last `on_build_start` call.
    pub fn input_dir(&self) -> Option<&Path> {
        self.input_dir.as_deref()
    }

    pub fn config(&self) -> &BundleConfig {
        &self.config
    }
}

// ============================================================================
// Tests
// ============================================================================
