//! Build finalizer: flush the global registry to bundle output files.
//!
//! Runs once at build end. Every bundle write is independent, so the
//! flush proceeds settle-all across bundles in parallel: one bundle's
//! minify or write failure is logged and collected, and the remaining
//! bundles still land on disk before the build reports failure.

use crate::bundle::{BundleKind, BundleRegistry};
use crate::config::BundleConfig;
use crate::minify::{CssMinifier, JsMinifier, JsMinifyOptions};
use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use std::fs;
use std::path::Path;

/// Write every non-empty bundle in `registry` to
/// `<output>/css/<name>.css` and `<output>/js/<name>.js` (plus a
/// `.js.map` next to any JS bundle whose minifier emits a source map).
pub fn flush_bundles(
    registry: &BundleRegistry,
    config: &BundleConfig,
    css_minifier: &dyn CssMinifier,
    js_minifier: &dyn JsMinifier,
) -> Result<()> {
    let css_bundles = registry.flush(BundleKind::Css);
    let js_bundles = registry.flush(BundleKind::Js);

    if css_bundles.is_empty() && js_bundles.is_empty() {
        tracing::debug!("no bundles to flush");
        return Ok(());
    }

    let css_dir = config.css_dir();
    let js_dir = config.js_dir();
    if !css_bundles.is_empty() {
        fs::create_dir_all(&css_dir)
            .with_context(|| format!("failed to create {}", css_dir.display()))?;
    }
    if !js_bundles.is_empty() {
        fs::create_dir_all(&js_dir)
            .with_context(|| format!("failed to create {}", js_dir.display()))?;
    }

    let css_failures: Vec<String> = css_bundles
        .par_iter()
        .filter_map(|(name, content)| {
            write_css_bundle(&css_dir, name, content, config, css_minifier)
                .err()
                .map(|e| {
                    tracing::warn!(bundle = %name, error = %e, "failed to flush CSS bundle");
                    format!("css/{name}: {e:#}")
                })
        })
        .collect();

    let js_failures: Vec<String> = js_bundles
        .par_iter()
        .filter_map(|(name, content)| {
            write_js_bundle(&js_dir, name, content, config, js_minifier)
                .err()
                .map(|e| {
                    tracing::warn!(bundle = %name, error = %e, "failed to flush JS bundle");
                    format!("js/{name}: {e:#}")
                })
        })
        .collect();

    tracing::info!(
        css = css_bundles.len() - css_failures.len(),
        js = js_bundles.len() - js_failures.len(),
        "flushed bundle files"
    );

    let failures: Vec<String> = css_failures.into_iter().chain(js_failures).collect();
    if !failures.is_empty() {
        bail!("{} bundle(s) failed to flush: {}", failures.len(), failures.join("; "));
    }
    Ok(())
}

/// Minification failures here degrade to the unminified content; only the
/// filesystem write itself can fail the bundle.
fn write_css_bundle(
    dir: &Path,
    name: &str,
    content: &str,
    config: &BundleConfig,
    minifier: &dyn CssMinifier,
) -> Result<()> {
    let filename = format!("{name}.css");
    let output = if config.minify {
        match minifier.minify(&filename, content) {
            Ok(minified) => minified,
            Err(error) => {
                tracing::warn!(bundle = %name, %error, "CSS bundle minification failed, writing raw content");
                content.to_string()
            }
        }
    } else {
        content.to_string()
    };

    let path = dir.join(&filename);
    fs::write(&path, output).with_context(|| format!("failed to write {}", path.display()))
}

fn write_js_bundle(
    dir: &Path,
    name: &str,
    content: &str,
    config: &BundleConfig,
    minifier: &dyn JsMinifier,
) -> Result<()> {
    let filename = format!("{name}.js");
    let mut options = JsMinifyOptions::new(filename.clone());
    options.minify = config.minify;

    let output = match minifier.minify(content, &options) {
        Ok(output) => output,
        Err(error) => {
            tracing::warn!(bundle = %name, %error, "JS bundle minification failed, writing raw content");
            crate::minify::JsMinifyOutput {
                code: content.to_string(),
                map: None,
            }
        }
    };

    let path = dir.join(&filename);
    match output.map {
        Some(map) => {
            let map_filename = format!("{filename}.map");
            let map_path = dir.join(&map_filename);
            fs::write(&map_path, map)
                .with_context(|| format!("failed to write {}", map_path.display()))?;
            let code = format!("//# sourceMappingURL={map_filename}\n{}", output.code);
            fs::write(&path, code)
                .with_context(|| format!("failed to write {}", path.display()))
        }
        None => fs::write(&path, output.code)
            .with_context(|| format!("failed to write {}", path.display())),
    }
}

// ============================================================================
// Tests
// ============================================================================
