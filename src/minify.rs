//! CSS and JS minification backends.
//!
//! The resolve and finalize passes talk to minifiers through the two
//! traits here, so tests can substitute counting fakes and a future
//! backend swap stays local to this module.

use anyhow::{Result, anyhow};
use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, StyleSheet};
use minify_js::{Session, TopLevelMode, minify};

// ============================================================================
// Traits
// ============================================================================

/// Minifies CSS text.
pub trait CssMinifier: Send + Sync {
    /// `filename` only feeds error messages and has no filesystem meaning.
    fn minify(&self, filename: &str, source: &str) -> Result<String>;
}

/// Minifies JS text.
pub trait JsMinifier: Send + Sync {
    fn minify(&self, source: &str, options: &JsMinifyOptions) -> Result<JsMinifyOutput>;
}

/// Per-call JS minification settings.
#[derive(Debug, Clone)]
pub struct JsMinifyOptions {
    /// When false the backend must return the source unchanged.
    pub minify: bool,
    pub target: JsTarget,
    pub format: JsFormat,
    /// Synthetic name used in diagnostics and source maps.
    pub sourcefile: String,
}

impl JsMinifyOptions {
    pub fn new(sourcefile: impl Into<String>) -> Self {
        Self {
            minify: true,
            target: JsTarget::Es2020,
            format: JsFormat::Module,
            sourcefile: sourcefile.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsTarget {
    Es2015,
    Es2020,
    EsNext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsFormat {
    /// ES module semantics; top-level names are mangleable.
    Module,
    /// Classic script semantics; top-level names stay global.
    Classic,
}

/// Result of a JS minification call.
#[derive(Debug, Clone)]
pub struct JsMinifyOutput {
    pub code: String,
    /// Source map JSON, when the backend produces one.
    pub map: Option<String>,
}

// ============================================================================
// Production backends
// ============================================================================

/// CSS backend over lightningcss.
#[derive(Debug, Default, Clone, Copy)]
pub struct LightningCss;

impl CssMinifier for LightningCss {
    fn minify(&self, filename: &str, source: &str) -> Result<String> {
        // lightningcss errors borrow the source, so stringify before return
        let mut sheet = StyleSheet::parse(
            source,
            ParserOptions {
                filename: filename.to_string(),
                ..ParserOptions::default()
            },
        )
        .map_err(|e| anyhow!("failed to parse CSS in {filename}: {e}"))?;

        sheet
            .minify(MinifyOptions::default())
            .map_err(|e| anyhow!("failed to minify CSS in {filename}: {e}"))?;

        let output = sheet
            .to_css(PrinterOptions {
                minify: true,
                ..PrinterOptions::default()
            })
            .map_err(|e| anyhow!("failed to print CSS in {filename}: {e}"))?;

        Ok(output.code)
    }
}

/// JS backend over minify-js.
///
/// Does not emit source maps; [`JsMinifyOutput::map`] is always `None`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MinifyJs;

impl JsMinifier for MinifyJs {
    fn minify(&self, source: &str, options: &JsMinifyOptions) -> Result<JsMinifyOutput> {
        if !options.minify {
            return Ok(JsMinifyOutput {
                code: source.to_string(),
                map: None,
            });
        }

        let mode = match options.format {
            JsFormat::Module => TopLevelMode::Module,
            JsFormat::Classic => TopLevelMode::Global,
        };

        let session = Session::new();
        let mut out = Vec::new();
        minify(&session, mode, source.as_bytes(), &mut out).map_err(|e| {
            anyhow!(
                "failed to minify JS in {}: {:?}",
                options.sourcefile,
                e
            )
        })?;

        Ok(JsMinifyOutput {
            code: String::from_utf8(out)?,
            map: None,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
