//! Sprig - Asset bundling for static-site build pipelines.
//!
//! Takes rendered HTML pages that reference named CSS/JS bundles and
//! resolves those references into external files or inlined minified
//! content, deduplicating `<head>` metadata across composed layouts along
//! the way. Bundles accumulate in a build-scoped registry and flush to
//! one output file per bundle at build end.

pub mod bundle;
pub mod config;
pub mod error;
pub mod finalize;
pub mod hash;
pub mod head;
pub mod minify;
pub mod pipeline;
pub mod resolve;
pub mod tree;

pub use bundle::{BundleKind, BundleMap, BundleRegistry, OrderedSet};
pub use config::BundleConfig;
pub use error::{ConfigError, PipelineError};
pub use minify::{CssMinifier, JsMinifier, LightningCss, MinifyJs};
pub use pipeline::{AssetPipeline, PageRender};
