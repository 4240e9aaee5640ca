//! Error taxonomy for the bundling pipeline.
//!
//! Only structural contract violations are typed errors that abort a page
//! compile. Unused bundle references and minifier failures are non-fatal:
//! they are logged and the pipeline degrades (node removed / content kept
//! unminified). Output-file write failures are isolated per bundle by the
//! finalizer.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Fatal per-page errors: the page template broke its structural contract.
///
/// These propagate out of `compile_page` and abort that page's output;
/// whether the whole build aborts is the orchestrator's call.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The rendered page has no `<html>` element to attach the
    /// deduplicated head to.
    #[error("page `{page}` has no <html> element")]
    MissingHtmlRoot { page: String },

    /// A bundle reference sits on an element missing a required attribute
    /// (e.g. a bundle-prefixed `href` on a `<link>` without `rel`).
    #[error("page `{page}`: {detail}")]
    MalformedReference { page: String, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_config_error_display() {
        let io_err = ConfigError::Io(
            PathBuf::from("sprig.toml"),
            Error::new(ErrorKind::NotFound, "file not found"),
        );
        let display = format!("{io_err}");
        assert!(display.contains("IO error"));
        assert!(display.contains("sprig.toml"));
    }

    #[test]
    fn test_pipeline_error_display() {
        let err = PipelineError::MissingHtmlRoot {
            page: "/plants/rose/".to_string(),
        };
        let display = format!("{err}");
        assert!(display.contains("/plants/rose/"));
        assert!(display.contains("<html>"));

        let err = PipelineError::MalformedReference {
            page: "/index/".to_string(),
            detail: "<link> with bundle href has no rel attribute".to_string(),
        };
        assert!(format!("{err}").contains("no rel attribute"));
    }
}
