//! Bundler configuration, loadable from `sprig.toml`.
//!
//! # Example
//!
//! ```toml
//! output = "dist"   # Build output directory
//! minify = true     # Minify inline blocks and flushed bundle files
//! ```

use crate::error::ConfigError;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

mod defaults {
    use std::path::PathBuf;

    pub fn output() -> PathBuf {
        PathBuf::from("dist")
    }

    pub const fn r#true() -> bool {
        true
    }
}

/// Bundler configuration.
///
/// Canonical URL paths inside pages are fixed (`/css/<name>.css`,
/// `/js/<name>.js`); the config only controls where those files land on
/// disk and whether content is minified.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BundleConfig {
    /// Build output directory. Bundle files are written to
    /// `<output>/css/` and `<output>/js/`.
    #[serde(default = "defaults::output")]
    #[educe(Default = defaults::output())]
    pub output: PathBuf,

    /// Minify inline `<style>`/`<script>` blocks and flushed bundle files.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub minify: bool,
}

impl BundleConfig {
    /// Load configuration from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "output directory must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Directory for flushed CSS bundle files.
    pub fn css_dir(&self) -> PathBuf {
        self.output.join("css")
    }

    /// Directory for flushed JS bundle files.
    pub fn js_dir(&self) -> PathBuf {
        self.output.join("js")
    }
}
