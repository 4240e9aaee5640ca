//! Bundle reference encoding inside generated HTML.
//!
//! Two forms exist:
//!
//! - `href`/`src` values of the form `bundle:<name>` on `<link>` and
//!   `<script>` elements;
//! - inline placeholder tokens `/*@--BUNDLE--<name>--@*/` embedded in raw
//!   `<style>`/`<script>` text (comment-safe in both CSS and JS).
//!
//! The reserved name `*` means "every bundle rendered for this page that is
//! not explicitly referenced elsewhere". It is only valid in the
//! `href`/`src` form and as a whole-token placeholder, never as a named
//! placeholder target.

use regex::Regex;
use std::sync::LazyLock;

/// Bundle name components contribute to when they don't pick one.
pub const DEFAULT_BUNDLE: &str = "default";

/// Reserved wildcard bundle name.
pub const WILDCARD_BUNDLE: &str = "*";

/// Reserved prefix marking an `href`/`src` value as a bundle reference.
pub const BUNDLE_REF_PREFIX: &str = "bundle:";

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/\*@--BUNDLE--(.*?)--@\*/").expect("placeholder regex is valid")
});

/// Regex matching inline placeholder tokens; capture 1 is the bundle name.
pub fn placeholder_regex() -> &'static Regex {
    &PLACEHOLDER_RE
}

/// Extract the bundle name from a `bundle:`-prefixed reference value.
/// Returns `None` for ordinary URLs.
pub fn parse_reference(value: &str) -> Option<&str> {
    value.strip_prefix(BUNDLE_REF_PREFIX)
}

/// Build the placeholder token for a bundle name.
pub fn placeholder_token(name: &str) -> String {
    format!("/*@--BUNDLE--{name}--@*/")
}

/// Canonical URL path of a flushed CSS bundle.
pub fn css_output_path(name: &str) -> String {
    format!("/css/{name}.css")
}

/// Canonical URL path of a flushed JS bundle.
pub fn js_output_path(name: &str) -> String {
    format!("/js/{name}.js")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reference() {
        assert_eq!(parse_reference("bundle:plant"), Some("plant"));
        assert_eq!(parse_reference("bundle:*"), Some("*"));
        assert_eq!(parse_reference("/css/site.css"), None);
        assert_eq!(parse_reference("https://example.com/a.css"), None);
    }

    #[test]
    fn test_placeholder_regex_matches_token() {
        let caps = placeholder_regex()
            .captures("/*@--BUNDLE--plant--@*/")
            .unwrap();
        assert_eq!(&caps[1], "plant");
    }

    #[test]
    fn test_placeholder_regex_multiple_tokens() {
        let text = "/*@--BUNDLE--plants--@*/\n/*@--BUNDLE--default--@*/";
        let names: Vec<_> = placeholder_regex()
            .captures_iter(text)
            .map(|c| c[1].to_string())
            .collect();
        assert_eq!(names, vec!["plants", "default"]);
    }

    #[test]
    fn test_placeholder_regex_is_lazy() {
        // Two tokens on one line must not merge into one greedy match
        let text = "/*@--BUNDLE--a--@*/ x /*@--BUNDLE--b--@*/";
        assert_eq!(placeholder_regex().find_iter(text).count(), 2);
    }

    #[test]
    fn test_placeholder_token_round_trip() {
        let token = placeholder_token("default");
        let caps = placeholder_regex().captures(&token).unwrap();
        assert_eq!(&caps[1], "default");
    }

    #[test]
    fn test_output_paths() {
        assert_eq!(css_output_path("plant"), "/css/plant.css");
        assert_eq!(js_output_path("search"), "/js/search.js");
    }
}
