//! URL path normalization.
//!
//! # Responsibilities
//! - Canonicalize request paths that accumulated legacy CMS noise
//!   (mixed case, `+`/`%20` separators, doubled slashes, trailing slashes)
//! - Leave asset, API, and system routes untouched
//!
//! # Design Decisions
//! - Exemption uses plain substring checks (no regex in the hot path)
//! - Normalization is idempotent: applying it to its own output is a no-op
//! - The query string and host are never touched; only the path is rewritten

use std::borrow::Cow;

/// Path fragments that mark a request as exempt from normalization.
///
/// Anything that looks like an asset, an API route, or a CMS-internal
/// endpoint must pass through byte-for-byte: those URLs are case-sensitive
/// and rewriting them breaks the origin.
const EXEMPT_MARKERS: &[&str] = &[
    "css",
    "js",
    "sitecore",
    "api",
    "soap",
    "wffm",
    "_",
    "/media/",
    "/form/",
    "/clientevent/",
    "/index",
    "/shop",
    "/login",
];

/// Returns true if the path must not be normalized.
///
/// A path containing a dot (file extensions) or any exempt marker is left
/// alone. Matching is case-insensitive.
pub fn is_exempt(path: &str) -> bool {
    if path.contains('.') {
        return true;
    }
    let lower = path.to_ascii_lowercase();
    EXEMPT_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Normalize a request path.
///
/// Exempt paths are returned unchanged. For all others, in order:
/// lowercase, replace `+` and encoded spaces with `-`, collapse slash runs,
/// and strip a single trailing slash (the root path stays `/`).
///
/// Returns a borrowed value when the path is already canonical.
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if is_exempt(path) {
        return Cow::Borrowed(path);
    }

    let lowered = path.to_ascii_lowercase();
    let replaced = lowered.replace('+', "-").replace("%20", "-");

    let mut collapsed = String::with_capacity(replaced.len());
    let mut prev_slash = false;
    for c in replaced.chars() {
        if c == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        collapsed.push(c);
    }

    if collapsed.len() > 1 && collapsed.ends_with('/') {
        collapsed.pop();
    }

    if collapsed == path {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(collapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_collapses() {
        assert_eq!(normalize_path("/Foo//Bar/"), "/foo/bar");
        assert_eq!(normalize_path("/About-Us"), "/about-us");
    }

    #[test]
    fn test_plus_and_encoded_space_become_dash() {
        assert_eq!(normalize_path("/some+page"), "/some-page");
        assert_eq!(normalize_path("/some%20page"), "/some-page");
        assert_eq!(normalize_path("/Some%20Page+Here"), "/some-page-here");
    }

    #[test]
    fn test_root_path_is_preserved() {
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn test_trailing_slash_stripped_once() {
        assert_eq!(normalize_path("/foo/"), "/foo");
        // The slash run collapses first, then the single trailing slash goes.
        assert_eq!(normalize_path("/foo//"), "/foo");
    }

    #[test]
    fn test_idempotent() {
        for path in ["/Foo//Bar/", "/some+page", "/a/B/c/", "/", "/already-fine"] {
            let once = normalize_path(path).into_owned();
            let twice = normalize_path(&once).into_owned();
            assert_eq!(once, twice, "normalize must be idempotent for {path}");
        }
    }

    #[test]
    fn test_exempt_paths_unchanged() {
        for path in [
            "/styles/main.css",
            "/bundle.JS",
            "/Sitecore/Admin",
            "/API/v1/Thing",
            "/media/Images/Logo",
            "/Form/Contact",
            "/my_page",
            "/index",
            "/Shop/Cart/",
            "/login",
            "/file.PDF",
        ] {
            assert!(is_exempt(path), "{path} should be exempt");
            assert_eq!(normalize_path(path), path);
        }
    }

    #[test]
    fn test_non_exempt_detection() {
        assert!(!is_exempt("/about-us"));
        assert!(!is_exempt("/Foo//Bar/"));
    }
}
