//! PEP 503 distribution name normalization
//!
//! Registry lookups and name comparisons are case-insensitive and treat
//! `-`, `_` and `.` as equivalent separators. Wheel tag tokens are not
//! normalized; this applies to distribution names only.

use once_cell::sync::Lazy;
use regex::Regex;

static SEPARATOR_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-_.]+").expect("valid regex"));

/// Normalize a distribution name per PEP 503.
///
/// Runs of `-`, `_` and `.` collapse to a single `-` and the result is
/// lowercased. `Foo.Bar__baz` and `foo-bar-baz` normalize identically.
pub fn normalize_name(name: &str) -> String {
    SEPARATOR_RUN.replace_all(name, "-").to_lowercase()
}

/// Compare two distribution names under normalization.
pub fn names_equal(a: &str, b: &str) -> bool {
    normalize_name(a) == normalize_name(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases() {
        assert_eq!(normalize_name("Django"), "django");
    }

    #[test]
    fn test_normalize_collapses_separators() {
        assert_eq!(normalize_name("foo.bar__baz"), "foo-bar-baz");
        assert_eq!(normalize_name("foo-_.bar"), "foo-bar");
        assert_eq!(normalize_name("typing_extensions"), "typing-extensions");
    }

    #[test]
    fn test_normalize_idempotent() {
        let once = normalize_name("Foo.Bar__Baz");
        assert_eq!(normalize_name(&once), once);
    }

    #[test]
    fn test_names_equal() {
        assert!(names_equal("Typing_Extensions", "typing-extensions"));
        assert!(!names_equal("typing-extensions", "typing"));
    }
}
