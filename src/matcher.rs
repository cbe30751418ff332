//! Dependency name matching shared by ignore, automerge and group rules
//!
//! Patterns are either exact names or a prefix followed by a trailing `*`.
//! There is no regex support and the wildcard is suffix-only.

/// Returns true if `name` matches any of the given patterns.
///
/// A pattern matches when it equals the name exactly, or when it ends
/// with `*` and the name starts with the part before the `*`. An empty
/// pattern list matches nothing.
pub fn matches_dependency<S: AsRef<str>>(name: &str, patterns: &[S]) -> bool {
    if patterns.iter().any(|pattern| pattern.as_ref() == name) {
        return true;
    }

    patterns
        .iter()
        .filter_map(|pattern| pattern.as_ref().strip_suffix('*'))
        .any(|prefix| name.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(matches_dependency("x", &["x"]));
        assert!(matches_dependency("lodash", &["react", "lodash"]));
    }

    #[test]
    fn test_exact_mismatch() {
        assert!(!matches_dependency("foo", &["bar"]));
        assert!(!matches_dependency("lodash", &["lodash.merge"]));
    }

    #[test]
    fn test_wildcard_prefix_match() {
        assert!(matches_dependency("foo-bar", &["foo-*"]));
        assert!(matches_dependency("lodash.merge", &["lodash*"]));
    }

    #[test]
    fn test_wildcard_prefix_mismatch() {
        assert!(!matches_dependency("express", &["lodash*"]));
    }

    #[test]
    fn test_wildcard_is_suffix_only() {
        // A leading `*` is not a wildcard, so only the literal string matches
        assert!(!matches_dependency("my-types", &["*-types"]));
        assert!(matches_dependency("*-types", &["*-types"]));
    }

    #[test]
    fn test_catch_all_matches_everything() {
        assert!(matches_dependency("anything", &["*"]));
        assert!(matches_dependency("", &["*"]));
    }

    #[test]
    fn test_empty_pattern_list_never_matches() {
        assert!(!matches_dependency("anything", &[] as &[&str]));
    }

    #[test]
    fn test_multiple_patterns_any_match_wins() {
        assert!(matches_dependency("react-dom", &["vue*", "react*", "ember"]));
    }
}
