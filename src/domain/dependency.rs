//! Dependency information structures

use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved package dependency as reported by the resolution engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Package name
    pub name: String,
    /// Currently installed or required version
    pub version: String,
    /// Whether the dependency is declared directly by the project manifest
    #[serde(default)]
    pub top_level: bool,
}

impl Dependency {
    /// Creates a new top-level dependency
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            top_level: true,
        }
    }

    /// Creates a new transitive dependency
    pub fn transitive(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            top_level: false,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.version)
    }
}

/// A proposed new version for a dependency, computed by the resolution engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateUpdate {
    /// Package name
    pub name: String,
    /// Version the dependency would be updated to
    pub version: String,
    /// Version the dependency is currently at
    pub previous_version: String,
    /// Source repository URL of the package, when the registry exposes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl CandidateUpdate {
    /// Creates a new candidate update
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        previous_version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            previous_version: previous_version.into(),
            source_url: None,
        }
    }

    /// Sets the source repository URL (builder pattern)
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }
}

/// A dependency file fetched from or written back to the repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyFile {
    /// Path of the file relative to the repository root
    pub path: String,
    /// Full file content
    pub content: String,
}

impl DependencyFile {
    /// Creates a new dependency file
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_new_is_top_level() {
        let dep = Dependency::new("lodash", "4.17.20");
        assert_eq!(dep.name, "lodash");
        assert_eq!(dep.version, "4.17.20");
        assert!(dep.top_level);
    }

    #[test]
    fn test_dependency_transitive() {
        let dep = Dependency::transitive("minimist", "1.2.5");
        assert!(!dep.top_level);
    }

    #[test]
    fn test_dependency_display() {
        let dep = Dependency::new("left-pad", "1.0.0");
        assert_eq!(format!("{}", dep), "left-pad (1.0.0)");
    }

    #[test]
    fn test_candidate_update_new() {
        let update = CandidateUpdate::new("left-pad", "1.0.1", "1.0.0");
        assert_eq!(update.version, "1.0.1");
        assert_eq!(update.previous_version, "1.0.0");
        assert!(update.source_url.is_none());
    }

    #[test]
    fn test_candidate_update_with_source_url() {
        let update = CandidateUpdate::new("left-pad", "1.0.1", "1.0.0")
            .with_source_url("https://github.com/left-pad/left-pad");
        assert_eq!(
            update.source_url.as_deref(),
            Some("https://github.com/left-pad/left-pad")
        );
    }

    #[test]
    fn test_serde_dependency_round_trip() {
        let dep = Dependency::new("serde", "1.0.200");
        let json = serde_json::to_string(&dep).unwrap();
        let parsed: Dependency = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, dep);
    }

    #[test]
    fn test_serde_dependency_top_level_defaults_to_false() {
        let parsed: Dependency =
            serde_json::from_str(r#"{"name":"rake","version":"13.0.0"}"#).unwrap();
        assert!(!parsed.top_level);
    }
}
