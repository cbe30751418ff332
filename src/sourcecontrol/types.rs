//! Source control API entities

use serde::{Deserialize, Serialize};

/// A hosted project (repository)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    /// Numeric project id used by the API
    pub id: u64,
    /// Full `namespace/project` path
    pub path_with_namespace: String,
    /// Default branch of the repository
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// Author of a merge request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Author {
    /// Account username
    pub username: String,
}

/// An open merge request as returned by the source control API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MergeRequest {
    /// Project-scoped merge request number
    pub iid: u64,
    /// Merge request title
    pub title: String,
    /// Merge request description body
    #[serde(default)]
    pub description: String,
    /// Branch the merge request was created from
    pub source_branch: String,
    /// Account that created the merge request
    pub author: Author,
    /// Web URL of the merge request
    #[serde(default)]
    pub web_url: String,
}

/// A CI pipeline attached to a merge request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Pipeline {
    /// Pipeline id
    pub id: u64,
    /// Pipeline status, e.g. `pending`, `running`, `success`, `failed`
    pub status: String,
}

impl Pipeline {
    /// Returns true once the pipeline has reached a terminal status
    pub fn is_finished(&self) -> bool {
        matches!(
            self.status.as_str(),
            "success" | "failed" | "canceled" | "skipped"
        )
    }
}

/// A repository file fetched through the API, content base64 encoded
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryFile {
    /// Path of the file inside the repository
    pub file_path: String,
    /// Base64 encoded file content
    pub content: String,
}

/// Location of a repository the resolution engine should operate on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySource {
    /// Source control provider, e.g. `gitlab`
    pub provider: String,
    /// Hostname of the source control instance
    pub hostname: String,
    /// Base API endpoint of the instance
    pub api_endpoint: String,
    /// Full `namespace/project` path
    pub repo: String,
    /// Directory within the repository the dependency files live in
    pub directory: String,
    /// Branch to operate on; `None` means the default branch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}
