//! Merge request creation capability
//!
//! Pushes a branch with the patched dependency files and opens the merge
//! request. The branch name is always supplied by the caller, so group
//! branches are an explicit input rather than an after-the-fact override.

use super::{MergeRequest, SourceControlClient};
use crate::domain::DependencyFile;
use crate::error::ApiError;
use tracing::{debug, info};

/// Parameters for opening a merge request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMergeRequest {
    /// Branch the merge request is created from
    pub source_branch: String,
    /// Branch the merge request targets
    pub target_branch: String,
    /// Merge request title
    pub title: String,
    /// Merge request description body
    pub description: String,
}

/// Creates merge requests for a project from a known base commit
pub struct MergeRequestCreator<'a, S: SourceControlClient> {
    client: &'a S,
    project_id: u64,
    base_commit: String,
    target_branch: String,
}

impl<'a, S: SourceControlClient> MergeRequestCreator<'a, S> {
    /// Create a new merge request creator
    pub fn new(
        client: &'a S,
        project_id: u64,
        base_commit: impl Into<String>,
        target_branch: impl Into<String>,
    ) -> Self {
        Self {
            client,
            project_id,
            base_commit: base_commit.into(),
            target_branch: target_branch.into(),
        }
    }

    /// Push `files` to `source_branch` and open a merge request.
    ///
    /// Returns `None` when an open merge request already exists for the
    /// branch; the existing request is left untouched.
    pub async fn create(
        &self,
        source_branch: &str,
        title: &str,
        description: &str,
        commit_message: &str,
        files: &[DependencyFile],
    ) -> Result<Option<MergeRequest>, ApiError> {
        let open = self.client.open_merge_requests(self.project_id).await?;
        if open.iter().any(|mr| mr.source_branch == source_branch) {
            debug!(source_branch, "open merge request already exists");
            return Ok(None);
        }

        match self
            .client
            .create_branch(self.project_id, source_branch, &self.base_commit)
            .await
        {
            Ok(()) => {}
            // The branch can be left over from an interrupted earlier run
            Err(ApiError::Http { status: 400, .. }) => {
                debug!(source_branch, "branch already exists, reusing it");
            }
            Err(e) => return Err(e),
        }

        self.client
            .commit_files(self.project_id, source_branch, commit_message, files)
            .await?;

        let request = NewMergeRequest {
            source_branch: source_branch.to_string(),
            target_branch: self.target_branch.clone(),
            title: title.to_string(),
            description: description.to_string(),
        };
        let created = self
            .client
            .create_merge_request(self.project_id, &request)
            .await?;
        info!(iid = created.iid, source_branch, "merge request created");
        Ok(Some(created))
    }
}
