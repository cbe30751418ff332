//! Source control capability used by the orchestrator
//!
//! This module provides:
//! - The `SourceControlClient` trait every provider implements
//! - A GitLab REST v4 implementation over reqwest
//! - A merge request creator that pushes a branch and opens the request
//! - Repository URL resolution for standard and self-hosted instances

mod gitlab;
mod mr_creator;
mod types;
mod url;

pub use gitlab::GitLabClient;
pub use mr_creator::{MergeRequestCreator, NewMergeRequest};
pub use types::{Author, MergeRequest, Pipeline, Project, RepositoryFile, RepositorySource};
pub use url::{CustomHostUrlResolver, RepositoryUrlResolver, StandardUrlResolver};

use crate::domain::DependencyFile;
use crate::error::ApiError;
use async_trait::async_trait;

/// Trait for source control providers
#[async_trait]
pub trait SourceControlClient: Send + Sync {
    /// Look up a project by its full `namespace/project` path
    async fn project(&self, path: &str) -> Result<Project, ApiError>;

    /// Fetch a repository file and return its decoded content
    async fn file_content(
        &self,
        project_id: u64,
        file_path: &str,
        ref_name: &str,
    ) -> Result<String, ApiError>;

    /// List the project's currently open merge requests
    async fn open_merge_requests(&self, project_id: u64) -> Result<Vec<MergeRequest>, ApiError>;

    /// Create a branch pointing at the given ref
    async fn create_branch(
        &self,
        project_id: u64,
        branch: &str,
        ref_name: &str,
    ) -> Result<(), ApiError>;

    /// Delete a branch
    async fn delete_branch(&self, project_id: u64, branch: &str) -> Result<(), ApiError>;

    /// Commit a set of updated files onto a branch
    async fn commit_files(
        &self,
        project_id: u64,
        branch: &str,
        message: &str,
        files: &[DependencyFile],
    ) -> Result<(), ApiError>;

    /// Open a merge request
    async fn create_merge_request(
        &self,
        project_id: u64,
        request: &NewMergeRequest,
    ) -> Result<MergeRequest, ApiError>;

    /// Close an open merge request
    async fn close_merge_request(&self, project_id: u64, iid: u64) -> Result<(), ApiError>;

    /// List the pipelines attached to a merge request
    async fn merge_request_pipelines(
        &self,
        project_id: u64,
        iid: u64,
    ) -> Result<Vec<Pipeline>, ApiError>;

    /// Fetch a single pipeline
    async fn pipeline(&self, project_id: u64, pipeline_id: u64) -> Result<Pipeline, ApiError>;

    /// Accept a merge request so it merges once its pipeline succeeds,
    /// deleting the source branch afterwards
    async fn accept_merge_request(&self, project_id: u64, iid: u64) -> Result<(), ApiError>;
}
