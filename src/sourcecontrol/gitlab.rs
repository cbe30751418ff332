//! GitLab REST v4 implementation of the source control capability

use super::mr_creator::NewMergeRequest;
use super::types::{MergeRequest, Pipeline, Project, RepositoryFile};
use super::SourceControlClient;
use crate::domain::DependencyFile;
use crate::error::ApiError;
use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Default timeout for API requests (30 seconds)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("depbot/", env!("CARGO_PKG_VERSION"));

/// GitLab API client
///
/// Merge request operations are deliberately not retried at this layer;
/// the only retried call path is the pipeline wait in the auto-merge
/// controller.
pub struct GitLabClient {
    client: Client,
    token: String,
    host: String,
}

#[derive(Serialize)]
struct CreateBranchPayload<'a> {
    branch: &'a str,
    #[serde(rename = "ref")]
    ref_name: &'a str,
}

#[derive(Serialize)]
struct CommitAction<'a> {
    action: &'static str,
    file_path: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct CommitPayload<'a> {
    branch: &'a str,
    commit_message: &'a str,
    actions: Vec<CommitAction<'a>>,
}

#[derive(Serialize)]
struct CreateMergeRequestPayload<'a> {
    source_branch: &'a str,
    target_branch: &'a str,
    title: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct StateEventPayload {
    state_event: &'static str,
}

#[derive(Serialize)]
struct AcceptPayload {
    merge_when_pipeline_succeeds: bool,
    should_remove_source_branch: bool,
}

impl GitLabClient {
    /// Create a new client for the given GitLab host
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| ApiError::network("HTTP client", e.to_string()))?;

        Ok(Self {
            client,
            token: token.into(),
            host: host.into(),
        })
    }

    /// Base API endpoint of the instance, e.g. `https://gitlab.com/api/v4`
    pub fn endpoint(&self) -> String {
        format!("https://{}/api/v4", self.host)
    }

    /// Hostname this client talks to
    pub fn host(&self) -> &str {
        &self.host
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint(), path)
    }

    fn map_status(status: StatusCode, resource: &str) -> ApiError {
        match status {
            StatusCode::NOT_FOUND => ApiError::not_found(resource),
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => ApiError::forbidden(resource),
            other => ApiError::http(other.as_u16(), resource),
        }
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        resource: &str,
    ) -> Result<T, ApiError> {
        let response = request
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await
            .map_err(|e| ApiError::network(resource, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::map_status(status, resource));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::decode(resource, e.to_string()))
    }

    async fn send_no_body(
        &self,
        request: reqwest::RequestBuilder,
        resource: &str,
    ) -> Result<(), ApiError> {
        let response = request
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await
            .map_err(|e| ApiError::network(resource, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::map_status(status, resource));
        }
        Ok(())
    }
}

#[async_trait]
impl SourceControlClient for GitLabClient {
    async fn project(&self, path: &str) -> Result<Project, ApiError> {
        debug!(project = path, "fetching project");
        let url = self.api_url(&format!("/projects/{}", urlencoding::encode(path)));
        let resource = format!("project {}", path);
        self.send(self.client.get(&url), &resource).await
    }

    async fn file_content(
        &self,
        project_id: u64,
        file_path: &str,
        ref_name: &str,
    ) -> Result<String, ApiError> {
        debug!(project_id, file_path, ref_name, "fetching repository file");
        let url = self.api_url(&format!(
            "/projects/{}/repository/files/{}",
            project_id,
            urlencoding::encode(file_path)
        ));
        let resource = format!("file {}", file_path);
        let file: RepositoryFile = self
            .send(
                self.client.get(&url).query(&[("ref", ref_name)]),
                &resource,
            )
            .await?;

        // GitLab wraps base64 content; strip the line breaks before decoding
        let packed: String = file.content.split_whitespace().collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(packed)
            .map_err(|e| ApiError::decode(&resource, e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| ApiError::decode(&resource, e.to_string()))
    }

    async fn open_merge_requests(&self, project_id: u64) -> Result<Vec<MergeRequest>, ApiError> {
        let url = self.api_url(&format!("/projects/{}/merge_requests", project_id));
        let resource = format!("merge requests of project {}", project_id);
        self.send(
            self.client
                .get(&url)
                .query(&[("state", "opened"), ("per_page", "100")]),
            &resource,
        )
        .await
    }

    async fn create_branch(
        &self,
        project_id: u64,
        branch: &str,
        ref_name: &str,
    ) -> Result<(), ApiError> {
        debug!(project_id, branch, ref_name, "creating branch");
        let url = self.api_url(&format!("/projects/{}/repository/branches", project_id));
        let resource = format!("branch {}", branch);
        let payload = CreateBranchPayload { branch, ref_name };
        self.send_no_body(self.client.post(&url).json(&payload), &resource)
            .await
    }

    async fn delete_branch(&self, project_id: u64, branch: &str) -> Result<(), ApiError> {
        debug!(project_id, branch, "deleting branch");
        let url = self.api_url(&format!(
            "/projects/{}/repository/branches/{}",
            project_id,
            urlencoding::encode(branch)
        ));
        let resource = format!("branch {}", branch);
        self.send_no_body(self.client.delete(&url), &resource).await
    }

    async fn commit_files(
        &self,
        project_id: u64,
        branch: &str,
        message: &str,
        files: &[DependencyFile],
    ) -> Result<(), ApiError> {
        debug!(project_id, branch, files = files.len(), "committing files");
        let url = self.api_url(&format!("/projects/{}/repository/commits", project_id));
        let resource = format!("commit on {}", branch);
        let payload = CommitPayload {
            branch,
            commit_message: message,
            actions: files
                .iter()
                .map(|file| CommitAction {
                    action: "update",
                    file_path: &file.path,
                    content: &file.content,
                })
                .collect(),
        };
        self.send_no_body(self.client.post(&url).json(&payload), &resource)
            .await
    }

    async fn create_merge_request(
        &self,
        project_id: u64,
        request: &NewMergeRequest,
    ) -> Result<MergeRequest, ApiError> {
        debug!(
            project_id,
            source_branch = %request.source_branch,
            "creating merge request"
        );
        let url = self.api_url(&format!("/projects/{}/merge_requests", project_id));
        let resource = format!("merge request for {}", request.source_branch);
        let payload = CreateMergeRequestPayload {
            source_branch: &request.source_branch,
            target_branch: &request.target_branch,
            title: &request.title,
            description: &request.description,
        };
        self.send(self.client.post(&url).json(&payload), &resource)
            .await
    }

    async fn close_merge_request(&self, project_id: u64, iid: u64) -> Result<(), ApiError> {
        debug!(project_id, iid, "closing merge request");
        let url = self.api_url(&format!("/projects/{}/merge_requests/{}", project_id, iid));
        let resource = format!("merge request !{}", iid);
        let payload = StateEventPayload {
            state_event: "close",
        };
        self.send_no_body(self.client.put(&url).json(&payload), &resource)
            .await
    }

    async fn merge_request_pipelines(
        &self,
        project_id: u64,
        iid: u64,
    ) -> Result<Vec<Pipeline>, ApiError> {
        let url = self.api_url(&format!(
            "/projects/{}/merge_requests/{}/pipelines",
            project_id, iid
        ));
        let resource = format!("pipelines of merge request !{}", iid);
        self.send(self.client.get(&url), &resource).await
    }

    async fn pipeline(&self, project_id: u64, pipeline_id: u64) -> Result<Pipeline, ApiError> {
        let url = self.api_url(&format!("/projects/{}/pipelines/{}", project_id, pipeline_id));
        let resource = format!("pipeline {}", pipeline_id);
        self.send(self.client.get(&url), &resource).await
    }

    async fn accept_merge_request(&self, project_id: u64, iid: u64) -> Result<(), ApiError> {
        debug!(project_id, iid, "accepting merge request");
        let url = self.api_url(&format!(
            "/projects/{}/merge_requests/{}/merge",
            project_id, iid
        ));
        let resource = format!("merge of merge request !{}", iid);
        let payload = AcceptPayload {
            merge_when_pipeline_succeeds: true,
            should_remove_source_branch: true,
        };
        self.send_no_body(self.client.put(&url).json(&payload), &resource)
            .await
    }
}
