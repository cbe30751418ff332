//! Auto-merge control for freshly created merge requests
//!
//! CI pipelines appear asynchronously after a merge request is created.
//! The controller waits for them with a bounded number of attempts and a
//! fixed delay, then the caller arms merge-on-pipeline-success. Running
//! out of attempts abandons auto-merge for the request; it is not an
//! error.

use crate::error::ApiError;
use crate::sourcecontrol::{Pipeline, SourceControlClient};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Attempts made before giving up on pipelines appearing
const MAX_ATTEMPTS: u32 = 3;

/// Fixed delay between attempts
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Poll period of the pipeline completion wait
const COMPLETION_POLL_DELAY: Duration = Duration::from_secs(30);

/// Waits for pipelines on a merge request and arms auto-merge
pub struct AutoMergeController<'a, S: SourceControlClient> {
    client: &'a S,
    max_attempts: u32,
    retry_delay: Duration,
}

impl<'a, S: SourceControlClient> AutoMergeController<'a, S> {
    /// Create a controller with the default retry policy
    pub fn new(client: &'a S) -> Self {
        Self {
            client,
            max_attempts: MAX_ATTEMPTS,
            retry_delay: RETRY_DELAY,
        }
    }

    /// Override the retry policy (for testing)
    pub fn with_retry_policy(mut self, max_attempts: u32, retry_delay: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.retry_delay = retry_delay;
        self
    }

    /// Wait for the merge request's pipelines to appear.
    ///
    /// An empty pipeline list and an API failure both count as a failed
    /// attempt. Returns `None` once the attempts are exhausted.
    pub async fn wait_for_pipelines(
        &self,
        project_id: u64,
        merge_request_iid: u64,
    ) -> Option<Vec<Pipeline>> {
        for attempt in 1..=self.max_attempts {
            match self
                .client
                .merge_request_pipelines(project_id, merge_request_iid)
                .await
            {
                Ok(pipelines) if !pipelines.is_empty() => return Some(pipelines),
                Ok(_) => {
                    warn!(
                        merge_request = merge_request_iid,
                        attempt,
                        attempts_left = self.max_attempts - attempt,
                        "no pipelines yet"
                    );
                }
                Err(e) => {
                    warn!(
                        merge_request = merge_request_iid,
                        attempt,
                        attempts_left = self.max_attempts - attempt,
                        error = %e,
                        "failed to list pipelines"
                    );
                }
            }
            if attempt < self.max_attempts {
                sleep(self.retry_delay).await;
            }
        }
        info!(
            merge_request = merge_request_iid,
            "giving up waiting for pipelines, auto-merge skipped"
        );
        None
    }

    /// Poll the given pipelines until every one reaches a terminal status.
    ///
    /// This wait has no upper bound: a pipeline that never finishes keeps
    /// the loop alive forever, which is why callers must opt in to it
    /// explicitly. Errors while polling a pipeline end its wait.
    pub async fn wait_for_pipeline_completion(
        &self,
        project_id: u64,
        pipelines: &[Pipeline],
    ) -> Result<(), ApiError> {
        for pipeline in pipelines {
            loop {
                let current = self.client.pipeline(project_id, pipeline.id).await?;
                if current.is_finished() {
                    break;
                }
                info!(
                    pipeline = current.id,
                    status = %current.status,
                    "pipeline not yet complete"
                );
                sleep(COMPLETION_POLL_DELAY).await;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DependencyFile;
    use crate::sourcecontrol::{MergeRequest, NewMergeRequest, Project};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns scripted pipeline list responses, one per call
    struct FakePipelineClient {
        responses: Mutex<Vec<Result<Vec<Pipeline>, ApiError>>>,
        calls: Mutex<u32>,
    }

    impl FakePipelineClient {
        fn new(responses: Vec<Result<Vec<Pipeline>, ApiError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    fn pipeline(id: u64, status: &str) -> Pipeline {
        Pipeline {
            id,
            status: status.to_string(),
        }
    }

    #[async_trait]
    impl SourceControlClient for FakePipelineClient {
        async fn project(&self, _path: &str) -> Result<Project, ApiError> {
            unreachable!("not used by the controller")
        }

        async fn file_content(
            &self,
            _project_id: u64,
            _file_path: &str,
            _ref_name: &str,
        ) -> Result<String, ApiError> {
            unreachable!("not used by the controller")
        }

        async fn open_merge_requests(
            &self,
            _project_id: u64,
        ) -> Result<Vec<MergeRequest>, ApiError> {
            unreachable!("not used by the controller")
        }

        async fn create_branch(
            &self,
            _project_id: u64,
            _branch: &str,
            _ref_name: &str,
        ) -> Result<(), ApiError> {
            unreachable!("not used by the controller")
        }

        async fn delete_branch(&self, _project_id: u64, _branch: &str) -> Result<(), ApiError> {
            unreachable!("not used by the controller")
        }

        async fn commit_files(
            &self,
            _project_id: u64,
            _branch: &str,
            _message: &str,
            _files: &[DependencyFile],
        ) -> Result<(), ApiError> {
            unreachable!("not used by the controller")
        }

        async fn create_merge_request(
            &self,
            _project_id: u64,
            _request: &NewMergeRequest,
        ) -> Result<MergeRequest, ApiError> {
            unreachable!("not used by the controller")
        }

        async fn close_merge_request(&self, _project_id: u64, _iid: u64) -> Result<(), ApiError> {
            unreachable!("not used by the controller")
        }

        async fn merge_request_pipelines(
            &self,
            _project_id: u64,
            _iid: u64,
        ) -> Result<Vec<Pipeline>, ApiError> {
            *self.calls.lock().unwrap() += 1;
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Ok(Vec::new());
            }
            responses.remove(0)
        }

        async fn pipeline(&self, _project_id: u64, pipeline_id: u64) -> Result<Pipeline, ApiError> {
            *self.calls.lock().unwrap() += 1;
            Ok(pipeline(pipeline_id, "success"))
        }

        async fn accept_merge_request(&self, _project_id: u64, _iid: u64) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn fast_controller(client: &FakePipelineClient) -> AutoMergeController<'_, FakePipelineClient> {
        AutoMergeController::new(client).with_retry_policy(3, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_abandons_after_three_empty_attempts() {
        let client = FakePipelineClient::new(vec![Ok(Vec::new()), Ok(Vec::new()), Ok(Vec::new())]);
        let controller = fast_controller(&client);
        let result = controller.wait_for_pipelines(1, 10).await;
        assert!(result.is_none());
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn test_returns_pipelines_on_second_attempt() {
        let client = FakePipelineClient::new(vec![
            Ok(Vec::new()),
            Ok(vec![pipeline(1, "pending")]),
        ]);
        let controller = fast_controller(&client);
        let result = controller.wait_for_pipelines(1, 10).await;
        assert_eq!(result.unwrap().len(), 1);
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_api_errors_count_as_failed_attempts() {
        let client = FakePipelineClient::new(vec![
            Err(ApiError::http(500, "pipelines")),
            Ok(vec![pipeline(1, "running")]),
        ]);
        let controller = fast_controller(&client);
        let result = controller.wait_for_pipelines(1, 10).await;
        assert!(result.is_some());
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_abandons_after_persistent_errors() {
        let client = FakePipelineClient::new(vec![
            Err(ApiError::http(500, "pipelines")),
            Err(ApiError::http(500, "pipelines")),
            Err(ApiError::http(500, "pipelines")),
        ]);
        let controller = fast_controller(&client);
        assert!(controller.wait_for_pipelines(1, 10).await.is_none());
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn test_completion_wait_returns_for_finished_pipelines() {
        let client = FakePipelineClient::new(Vec::new());
        let controller = fast_controller(&client);
        let pipelines = vec![pipeline(1, "running"), pipeline(2, "running")];
        controller
            .wait_for_pipeline_completion(1, &pipelines)
            .await
            .unwrap();
        assert_eq!(client.calls(), 2);
    }
}
