//! Integration tests for depbot
//!
//! These tests drive the orchestrator end-to-end against in-memory
//! source control and resolution engine doubles, verifying:
//! - Group merge request creation and reconciliation
//! - Stale and obsolete merge request cleanup
//! - Schedule and merge request limit gating
//! - Auto-merge arming

use async_trait::async_trait;
use chrono::NaiveDate;
use depbot::context::RunContext;
use depbot::domain::{CandidateUpdate, Dependency, DependencyFile};
use depbot::error::{ApiError, ResolverError};
use depbot::orchestrator::Orchestrator;
use depbot::resolver::{FetchedFiles, ResolutionEngine, UnlockStrategy};
use depbot::sourcecontrol::{
    Author, MergeRequest, NewMergeRequest, Pipeline, Project, RepositorySource,
    SourceControlClient,
};
use depbot::config::PackageManager;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const BOT: &str = "dependabot";

/// A Tuesday, so daily schedules are due and weekly ones are not
const TUESDAY: (i32, u32, u32) = (2021, 3, 16);

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(TUESDAY.0, TUESDAY.1, TUESDAY.2).unwrap()
}

struct GitLabState {
    config_document: Option<String>,
    open: Vec<MergeRequest>,
    next_iid: u64,
    created: Vec<MergeRequest>,
    closed: Vec<u64>,
    deleted_branches: Vec<String>,
    commits: Vec<(String, String)>,
    accepted: Vec<u64>,
    pipeline_list_calls: u32,
}

/// In-memory GitLab double shared between the test and the orchestrator
#[derive(Clone)]
struct FakeGitLab {
    state: Arc<Mutex<GitLabState>>,
}

impl FakeGitLab {
    fn new(config_document: Option<&str>, open: Vec<MergeRequest>) -> Self {
        Self {
            state: Arc::new(Mutex::new(GitLabState {
                config_document: config_document.map(str::to_string),
                open,
                next_iid: 100,
                created: Vec::new(),
                closed: Vec::new(),
                deleted_branches: Vec::new(),
                commits: Vec::new(),
                accepted: Vec::new(),
                pipeline_list_calls: 0,
            })),
        }
    }

    fn created(&self) -> Vec<MergeRequest> {
        self.state.lock().unwrap().created.clone()
    }

    fn closed(&self) -> Vec<u64> {
        self.state.lock().unwrap().closed.clone()
    }

    fn deleted_branches(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted_branches.clone()
    }

    fn accepted(&self) -> Vec<u64> {
        self.state.lock().unwrap().accepted.clone()
    }

    fn commits(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().commits.clone()
    }

    fn pipeline_list_calls(&self) -> u32 {
        self.state.lock().unwrap().pipeline_list_calls
    }
}

fn project() -> Project {
    Project {
        id: 1,
        path_with_namespace: "acme/widgets".to_string(),
        default_branch: Some("main".to_string()),
    }
}

fn bot_mr(iid: u64, title: &str, source_branch: &str) -> MergeRequest {
    MergeRequest {
        iid,
        title: title.to_string(),
        description: String::new(),
        source_branch: source_branch.to_string(),
        author: Author {
            username: BOT.to_string(),
        },
        web_url: String::new(),
    }
}

#[async_trait]
impl SourceControlClient for FakeGitLab {
    async fn project(&self, path: &str) -> Result<Project, ApiError> {
        assert_eq!(path, "acme/widgets");
        Ok(project())
    }

    async fn file_content(
        &self,
        _project_id: u64,
        file_path: &str,
        ref_name: &str,
    ) -> Result<String, ApiError> {
        assert_eq!(ref_name, "main");
        let state = self.state.lock().unwrap();
        state
            .config_document
            .clone()
            .ok_or_else(|| ApiError::not_found(format!("file {}", file_path)))
    }

    async fn open_merge_requests(&self, _project_id: u64) -> Result<Vec<MergeRequest>, ApiError> {
        Ok(self.state.lock().unwrap().open.clone())
    }

    async fn create_branch(
        &self,
        _project_id: u64,
        _branch: &str,
        _ref_name: &str,
    ) -> Result<(), ApiError> {
        Ok(())
    }

    async fn delete_branch(&self, _project_id: u64, branch: &str) -> Result<(), ApiError> {
        self.state
            .lock()
            .unwrap()
            .deleted_branches
            .push(branch.to_string());
        Ok(())
    }

    async fn commit_files(
        &self,
        _project_id: u64,
        branch: &str,
        message: &str,
        _files: &[DependencyFile],
    ) -> Result<(), ApiError> {
        self.state
            .lock()
            .unwrap()
            .commits
            .push((branch.to_string(), message.to_string()));
        Ok(())
    }

    async fn create_merge_request(
        &self,
        _project_id: u64,
        request: &NewMergeRequest,
    ) -> Result<MergeRequest, ApiError> {
        let mut state = self.state.lock().unwrap();
        let iid = state.next_iid;
        state.next_iid += 1;
        let mut merge_request = bot_mr(iid, &request.title, &request.source_branch);
        merge_request.description = request.description.clone();
        state.open.push(merge_request.clone());
        state.created.push(merge_request.clone());
        Ok(merge_request)
    }

    async fn close_merge_request(&self, _project_id: u64, iid: u64) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.closed.push(iid);
        state.open.retain(|mr| mr.iid != iid);
        Ok(())
    }

    async fn merge_request_pipelines(
        &self,
        _project_id: u64,
        _iid: u64,
    ) -> Result<Vec<Pipeline>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.pipeline_list_calls += 1;
        Ok(vec![Pipeline {
            id: 7,
            status: "pending".to_string(),
        }])
    }

    async fn pipeline(&self, _project_id: u64, pipeline_id: u64) -> Result<Pipeline, ApiError> {
        Ok(Pipeline {
            id: pipeline_id,
            status: "success".to_string(),
        })
    }

    async fn accept_merge_request(&self, _project_id: u64, iid: u64) -> Result<(), ApiError> {
        self.state.lock().unwrap().accepted.push(iid);
        Ok(())
    }
}

struct ResolverState {
    dependencies: Vec<Dependency>,
    up_to_date: Vec<String>,
    updates: HashMap<String, CandidateUpdate>,
    fetch_calls: u32,
}

/// Scripted resolution engine double
#[derive(Clone)]
struct FakeResolver {
    state: Arc<Mutex<ResolverState>>,
}

impl FakeResolver {
    fn new(dependencies: Vec<Dependency>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ResolverState {
                dependencies,
                up_to_date: Vec::new(),
                updates: HashMap::new(),
                fetch_calls: 0,
            })),
        }
    }

    fn with_update(self, name: &str, from: &str, to: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .updates
            .insert(name.to_string(), CandidateUpdate::new(name, to, from));
        self
    }

    fn with_up_to_date(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .up_to_date
            .push(name.to_string());
        self
    }

    fn fetch_calls(&self) -> u32 {
        self.state.lock().unwrap().fetch_calls
    }
}

#[async_trait]
impl ResolutionEngine for FakeResolver {
    async fn fetch_files(
        &self,
        _package_manager: PackageManager,
        _source: &RepositorySource,
    ) -> Result<FetchedFiles, ResolverError> {
        let mut state = self.state.lock().unwrap();
        state.fetch_calls += 1;
        Ok(FetchedFiles {
            files: vec![DependencyFile::new("package.json", "{}")],
            commit: "abc123".to_string(),
        })
    }

    async fn parse_dependencies(
        &self,
        _package_manager: PackageManager,
        _source: &RepositorySource,
        _files: &[DependencyFile],
    ) -> Result<Vec<Dependency>, ResolverError> {
        Ok(self.state.lock().unwrap().dependencies.clone())
    }

    async fn up_to_date(
        &self,
        _package_manager: PackageManager,
        dependency: &Dependency,
        _files: &[DependencyFile],
    ) -> Result<bool, ResolverError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .up_to_date
            .contains(&dependency.name))
    }

    async fn can_update(
        &self,
        _package_manager: PackageManager,
        dependency: &Dependency,
        _files: &[DependencyFile],
        strategy: UnlockStrategy,
    ) -> Result<bool, ResolverError> {
        let state = self.state.lock().unwrap();
        Ok(strategy == UnlockStrategy::Own && state.updates.contains_key(&dependency.name))
    }

    async fn updated_dependencies(
        &self,
        _package_manager: PackageManager,
        dependency: &Dependency,
        _files: &[DependencyFile],
        _strategy: UnlockStrategy,
    ) -> Result<Vec<CandidateUpdate>, ResolverError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .updates
            .get(&dependency.name)
            .cloned()
            .into_iter()
            .collect())
    }

    async fn updated_files(
        &self,
        _package_manager: PackageManager,
        _updates: &[CandidateUpdate],
        files: &[DependencyFile],
    ) -> Result<Vec<DependencyFile>, ResolverError> {
        Ok(files.to_vec())
    }
}

fn run_context(mr_limit: usize) -> RunContext {
    RunContext {
        organization: "acme".to_string(),
        host: "gitlab.example.com".to_string(),
        repository: "acme/widgets".to_string(),
        mr_limit,
        bot_username: BOT.to_string(),
        config_path: ".dependabot/config.yml".to_string(),
        wait_for_pipeline_completion: false,
        credentials: Vec::new(),
    }
}

fn orchestrator(
    client: &FakeGitLab,
    resolver: &FakeResolver,
    mr_limit: usize,
) -> Orchestrator<FakeGitLab, FakeResolver> {
    Orchestrator::new(run_context(mr_limit), client.clone(), resolver.clone()).with_today(today())
}

const CATCH_ALL_CONFIG: &str = r#"
update_configs:
  - package_manager: javascript
    directory: "/"
    update_schedule: daily
"#;

mod merge_request_creation {
    use super::*;

    #[tokio::test]
    async fn test_group_merge_request_for_multiple_updates() {
        let client = FakeGitLab::new(Some(CATCH_ALL_CONFIG), Vec::new());
        let resolver = FakeResolver::new(vec![
            Dependency::new("axios", "0.21.0"),
            Dependency::new("lodash", "4.17.20"),
        ])
        .with_update("axios", "0.21.0", "0.21.1")
        .with_update("lodash", "4.17.20", "4.17.21");

        orchestrator(&client, &resolver, 5).run().await;

        let created = client.created();
        assert_eq!(created.len(), 1, "exactly one group merge request");
        assert_eq!(created[0].title, "Bump dependencies");
        assert_eq!(
            created[0].source_branch,
            "dependabot/npm_and_yarn/dependencies"
        );
        assert!(created[0].description.contains("Bumps `axios` from 0.21.0 to 0.21.1."));
        assert!(created[0]
            .description
            .contains("Bumps `lodash` from 4.17.20 to 4.17.21."));

        let commits = client.commits();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].0, "dependabot/npm_and_yarn/dependencies");
        assert!(commits[0].1.starts_with("Bump dependencies"));

        // No automerge rule configured, so pipelines are never consulted
        assert_eq!(client.pipeline_list_calls(), 0);
        assert!(client.accepted().is_empty());
    }

    #[tokio::test]
    async fn test_single_update_in_catch_all_group_without_prior_request() {
        // One updated dependency and no stale request to replace: the
        // reconciler reports nothing to do
        let client = FakeGitLab::new(Some(CATCH_ALL_CONFIG), Vec::new());
        let resolver = FakeResolver::new(vec![Dependency::new("lodash", "4.17.20")])
            .with_update("lodash", "4.17.20", "4.17.21");

        orchestrator(&client, &resolver, 5).run().await;

        assert!(client.created().is_empty());
        assert!(client.closed().is_empty());
    }

    #[tokio::test]
    async fn test_stale_single_package_request_is_replaced() {
        let config = r#"
update_configs:
  - package_manager: javascript
    directory: "/"
    update_schedule: daily
    group_updates:
      - match:
          dependency_name: "react*"
"#;
        let stale = bot_mr(
            9,
            "Bump left-pad from 1.0.0 to 1.0.0",
            "dependabot/npm_and_yarn/left-pad-1.0.0",
        );
        let client = FakeGitLab::new(Some(config), vec![stale]);
        let resolver = FakeResolver::new(vec![Dependency::new("left-pad", "1.0.0")])
            .with_update("left-pad", "1.0.0", "1.0.1");

        orchestrator(&client, &resolver, 5).run().await;

        assert_eq!(client.closed(), vec![9]);
        assert_eq!(
            client.deleted_branches(),
            vec!["dependabot/npm_and_yarn/left-pad-1.0.0"]
        );
        let created = client.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].title, "Bump left-pad from 1.0.0 to 1.0.1");
        assert_eq!(
            created[0].source_branch,
            "dependabot/npm_and_yarn/left-pad-1.0.1"
        );
    }

    #[tokio::test]
    async fn test_matching_group_request_is_kept() {
        let mut existing = bot_mr(12, "Bump dependencies", "dependabot/npm_and_yarn/dependencies");
        existing.description = "Bumps `axios` from 0.21.0 to 0.21.1.\n\nBumps `lodash` from 4.17.20 to 4.17.21.".to_string();
        let client = FakeGitLab::new(Some(CATCH_ALL_CONFIG), vec![existing]);
        let resolver = FakeResolver::new(vec![
            Dependency::new("axios", "0.21.0"),
            Dependency::new("lodash", "4.17.20"),
        ])
        .with_update("axios", "0.21.0", "0.21.1")
        .with_update("lodash", "4.17.20", "4.17.21");

        orchestrator(&client, &resolver, 5).run().await;

        // The open group request still describes the planned updates
        assert!(client.created().is_empty());
        assert!(client.closed().is_empty());
    }

    #[tokio::test]
    async fn test_drifted_group_request_is_recreated() {
        let mut existing = bot_mr(12, "Bump dependencies", "dependabot/npm_and_yarn/dependencies");
        existing.description = "Bumps `lodash` from 4.17.20 to 4.17.21.".to_string();
        let client = FakeGitLab::new(Some(CATCH_ALL_CONFIG), vec![existing]);
        let resolver = FakeResolver::new(vec![
            Dependency::new("axios", "0.21.0"),
            Dependency::new("lodash", "4.17.20"),
        ])
        .with_update("axios", "0.21.0", "0.21.1")
        .with_update("lodash", "4.17.20", "4.17.21");

        orchestrator(&client, &resolver, 5).run().await;

        // axios is not mentioned by the open request, so it is replaced
        assert_eq!(client.closed(), vec![12]);
        let created = client.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].title, "Bump dependencies");
        assert_eq!(
            created[0].source_branch,
            "dependabot/npm_and_yarn/dependencies"
        );
    }

    #[tokio::test]
    async fn test_obsolete_request_closed_when_dependency_becomes_current() {
        let obsolete = bot_mr(
            4,
            "Bump lodash from 4.17.20 to 4.17.21",
            "dependabot/npm_and_yarn/lodash-4.17.21",
        );
        let client = FakeGitLab::new(Some(CATCH_ALL_CONFIG), vec![obsolete]);
        let resolver = FakeResolver::new(vec![Dependency::new("lodash", "4.17.21")])
            .with_up_to_date("lodash");

        orchestrator(&client, &resolver, 5).run().await;

        assert_eq!(client.closed(), vec![4]);
        assert!(client.created().is_empty());
    }
}

mod gating {
    use super::*;

    #[tokio::test]
    async fn test_weekly_schedule_skips_off_days() {
        let config = r#"
update_configs:
  - package_manager: javascript
    update_schedule: weekly
"#;
        let client = FakeGitLab::new(Some(config), Vec::new());
        let resolver = FakeResolver::new(vec![Dependency::new("lodash", "4.17.20")])
            .with_update("lodash", "4.17.20", "4.17.21");

        // Today is a Tuesday
        orchestrator(&client, &resolver, 5).run().await;

        assert_eq!(resolver.fetch_calls(), 0);
        assert!(client.created().is_empty());
    }

    #[tokio::test]
    async fn test_open_request_limit_skips_entry() {
        let open = vec![
            bot_mr(1, "Bump a from 1 to 2", "dependabot/npm_and_yarn/a-2"),
            bot_mr(2, "Bump b from 1 to 2", "dependabot/npm_and_yarn/b-2"),
        ];
        let client = FakeGitLab::new(Some(CATCH_ALL_CONFIG), open);
        let resolver = FakeResolver::new(vec![Dependency::new("lodash", "4.17.20")])
            .with_update("lodash", "4.17.20", "4.17.21");

        orchestrator(&client, &resolver, 2).run().await;

        assert_eq!(resolver.fetch_calls(), 0);
        assert!(client.created().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_entry_does_not_abort_the_run() {
        let config = r#"
update_configs:
  - package_manager: fortran
    update_schedule: daily
  - package_manager: javascript
    update_schedule: daily
"#;
        let client = FakeGitLab::new(Some(config), Vec::new());
        let resolver = FakeResolver::new(vec![
            Dependency::new("axios", "0.21.0"),
            Dependency::new("lodash", "4.17.20"),
        ])
        .with_update("axios", "0.21.0", "0.21.1")
        .with_update("lodash", "4.17.20", "4.17.21");

        orchestrator(&client, &resolver, 5).run().await;

        // The second entry was still processed
        assert_eq!(resolver.fetch_calls(), 1);
        assert_eq!(client.created().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_configuration_file_is_recoverable() {
        let client = FakeGitLab::new(None, Vec::new());
        let resolver = FakeResolver::new(Vec::new());

        orchestrator(&client, &resolver, 5).run().await;

        assert_eq!(resolver.fetch_calls(), 0);
        assert!(client.created().is_empty());
    }
}

mod auto_merge {
    use super::*;

    const AUTOMERGE_ALL_CONFIG: &str = r#"
update_configs:
  - package_manager: javascript
    update_schedule: daily
    automerged_updates:
      - match:
          dependency_name: "*"
          update_type: "all"
"#;

    #[tokio::test]
    async fn test_automerge_armed_for_eligible_group() {
        let client = FakeGitLab::new(Some(AUTOMERGE_ALL_CONFIG), Vec::new());
        let resolver = FakeResolver::new(vec![
            Dependency::new("axios", "0.21.0"),
            Dependency::new("lodash", "4.17.20"),
        ])
        .with_update("axios", "0.21.0", "0.21.1")
        .with_update("lodash", "4.17.20", "4.17.21");

        orchestrator(&client, &resolver, 5).run().await;

        let created = client.created();
        assert_eq!(created.len(), 1);
        assert_eq!(client.pipeline_list_calls(), 1);
        assert_eq!(client.accepted(), vec![created[0].iid]);
    }

    #[tokio::test]
    async fn test_automerge_not_armed_without_matching_rule() {
        let config = r#"
update_configs:
  - package_manager: javascript
    update_schedule: daily
    automerged_updates:
      - match:
          dependency_name: "jest*"
"#;
        let client = FakeGitLab::new(Some(config), Vec::new());
        let resolver = FakeResolver::new(vec![
            Dependency::new("axios", "0.21.0"),
            Dependency::new("lodash", "4.17.20"),
        ])
        .with_update("axios", "0.21.0", "0.21.1")
        .with_update("lodash", "4.17.20", "4.17.21");

        orchestrator(&client, &resolver, 5).run().await;

        assert_eq!(client.created().len(), 1);
        assert_eq!(client.pipeline_list_calls(), 0);
        assert!(client.accepted().is_empty());
    }
}
