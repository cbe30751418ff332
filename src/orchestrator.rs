//! Run orchestration
//!
//! Sequences one bot run over a repository: look up the project, read the
//! update policy, then for each update config entry group, plan and
//! reconcile dependency updates into merge requests. Entries are
//! processed strictly sequentially and an error in one entry never aborts
//! the others.

use crate::automerge::AutoMergeController;
use crate::config::{parse_update_configs, RawUpdateConfig, UpdateConfig};
use crate::context::RunContext;
use crate::domain::{CandidateUpdate, DependencyGroup, ExistingMergeRequest};
use crate::error::{ApiError, AppError};
use crate::grouping::{BranchNamer, GroupingEngine};
use crate::planner::UpdatePlanner;
use crate::reconcile::{dependency_lines, MergeRequestAction, ReconciliationEngine};
use crate::render::BumpRenderer;
use crate::resolver::ResolutionEngine;
use crate::sourcecontrol::{
    CustomHostUrlResolver, MergeRequest, MergeRequestCreator, Project, RepositorySource,
    SourceControlClient,
};
use chrono::{Local, NaiveDate};
use tracing::{error, info, warn, Instrument};

/// Branch consulted for the policy document when the project does not
/// report a default branch
const FALLBACK_BRANCH: &str = "master";

/// Drives one bot run against a repository
pub struct Orchestrator<S: SourceControlClient, R: ResolutionEngine> {
    context: RunContext,
    client: S,
    resolver: R,
    url_resolver: CustomHostUrlResolver,
    today: NaiveDate,
}

impl<S: SourceControlClient, R: ResolutionEngine> Orchestrator<S, R> {
    /// Create an orchestrator for the given run context
    pub fn new(context: RunContext, client: S, resolver: R) -> Self {
        let url_resolver = CustomHostUrlResolver::new(&context.host);
        Self {
            context,
            client,
            resolver,
            url_resolver,
            today: Local::now().date_naive(),
        }
    }

    /// Override the date used by the schedule predicate (for testing)
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Process the configured repository
    pub async fn run(&self) {
        let span = tracing::info_span!(
            "process",
            organization = %self.context.organization,
            repository = %self.context.repository
        );
        self.process().instrument(span).await
    }

    async fn process(&self) {
        info!("checking for repository");
        let project = match self.client.project(&self.context.repository).await {
            Ok(project) => project,
            Err(ApiError::NotFound { .. }) => {
                info!("named repository not found");
                return;
            }
            Err(ApiError::Forbidden { .. }) => {
                info!("access not granted to repository");
                return;
            }
            Err(e) => {
                error!(error = %e, "failed to look up repository");
                return;
            }
        };
        self.process_project(&project).await;
    }

    async fn process_project(&self, project: &Project) {
        info!(path = %self.context.config_path, "checking for update configuration file");
        let default_branch = project.default_branch.as_deref().unwrap_or(FALLBACK_BRANCH);
        let document = match self
            .client
            .file_content(project.id, &self.context.config_path, default_branch)
            .await
        {
            Ok(document) => document,
            Err(e @ (ApiError::NotFound { .. } | ApiError::Forbidden { .. })) => {
                warn!(error = %e, "update configuration file issue, raising bug if required");
                return;
            }
            Err(e) => {
                error!(error = %e, "failed to fetch update configuration file");
                return;
            }
        };

        let entries = match parse_update_configs(&document) {
            Ok(entries) => entries,
            Err(e) => {
                error!(error = %e, "update configuration file is invalid");
                return;
            }
        };

        for raw in entries {
            let key = raw.package_manager_key().to_string();
            let span = tracing::info_span!("update_config", package_manager = %key);
            if let Err(e) = self
                .process_update_config(project, raw)
                .instrument(span)
                .await
            {
                error!(package_manager = %key, error = %e, "failed processing");
            }
        }
    }

    async fn process_update_config(
        &self,
        project: &Project,
        raw: RawUpdateConfig,
    ) -> Result<(), AppError> {
        let config = UpdateConfig::from_raw(raw)?;
        let package_manager = config.package_manager;

        if !config.schedule.is_due(self.today) {
            info!(schedule = %config.schedule, "skipping dependency checking");
            return Ok(());
        }

        let open = self.client.open_merge_requests(project.id).await?;
        let bot_open = open
            .iter()
            .filter(|mr| mr.author.username == self.context.bot_username)
            .count();
        if bot_open == self.context.mr_limit {
            info!(
                limit = self.context.mr_limit,
                "skipping; maximum number of open merge requests reached"
            );
            return Ok(());
        }

        info!(directory = %config.directory, "processing update configuration");
        let source = RepositorySource {
            provider: "gitlab".to_string(),
            hostname: self.context.host.clone(),
            api_endpoint: format!("https://{}/api/v4", self.context.host),
            repo: project.path_with_namespace.clone(),
            directory: config.directory.clone(),
            branch: config.target_branch.clone(),
        };

        info!("fetching dependency files");
        let fetched = self.resolver.fetch_files(package_manager, &source).await?;
        info!("parsing dependencies");
        let dependencies = self
            .resolver
            .parse_dependencies(package_manager, &source, &fetched.files)
            .await?;

        let namer = BranchNamer::new(
            package_manager,
            config.directory.clone(),
            config.target_branch.clone(),
        );
        let groups = GroupingEngine::new(&config.group_rules).group(&dependencies, &namer);

        let target_branch = config
            .target_branch
            .clone()
            .or_else(|| project.default_branch.clone())
            .unwrap_or_else(|| FALLBACK_BRANCH.to_string());
        let planner = UpdatePlanner::new(&self.resolver, &config, &fetched.files);
        let reconciler = ReconciliationEngine::new(&self.context.bot_username);

        for mut group in groups {
            planner.plan(&mut group).await;

            // Refetch each round: earlier groups may have closed requests
            let open = self.client.open_merge_requests(project.id).await?;
            group.merge_request = self.find_existing(&open, &group.source_branch);

            let outcome = reconciler.reconcile(&group, &open);
            for merge_request in &outcome.requests_to_close {
                self.close_merge_request(project, merge_request).await?;
            }
            if !outcome.proceed() {
                continue;
            }

            let updated: Vec<CandidateUpdate> = group
                .updated_plans()
                .iter()
                .flat_map(|plan| plan.updates.iter().cloned())
                .collect();
            if updated.is_empty() {
                continue;
            }

            info!(branch = %group.branch_name, "updating dependency files");
            let files = self
                .resolver
                .updated_files(package_manager, &updated, &fetched.files)
                .await?;

            let renderer = BumpRenderer::new(&config.commit_message, &self.url_resolver);
            let title = renderer.merge_request_title(&group);
            let body = renderer.merge_request_body(&group);
            let commit_message = renderer.commit_message(&group);
            let source_branch = self.source_branch_for(&group, &namer, &updated, outcome.action);

            let creator =
                MergeRequestCreator::new(&self.client, project.id, &fetched.commit, &target_branch);
            let created = creator
                .create(&source_branch, &title, &body, &commit_message, &files)
                .await?;
            let created = match created {
                Some(created) => created,
                None => {
                    info!(branch = %group.branch_name, "merge request already exists");
                    continue;
                }
            };

            if !group.auto_merge() {
                continue;
            }
            info!(branch = %group.branch_name, "waiting for pipelines to start");
            let controller = AutoMergeController::new(&self.client);
            let pipelines = match controller.wait_for_pipelines(project.id, created.iid).await {
                Some(pipelines) => pipelines,
                None => continue,
            };
            if self.context.wait_for_pipeline_completion {
                controller
                    .wait_for_pipeline_completion(project.id, &pipelines)
                    .await?;
            }
            info!(branch = %group.branch_name, "setting merge request to auto-merge");
            self.client
                .accept_merge_request(project.id, created.iid)
                .await?;
        }
        Ok(())
    }

    /// Branch the group's merge request is created from: the stable group
    /// branch for real groups and kept requests, a version-suffixed branch
    /// for fresh groups of one
    fn source_branch_for(
        &self,
        group: &DependencyGroup,
        namer: &BranchNamer,
        updated: &[CandidateUpdate],
        action: MergeRequestAction,
    ) -> String {
        if action == MergeRequestAction::Keep || group.plans.len() > 1 {
            group.source_branch.clone()
        } else {
            namer.single_branch(&updated[0].name, &updated[0].version)
        }
    }

    fn find_existing(
        &self,
        open: &[MergeRequest],
        source_branch: &str,
    ) -> Option<ExistingMergeRequest> {
        open.iter()
            .find(|mr| {
                mr.author.username == self.context.bot_username && mr.source_branch == source_branch
            })
            .map(|mr| ExistingMergeRequest {
                dependency_lines: dependency_lines(&mr.description),
                merge_request: mr.clone(),
            })
    }

    async fn close_merge_request(
        &self,
        project: &Project,
        merge_request: &MergeRequest,
    ) -> Result<(), ApiError> {
        info!(title = %merge_request.title, "closing merge request");
        self.client
            .close_merge_request(project.id, merge_request.iid)
            .await?;
        info!(branch = %merge_request.source_branch, "deleting branch");
        self.client
            .delete_branch(project.id, &merge_request.source_branch)
            .await
    }
}
