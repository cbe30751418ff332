//! Resolution engine backed by an external helper command
//!
//! Each operation spawns the configured helper once, writes a JSON request
//! to its stdin and reads a JSON response from its stdout. Credentials are
//! forwarded verbatim so the helper can reach private registries.

use super::{FetchedFiles, ResolutionEngine, UnlockStrategy};
use crate::config::PackageManager;
use crate::domain::{CandidateUpdate, Dependency, DependencyFile};
use crate::error::ResolverError;
use crate::sourcecontrol::RepositorySource;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Shells out to a resolver helper speaking JSON over stdin/stdout
pub struct CommandResolver {
    program: String,
    args: Vec<String>,
    credentials: Vec<serde_json::Value>,
}

#[derive(Serialize)]
struct ResolverRequest<'a> {
    operation: &'static str,
    package_manager: &'a str,
    credentials: &'a [serde_json::Value],
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a RepositorySource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dependency: Option<&'a Dependency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    files: Option<&'a [DependencyFile]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    requirements_to_unlock: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updates: Option<&'a [CandidateUpdate]>,
}

impl<'a> ResolverRequest<'a> {
    fn new(
        operation: &'static str,
        package_manager: &'a PackageManager,
        credentials: &'a [serde_json::Value],
    ) -> Self {
        Self {
            operation,
            package_manager: package_manager.as_str(),
            credentials,
            source: None,
            dependency: None,
            files: None,
            requirements_to_unlock: None,
            updates: None,
        }
    }
}

#[derive(Deserialize)]
struct ParseResponse {
    dependencies: Vec<Dependency>,
}

#[derive(Deserialize)]
struct UpToDateResponse {
    up_to_date: bool,
}

#[derive(Deserialize)]
struct CanUpdateResponse {
    can_update: bool,
}

#[derive(Deserialize)]
struct UpdatedDependenciesResponse {
    dependencies: Vec<CandidateUpdate>,
}

#[derive(Deserialize)]
struct UpdatedFilesResponse {
    files: Vec<DependencyFile>,
}

impl CommandResolver {
    /// Create a resolver for the given helper command line
    pub fn new(command: &str, credentials: Vec<serde_json::Value>) -> Self {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_default();
        Self {
            program,
            args: parts.collect(),
            credentials,
        }
    }

    async fn run<T: DeserializeOwned>(
        &self,
        request: &ResolverRequest<'_>,
    ) -> Result<T, ResolverError> {
        debug!(
            operation = request.operation,
            package_manager = request.package_manager,
            "invoking resolver helper"
        );
        let payload = serde_json::to_vec(request)
            .map_err(|e| ResolverError::protocol(request.operation, e.to_string()))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ResolverError::spawn(&self.program, e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&payload)
                .await
                .map_err(|e| ResolverError::failed(request.operation, e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ResolverError::failed(request.operation, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResolverError::failed(
                request.operation,
                format!("{} ({})", stderr.trim(), output.status),
            ));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| ResolverError::protocol(request.operation, e.to_string()))
    }
}

#[async_trait]
impl ResolutionEngine for CommandResolver {
    async fn fetch_files(
        &self,
        package_manager: PackageManager,
        source: &RepositorySource,
    ) -> Result<FetchedFiles, ResolverError> {
        let mut request = ResolverRequest::new("fetch_files", &package_manager, &self.credentials);
        request.source = Some(source);
        self.run(&request).await
    }

    async fn parse_dependencies(
        &self,
        package_manager: PackageManager,
        source: &RepositorySource,
        files: &[DependencyFile],
    ) -> Result<Vec<Dependency>, ResolverError> {
        let mut request =
            ResolverRequest::new("parse_dependencies", &package_manager, &self.credentials);
        request.source = Some(source);
        request.files = Some(files);
        let response: ParseResponse = self.run(&request).await?;
        Ok(response.dependencies)
    }

    async fn up_to_date(
        &self,
        package_manager: PackageManager,
        dependency: &Dependency,
        files: &[DependencyFile],
    ) -> Result<bool, ResolverError> {
        let mut request = ResolverRequest::new("up_to_date", &package_manager, &self.credentials);
        request.dependency = Some(dependency);
        request.files = Some(files);
        let response: UpToDateResponse = self.run(&request).await?;
        Ok(response.up_to_date)
    }

    async fn can_update(
        &self,
        package_manager: PackageManager,
        dependency: &Dependency,
        files: &[DependencyFile],
        strategy: UnlockStrategy,
    ) -> Result<bool, ResolverError> {
        let mut request = ResolverRequest::new("can_update", &package_manager, &self.credentials);
        request.dependency = Some(dependency);
        request.files = Some(files);
        request.requirements_to_unlock = Some(strategy.as_str());
        let response: CanUpdateResponse = self.run(&request).await?;
        Ok(response.can_update)
    }

    async fn updated_dependencies(
        &self,
        package_manager: PackageManager,
        dependency: &Dependency,
        files: &[DependencyFile],
        strategy: UnlockStrategy,
    ) -> Result<Vec<CandidateUpdate>, ResolverError> {
        let mut request =
            ResolverRequest::new("updated_dependencies", &package_manager, &self.credentials);
        request.dependency = Some(dependency);
        request.files = Some(files);
        request.requirements_to_unlock = Some(strategy.as_str());
        let response: UpdatedDependenciesResponse = self.run(&request).await?;
        Ok(response.dependencies)
    }

    async fn updated_files(
        &self,
        package_manager: PackageManager,
        updates: &[CandidateUpdate],
        files: &[DependencyFile],
    ) -> Result<Vec<DependencyFile>, ResolverError> {
        let mut request =
            ResolverRequest::new("updated_files", &package_manager, &self.credentials);
        request.updates = Some(updates);
        request.files = Some(files);
        let response: UpdatedFilesResponse = self.run(&request).await?;
        Ok(response.files)
    }
}
