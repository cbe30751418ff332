//! Dependency resolution capability
//!
//! Fetching dependency files, parsing manifests and computing candidate
//! updates happen outside this process. This module provides:
//! - The `ResolutionEngine` trait the planner and orchestrator depend on
//! - The requirement unlock strategies tried when checking updates
//! - A pass-through implementation that shells out to a helper command

mod command;

pub use command::CommandResolver;

use crate::config::PackageManager;
use crate::domain::{CandidateUpdate, Dependency, DependencyFile};
use crate::error::ResolverError;
use crate::sourcecontrol::RepositorySource;
use async_trait::async_trait;
use serde::Deserialize;

/// How far a dependency's declared version requirement may be loosened
/// to permit an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockStrategy {
    /// Leave all requirements untouched
    None,
    /// Loosen only the dependency's own requirement
    Own,
    /// Loosen any requirement standing in the way
    All,
}

impl UnlockStrategy {
    /// Strategies in the order they are tried
    pub const ORDERED: [UnlockStrategy; 3] =
        [UnlockStrategy::None, UnlockStrategy::Own, UnlockStrategy::All];

    /// Wire name of the strategy
    pub fn as_str(&self) -> &'static str {
        match self {
            UnlockStrategy::None => "none",
            UnlockStrategy::Own => "own",
            UnlockStrategy::All => "all",
        }
    }
}

/// Dependency files plus the commit they were fetched at
#[derive(Debug, Clone, Deserialize)]
pub struct FetchedFiles {
    /// The dependency files of the configured directory
    pub files: Vec<DependencyFile>,
    /// Commit sha the files were read from; used as merge request base
    pub commit: String,
}

/// Trait for the external dependency resolution engine
#[async_trait]
pub trait ResolutionEngine: Send + Sync {
    /// Fetch the dependency files and current commit of a repository
    async fn fetch_files(
        &self,
        package_manager: PackageManager,
        source: &RepositorySource,
    ) -> Result<FetchedFiles, ResolverError>;

    /// Parse the fetched files into resolved dependencies
    async fn parse_dependencies(
        &self,
        package_manager: PackageManager,
        source: &RepositorySource,
        files: &[DependencyFile],
    ) -> Result<Vec<Dependency>, ResolverError>;

    /// Returns true if the dependency is already at its latest version
    async fn up_to_date(
        &self,
        package_manager: PackageManager,
        dependency: &Dependency,
        files: &[DependencyFile],
    ) -> Result<bool, ResolverError>;

    /// Returns true if the dependency can be updated under the strategy
    async fn can_update(
        &self,
        package_manager: PackageManager,
        dependency: &Dependency,
        files: &[DependencyFile],
        strategy: UnlockStrategy,
    ) -> Result<bool, ResolverError>;

    /// Compute the candidate updates under the strategy
    async fn updated_dependencies(
        &self,
        package_manager: PackageManager,
        dependency: &Dependency,
        files: &[DependencyFile],
        strategy: UnlockStrategy,
    ) -> Result<Vec<CandidateUpdate>, ResolverError>;

    /// Apply candidate updates to the dependency files
    async fn updated_files(
        &self,
        package_manager: PackageManager,
        updates: &[CandidateUpdate],
        files: &[DependencyFile],
    ) -> Result<Vec<DependencyFile>, ResolverError>;
}
