//! Update planning per dependency group
//!
//! Applies ignore rules, asks the resolution engine whether each
//! dependency is current, and walks the requirement unlock strategies in
//! order until one permits an update. Resolution failures are recoverable
//! per dependency: the dependency is reported as not updatable and the
//! run continues.

use crate::config::UpdateConfig;
use crate::domain::{DependencyFile, DependencyGroup, UpdatePlan};
use crate::error::ResolverError;
use crate::resolver::{ResolutionEngine, UnlockStrategy};
use tracing::{debug, info, warn};

/// Fills the update plans of a dependency group
pub struct UpdatePlanner<'a, R: ResolutionEngine> {
    resolver: &'a R,
    config: &'a UpdateConfig,
    files: &'a [DependencyFile],
}

impl<'a, R: ResolutionEngine> UpdatePlanner<'a, R> {
    /// Create a planner for one update config entry
    pub fn new(resolver: &'a R, config: &'a UpdateConfig, files: &'a [DependencyFile]) -> Self {
        Self {
            resolver,
            config,
            files,
        }
    }

    /// Fill in candidate updates and auto-merge eligibility for every
    /// dependency in the group
    pub async fn plan(&self, group: &mut DependencyGroup) {
        for plan in &mut group.plans {
            if self.config.is_ignored(&plan.dependency.name) {
                info!(
                    dependency = %plan.dependency.name,
                    version = %plan.dependency.version,
                    "dependency ignored"
                );
                continue;
            }

            if let Err(e) = self.plan_dependency(plan).await {
                warn!(
                    dependency = %plan.dependency.name,
                    version = %plan.dependency.version,
                    error = %e,
                    "update check failed, treating dependency as not updatable"
                );
            }
        }
    }

    async fn plan_dependency(&self, plan: &mut UpdatePlan) -> Result<(), ResolverError> {
        let package_manager = self.config.package_manager;
        let dependency = &plan.dependency;

        info!(
            dependency = %dependency.name,
            version = %dependency.version,
            "checking for updates"
        );
        if self
            .resolver
            .up_to_date(package_manager, dependency, self.files)
            .await?
        {
            info!(
                dependency = %dependency.name,
                version = %dependency.version,
                "already up to date"
            );
            return Ok(());
        }

        let mut usable_strategy = None;
        for strategy in UnlockStrategy::ORDERED {
            if self
                .resolver
                .can_update(package_manager, dependency, self.files, strategy)
                .await?
            {
                usable_strategy = Some(strategy);
                break;
            }
        }

        let strategy = match usable_strategy {
            Some(strategy) => strategy,
            None => {
                info!(
                    dependency = %dependency.name,
                    version = %dependency.version,
                    "cannot be updated"
                );
                return Ok(());
            }
        };
        debug!(
            dependency = %dependency.name,
            strategy = strategy.as_str(),
            "requirements to unlock"
        );

        plan.updates = self
            .resolver
            .updated_dependencies(package_manager, dependency, self.files, strategy)
            .await?;

        if plan.has_updates() && self.config.auto_merges(&plan.dependency.name) {
            plan.auto_merge = true;
        }
        Ok(())
    }
}
