//! Dependency groups sharing an update branch and merge request

use super::UpdatePlan;
use crate::sourcecontrol::MergeRequest;

/// An open merge request previously created for a group, together with the
/// dependency bump lines extracted from its description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingMergeRequest {
    /// The merge request as returned by the source control API
    pub merge_request: MergeRequest,
    /// Description lines of the form `Bumps <name> from <old> to <new>.`
    pub dependency_lines: Vec<String>,
}

/// A named bundle of dependencies updated together on one branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGroup {
    /// Raw group key: `*` for the catch-all rule, the capitalized rule
    /// pattern for configured rules, or the dependency's own name for
    /// ungrouped dependencies
    pub key: String,
    /// Display name used in merge request titles; empty for the catch-all
    pub group_name: String,
    /// Sanitized short branch name, stable across runs
    pub branch_name: String,
    /// Full source branch ref used to locate the group's merge request
    pub source_branch: String,
    /// The group's currently open merge request, if one exists
    pub merge_request: Option<ExistingMergeRequest>,
    /// Update plans for the group members, ordered by dependency name
    pub plans: Vec<UpdatePlan>,
}

impl DependencyGroup {
    /// Returns plans that carry at least one candidate update
    pub fn updated_plans(&self) -> Vec<&UpdatePlan> {
        self.plans.iter().filter(|plan| plan.has_updates()).collect()
    }

    /// Returns plans with no candidate updates
    pub fn unchanged_plans(&self) -> Vec<&UpdatePlan> {
        self.plans.iter().filter(|plan| !plan.has_updates()).collect()
    }

    /// Returns true if any member of the group qualifies for auto-merge
    pub fn auto_merge(&self) -> bool {
        self.plans.iter().any(|plan| plan.auto_merge)
    }
}
