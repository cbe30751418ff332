//! Merge request reconciliation
//!
//! Given a planned dependency group and the currently open bot-authored
//! merge requests, decides which requests are obsolete and whether the
//! group should produce a new or refreshed merge request. The decision is
//! pure; closing and creating are executed by the orchestrator, closes
//! strictly before creates so branch names never collide.

use crate::domain::{DependencyGroup, ExistingMergeRequest, UpdatePlan};
use crate::sourcecontrol::MergeRequest;
use regex::Regex;
use std::sync::OnceLock;

/// What should happen to the group's merge request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRequestAction {
    /// Create a new or refreshed merge request
    Create,
    /// An open merge request already reflects the planned updates
    Keep,
    /// No merge request should be produced
    None,
}

/// Outcome of reconciling one group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// What to do about the group's own merge request
    pub action: MergeRequestAction,
    /// Obsolete merge requests, in closing order, deduplicated
    pub requests_to_close: Vec<MergeRequest>,
}

impl Reconciliation {
    /// Returns true if the run should go on to produce the group's merge
    /// request (creation is still skipped when nothing is updated, and
    /// the creator leaves an already matching request untouched)
    pub fn proceed(&self) -> bool {
        matches!(
            self.action,
            MergeRequestAction::Create | MergeRequestAction::Keep
        )
    }
}

fn bump_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^bumps .* from .* to .*\.").expect("bump line regex is valid")
    })
}

/// Extract the dependency bump lines from a merge request description
pub fn dependency_lines(description: &str) -> Vec<String> {
    description
        .lines()
        .filter(|line| bump_line_regex().is_match(line))
        .map(str::to_string)
        .collect()
}

/// Returns true when the existing merge request no longer describes the
/// planned update of this dependency: either the dependency is not
/// mentioned at all, or no mentioning line carries both the current and
/// the proposed version.
fn unrelated_to_merge_request(existing: &ExistingMergeRequest, plan: &UpdatePlan) -> bool {
    let mentioning: Vec<&String> = existing
        .dependency_lines
        .iter()
        .filter(|line| line.contains(&plan.dependency.name))
        .collect();
    if mentioning.is_empty() {
        return true;
    }

    let update = match plan.updates.first() {
        Some(update) => update,
        None => return true,
    };
    !mentioning
        .iter()
        .any(|line| line.contains(&plan.dependency.version) && line.contains(&update.version))
}

/// Decides merge request transitions for planned dependency groups
pub struct ReconciliationEngine {
    bot_username: String,
}

impl ReconciliationEngine {
    /// Create an engine that recognizes the bot's own merge requests
    pub fn new(bot_username: impl Into<String>) -> Self {
        Self {
            bot_username: bot_username.into(),
        }
    }

    /// Reconcile one group against the open merge requests
    pub fn reconcile(
        &self,
        group: &DependencyGroup,
        open_merge_requests: &[MergeRequest],
    ) -> Reconciliation {
        let open: Vec<&MergeRequest> = open_merge_requests
            .iter()
            .filter(|mr| mr.author.username == self.bot_username)
            .collect();
        let updated = group.updated_plans();

        let mut close: Vec<MergeRequest> = Vec::new();
        let mut action = MergeRequestAction::None;

        if let Some(existing) = &group.merge_request {
            let mut unrelated = updated.is_empty();
            let mut superseded: Vec<MergeRequest> = Vec::new();
            for plan in &updated {
                // Per-package requests get folded into the group request
                superseded.extend(
                    open.iter()
                        .filter(|mr| mr.title.contains(&plan.dependency.name))
                        .map(|mr| (*mr).clone()),
                );
                if unrelated_to_merge_request(existing, plan) {
                    unrelated = true;
                }
            }

            if unrelated {
                // The open group request describes different updates, so it
                // is recreated from scratch
                close.push(existing.merge_request.clone());
                action = MergeRequestAction::Create;
            } else {
                action = MergeRequestAction::Keep;
            }
            close.extend(superseded);
        } else if updated.len() > 1 {
            for plan in &updated {
                close.extend(
                    open.iter()
                        .filter(|mr| mr.title.contains(&plan.dependency.name))
                        .map(|mr| (*mr).clone()),
                );
            }
            action = MergeRequestAction::Create;
        } else if updated.len() == 1 {
            let plan = updated[0];
            // updated_plans guarantees at least one candidate update
            let update = &plan.updates[0];
            let stale: Vec<MergeRequest> = open
                .iter()
                .filter(|mr| {
                    mr.title.contains(&plan.dependency.name)
                        && mr.title.contains(&plan.dependency.version)
                        && !mr.title.contains(&update.version)
                })
                .map(|mr| (*mr).clone())
                .collect();
            if !stale.is_empty() {
                action = MergeRequestAction::Create;
            }
            close.extend(stale);
        }

        // Requests for dependencies that no longer need updating
        for plan in group.unchanged_plans() {
            close.extend(
                open.iter()
                    .filter(|mr| mr.title.contains(&plan.dependency.name))
                    .map(|mr| (*mr).clone()),
            );
        }

        let mut seen = std::collections::HashSet::new();
        close.retain(|mr| seen.insert(mr.iid));

        Reconciliation {
            action,
            requests_to_close: close,
        }
    }
}
