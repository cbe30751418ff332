//! Merge request message rendering
//!
//! Produces the `Bump <name> from <old> to <new>` titles and description
//! bodies. The description lines follow the exact grammar the
//! reconciliation engine parses back out of existing merge requests, so
//! renderer and reconciler must evolve together.

use crate::config::CommitMessageOptions;
use crate::domain::{DependencyGroup, UpdatePlan};
use crate::sourcecontrol::RepositoryUrlResolver;

/// Conventional-commit prefixes that keep the bump verb capitalized
const ANGULAR_PREFIXES: [&str; 10] = [
    "build", "chore", "ci", "docs", "feat", "fix", "perf", "refactor", "style", "test",
];

/// Scope appended to the prefix when `include_scope` is set
const DEPENDENCY_SCOPE: &str = "deps";

/// Renders merge request titles, descriptions and commit messages
pub struct BumpRenderer<'a> {
    options: &'a CommitMessageOptions,
    urls: &'a dyn RepositoryUrlResolver,
}

impl<'a> BumpRenderer<'a> {
    /// Create a renderer for one update config entry
    pub fn new(options: &'a CommitMessageOptions, urls: &'a dyn RepositoryUrlResolver) -> Self {
        Self { options, urls }
    }

    fn capitalize_bump(&self) -> bool {
        match self.options.prefix.as_deref() {
            Some(prefix) => {
                let prefix = prefix.trim();
                ANGULAR_PREFIXES.contains(&prefix)
                    || !prefix.chars().next().is_some_and(|c| c.is_lowercase())
            }
            None => true,
        }
    }

    fn bump_verb(&self) -> &'static str {
        if self.capitalize_bump() {
            "Bump"
        } else {
            "bump"
        }
    }

    fn prefix(&self) -> String {
        match self.options.prefix.as_deref() {
            Some(prefix) if self.options.include_scope => {
                format!("{}({}): ", prefix, DEPENDENCY_SCOPE)
            }
            Some(prefix) => format!("{}: ", prefix),
            None => String::new(),
        }
    }

    fn dependency_link(&self, plan: &UpdatePlan) -> String {
        let update = match plan.updates.first() {
            Some(update) => update,
            None => return format!("`{}`", plan.dependency.name),
        };
        match update
            .source_url
            .as_deref()
            .and_then(|url| self.urls.resolve(url))
        {
            Some(location) => format!("[{}]({})", plan.dependency.name, location.browse_url()),
            None => format!("`{}`", plan.dependency.name),
        }
    }

    /// Merge request title for a group's updated dependencies
    pub fn merge_request_title(&self, group: &DependencyGroup) -> String {
        let updated = group.updated_plans();
        if updated.len() == 1 {
            let plan = updated[0];
            // updated_plans guarantees at least one candidate update
            let update = &plan.updates[0];
            return format!(
                "{}{} {} from {} to {}",
                self.prefix(),
                self.bump_verb(),
                plan.dependency.name,
                update.previous_version,
                update.version
            );
        }

        if group.group_name.is_empty() {
            format!("{}{} dependencies", self.prefix(), self.bump_verb())
        } else {
            format!(
                "{}{} {} dependencies",
                self.prefix(),
                self.bump_verb(),
                group.group_name
            )
        }
    }

    /// Merge request description: one bump line per updated dependency
    pub fn merge_request_body(&self, group: &DependencyGroup) -> String {
        group
            .updated_plans()
            .iter()
            .filter_map(|plan| {
                plan.updates.first().map(|update| {
                    format!(
                        "Bumps {} from {} to {}.",
                        self.dependency_link(plan),
                        update.previous_version,
                        update.version
                    )
                })
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Commit message for the update branch
    pub fn commit_message(&self, group: &DependencyGroup) -> String {
        let title = self.merge_request_title(group);
        let body = self.merge_request_body(group);
        if body.is_empty() {
            title
        } else {
            format!("{}\n\n{}", title, body)
        }
    }
}
