//! Dependency grouping and branch naming
//!
//! Top-level dependencies are partitioned into named groups by the
//! configured group rules; each group owns one update branch whose name is
//! a pure function of the group key, which is what makes the group's
//! merge request findable on the next run.

use crate::config::{GroupRule, PackageManager};
use crate::domain::{Dependency, DependencyGroup, UpdatePlan};
use crate::matcher::matches_dependency;
use std::collections::BTreeMap;

/// Branch prefix shared by every bot-authored branch
const BRANCH_PREFIX: &str = "dependabot";

/// Short branch name of the catch-all group
const CATCH_ALL_BRANCH: &str = "dependencies";

/// Reduce a proposed ref to the character set accepted by git.
///
/// Not a complete implementation of git's ref validation, but it covers
/// the names group keys and package names produce: forbidden characters
/// are dropped, a period after a slash is spelled out, runs of periods
/// and slashes are squeezed, and trailing periods are trimmed.
pub fn sanitize_ref(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_' | '.' | '(' | ')' | '{' | '}')
        })
        .collect();
    let kept = kept.replace("/.", "/dot-");

    let mut squeezed = String::with_capacity(kept.len());
    let mut previous: Option<char> = None;
    for c in kept.chars() {
        if (c == '.' || c == '/') && previous == Some(c) {
            continue;
        }
        squeezed.push(c);
        previous = Some(c);
    }
    squeezed.trim_end_matches('.').to_string()
}

/// Derives full branch refs for update branches
#[derive(Debug, Clone)]
pub struct BranchNamer {
    package_manager: PackageManager,
    directory: String,
    target_branch: Option<String>,
}

impl BranchNamer {
    /// Create a namer for one update config entry
    pub fn new(
        package_manager: PackageManager,
        directory: impl Into<String>,
        target_branch: Option<String>,
    ) -> Self {
        Self {
            package_manager,
            directory: directory.into(),
            target_branch,
        }
    }

    fn prefixed(&self, name: &str) -> String {
        let mut parts: Vec<&str> = vec![BRANCH_PREFIX, self.package_manager.as_str()];
        let directory = self.directory.trim_matches('/');
        if !directory.is_empty() {
            parts.push(directory);
        }
        if let Some(target) = self.target_branch.as_deref() {
            parts.push(target);
        }
        parts.push(name);
        sanitize_ref(&parts.join("/"))
    }

    /// Branch ref for a dependency group
    pub fn group_branch(&self, short_name: &str) -> String {
        self.prefixed(short_name)
    }

    /// Branch ref for a single-dependency merge request
    pub fn single_branch(&self, dependency_name: &str, new_version: &str) -> String {
        self.prefixed(&format!("{}-{}", dependency_name, new_version))
    }
}

/// Ruby-style capitalization: first character uppercased, rest lowercased
fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Partitions dependencies into groups per the configured rules
pub struct GroupingEngine<'a> {
    rules: &'a [GroupRule],
}

impl<'a> GroupingEngine<'a> {
    /// Create a grouping engine over the configured rules
    pub fn new(rules: &'a [GroupRule]) -> Self {
        Self { rules }
    }

    /// Group key for one dependency: the first matching rule's pattern,
    /// capitalized, or the dependency's own name when no rule matches
    fn group_key(&self, dependency: &Dependency) -> String {
        for rule in self.rules {
            if matches_dependency(&dependency.name, &[rule.dependency_name.as_str()]) {
                return capitalize(&rule.dependency_name);
            }
        }
        dependency.name.clone()
    }

    /// Partition the top-level dependencies into groups, sorted by group
    /// key, members sorted by name. Branch names are derived through the
    /// given namer and are stable for a given rule set and membership.
    pub fn group(&self, dependencies: &[Dependency], namer: &BranchNamer) -> Vec<DependencyGroup> {
        let mut partitions: BTreeMap<String, Vec<Dependency>> = BTreeMap::new();
        for dependency in dependencies.iter().filter(|d| d.top_level) {
            partitions
                .entry(self.group_key(dependency))
                .or_default()
                .push(dependency.clone());
        }

        partitions
            .into_iter()
            .map(|(key, mut members)| {
                members.sort_by(|a, b| a.name.cmp(&b.name));
                let (group_name, short_name) = if key == "*" {
                    (String::new(), CATCH_ALL_BRANCH.to_string())
                } else {
                    let short = sanitize_ref(&key.to_lowercase().replace(' ', "-"));
                    (key.clone(), short)
                };
                DependencyGroup {
                    key,
                    group_name,
                    source_branch: namer.group_branch(&short_name),
                    branch_name: short_name,
                    merge_request: None,
                    plans: members.into_iter().map(UpdatePlan::new).collect(),
                }
            })
            .collect()
    }
}
