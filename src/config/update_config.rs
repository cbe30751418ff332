//! Parsed per-package-manager update policy
//!
//! The policy document is a YAML file with an `update_configs` list. Each
//! entry is parsed structurally first and resolved into an immutable
//! `UpdateConfig` per entry, so an unsupported package manager or schedule
//! only fails the affected entry.

use super::{PackageManager, UpdateSchedule};
use crate::error::ConfigError;
use serde::Deserialize;

/// Suppresses update checks for matching dependencies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRule {
    /// Dependency name pattern, wildcard suffix allowed
    pub dependency_name: String,
    /// Version requirement; parsed but not evaluated
    pub version_requirement: Option<String>,
}

/// Marks matching updates as eligible for automatic merging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomergeRule {
    /// Dependency name pattern, wildcard suffix allowed
    pub dependency_name: String,
    /// Dependency type; parsed but not evaluated
    pub dependency_type: Option<String>,
    /// `all` makes every update eligible regardless of the name pattern
    pub update_type: Option<String>,
}

impl AutomergeRule {
    /// Returns true if an update of the named dependency qualifies
    pub fn applies_to(&self, dependency_name: &str) -> bool {
        if self.update_type.as_deref() == Some("all") {
            return true;
        }
        crate::matcher::matches_dependency(dependency_name, &[self.dependency_name.as_str()])
    }
}

/// Assigns matching dependencies to a shared update branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRule {
    /// Dependency name pattern, wildcard suffix allowed
    pub dependency_name: String,
}

/// Commit message options forwarded to the message renderer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitMessageOptions {
    /// Commit message prefix, e.g. `chore`
    pub prefix: Option<String>,
    /// Prefix for development dependencies; carried but rendered as `prefix`
    pub prefix_development: Option<String>,
    /// Whether to append a `(deps)` scope to the prefix
    pub include_scope: bool,
}

/// One package manager's update policy, read-only after construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateConfig {
    /// Resolved package manager identifier
    pub package_manager: PackageManager,
    /// Directory the dependency files live in
    pub directory: String,
    /// How often the entry is processed
    pub schedule: UpdateSchedule,
    /// Branch merge requests should target; `None` means the default branch
    pub target_branch: Option<String>,
    /// Ignore rules, evaluated before any update check
    pub ignore_rules: Vec<IgnoreRule>,
    /// Automerge rules, evaluated once candidate updates exist
    pub automerge_rules: Vec<AutomergeRule>,
    /// Group rules in configured order; defaults to a single catch-all
    pub group_rules: Vec<GroupRule>,
    /// Commit message options
    pub commit_message: CommitMessageOptions,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    update_configs: Vec<RawUpdateConfig>,
}

/// Structurally parsed update config entry, not yet validated
#[derive(Debug, Clone, Deserialize)]
pub struct RawUpdateConfig {
    package_manager: String,
    #[serde(default = "default_directory")]
    directory: String,
    update_schedule: String,
    #[serde(default)]
    target_branch: Option<String>,
    #[serde(default)]
    ignored_updates: Vec<RawRule<RawIgnoreMatch>>,
    #[serde(default)]
    automerged_updates: Vec<RawRule<RawAutomergeMatch>>,
    #[serde(default)]
    group_updates: Option<Vec<RawRule<RawGroupMatch>>>,
    #[serde(default)]
    commit_message: Option<RawCommitMessage>,
}

fn default_directory() -> String {
    "/".to_string()
}

#[derive(Debug, Clone, Deserialize)]
struct RawRule<T> {
    #[serde(rename = "match")]
    matcher: T,
}

#[derive(Debug, Clone, Deserialize)]
struct RawIgnoreMatch {
    dependency_name: String,
    #[serde(default)]
    version_requirement: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawAutomergeMatch {
    #[serde(default)]
    dependency_name: String,
    #[serde(default)]
    dependency_type: Option<String>,
    #[serde(default)]
    update_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawGroupMatch {
    dependency_name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RawCommitMessage {
    #[serde(default)]
    prefix: Option<String>,
    #[serde(default)]
    prefix_development: Option<String>,
    #[serde(default)]
    include_scope: Option<bool>,
}

impl RawUpdateConfig {
    /// Policy key of the entry, for log output before resolution
    pub fn package_manager_key(&self) -> &str {
        &self.package_manager
    }
}

/// Parse the policy document into its raw update config entries
pub fn parse_update_configs(document: &str) -> Result<Vec<RawUpdateConfig>, ConfigError> {
    let raw: RawDocument =
        serde_yaml::from_str(document).map_err(|e| ConfigError::parse_error(e.to_string()))?;
    if raw.update_configs.is_empty() {
        return Err(ConfigError::Empty);
    }
    Ok(raw.update_configs)
}

impl UpdateConfig {
    /// Validate and resolve one raw entry
    pub fn from_raw(raw: RawUpdateConfig) -> Result<Self, ConfigError> {
        let package_manager = PackageManager::from_config_key(&raw.package_manager)?;
        let schedule = UpdateSchedule::from_config_value(&raw.update_schedule)?;

        let ignore_rules = raw
            .ignored_updates
            .into_iter()
            .map(|rule| IgnoreRule {
                dependency_name: rule.matcher.dependency_name,
                version_requirement: rule.matcher.version_requirement,
            })
            .collect();

        let automerge_rules = raw
            .automerged_updates
            .into_iter()
            .map(|rule| AutomergeRule {
                dependency_name: rule.matcher.dependency_name,
                dependency_type: rule.matcher.dependency_type,
                update_type: rule.matcher.update_type,
            })
            .collect();

        let group_rules = match raw.group_updates {
            Some(rules) => rules
                .into_iter()
                .map(|rule| GroupRule {
                    dependency_name: rule.matcher.dependency_name,
                })
                .collect(),
            None => vec![GroupRule {
                dependency_name: "*".to_string(),
            }],
        };

        let commit_message = raw
            .commit_message
            .map(|message| CommitMessageOptions {
                prefix: message.prefix,
                prefix_development: message.prefix_development,
                include_scope: message.include_scope.unwrap_or(false),
            })
            .unwrap_or_default();

        Ok(Self {
            package_manager,
            directory: raw.directory,
            schedule,
            target_branch: raw.target_branch,
            ignore_rules,
            automerge_rules,
            group_rules,
            commit_message,
        })
    }

    /// Returns true if the named dependency matches any ignore rule
    pub fn is_ignored(&self, dependency_name: &str) -> bool {
        self.ignore_rules.iter().any(|rule| {
            crate::matcher::matches_dependency(dependency_name, &[rule.dependency_name.as_str()])
        })
    }

    /// Returns true if an update of the named dependency may auto-merge
    pub fn auto_merges(&self, dependency_name: &str) -> bool {
        self.automerge_rules
            .iter()
            .any(|rule| rule.applies_to(dependency_name))
    }
}
