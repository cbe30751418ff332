//! Update policy configuration
//!
//! This module provides:
//! - The package manager identifier mapping
//! - The update schedule predicate
//! - The parsed per-package-manager update policy

mod package_manager;
mod schedule;
mod update_config;

pub use package_manager::PackageManager;
pub use schedule::UpdateSchedule;
pub use update_config::{
    parse_update_configs, AutomergeRule, CommitMessageOptions, GroupRule, IgnoreRule,
    RawUpdateConfig, UpdateConfig,
};
