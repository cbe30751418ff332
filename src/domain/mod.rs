//! Core domain models for depbot
//!
//! This module contains the fundamental types used throughout the application:
//! - Dependency and candidate update structures
//! - Update plans produced per dependency
//! - Dependency groups sharing an update branch

mod dependency;
mod group;
mod plan;

pub use dependency::{CandidateUpdate, Dependency, DependencyFile};
pub use group::{DependencyGroup, ExistingMergeRequest};
pub use plan::UpdatePlan;
