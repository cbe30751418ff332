//! Update plans produced by the update planner

use super::{CandidateUpdate, Dependency};

/// Outcome of checking one dependency for updates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePlan {
    /// The dependency that was checked
    pub dependency: Dependency,
    /// Candidate updates computed by the resolution engine; empty when the
    /// dependency is ignored, current, or cannot be updated
    pub updates: Vec<CandidateUpdate>,
    /// Whether the update qualifies for automatic merging. Once set it is
    /// never reset within a run.
    pub auto_merge: bool,
}

impl UpdatePlan {
    /// Creates an empty plan for a dependency
    pub fn new(dependency: Dependency) -> Self {
        Self {
            dependency,
            updates: Vec::new(),
            auto_merge: false,
        }
    }

    /// Returns true if the plan carries at least one candidate update
    pub fn has_updates(&self) -> bool {
        !self.updates.is_empty()
    }
}
