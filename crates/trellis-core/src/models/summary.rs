//! Plan summary types and functionality.

use serde::{Deserialize, Serialize};

use super::{Plan, StepStatus};

/// Summary information about a plan with step statistics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanSummary {
    /// Plan ID
    pub plan_id: String,
    /// Title of the plan
    pub title: String,
    /// Number of completed steps
    pub completed_steps: usize,
    /// Total number of steps
    pub total_steps: usize,
    /// Whether this is the registry's active plan
    pub is_active: bool,
}

impl PlanSummary {
    /// Create a PlanSummary from a Plan and the registry's active pointer
    pub fn from_plan(plan: &Plan, active_plan_id: Option<&str>) -> Self {
        Self {
            plan_id: plan.plan_id().to_string(),
            title: plan.title().to_string(),
            completed_steps: plan.count(StepStatus::Completed),
            total_steps: plan.len(),
            is_active: active_plan_id == Some(plan.plan_id()),
        }
    }
}
