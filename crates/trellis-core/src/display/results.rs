//! Result wrapper types for displaying operation outcomes.
//!
//! Each registry write returns one of these so that every surface (CLI, MCP)
//! prints the same confirmation followed by the affected plan.

use std::fmt;

use crate::models::{Plan, StepsDiff};

/// Confirmation of a `create`.
///
/// # Examples
///
/// ```rust
/// use trellis_core::{display::CreateResult, models::Plan};
///
/// let plan = Plan::new("p1", "New Project", vec!["first".to_string()]).unwrap();
/// let output = CreateResult::new(plan).to_string();
/// assert!(output.starts_with("Plan created successfully with ID: p1"));
/// ```
#[derive(Debug, Clone)]
pub struct CreateResult<T> {
    pub resource: T,
}

impl<T> CreateResult<T> {
    /// Create a new CreateResult wrapper.
    pub fn new(resource: T) -> Self {
        Self { resource }
    }
}

impl fmt::Display for CreateResult<Plan> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Plan created successfully with ID: {}",
            self.resource.plan_id()
        )?;
        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

/// Confirmation of an `update`, with the list of changes applied.
#[derive(Debug, Clone)]
pub struct UpdateResult<T> {
    pub resource: T,
    pub changes: Vec<String>,
}

impl<T> UpdateResult<T> {
    /// Create a new UpdateResult wrapper.
    pub fn new(resource: T) -> Self {
        Self {
            resource,
            changes: Vec::new(),
        }
    }

    /// Create an UpdateResult with a list of changes made.
    pub fn with_changes(resource: T, changes: Vec<String>) -> Self {
        Self { resource, changes }
    }
}

impl fmt::Display for UpdateResult<Plan> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Plan updated successfully: {}", self.resource.plan_id())?;

        if !self.changes.is_empty() {
            writeln!(f)?;
            writeln!(f, "Changes made:")?;
            for change in &self.changes {
                writeln!(f, "- {change}")?;
            }
        }

        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

/// Human-readable description of a steps replacement.
pub fn describe_steps_diff(diff: StepsDiff) -> String {
    format!(
        "Replaced steps ({} kept their progress, {} reset to not_started)",
        diff.preserved, diff.reset
    )
}

/// Confirmation of `set_active` / `resume`.
#[derive(Debug, Clone)]
pub struct ActivateResult {
    pub plan: Plan,
}

impl fmt::Display for ActivateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Plan '{}' is now the active plan.", self.plan.plan_id())?;
        writeln!(f)?;
        write!(f, "{}", self.plan)
    }
}

/// Confirmation of `mark_step`.
#[derive(Debug, Clone)]
pub struct MarkStepResult {
    pub plan: Plan,
    pub step_index: usize,
}

impl fmt::Display for MarkStepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Step {} updated in plan '{}'.",
            self.step_index,
            self.plan.plan_id()
        )?;
        writeln!(f)?;
        write!(f, "{}", self.plan)
    }
}

/// Confirmation of `delete`.
#[derive(Debug, Clone)]
pub struct DeleteResult<T> {
    pub resource: T,
}

impl<T> DeleteResult<T> {
    /// Create a new DeleteResult wrapper.
    pub fn new(resource: T) -> Self {
        Self { resource }
    }
}

impl fmt::Display for DeleteResult<Plan> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Plan '{}' has been deleted.", self.resource.plan_id())
    }
}
