//! Plan model definition and step-level mutation.

use serde::{Deserialize, Serialize};

use super::StepStatus;
use crate::error::{PlanError, Result};

/// A titled, ordered list of steps with per-step status and notes.
///
/// `steps`, `step_statuses` and `step_notes` always have the same length;
/// index `i` in each refers to the same step. Fields are private so that every
/// mutation goes through a method that re-checks this.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Plan {
    plan_id: String,
    title: String,
    steps: Vec<String>,
    step_statuses: Vec<StepStatus>,
    step_notes: Vec<String>,
}

/// Borrowed view of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepView<'a> {
    pub index: usize,
    pub text: &'a str,
    pub status: StepStatus,
    pub notes: &'a str,
}

/// What a steps replacement kept and what it reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepsDiff {
    pub preserved: usize,
    pub reset: usize,
}

impl Plan {
    /// Creates a plan with every step `not_started` and empty notes.
    pub fn new(
        plan_id: impl Into<String>,
        title: impl Into<String>,
        steps: Vec<String>,
    ) -> Result<Self> {
        let plan_id = plan_id.into();
        let title = title.into();

        if plan_id.is_empty() {
            return Err(PlanError::missing_param("plan_id", "create"));
        }
        if title.is_empty() {
            return Err(PlanError::missing_param("title", "create"));
        }
        if steps.is_empty() {
            return Err(PlanError::invalid_input("steps").with_reason(
                "Parameter `steps` must be a non-empty list of strings for command: create",
            ));
        }

        let len = steps.len();
        Ok(Self {
            plan_id,
            title,
            steps,
            step_statuses: vec![StepStatus::NotStarted; len],
            step_notes: vec![String::new(); len],
        })
    }

    pub fn plan_id(&self) -> &str {
        &self.plan_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn step_statuses(&self) -> &[StepStatus] {
        &self.step_statuses
    }

    pub fn step_notes(&self) -> &[String] {
        &self.step_notes
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the step at `index`, if any.
    pub fn step(&self, index: usize) -> Option<StepView<'_>> {
        Some(StepView {
            index,
            text: self.steps.get(index)?,
            status: *self.step_statuses.get(index)?,
            notes: self.step_notes.get(index)?,
        })
    }

    /// Iterates over all steps in index order.
    pub fn iter_steps(&self) -> impl Iterator<Item = StepView<'_>> {
        self.steps
            .iter()
            .zip(&self.step_statuses)
            .zip(&self.step_notes)
            .enumerate()
            .map(|(index, ((text, status), notes))| StepView {
                index,
                text,
                status: *status,
                notes,
            })
    }

    /// Number of steps currently in `status`.
    pub fn count(&self, status: StepStatus) -> usize {
        self.step_statuses.iter().filter(|s| **s == status).count()
    }

    /// First step that is not `completed`, in index order.
    pub fn first_unfinished(&self) -> Option<StepView<'_>> {
        self.iter_steps()
            .find(|step| step.status != StepStatus::Completed)
    }

    /// True when every step is `completed`.
    pub fn is_complete(&self) -> bool {
        self.first_unfinished().is_none()
    }

    pub(crate) fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Replaces the step list, carrying status and notes over by position.
    ///
    /// Index `i` keeps its status and notes only if it existed before and its
    /// text is unchanged. A moved step therefore counts as a new one.
    pub(crate) fn replace_steps(&mut self, steps: Vec<String>) -> Result<StepsDiff> {
        let mut diff = StepsDiff::default();
        let mut statuses = Vec::with_capacity(steps.len());
        let mut notes = Vec::with_capacity(steps.len());

        for (i, step) in steps.iter().enumerate() {
            match self.step(i) {
                Some(old) if old.text == step => {
                    statuses.push(old.status);
                    notes.push(old.notes.to_string());
                    diff.preserved += 1;
                }
                _ => {
                    statuses.push(StepStatus::NotStarted);
                    notes.push(String::new());
                    diff.reset += 1;
                }
            }
        }

        self.steps = steps;
        self.step_statuses = statuses;
        self.step_notes = notes;
        self.check_invariant()?;
        Ok(diff)
    }

    /// Fails with a validation error unless `index` is a valid step index.
    pub fn check_index(&self, index: usize) -> Result<()> {
        if index < self.steps.len() {
            return Ok(());
        }
        let reason = if self.steps.is_empty() {
            format!("Invalid step_index: {index}. The plan has no steps.")
        } else {
            format!(
                "Invalid step_index: {index}. Valid indices range from 0 to {}.",
                self.steps.len() - 1
            )
        };
        Err(PlanError::invalid_input("step_index").with_reason(reason))
    }

    pub(crate) fn set_status(&mut self, index: usize, status: StepStatus) -> Result<()> {
        self.check_index(index)?;
        self.step_statuses[index] = status;
        Ok(())
    }

    pub(crate) fn set_notes(&mut self, index: usize, notes: impl Into<String>) -> Result<()> {
        self.check_index(index)?;
        self.step_notes[index] = notes.into();
        Ok(())
    }

    /// Verifies the parallel-sequence invariant.
    pub fn check_invariant(&self) -> Result<()> {
        let len = self.steps.len();
        if self.step_statuses.len() != len || self.step_notes.len() != len {
            return Err(PlanError::invalid_input("steps").with_reason(format!(
                "plan '{}' has {} steps, {} statuses and {} notes",
                self.plan_id,
                len,
                self.step_statuses.len(),
                self.step_notes.len()
            )));
        }
        Ok(())
    }

    /// Rebuilds a plan from stored columns, checking the invariant.
    pub(crate) fn from_parts(
        plan_id: String,
        title: String,
        steps: Vec<String>,
        step_statuses: Vec<StepStatus>,
        step_notes: Vec<String>,
    ) -> Result<Self> {
        let plan = Self {
            plan_id,
            title,
            steps,
            step_statuses,
            step_notes,
        };
        plan.check_invariant()?;
        Ok(plan)
    }
}
