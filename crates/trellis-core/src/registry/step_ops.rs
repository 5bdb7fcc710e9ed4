//! Step operations for the PlanRegistry.

use log::info;

use super::{Outcome, PlanRegistry};
use crate::{
    display::MarkStepResult,
    error::{PlanError, Result},
    models::StepStatus,
};

impl PlanRegistry {
    /// Sets the status and/or notes of one step.
    ///
    /// `plan_id` defaults to the active plan. Notes are only overwritten by a
    /// non-empty value; omitting them keeps what is there. Any status may be
    /// set from any other.
    ///
    /// # Errors
    ///
    /// `PlanError::NoActivePlan`, `PlanError::PlanNotFound`, or
    /// `PlanError::InvalidInput` for an out-of-range `step_index`. Nothing is
    /// mutated on failure.
    pub fn mark_step(
        &mut self,
        plan_id: Option<&str>,
        step_index: usize,
        status: Option<StepStatus>,
        notes: Option<&str>,
    ) -> Result<Outcome<MarkStepResult>> {
        let plan_id = self.resolve_plan_id(plan_id)?;
        let plan = self.plan_mut(&plan_id)?;
        plan.check_index(step_index)?;

        if let Some(status) = status {
            plan.set_status(step_index, status)?;
        }
        if let Some(notes) = notes.filter(|n| !n.is_empty()) {
            plan.set_notes(step_index, notes)?;
        }

        let plan = plan.clone();
        if let Some(status) = status {
            info!("Step {step_index} of plan '{plan_id}' marked {status}");
        }

        let warning = self.persist_save(&plan_id);
        Ok(Outcome::new(MarkStepResult { plan, step_index }, warning))
    }

    /// Convenience for marking a step with a status and no notes.
    pub(crate) fn set_step_status(
        &mut self,
        plan_id: &str,
        step_index: usize,
        status: StepStatus,
    ) -> Result<Outcome<MarkStepResult>> {
        if plan_id.is_empty() {
            return Err(PlanError::missing_param("plan_id", "mark_step"));
        }
        self.mark_step(Some(plan_id), step_index, Some(status), None)
    }
}
