//! Plan-level operations for the PlanRegistry.

use log::info;

use super::{Outcome, PlanRegistry};
use crate::{
    display::{
        describe_steps_diff, ActivateResult, CreateResult, DeleteResult, PlanSummaries,
        UpdateResult,
    },
    error::{PlanError, Result},
    models::{Plan, PlanSummary},
    sync::SyncOperation,
};

impl PlanRegistry {
    /// Creates a plan and makes it the active one.
    ///
    /// # Errors
    ///
    /// Validation errors for an empty id, an id already in use, an empty title
    /// or an empty step list. Nothing is mutated on failure.
    pub fn create(
        &mut self,
        plan_id: &str,
        title: &str,
        steps: Vec<String>,
    ) -> Result<Outcome<CreateResult<Plan>>> {
        if plan_id.is_empty() {
            return Err(PlanError::missing_param("plan_id", "create"));
        }
        if self.plans.contains_key(plan_id) {
            return Err(PlanError::PlanExists {
                plan_id: plan_id.to_string(),
            });
        }

        let plan = Plan::new(plan_id, title, steps)?;
        self.plans.insert(plan_id.to_string(), plan.clone());
        self.active_plan_id = Some(plan_id.to_string());
        info!("Created plan '{plan_id}' with {} step(s)", plan.len());

        let warning = self.persist_save(plan_id);
        self.sync.notify(SyncOperation::Create, plan_id, Some(&plan));
        Ok(Outcome::new(CreateResult::new(plan), warning))
    }

    /// Changes the title and/or the steps of a plan.
    ///
    /// An empty title or step list counts as not supplied. New steps inherit
    /// status and notes only from the same index with identical text, so a
    /// reordered step starts over as `not_started`.
    pub fn update(
        &mut self,
        plan_id: &str,
        title: Option<&str>,
        steps: Option<Vec<String>>,
    ) -> Result<Outcome<UpdateResult<Plan>>> {
        if plan_id.is_empty() {
            return Err(PlanError::missing_param("plan_id", "update"));
        }

        let plan = self.plan_mut(plan_id)?;
        let mut changes = Vec::new();

        if let Some(title) = title.filter(|t| !t.is_empty()) {
            if title != plan.title() {
                changes.push(format!("Updated title to '{title}'"));
            }
            plan.set_title(title);
        }

        if let Some(steps) = steps.filter(|s| !s.is_empty()) {
            let diff = plan.replace_steps(steps)?;
            changes.push(describe_steps_diff(diff));
        }

        let plan = plan.clone();
        info!("Updated plan '{plan_id}' ({} change(s))", changes.len());

        let warning = self.persist_save(plan_id);
        self.sync.notify(SyncOperation::Update, plan_id, Some(&plan));
        Ok(Outcome::new(UpdateResult::with_changes(plan, changes), warning))
    }

    /// Summaries of every plan, ordered by id.
    pub fn list(&self) -> PlanSummaries {
        let active = self.active_plan_id();
        PlanSummaries(
            self.plans
                .values()
                .map(|plan| PlanSummary::from_plan(plan, active))
                .collect(),
        )
    }

    /// Returns the named plan, or the active plan when `plan_id` is omitted.
    ///
    /// # Errors
    ///
    /// `PlanError::NoActivePlan` when no id is given and none is active;
    /// `PlanError::PlanNotFound` for an unknown id.
    pub fn get(&self, plan_id: Option<&str>) -> Result<&Plan> {
        let plan_id = self.resolve_plan_id(plan_id)?;
        self.plans
            .get(&plan_id)
            .ok_or_else(|| PlanError::not_found(plan_id))
    }

    /// Points the active-plan reference at `plan_id`.
    ///
    /// The pointer is process state only; it is neither persisted nor synced.
    pub fn set_active(&mut self, plan_id: &str) -> Result<ActivateResult> {
        if plan_id.is_empty() {
            return Err(PlanError::missing_param("plan_id", "set_active"));
        }
        let plan = self
            .plans
            .get(plan_id)
            .ok_or_else(|| PlanError::not_found(plan_id))?
            .clone();

        self.active_plan_id = Some(plan_id.to_string());
        info!("Plan '{plan_id}' is now active");
        Ok(ActivateResult { plan })
    }

    /// Same as [`set_active`](Self::set_active).
    pub fn resume(&mut self, plan_id: &str) -> Result<ActivateResult> {
        self.set_active(plan_id)
    }

    /// Removes a plan, clearing the active pointer if it referenced it.
    pub fn delete(&mut self, plan_id: &str) -> Result<Outcome<DeleteResult<Plan>>> {
        if plan_id.is_empty() {
            return Err(PlanError::missing_param("plan_id", "delete"));
        }
        let plan = self
            .plans
            .remove(plan_id)
            .ok_or_else(|| PlanError::not_found(plan_id))?;

        if self.active_plan_id.as_deref() == Some(plan_id) {
            self.active_plan_id = None;
        }
        info!("Deleted plan '{plan_id}'");

        let warning = self.persist_delete(plan_id);
        self.sync.notify(SyncOperation::Delete, plan_id, None);
        Ok(Outcome::new(DeleteResult::new(plan), warning))
    }
}
