//! Driving a plan to completion with agents.
//!
//! [`PlanningFlow::execute`] walks the plan's steps in index order. For the
//! first step that is not `completed` it:
//!
//! 1. halts with [`FlowOutcome::Blocked`] if the step is `blocked`;
//! 2. picks an agent (a leading `[name]` tag routes to that agent, anything
//!    else goes to the pool's primary agent);
//! 3. marks the step `in_progress` and awaits the agent;
//! 4. marks the step `completed` and starts over.
//!
//! An agent error stops the run with [`PlanError::AgentFailed`] and leaves the
//! step `in_progress`. A step marked `blocked` by someone else while its agent
//! runs is not completed; the run halts as blocked instead. If the step was
//! rewritten or re-marked while its agent ran, the output is dropped and
//! selection starts over.
//!
//! The registry lock is only held around registry calls, never across an
//! agent call. Registry writes run on the blocking pool since they reach the
//! store. There is no step limit; wrap `execute` in a timeout.

use std::{fmt, sync::Arc};

use jiff::Timestamp;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::{sync::Mutex, task};

use crate::{
    display::{CreateResult, LocalDateTime},
    error::{PlanError, Result},
    models::{Plan, StepStatus},
    registry::{Outcome, PersistenceWarning, PlanRegistry},
};

pub mod agent;

#[cfg(test)]
mod tests;

pub use agent::{split_agent_tag, Agent, AgentPool, StepContext};

/// Title and steps for a plan defined outside the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSeed {
    pub title: String,
    pub steps: Vec<String>,
}

/// Why a run stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Every step is completed
    Completed,
    /// The current step is blocked and needs outside intervention
    Blocked { step_index: usize },
}

/// One step performed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutedStep {
    pub step_index: usize,
    pub agent: String,
    pub output: String,
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct FlowReport {
    pub plan_id: String,
    pub outcome: FlowOutcome,
    pub executed: Vec<ExecutedStep>,
    /// Store writes that failed during the run
    pub warnings: Vec<PersistenceWarning>,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
}

impl FlowReport {
    pub fn is_complete(&self) -> bool {
        self.outcome == FlowOutcome::Completed
    }
}

impl fmt::Display for FlowReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            FlowOutcome::Completed => writeln!(
                f,
                "Plan '{}' completed: {} step(s) executed in this run.",
                self.plan_id,
                self.executed.len()
            )?,
            FlowOutcome::Blocked { step_index } => writeln!(
                f,
                "Plan '{}' halted: step {step_index} is blocked and needs attention.",
                self.plan_id
            )?,
        }
        writeln!(f, "Started:  {}", LocalDateTime(&self.started_at))?;
        writeln!(f, "Finished: {}", LocalDateTime(&self.finished_at))?;

        for step in &self.executed {
            writeln!(f)?;
            writeln!(f, "Step {} ({}):", step.step_index, step.agent)?;
            writeln!(f, "{}", step.output.trim_end())?;
        }

        if !self.warnings.is_empty() {
            writeln!(f)?;
            for warning in &self.warnings {
                writeln!(f, "{warning}")?;
            }
        }
        Ok(())
    }
}

/// What happened to a step once its agent returned.
enum Finish {
    Completed(Option<PersistenceWarning>),
    Blocked,
    Stale,
}

/// Runs agents over the steps of one plan.
pub struct PlanningFlow {
    registry: Arc<Mutex<PlanRegistry>>,
    agents: AgentPool,
    plan_id: Option<String>,
}

impl PlanningFlow {
    /// A flow over the registry's active plan.
    pub fn new(registry: Arc<Mutex<PlanRegistry>>, agents: AgentPool) -> Self {
        Self {
            registry,
            agents,
            plan_id: None,
        }
    }

    /// Targets `plan_id` instead of the active plan.
    pub fn with_plan_id(mut self, plan_id: impl Into<String>) -> Self {
        self.plan_id = Some(plan_id.into());
        self
    }

    /// Creates `plan_id` from `seed` unless it already exists.
    ///
    /// Returns `None` when the plan was already there. In both cases the flow
    /// targets `plan_id` afterwards.
    pub async fn seed(
        &mut self,
        plan_id: &str,
        seed: PlanSeed,
    ) -> Result<Option<Outcome<CreateResult<Plan>>>> {
        self.plan_id = Some(plan_id.to_string());
        let plan_id = plan_id.to_string();
        self.with_registry(move |registry| {
            if registry.plan(&plan_id).is_some() {
                return Ok(None);
            }
            registry.create(&plan_id, &seed.title, seed.steps).map(Some)
        })
        .await
    }

    /// Runs `f` against the locked registry on the blocking pool.
    async fn with_registry<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut PlanRegistry) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let mut registry = Arc::clone(&self.registry).lock_owned().await;
        task::spawn_blocking(move || f(&mut registry))
            .await
            .map_err(|e| PlanError::Configuration {
                message: format!("Task join error: {e}"),
            })?
    }

    /// Runs until the plan is complete, a step is blocked, or an agent fails.
    ///
    /// # Errors
    ///
    /// `PlanError::NoActivePlan` / `PlanError::PlanNotFound` if there is no
    /// plan to run, `PlanError::UnknownAgent` / `PlanError::NoAgents` if a
    /// step cannot be routed (the step is left untouched), and
    /// `PlanError::AgentFailed` if an agent returns an error.
    pub async fn execute(&self) -> Result<FlowReport> {
        let started_at = Timestamp::now();
        let plan_id = {
            let registry = self.registry.lock().await;
            registry.get(self.plan_id.as_deref())?.plan_id().to_string()
        };

        let mut executed: Vec<ExecutedStep> = Vec::new();
        let mut warnings = Vec::new();

        let outcome = loop {
            let (step_index, step_text, plan_title, plan_view) = {
                let registry = self.registry.lock().await;
                let plan = registry.get(Some(&plan_id))?;
                match plan.first_unfinished() {
                    None => break FlowOutcome::Completed,
                    Some(step) if !step.status.is_actionable() => {
                        break FlowOutcome::Blocked {
                            step_index: step.index,
                        }
                    }
                    Some(step) => (
                        step.index,
                        step.text.to_string(),
                        plan.title().to_string(),
                        plan.to_string(),
                    ),
                }
            };

            let (agent, task) = self.agents.resolve(&step_text)?;

            let id = plan_id.clone();
            let marked = self
                .with_registry(move |registry| {
                    registry.set_step_status(&id, step_index, StepStatus::InProgress)
                })
                .await?;
            warnings.extend(marked.warning);
            info!(
                "Running step {step_index} of plan '{plan_id}' with agent '{}'",
                agent.name()
            );

            let context = StepContext {
                plan_id: plan_id.clone(),
                plan_title,
                step_index,
                step_text: task.to_string(),
                plan_view,
                previous_outputs: executed.clone(),
            };

            let output = match agent.step(&context).await {
                Ok(output) => output,
                Err(e) => {
                    warn!(
                        "Agent '{}' failed on step {step_index} of plan '{plan_id}': {e:#}",
                        agent.name()
                    );
                    return Err(PlanError::AgentFailed {
                        plan_id,
                        step_index,
                        agent: agent.name().to_string(),
                        message: format!("{e:#}"),
                    });
                }
            };

            let id = plan_id.clone();
            let dispatched = step_text.clone();
            let finished = self
                .with_registry(move |registry| {
                    let current = registry.get(Some(&id))?.step(step_index).map(|step| {
                        (step.status, step.text == dispatched)
                    });
                    match current {
                        Some((StepStatus::Blocked, true)) => Ok(Finish::Blocked),
                        Some((StepStatus::InProgress, true)) => registry
                            .set_step_status(&id, step_index, StepStatus::Completed)
                            .map(|marked| Finish::Completed(marked.warning)),
                        _ => Ok(Finish::Stale),
                    }
                })
                .await?;

            match finished {
                Finish::Completed(warning) => warnings.extend(warning),
                Finish::Blocked => {
                    info!("Step {step_index} of plan '{plan_id}' was blocked while running");
                    break FlowOutcome::Blocked { step_index };
                }
                Finish::Stale => {
                    info!(
                        "Step {step_index} of plan '{plan_id}' changed while running, discarding output"
                    );
                    continue;
                }
            }

            executed.push(ExecutedStep {
                step_index,
                agent: agent.name().to_string(),
                output,
            });
        };

        match outcome {
            FlowOutcome::Completed => info!("Plan '{plan_id}' is complete"),
            FlowOutcome::Blocked { step_index } => {
                info!("Plan '{plan_id}' halted at blocked step {step_index}")
            }
        }

        Ok(FlowReport {
            plan_id,
            outcome,
            executed,
            warnings,
            started_at,
            finished_at: Timestamp::now(),
        })
    }
}

impl fmt::Debug for PlanningFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanningFlow")
            .field("agents", &self.agents)
            .field("plan_id", &self.plan_id)
            .finish()
    }
}
