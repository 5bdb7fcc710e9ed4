//! Tagged command surface over the registry.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Outcome, PersistenceWarning, PlanRegistry};
use crate::{
    display::{
        ActivateResult, CreateResult, DeleteResult, MarkStepResult, PlanSummaries, UpdateResult,
    },
    error::Result,
    models::{Plan, StepStatus},
};

/// One registry operation with its parameters.
///
/// ```rust
/// use trellis_core::PlanCommand;
///
/// let command: PlanCommand = serde_json::from_str(
///     r#"{"command": "mark_step", "step_index": 1, "step_status": "blocked"}"#,
/// ).unwrap();
/// assert_eq!(command.name(), "mark_step");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum PlanCommand {
    Create {
        plan_id: String,
        title: String,
        steps: Vec<String>,
    },
    Update {
        plan_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        steps: Option<Vec<String>>,
    },
    List,
    Get {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        plan_id: Option<String>,
    },
    SetActive {
        plan_id: String,
    },
    Resume {
        plan_id: String,
    },
    MarkStep {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        plan_id: Option<String>,
        step_index: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step_status: Option<StepStatus>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step_notes: Option<String>,
    },
    Delete {
        plan_id: String,
    },
}

impl PlanCommand {
    /// The wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            PlanCommand::Create { .. } => "create",
            PlanCommand::Update { .. } => "update",
            PlanCommand::List => "list",
            PlanCommand::Get { .. } => "get",
            PlanCommand::SetActive { .. } => "set_active",
            PlanCommand::Resume { .. } => "resume",
            PlanCommand::MarkStep { .. } => "mark_step",
            PlanCommand::Delete { .. } => "delete",
        }
    }
}

/// What a [`PlanCommand`] produced.
#[derive(Debug, Clone)]
pub enum CommandOutput {
    Created(Outcome<CreateResult<Plan>>),
    Updated(Outcome<UpdateResult<Plan>>),
    Listed(PlanSummaries),
    Shown(Plan),
    Activated(ActivateResult),
    StepMarked(Outcome<MarkStepResult>),
    Deleted(Outcome<DeleteResult<Plan>>),
}

impl CommandOutput {
    /// The durability warning of a write, if the store rejected it.
    pub fn warning(&self) -> Option<&PersistenceWarning> {
        match self {
            CommandOutput::Created(outcome) => outcome.warning.as_ref(),
            CommandOutput::Updated(outcome) => outcome.warning.as_ref(),
            CommandOutput::StepMarked(outcome) => outcome.warning.as_ref(),
            CommandOutput::Deleted(outcome) => outcome.warning.as_ref(),
            CommandOutput::Listed(_) | CommandOutput::Shown(_) | CommandOutput::Activated(_) => {
                None
            }
        }
    }
}

impl fmt::Display for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutput::Created(outcome) => write!(f, "{outcome}"),
            CommandOutput::Updated(outcome) => write!(f, "{outcome}"),
            CommandOutput::Listed(summaries) => write!(f, "{summaries}"),
            CommandOutput::Shown(plan) => write!(f, "{plan}"),
            CommandOutput::Activated(result) => write!(f, "{result}"),
            CommandOutput::StepMarked(outcome) => write!(f, "{outcome}"),
            CommandOutput::Deleted(outcome) => write!(f, "{outcome}"),
        }
    }
}

impl PlanRegistry {
    /// Dispatches a command to the matching registry operation.
    pub fn execute(&mut self, command: PlanCommand) -> Result<CommandOutput> {
        Ok(match command {
            PlanCommand::Create {
                plan_id,
                title,
                steps,
            } => CommandOutput::Created(self.create(&plan_id, &title, steps)?),
            PlanCommand::Update {
                plan_id,
                title,
                steps,
            } => CommandOutput::Updated(self.update(&plan_id, title.as_deref(), steps)?),
            PlanCommand::List => CommandOutput::Listed(self.list()),
            PlanCommand::Get { plan_id } => {
                CommandOutput::Shown(self.get(plan_id.as_deref())?.clone())
            }
            PlanCommand::SetActive { plan_id } => {
                CommandOutput::Activated(self.set_active(&plan_id)?)
            }
            PlanCommand::Resume { plan_id } => CommandOutput::Activated(self.resume(&plan_id)?),
            PlanCommand::MarkStep {
                plan_id,
                step_index,
                step_status,
                step_notes,
            } => CommandOutput::StepMarked(self.mark_step(
                plan_id.as_deref(),
                step_index,
                step_status,
                step_notes.as_deref(),
            )?),
            PlanCommand::Delete { plan_id } => CommandOutput::Deleted(self.delete(&plan_id)?),
        })
    }
}
