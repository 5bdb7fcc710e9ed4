//! Flat request shape for the planning command surface.
//!
//! [`PlanningRequest`] is what external callers (the MCP tool, JSON clients)
//! send: one `command` plus every parameter any command might take. It is
//! converted into the exhaustive [`PlanCommand`] with per-command validation
//! before anything touches the registry.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │ PlanningRequest │    │   PlanCommand   │    │  PlanRegistry   │
//! │ (flat, loose)   │───▶│ (tagged, typed) │───▶│   ::execute     │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```

use std::fmt;

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::PlanError,
    models::StepStatus,
    registry::PlanCommand,
};

/// Names of the planning commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum CommandName {
    Create,
    Update,
    List,
    Get,
    SetActive,
    Resume,
    MarkStep,
    Delete,
}

impl CommandName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::Create => "create",
            CommandName::Update => "update",
            CommandName::List => "list",
            CommandName::Get => "get",
            CommandName::SetActive => "set_active",
            CommandName::Resume => "resume",
            CommandName::MarkStep => "mark_step",
            CommandName::Delete => "delete",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for the planning tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct PlanningRequest {
    /// The command to execute: create, update, list, get, set_active, resume,
    /// mark_step or delete
    pub command: CommandName,
    /// Unique identifier for the plan. Required for create, update,
    /// set_active, resume and delete; get and mark_step default to the active
    /// plan
    #[serde(default)]
    pub plan_id: Option<String>,
    /// Title for the plan. Required for create, optional for update
    #[serde(default)]
    pub title: Option<String>,
    /// List of plan steps. Required for create, optional for update
    #[serde(default)]
    pub steps: Option<Vec<String>>,
    /// Index of the step to update (0-based). Required for mark_step
    #[serde(default)]
    pub step_index: Option<i64>,
    /// Status to set for a step: not_started, in_progress, completed or
    /// blocked. Used with mark_step
    #[serde(default)]
    pub step_status: Option<String>,
    /// Additional notes for a step. Used with mark_step
    #[serde(default)]
    pub step_notes: Option<String>,
}

impl PlanningRequest {
    /// A request carrying only the command name.
    pub fn new(command: CommandName) -> Self {
        Self {
            command,
            plan_id: None,
            title: None,
            steps: None,
            step_index: None,
            step_status: None,
            step_notes: None,
        }
    }

    fn required_plan_id(&mut self) -> Result<String, PlanError> {
        self.plan_id
            .take()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PlanError::missing_param("plan_id", self.command.as_str()))
    }
}

impl TryFrom<PlanningRequest> for PlanCommand {
    type Error = PlanError;

    fn try_from(mut request: PlanningRequest) -> Result<Self, Self::Error> {
        let command = request.command;
        Ok(match command {
            CommandName::Create => {
                let plan_id = request.required_plan_id()?;
                let title = request
                    .title
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| PlanError::missing_param("title", "create"))?;
                let steps = request.steps.unwrap_or_default();
                if steps.is_empty() {
                    return Err(PlanError::invalid_input("steps").with_reason(
                        "Parameter `steps` must be a non-empty list of strings for command: create",
                    ));
                }
                PlanCommand::Create {
                    plan_id,
                    title,
                    steps,
                }
            }
            CommandName::Update => PlanCommand::Update {
                plan_id: request.required_plan_id()?,
                title: request.title,
                steps: request.steps,
            },
            CommandName::List => PlanCommand::List,
            CommandName::Get => PlanCommand::Get {
                plan_id: request.plan_id.filter(|id| !id.is_empty()),
            },
            CommandName::SetActive => PlanCommand::SetActive {
                plan_id: request.required_plan_id()?,
            },
            CommandName::Resume => PlanCommand::Resume {
                plan_id: request.required_plan_id()?,
            },
            CommandName::MarkStep => {
                let raw_index = request
                    .step_index
                    .ok_or_else(|| PlanError::missing_param("step_index", "mark_step"))?;
                let step_index = usize::try_from(raw_index).map_err(|_| {
                    PlanError::invalid_input("step_index").with_reason(format!(
                        "Invalid step_index: {raw_index}. Step indices start at 0."
                    ))
                })?;
                let step_status = request
                    .step_status
                    .filter(|s| !s.is_empty())
                    .map(|s| {
                        s.parse::<StepStatus>()
                            .map_err(|e| PlanError::invalid_input("step_status").with_reason(e))
                    })
                    .transpose()?;
                PlanCommand::MarkStep {
                    plan_id: request.plan_id.filter(|id| !id.is_empty()),
                    step_index,
                    step_status,
                    step_notes: request.step_notes,
                }
            }
            CommandName::Delete => PlanCommand::Delete {
                plan_id: request.required_plan_id()?,
            },
        })
    }
}
