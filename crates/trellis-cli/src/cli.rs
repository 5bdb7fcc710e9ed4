//! Subcommand definitions and their handlers
//!
//! Argument structs carry the clap derives; [`Cli`] turns them into registry
//! calls and renders the same Display output the MCP tool returns.
//!
//! ```text
//! User Input → CLI Args (clap) → PlanRegistry → Display → TerminalRenderer
//! ```

use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use log::info;
use tokio::sync::Mutex;
use trellis_core::{AgentPool, FlowOutcome, PlanRegistry, PlanningFlow, StepStatus};

use crate::{
    agent::{AgentSpec, CommandAgent},
    renderer::TerminalRenderer,
};

/// Validates a plan id given on the command line.
///
/// Ids are 1 to 50 characters of ASCII letters, digits, `_` or `-`.
pub fn parse_plan_id(value: &str) -> Result<String, String> {
    let valid = !value.is_empty()
        && value.len() <= 50
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(value.to_string())
    } else {
        Err(format!(
            "invalid plan id '{value}': use 1-50 letters, digits, '_' or '-'"
        ))
    }
}

/// Create a new plan
///
/// The new plan becomes the active plan and all of its steps start as
/// not_started.
#[derive(Args)]
pub struct CreatePlanArgs {
    /// Unique identifier of the plan
    #[arg(value_parser = parse_plan_id)]
    pub plan_id: String,
    /// Title of the plan
    pub title: String,
    /// A step of the plan; repeat for each step, in order
    #[arg(short, long = "step", required = true)]
    pub steps: Vec<String>,
}

/// Update a plan's title or steps
///
/// Replacing the steps keeps the status and notes of every step whose text is
/// unchanged at the same position; everything else starts over as
/// not_started.
#[derive(Args)]
pub struct UpdatePlanArgs {
    /// Unique identifier of the plan to update
    #[arg(value_parser = parse_plan_id)]
    pub plan_id: String,
    /// New title for the plan
    #[arg(short, long)]
    pub title: Option<String>,
    /// Replacement step list; repeat for each step, in order
    #[arg(short, long = "step")]
    pub steps: Vec<String>,
}

/// Show details of a specific plan
#[derive(Args)]
pub struct ShowPlanArgs {
    /// Unique identifier of the plan to show
    #[arg(value_parser = parse_plan_id)]
    pub plan_id: String,
}

/// Delete a plan permanently
#[derive(Args)]
pub struct DeletePlanArgs {
    /// Unique identifier of the plan to delete
    #[arg(value_parser = parse_plan_id)]
    pub plan_id: String,
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Create a new plan
    #[command(alias = "c")]
    Create(CreatePlanArgs),
    /// Update a plan's title or steps
    #[command(alias = "u")]
    Update(UpdatePlanArgs),
    /// List all plans
    #[command(aliases = ["l", "ls"])]
    List,
    /// Show details of a specific plan
    #[command(alias = "s")]
    Show(ShowPlanArgs),
    /// Delete a plan permanently
    #[command(aliases = ["d", "rm"])]
    Delete(DeletePlanArgs),
}

/// Set the status and/or notes of a step
#[derive(Args)]
pub struct MarkStepArgs {
    /// Unique identifier of the plan
    #[arg(value_parser = parse_plan_id)]
    pub plan_id: String,
    /// 0-based index of the step
    pub step_index: usize,
    /// New status for the step
    #[arg(short, long)]
    pub status: Option<StepStatusArg>,
    /// Notes for the step; existing notes are kept when omitted
    #[arg(short, long)]
    pub notes: Option<String>,
}

#[derive(Subcommand)]
pub enum StepCommands {
    /// Set the status and/or notes of a step
    #[command(alias = "m")]
    Mark(MarkStepArgs),
}

/// Command-line representation of step status values
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StepStatusArg {
    /// Not started yet
    #[value(alias = "not_started")]
    NotStarted,
    /// Being worked on
    #[value(alias = "in_progress")]
    InProgress,
    /// Finished
    Completed,
    /// Waiting on something outside the plan
    Blocked,
}

impl From<StepStatusArg> for StepStatus {
    fn from(val: StepStatusArg) -> Self {
        match val {
            StepStatusArg::NotStarted => StepStatus::NotStarted,
            StepStatusArg::InProgress => StepStatus::InProgress,
            StepStatusArg::Completed => StepStatus::Completed,
            StepStatusArg::Blocked => StepStatus::Blocked,
        }
    }
}

/// Run a plan's remaining steps through agent programs
///
/// Each step is handed to an agent program as its last argument, with
/// TRELLIS_PLAN_ID and TRELLIS_STEP_INDEX set in its environment. A step
/// starting with `[name]` goes to the agent called `name`; other steps go to
/// the first agent. The run stops at the first blocked step, on the first
/// agent failure, or when the timeout expires.
#[derive(Args)]
pub struct RunArgs {
    /// Unique identifier of the plan to run
    #[arg(value_parser = parse_plan_id)]
    pub plan_id: String,
    /// Agent program as [NAME=]PROGRAM [ARGS...]; repeat for several agents
    #[arg(short, long = "agent", required = true, value_parser = AgentSpec::parse)]
    pub agents: Vec<AgentSpec>,
    /// Maximum wall-clock time for the whole run, in seconds
    #[arg(long, default_value_t = 3600)]
    pub timeout_secs: u64,
}

/// How long a finished command waits for remote sync requests.
const SYNC_GRACE: Duration = Duration::from_secs(5);

/// Handles CLI subcommands against one registry.
pub struct Cli {
    registry: PlanRegistry,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(registry: PlanRegistry, renderer: TerminalRenderer) -> Self {
        Self { registry, renderer }
    }

    pub async fn handle_plan_command(mut self, command: PlanCommands) -> Result<()> {
        let output = match command {
            PlanCommands::Create(args) => self
                .registry
                .create(&args.plan_id, &args.title, args.steps)
                .context("Failed to create plan")?
                .to_string(),
            PlanCommands::Update(args) => {
                let steps = (!args.steps.is_empty()).then_some(args.steps);
                self.registry
                    .update(&args.plan_id, args.title.as_deref(), steps)
                    .context("Failed to update plan")?
                    .to_string()
            }
            PlanCommands::List => self.registry.list().to_string(),
            PlanCommands::Show(args) => self
                .registry
                .get(Some(&args.plan_id))
                .context("Failed to show plan")?
                .to_string(),
            PlanCommands::Delete(args) => self
                .registry
                .delete(&args.plan_id)
                .context("Failed to delete plan")?
                .to_string(),
        };
        self.renderer.render(&output)?;
        self.registry.shutdown(SYNC_GRACE).await;
        Ok(())
    }

    pub fn handle_step_command(mut self, command: StepCommands) -> Result<()> {
        match command {
            StepCommands::Mark(args) => {
                if args.status.is_none() && args.notes.is_none() {
                    bail!("Nothing to change: pass --status and/or --notes");
                }
                let outcome = self
                    .registry
                    .mark_step(
                        Some(&args.plan_id),
                        args.step_index,
                        args.status.map(Into::into),
                        args.notes.as_deref(),
                    )
                    .context("Failed to mark step")?;
                self.renderer.render(&outcome.to_string())
            }
        }
    }

    pub fn list_plans(&self) -> Result<()> {
        self.renderer.render(&self.registry.list().to_string())
    }

    /// Runs the plan until it completes, blocks, fails or times out.
    pub async fn run_plan(self, args: RunArgs) -> Result<()> {
        let mut agents = AgentPool::new();
        for spec in args.agents {
            agents.insert(Arc::new(CommandAgent::new(spec)));
        }

        let registry = Arc::new(Mutex::new(self.registry));
        let flow = PlanningFlow::new(Arc::clone(&registry), agents).with_plan_id(&args.plan_id);
        let deadline = Duration::from_secs(args.timeout_secs);

        info!(
            "Running plan '{}' with a {}s deadline",
            args.plan_id, args.timeout_secs
        );
        let result = tokio::time::timeout(deadline, flow.execute()).await;
        drop(flow);
        if let Ok(registry) = Arc::try_unwrap(registry) {
            registry.into_inner().shutdown(SYNC_GRACE).await;
        }

        let report = match result {
            Ok(result) => result.context("Plan run failed")?,
            Err(_) => bail!(
                "Plan run timed out after {}s; progress so far has been kept",
                args.timeout_secs
            ),
        };

        self.renderer.render(&report.to_string())?;
        match report.outcome {
            FlowOutcome::Completed => Ok(()),
            FlowOutcome::Blocked { step_index } => {
                bail!("Plan '{}' is blocked at step {step_index}", report.plan_id)
            }
        }
    }
}
