//! Agents that perform plan steps, and the pool a flow picks them from.

use std::{fmt, sync::Arc};

use async_trait::async_trait;

use crate::error::{PlanError, Result};

use super::ExecutedStep;

/// Something that can carry out one step of a plan.
///
/// Returning `Err` is an unrecoverable failure for the step: the flow stops
/// and leaves the step `in_progress`.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Name used to route tagged steps to this agent
    fn name(&self) -> &str;

    /// Perform the step and return its output
    async fn step(&self, context: &StepContext) -> anyhow::Result<String>;
}

/// Everything an agent is told about the step it must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepContext {
    pub plan_id: String,
    pub plan_title: String,
    pub step_index: usize,
    /// Step text with any leading `[agent]` tag removed
    pub step_text: String,
    /// The formatted plan as it stood when the step was dispatched
    pub plan_view: String,
    /// Steps completed earlier in the same run, oldest first
    pub previous_outputs: Vec<ExecutedStep>,
}

/// Named agents available to a flow.
///
/// Names are matched case-insensitively. The first agent added is the primary
/// one unless [`with_primary`](Self::with_primary) picks another.
#[derive(Clone, Default)]
pub struct AgentPool {
    agents: Vec<Arc<dyn Agent>>,
    primary: usize,
}

impl AgentPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an agent, replacing any existing agent with the same name.
    pub fn with_agent(mut self, agent: Arc<dyn Agent>) -> Self {
        self.insert(agent);
        self
    }

    pub fn insert(&mut self, agent: Arc<dyn Agent>) {
        match self.position(agent.name()) {
            Some(i) => self.agents[i] = agent,
            None => self.agents.push(agent),
        }
    }

    /// Makes `name` the agent for untagged steps.
    pub fn with_primary(mut self, name: &str) -> Result<Self> {
        self.primary = self.position(name).ok_or_else(|| PlanError::UnknownAgent {
            name: name.to_string(),
        })?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Agent>> {
        self.position(name).map(|i| &self.agents[i])
    }

    pub fn primary(&self) -> Option<&Arc<dyn Agent>> {
        self.agents.get(self.primary)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.agents.iter().map(|a| a.name())
    }

    /// Picks the agent for `step_text` and returns it with the text to hand
    /// over.
    pub(crate) fn resolve<'a>(&self, step_text: &'a str) -> Result<(Arc<dyn Agent>, &'a str)> {
        let (tag, task) = split_agent_tag(step_text);
        let agent = match tag {
            Some(name) => self.get(name).ok_or_else(|| PlanError::UnknownAgent {
                name: name.to_string(),
            })?,
            None => self.primary().ok_or(PlanError::NoAgents)?,
        };
        Ok((Arc::clone(agent), task))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.agents
            .iter()
            .position(|a| a.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Debug for AgentPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentPool")
            .field("agents", &self.names().collect::<Vec<_>>())
            .field("primary", &self.primary().map(|a| a.name()))
            .finish()
    }
}

/// Splits a leading `[name]` tag off a step.
///
/// ```rust
/// use trellis_core::flow::split_agent_tag;
///
/// assert_eq!(split_agent_tag("[search] find prior art"), (Some("search"), "find prior art"));
/// assert_eq!(split_agent_tag("write the summary"), (None, "write the summary"));
/// assert_eq!(split_agent_tag("[not a tag] text"), (None, "[not a tag] text"));
/// ```
pub fn split_agent_tag(step_text: &str) -> (Option<&str>, &str) {
    let trimmed = step_text.trim_start();
    let Some(rest) = trimmed.strip_prefix('[') else {
        return (None, step_text);
    };
    let Some((name, task)) = rest.split_once(']') else {
        return (None, step_text);
    };

    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return (None, step_text);
    }
    (Some(name), task.trim_start())
}
