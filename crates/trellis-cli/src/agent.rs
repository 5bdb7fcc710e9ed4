//! Agents backed by external programs

use std::process::Stdio;

use anyhow::{bail, Context};
use async_trait::async_trait;
use log::debug;
use tokio::process::Command;
use trellis_core::{Agent, StepContext};

/// An agent program given as `[NAME=]PROGRAM [ARGS...]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSpec {
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
}

impl AgentSpec {
    /// Parses an `--agent` value. Without `NAME=` the agent is named after the
    /// program's file name.
    pub fn parse(value: &str) -> Result<Self, String> {
        let (name, command) = match value.split_once('=') {
            Some((name, command)) if is_agent_name(name) => (Some(name), command),
            _ => (None, value),
        };

        let mut words = command.split_whitespace().map(str::to_string);
        let Some(program) = words.next() else {
            return Err(format!("agent '{value}' has no program"));
        };
        let name = match name {
            Some(name) => name.to_string(),
            None => std::path::Path::new(&program)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(&program)
                .to_string(),
        };

        Ok(Self {
            name,
            program,
            args: words.collect(),
        })
    }
}

fn is_agent_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Runs `PROGRAM [ARGS...] <step text>` for every step it is given.
///
/// Standard output is the step's result. A non-zero exit is a failure.
#[derive(Debug)]
pub struct CommandAgent {
    spec: AgentSpec,
}

impl CommandAgent {
    pub fn new(spec: AgentSpec) -> Self {
        Self { spec }
    }
}

#[async_trait]
impl Agent for CommandAgent {
    fn name(&self) -> &str {
        &self.spec.name
    }

    async fn step(&self, context: &StepContext) -> anyhow::Result<String> {
        debug!(
            "Spawning {} for step {} of plan '{}'",
            self.spec.program, context.step_index, context.plan_id
        );
        let output = Command::new(&self.spec.program)
            .args(&self.spec.args)
            .arg(&context.step_text)
            .env("TRELLIS_PLAN_ID", &context.plan_id)
            .env("TRELLIS_STEP_INDEX", context.step_index.to_string())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to start '{}'", self.spec.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "'{}' exited with {}: {}",
                self.spec.program,
                output.status,
                stderr.trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
