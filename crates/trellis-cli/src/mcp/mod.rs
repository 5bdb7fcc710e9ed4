//! MCP server implementation for Trellis
//!
//! Exposes the registry's command surface to AI assistants as a single
//! `planning` tool over the Model Context Protocol (stdio transport).

use std::sync::Arc;

use anyhow::Result;
use log::{debug, error, info};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use tokio::{
    signal::unix::{signal, SignalKind},
    sync::Mutex,
    task,
};
use trellis_core::{PlanCommand, PlanRegistry, PlanningRequest};

pub mod errors;

use errors::to_mcp_error;

/// MCP server for Trellis
#[derive(Clone)]
pub struct TrellisMcpServer {
    registry: Arc<Mutex<PlanRegistry>>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl TrellisMcpServer {
    /// Create a new Trellis MCP server
    pub fn new(registry: PlanRegistry) -> Self {
        Self {
            registry: Arc::new(Mutex::new(registry)),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        name = "planning",
        description = "Create and track multi-step plans. Commands: create (plan_id, title, steps), update (plan_id, optional title and/or steps; steps whose text is unchanged at the same position keep their progress), list, get (plan_id or the active plan), set_active / resume (plan_id), mark_step (step_index, optional plan_id, step_status of not_started|in_progress|completed|blocked, step_notes), delete (plan_id). Creating a plan makes it the active plan."
    )]
    async fn planning(
        &self,
        Parameters(request): Parameters<PlanningRequest>,
    ) -> Result<CallToolResult, McpError> {
        debug!("planning tool called with command '{}'", request.command);
        let command = PlanCommand::try_from(request)
            .map_err(|e| to_mcp_error("Invalid planning request", &e))?;

        // Commands that write reach the store, so run them off the async workers.
        let mut registry = Arc::clone(&self.registry).lock_owned().await;
        let output = task::spawn_blocking(move || registry.execute(command))
            .await
            .map_err(|e| McpError::internal_error(format!("Task join error: {e}"), None))?
            .map_err(|e| to_mcp_error("Planning command failed", &e))?;

        Ok(CallToolResult::success(vec![Content::text(
            output.to_string(),
        )]))
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for TrellisMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "trellis".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(r#"Trellis keeps multi-step plans and tracks the status and notes of every step.

## Workflow
1. `create` a plan with an id, a title and an ordered list of steps. It becomes the active plan.
2. Work through the steps, recording progress with `mark_step` (status not_started, in_progress, completed or blocked, plus optional notes). Omit plan_id to use the active plan.
3. `get` shows the plan with a progress summary; `list` shows every plan.
4. `update` can rename a plan or replace its steps. Steps that keep the same text at the same position keep their status and notes.
5. `set_active` or `resume` switches the active plan; `delete` removes a plan for good.

Step indices start at 0. A step may name an agent with a leading `[name]` tag, for example `[search] find prior art`."#.to_string()),
            ..Default::default()
        }
    }
}

/// Run the MCP server with stdio transport
pub async fn run_stdio_server(server: TrellisMcpServer) -> Result<()> {
    use rmcp::{transport::stdio, ServiceExt};

    info!("Starting Trellis MCP server on stdio");
    debug!(
        "Server created with {} tools",
        server.tool_router.list_all().len()
    );

    let service = server.serve(stdio()).await.inspect_err(|e| {
        error!("serving error: {e:?}");
    })?;

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        result = service.waiting() => {
            match result {
                Ok(_) => info!("MCP server stopped normally"),
                Err(e) => error!("MCP server error: {e:?}"),
            }
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }

    info!("MCP server shutdown complete");
    Ok(())
}
