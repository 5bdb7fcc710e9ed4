//! Core library for the Trellis plan engine.
//!
//! This crate holds the plan lifecycle and the step-execution loop:
//!
//! - [`registry`]: the canonical set of plans, the active-plan pointer and
//!   every create/update/mark/delete operation
//! - [`store`]: pluggable durability (in memory, one JSON document, SQLite)
//! - [`sync`]: best-effort mirroring of mutations to a remote HTTP service
//! - [`flow`]: the loop that walks agents through a plan's steps
//! - [`display`]: plain-text rendering shared by every front-end
//!
//! Data flows one way: flow → registry → store, and registry → sync.
//!
//! # Quick Start
//!
//! ```rust
//! use trellis_core::{models::StepStatus, RegistryBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = RegistryBuilder::new().build().await?;
//!
//! let created = registry.create(
//!     "release",
//!     "Cut a release",
//!     vec!["bump version".to_string(), "tag".to_string()],
//! )?;
//! println!("{created}");
//!
//! registry.mark_step(None, 0, Some(StepStatus::Completed), Some("0.2.0"))?;
//! println!("{}", registry.list());
//! # Ok(())
//! # }
//! ```

pub mod display;
pub mod error;
pub mod flow;
pub mod models;
pub mod params;
pub mod registry;
pub mod store;
pub mod sync;

// Re-export commonly used types
pub use display::{
    ActivateResult, CreateResult, DeleteResult, LocalDateTime, MarkStepResult, PlanSummaries,
    UpdateResult,
};
pub use error::{PlanError, Result};
pub use flow::{
    Agent, AgentPool, ExecutedStep, FlowOutcome, FlowReport, PlanSeed, PlanningFlow, StepContext,
};
pub use models::{Plan, PlanMap, PlanSummary, StepStatus};
pub use params::{CommandName, PlanningRequest};
pub use registry::{
    CommandOutput, Outcome, PersistenceWarning, PlanCommand, PlanRegistry, RegistryBuilder,
};
pub use store::{PlanStore, StoreKind};
pub use sync::{ExternalSync, SyncConfig, SyncOperation};
