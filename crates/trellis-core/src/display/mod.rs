//! Display formatting for plans and operation results.
//!
//! Domain models implement [`std::fmt::Display`] directly (see [`models`]);
//! this module adds newtype wrappers for collections and result types for
//! write operations so the CLI and the MCP tool print identical text.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  Domain Models  │    │ Wrappers &      │    │   Formatted     │
//! │ (Plan, Summary) │───▶│ Result Types    │───▶│    Output       │
//! │                 │    │                 │    │  (Terminal/MCP) │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`collections`]: `PlanSummaries`
//! - [`results`]: `CreateResult`, `UpdateResult`, `ActivateResult`,
//!   `MarkStepResult`, `DeleteResult`
//! - [`datetime`]: Date/time formatting utilities
//! - [`models`]: Display implementations for domain models
//!
//! ```rust
//! use trellis_core::{
//!     display::{CreateResult, UpdateResult},
//!     models::Plan,
//! };
//!
//! let plan = Plan::new("p1", "New Project", vec!["scope".to_string()]).unwrap();
//!
//! let output = CreateResult::new(plan.clone()).to_string();
//! assert!(output.contains("Plan created successfully with ID: p1"));
//!
//! let changes = vec!["Updated title".to_string()];
//! let output = UpdateResult::with_changes(plan, changes).to_string();
//! assert!(output.contains("Changes made:"));
//! ```

pub mod collections;
pub mod datetime;
pub mod models;
pub mod results;

pub use collections::PlanSummaries;
pub use datetime::LocalDateTime;
pub use results::{
    describe_steps_diff, ActivateResult, CreateResult, DeleteResult, MarkStepResult, UpdateResult,
};
