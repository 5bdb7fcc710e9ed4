//! Data models for plans and steps.
//!
//! A [`Plan`] stores its steps as three parallel sequences (text, status,
//! notes). Display implementations live in [`crate::display::models`] so that
//! the models stay free of presentation logic.
//!
//! # Examples
//!
//! ```rust
//! use trellis_core::models::{Plan, StepStatus};
//!
//! let plan = Plan::new("p1", "Ship it", vec!["build".into(), "release".into()]).unwrap();
//! assert_eq!(plan.step_statuses(), &[StepStatus::NotStarted, StepStatus::NotStarted]);
//! assert_eq!(plan.first_unfinished().map(|s| s.text), Some("build"));
//! ```

pub mod plan;
pub mod status;
pub mod summary;


use std::collections::BTreeMap;

pub use plan::{Plan, StepView, StepsDiff};
pub use status::StepStatus;
pub use summary::PlanSummary;

/// Keyed plan map, ordered by plan id.
pub type PlanMap = BTreeMap<String, Plan>;
