//! The plan registry: canonical in-memory state and its operations.
//!
//! [`PlanRegistry`] owns every plan, the active-plan pointer, the storage
//! backend and the remote-sync handle. Writes mutate the in-memory map first,
//! then persist through the [`PlanStore`], then schedule a notification on
//! [`ExternalSync`].
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  PlanCommand /  │    │  PlanRegistry   │    │   PlanStore     │
//! │  direct calls   │───▶│ (plan_ops,      │───▶│ (memory, json,  │
//! │                 │    │  step_ops)      │    │  sqlite)        │
//! └─────────────────┘    └────────┬────────┘    └─────────────────┘
//!                                 │ fire-and-forget
//!                                 ▼
//!                        ┌─────────────────┐
//!                        │  ExternalSync   │
//!                        └─────────────────┘
//! ```
//!
//! ## Submodules
//!
//! - [`builder`]: Factory for creating [`PlanRegistry`] instances
//! - [`plan_ops`]: create, update, list, get, set_active, resume, delete
//! - [`step_ops`]: mark_step
//! - [`commands`]: The tagged [`PlanCommand`] surface and its dispatcher
//!
//! ## Durability
//!
//! Store failures never fail an operation. They are logged at `warn` and
//! handed back as a [`PersistenceWarning`] inside the operation's [`Outcome`],
//! so callers can decide whether to show them.
//!
//! ```rust
//! use trellis_core::RegistryBuilder;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = RegistryBuilder::new().build().await?;
//!
//! let created = registry.create("launch", "Launch", vec!["draft".into(), "ship".into()])?;
//! assert!(created.is_durable());
//! assert_eq!(registry.active_plan_id(), Some("launch"));
//! # Ok(())
//! # }
//! ```

use std::{fmt, time::Duration};

use log::{debug, warn};

use crate::{
    error::PlanError,
    models::{Plan, PlanMap},
    store::{PlanStore, StoreKind},
    sync::ExternalSync,
};

pub mod builder;
pub mod commands;
pub mod plan_ops;
pub mod step_ops;

#[cfg(test)]
mod tests;

pub use builder::RegistryBuilder;
pub use commands::{CommandOutput, PlanCommand};

/// A store write that failed after the in-memory change was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceWarning {
    pub store: StoreKind,
    pub plan_id: String,
    pub message: String,
}

impl fmt::Display for PersistenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Warning: changes to plan '{}' were applied but not saved to the {} store: {}",
            self.plan_id, self.store, self.message
        )
    }
}

/// Result of a registry write: the formatted value plus an optional
/// durability warning.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub warning: Option<PersistenceWarning>,
}

impl<T> Outcome<T> {
    pub fn new(value: T, warning: Option<PersistenceWarning>) -> Self {
        Self { value, warning }
    }

    /// True when the store accepted the write.
    pub fn is_durable(&self) -> bool {
        self.warning.is_none()
    }
}

impl<T: fmt::Display> fmt::Display for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)?;
        if let Some(warning) = &self.warning {
            writeln!(f)?;
            writeln!(f, "{warning}")?;
        }
        Ok(())
    }
}

/// In-memory registry of plans backed by a [`PlanStore`].
///
/// Operations are not synchronized against each other; share a registry
/// behind a mutex when more than one task mutates it.
pub struct PlanRegistry {
    pub(crate) plans: PlanMap,
    pub(crate) active_plan_id: Option<String>,
    pub(crate) store: Box<dyn PlanStore>,
    pub(crate) sync: ExternalSync,
}

impl PlanRegistry {
    /// Creates a registry over `store`, loading whatever it already holds.
    ///
    /// Load failures leave the registry empty; plans whose parallel sequences
    /// disagree in length are dropped.
    pub fn from_store(mut store: Box<dyn PlanStore>, sync: ExternalSync) -> Self {
        let kind = store.kind();
        let loaded = match store.load_all() {
            Ok(plans) => plans,
            Err(e) => {
                warn!("Failed to load plans from the {kind} store, starting empty: {e}");
                PlanMap::new()
            }
        };

        let plans: PlanMap = loaded
            .into_iter()
            .filter(|(key, plan)| match plan.check_invariant() {
                Ok(()) if key == plan.plan_id() => true,
                Ok(()) => {
                    warn!("Dropping stored plan keyed '{key}' whose id is '{}'", plan.plan_id());
                    false
                }
                Err(e) => {
                    warn!("Dropping stored plan '{key}': {e}");
                    false
                }
            })
            .collect();

        debug!("Loaded {} plan(s) from the {kind} store", plans.len());
        Self {
            plans,
            active_plan_id: None,
            store,
            sync,
        }
    }

    /// Looks up a plan without touching the active pointer.
    pub fn plan(&self, plan_id: &str) -> Option<&Plan> {
        self.plans.get(plan_id)
    }

    pub fn active_plan_id(&self) -> Option<&str> {
        self.active_plan_id.as_deref()
    }

    /// Number of plans held.
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn store_kind(&self) -> StoreKind {
        self.store.kind()
    }

    /// Consumes the registry, giving pending remote sync requests up to
    /// `grace` to complete. Every write has already reached the store.
    pub async fn shutdown(self, grace: Duration) {
        self.sync.shutdown(grace).await;
    }

    /// Resolves an optional id against the active plan. Empty ids count as
    /// omitted.
    pub(crate) fn resolve_plan_id(&self, plan_id: Option<&str>) -> Result<String, PlanError> {
        match plan_id.filter(|id| !id.is_empty()) {
            Some(id) => Ok(id.to_string()),
            None => self
                .active_plan_id
                .clone()
                .ok_or(PlanError::NoActivePlan),
        }
    }

    pub(crate) fn plan_mut(&mut self, plan_id: &str) -> Result<&mut Plan, PlanError> {
        self.plans
            .get_mut(plan_id)
            .ok_or_else(|| PlanError::not_found(plan_id))
    }

    /// Writes the current state of `plan_id` to the store.
    pub(crate) fn persist_save(&mut self, plan_id: &str) -> Option<PersistenceWarning> {
        let plan = self.plans.get(plan_id)?;
        let result = self.store.save(plan, &self.plans);
        self.check_persisted(plan_id, result)
    }

    /// Writes the removal of `plan_id` to the store.
    pub(crate) fn persist_delete(&mut self, plan_id: &str) -> Option<PersistenceWarning> {
        let result = self.store.delete(plan_id, &self.plans);
        self.check_persisted(plan_id, result)
    }

    fn check_persisted(
        &self,
        plan_id: &str,
        result: crate::error::Result<()>,
    ) -> Option<PersistenceWarning> {
        let e = result.err()?;
        let store = self.store.kind();
        warn!("Failed to persist plan '{plan_id}' to the {store} store: {e}");
        Some(PersistenceWarning {
            store,
            plan_id: plan_id.to_string(),
            message: e.to_string(),
        })
    }
}

impl fmt::Debug for PlanRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanRegistry")
            .field("plans", &self.plans.len())
            .field("active_plan_id", &self.active_plan_id)
            .field("store", &self.store.kind())
            .field("sync", &self.sync.is_enabled())
            .finish()
    }
}
