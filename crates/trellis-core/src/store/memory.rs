//! Transient backend.

use super::{PlanStore, StoreKind};
use crate::{
    error::Result,
    models::{Plan, PlanMap},
};

/// Store that keeps nothing; the registry's map is the only copy.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryStore;

impl PlanStore for MemoryStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Memory
    }

    fn load_all(&mut self) -> Result<PlanMap> {
        Ok(PlanMap::new())
    }

    fn save(&mut self, _plan: &Plan, _all: &PlanMap) -> Result<()> {
        Ok(())
    }

    fn delete(&mut self, _plan_id: &str, _all: &PlanMap) -> Result<()> {
        Ok(())
    }
}
