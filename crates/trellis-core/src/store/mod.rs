//! Persistence backends for the plan map.
//!
//! A [`PlanStore`] mirrors the registry's in-memory map to durable storage.
//! Three backends exist:
//!
//! - [`MemoryStore`]: no durability at all.
//! - [`FileStore`]: the whole map as one JSON document, rewritten on every
//!   mutation. A missing or unparsable file loads as an empty map.
//! - [`SqliteStore`]: one row per plan, upserted or deleted per mutation.
//!
//! Stores report failures through [`Result`]. They do not decide what to do
//! about them: the registry logs every store error and carries on with its
//! in-memory state (see [`crate::registry`]).

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{PlanError, Result},
    models::{Plan, PlanMap},
};

pub mod file;
pub mod memory;
pub mod sqlite;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Storage policy chosen at registry construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// State lives only in the registry's memory
    #[default]
    Memory,
    /// Single JSON document
    Json,
    /// Embedded SQLite table
    Sqlite,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Memory => "memory",
            StoreKind::Json => "json",
            StoreKind::Sqlite => "sqlite",
        }
    }

    /// File name used under the XDG data directory when no path is given.
    pub fn default_file_name(&self) -> Option<&'static str> {
        match self {
            StoreKind::Memory => None,
            StoreKind::Json => Some("plans.json"),
            StoreKind::Sqlite => Some("plans.db"),
        }
    }
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreKind::Memory),
            "json" | "file" => Ok(StoreKind::Json),
            "sqlite" => Ok(StoreKind::Sqlite),
            _ => Err(format!("Invalid storage type: {s}")),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable mirror of the plan map.
///
/// `all` is the registry's map *after* the mutation; whole-document backends
/// write it out, row-based backends ignore it.
pub trait PlanStore: Send {
    /// The policy this store implements.
    fn kind(&self) -> StoreKind;

    /// Reads every stored plan.
    fn load_all(&mut self) -> Result<PlanMap>;

    /// Persists a created or updated plan.
    fn save(&mut self, plan: &Plan, all: &PlanMap) -> Result<()>;

    /// Persists the removal of a plan.
    fn delete(&mut self, plan_id: &str, all: &PlanMap) -> Result<()>;
}

/// Opens the backend for `kind`. `path` is required for file-backed kinds.
pub fn open_store(kind: StoreKind, path: Option<&Path>) -> Result<Box<dyn PlanStore>> {
    let require_path = || -> Result<PathBuf> {
        path.map(Path::to_path_buf)
            .ok_or_else(|| PlanError::Configuration {
                message: format!("storage type '{kind}' requires a storage path"),
            })
    };

    Ok(match kind {
        StoreKind::Memory => Box::new(MemoryStore),
        StoreKind::Json => Box::new(FileStore::new(require_path()?)),
        StoreKind::Sqlite => Box::new(SqliteStore::open(require_path()?)?),
    })
}
