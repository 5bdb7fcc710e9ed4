//! Single-document JSON backend.

use std::{
    fs,
    io::ErrorKind,
    path::PathBuf,
};

use log::debug;

use super::{PlanStore, StoreKind};
use crate::{
    error::{FileSystemResultExt, Result},
    models::{Plan, PlanMap},
};

/// Stores the whole plan map as one JSON object keyed by plan id.
///
/// Every mutation rewrites the file in place. A crash mid-write can leave a
/// truncated document, which the next load treats as empty.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn write_all(&self, all: &PlanMap) -> Result<()> {
        let document = serde_json::to_string_pretty(all)?;
        fs::write(&self.path, document).fs_context(&self.path)?;
        debug!("Wrote {} plans to {}", all.len(), self.path.display());
        Ok(())
    }
}

impl PlanStore for FileStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Json
    }

    fn load_all(&mut self) -> Result<PlanMap> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No plan file at {}, starting empty", self.path.display());
                return Ok(PlanMap::new());
            }
            Err(e) => return Err(e).fs_context(&self.path),
        };

        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&mut self, _plan: &Plan, all: &PlanMap) -> Result<()> {
        self.write_all(all)
    }

    fn delete(&mut self, _plan_id: &str, all: &PlanMap) -> Result<()> {
        self.write_all(all)
    }
}
