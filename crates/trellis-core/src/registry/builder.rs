//! Builder for creating and configuring PlanRegistry instances.

use std::path::{Path, PathBuf};

use log::debug;
use tokio::task;

use super::PlanRegistry;
use crate::{
    error::{FileSystemResultExt, PlanError, Result},
    store::{open_store, StoreKind},
    sync::{ExternalSync, SyncConfig},
};

/// Builder for creating and configuring PlanRegistry instances.
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    storage: StoreKind,
    storage_path: Option<PathBuf>,
    sync: Option<SyncConfig>,
}

impl RegistryBuilder {
    /// Creates a new builder with a transient store and no remote sync.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the persistence policy.
    pub fn with_storage(mut self, storage: StoreKind) -> Self {
        self.storage = storage;
        self
    }

    /// Sets a custom storage file path.
    ///
    /// If not specified, file-backed stores use the XDG Base Directory
    /// specification: `$XDG_DATA_HOME/trellis/plans.json` (or `plans.db`), or
    /// `~/.local/share/trellis/...`.
    pub fn with_storage_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.storage_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Enables best-effort mirroring to a remote service.
    pub fn with_sync(mut self, config: Option<SyncConfig>) -> Self {
        self.sync = config;
        self
    }

    /// Builds the configured registry and loads any stored plans.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::FileSystem` if the storage directory cannot be
    /// created, `PlanError::Database` if the SQLite file cannot be opened, and
    /// `PlanError::Configuration` if remote sync is misconfigured. Unreadable
    /// stored data is not an error; the registry starts empty instead.
    pub async fn build(self) -> Result<PlanRegistry> {
        let storage = self.storage;
        let path = match storage.default_file_name() {
            Some(file_name) => Some(match self.storage_path {
                Some(path) => path,
                None => Self::default_storage_path(file_name)?,
            }),
            None => None,
        };

        if let Some(parent) = path.as_deref().and_then(Path::parent) {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).fs_context(parent)?;
            }
        }

        let sync = match self.sync {
            Some(config) => ExternalSync::spawn(config)?,
            None => ExternalSync::disabled(),
        };

        if let Some(path) = &path {
            debug!("Opening {storage} store at {}", path.display());
        }

        task::spawn_blocking(move || {
            let store = open_store(storage, path.as_deref())?;
            Ok::<_, PlanError>(PlanRegistry::from_store(store, sync))
        })
        .await
        .map_err(|e| PlanError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }

    /// Returns the default storage path following XDG Base Directory
    /// specification.
    fn default_storage_path(file_name: &str) -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("trellis")
            .place_data_file(file_name)
            .map_err(|e| PlanError::XdgDirectory(e.to_string()))
    }
}
