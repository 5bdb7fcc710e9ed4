#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use trellis_core::{PlanRegistry, RegistryBuilder, StoreKind};

/// Helper function to create a temporary directory and a storage path in it
pub fn create_test_environment(file_name: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let path = temp_dir.path().join(file_name);
    (temp_dir, path)
}

/// Helper function to open a registry over `path` with the given backend
pub async fn open_registry(storage: StoreKind, path: &Path) -> PlanRegistry {
    RegistryBuilder::new()
        .with_storage(storage)
        .with_storage_path(Some(path))
        .build()
        .await
        .expect("Failed to create registry")
}

pub fn steps(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
