//! Local filesystem backend
//!
//! Writes go to a `.tmp` sibling first and are renamed into place, so readers never
//! observe a half-written image. Parent directories are created on first use and
//! remembered so repeated saves into the same directory skip the syscall.

use crate::error::StorageError;
use crate::storage::{Location, Storage};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Default)]
pub struct LocalStorage {
    created_dirs: Mutex<HashSet<PathBuf>>,
}

impl LocalStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn path_of(location: &Location) -> Result<PathBuf, StorageError> {
        location
            .as_local_path()
            .ok_or_else(|| StorageError::UnsupportedScheme {
                scheme: location.as_str().split("://").next().unwrap_or_default().to_string(),
                location: location.clone(),
            })
    }

    fn ensure_parent(&self, path: &Path) -> Result<(), StorageError> {
        let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(());
        };

        let mut created = self.created_dirs.lock();
        if created.contains(parent) {
            return Ok(());
        }

        fs::create_dir_all(parent).map_err(|e| {
            StorageError::IoError(io::Error::new(
                e.kind(),
                format!("Failed to create parent directory {:?}: {}", parent, e),
            ))
        })?;
        debug!(dir = %parent.display(), "Created output directory");
        created.insert(parent.to_path_buf());
        Ok(())
    }
}

impl Storage for LocalStorage {
    fn load(&self, location: &Location) -> Result<Vec<u8>, StorageError> {
        let path = Self::path_of(location)?;
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(location.clone()),
            _ => StorageError::IoError(io::Error::new(
                e.kind(),
                format!("Failed to read {:?}: {}", path, e),
            )),
        })
    }

    fn save(&self, location: &Location, data: &[u8]) -> Result<(), StorageError> {
        let path = Self::path_of(location)?;
        self.ensure_parent(&path)?;

        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        fs::write(&temp_path, data).map_err(|e| {
            StorageError::IoError(io::Error::new(
                e.kind(),
                format!("Failed to write {:?}: {}", temp_path, e),
            ))
        })?;

        fs::rename(&temp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StorageError::IoError(io::Error::new(
                e.kind(),
                format!("Failed to rename temp file to {:?}: {}", path, e),
            ))
        })?;

        Ok(())
    }
}
