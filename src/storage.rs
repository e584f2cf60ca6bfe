//! Storage layer
//!
//! All reads and writes of frame bytes go through the [`Storage`] contract so new
//! backends can be added in one place. Locations are opaque URNs; the scheme picks
//! the backend: bare paths and `file://` go to the local filesystem, `http(s)://`
//! is read-only, anything else (e.g. `s3://`) needs a registered backend.

pub mod http;
pub mod local;

pub use http::HttpStorage;
pub use local::LocalStorage;

use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Identifier resolving to a storage backend and a path within it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(String);

/// The backend family a location resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scheme {
    File(PathBuf),
    Http,
    Other(String),
}

impl Location {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self(path.as_ref().to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn scheme(&self) -> Scheme {
        match self.0.split_once("://") {
            None => Scheme::File(PathBuf::from(&self.0)),
            Some(("file", path)) => Scheme::File(PathBuf::from(path)),
            Some(("http", _)) | Some(("https", _)) => Scheme::Http,
            Some((scheme, _)) => Scheme::Other(scheme.to_string()),
        }
    }

    /// Local filesystem path, if this location lives on disk.
    pub fn as_local_path(&self) -> Option<PathBuf> {
        match self.scheme() {
            Scheme::File(path) => Some(path),
            _ => None,
        }
    }

    /// Final path component without its extension.
    pub fn file_stem(&self) -> Option<&str> {
        let name = self.file_name()?;
        match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => Some(stem),
            _ => Some(name),
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        let path = self.0.split(['?', '#']).next().unwrap_or_default();
        path.rsplit('/').next().filter(|name| !name.is_empty())
    }

    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name()?;
        name.rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }

    /// Append a relative `/`-separated path.
    pub fn join(&self, relative: &str) -> Location {
        let relative = relative.trim_start_matches('/');
        if self.0.is_empty() {
            Location::new(relative)
        } else if self.0.ends_with('/') {
            Location(format!("{}{}", self.0, relative))
        } else {
            Location(format!("{}/{}", self.0, relative))
        }
    }

    /// Same location with the final component's extension replaced (or added).
    pub fn with_extension(&self, extension: &str) -> Location {
        let dir_end = self.0.rfind('/').map(|i| i + 1).unwrap_or(0);
        let base = match self.0[dir_end..].rfind('.') {
            Some(dot) if dot > 0 => &self.0[..dir_end + dot],
            _ => &self.0[..],
        };
        Location(format!("{}.{}", base, extension))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Location {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Location {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&Path> for Location {
    fn from(value: &Path) -> Self {
        Self::from_path(value)
    }
}

impl From<PathBuf> for Location {
    fn from(value: PathBuf) -> Self {
        Self::from_path(value)
    }
}

/// Storage contract: load and save raw bytes by location
pub trait Storage: Send + Sync {
    fn load(&self, location: &Location) -> Result<Vec<u8>, StorageError>;

    fn save(&self, location: &Location, data: &[u8]) -> Result<(), StorageError>;
}

/// Dispatches each location to the backend registered for its scheme
pub struct SchemeRouter {
    local: LocalStorage,
    http: HttpStorage,
    others: HashMap<String, Arc<dyn Storage>>,
}

impl SchemeRouter {
    pub fn new() -> Self {
        Self {
            local: LocalStorage::new(),
            http: HttpStorage::default(),
            others: HashMap::new(),
        }
    }

    /// Register a backend for an additional scheme such as `s3`.
    pub fn register(mut self, scheme: impl Into<String>, backend: Arc<dyn Storage>) -> Self {
        self.others.insert(scheme.into(), backend);
        self
    }

    fn backend_for(&self, location: &Location) -> Result<&dyn Storage, StorageError> {
        match location.scheme() {
            Scheme::File(_) => Ok(&self.local),
            Scheme::Http => Ok(&self.http),
            Scheme::Other(scheme) => match self.others.get(&scheme) {
                Some(backend) => Ok(backend.as_ref()),
                None => Err(StorageError::UnsupportedScheme {
                    scheme,
                    location: location.clone(),
                }),
            },
        }
    }
}

impl Default for SchemeRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for SchemeRouter {
    fn load(&self, location: &Location) -> Result<Vec<u8>, StorageError> {
        self.backend_for(location)?.load(location)
    }

    fn save(&self, location: &Location, data: &[u8]) -> Result<(), StorageError> {
        self.backend_for(location)?.save(location, data)
    }
}
