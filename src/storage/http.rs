//! Read-only HTTP(S) backend.

use crate::error::StorageError;
use crate::storage::{Location, Storage};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpStorage {
    client: Client,
}

impl HttpStorage {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpStorage {
    fn default() -> Self {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }
}

impl Storage for HttpStorage {
    fn load(&self, location: &Location) -> Result<Vec<u8>, StorageError> {
        debug!(location = %location, "Fetching remote image");
        let http_error = |message: String| StorageError::Http {
            location: location.clone(),
            message,
        };

        let response = self
            .client
            .get(location.as_str())
            .send()
            .map_err(|e| http_error(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                Err(StorageError::NotFound(location.clone()))
            }
            status if !status.is_success() => Err(http_error(format!("status {}", status))),
            _ => response
                .bytes()
                .map(|body| body.to_vec())
                .map_err(|e| http_error(e.to_string())),
        }
    }

    fn save(&self, location: &Location, _data: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::ReadOnly(location.clone()))
    }
}
