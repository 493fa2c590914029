//! Query store builder
//!
//! Chooses between an in-memory database and an on-disk file.

use super::QueryStore;
use crate::config::StoreConfig;
use crate::error::Result;
use rusqlite::Connection;
use std::path::PathBuf;

/// Builder for a [`QueryStore`].
#[derive(Debug, Default)]
pub struct StoreBuilder {
    path: Option<PathBuf>,
}

impl StoreBuilder {
    /// Create a new builder with in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `store` section of a [`crate::Config`].
    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            path: config.path.clone(),
        }
    }

    /// Keep the database in a file. The file is created if needed; a table
    /// registered by a previous run is replaced on the next registration.
    pub fn path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Configure for in-memory storage with no persistence.
    pub fn in_memory(mut self) -> Self {
        self.path = None;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.is_none()
    }

    pub fn build(self) -> Result<QueryStore> {
        let conn = match &self.path {
            Some(path) => {
                log::info!("Opening query store at {}", path.display());
                Connection::open(path)?
            }
            None => {
                log::debug!("Opening in-memory query store");
                Connection::open_in_memory()?
            }
        };
        Ok(QueryStore::from_connection(conn))
    }
}
