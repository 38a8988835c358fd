//! Store configuration and environment overrides.

use std::{env, path::PathBuf, str::FromStr, sync::Arc};

use thiserror::Error;

use crate::{
    core::inventory::Inventory,
    persist::{
        PersistError, RecordStore,
        json::{JsonFileLayout, JsonFileStore},
        sqlite::SqliteRecordStore,
    },
    types::DEFAULT_CLIENT,
};

/// Environment variable naming the data directory.
pub const ENV_DATA_DIR: &str = "STOCKBOOK_DATA_DIR";
/// Environment variable selecting the backend (`json` or `sqlite`).
pub const ENV_BACKEND: &str = "STOCKBOOK_BACKEND";
/// Environment variable overriding the sentinel client.
pub const ENV_DEFAULT_CLIENT: &str = "STOCKBOOK_DEFAULT_CLIENT";

/// Durable medium behind the ledgers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// One JSON file per collection.
    Json,
    /// One SQLite database.
    Sqlite,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(Backend::Json),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(ConfigError::UnknownBackend {
                value: other.to_string(),
            }),
        }
    }
}

/// Where and how records are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding every collection.
    pub data_dir: PathBuf,
    /// Storage backend.
    pub backend: Backend,
    /// File names for the JSON backend.
    pub layout: JsonFileLayout,
    /// Database file name for the SQLite backend.
    pub sqlite_file: String,
    /// Client recorded on sales that name none.
    pub default_client: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            backend: Backend::Json,
            layout: JsonFileLayout::default(),
            sqlite_file: "stockbook.db".to_string(),
            default_client: DEFAULT_CLIENT.to_string(),
        }
    }
}

impl StoreConfig {
    /// Defaults overridden by the `STOCKBOOK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(backend) = lookup(ENV_BACKEND).filter(|v| !v.is_empty()) {
            config.backend = backend.parse()?;
        }
        if let Some(client) = lookup(ENV_DEFAULT_CLIENT) {
            if client.is_empty() {
                return Err(ConfigError::EmptyDefaultClient);
            }
            config.default_client = client;
        }
        Ok(config)
    }

    /// Opens the configured store.
    pub fn open_store(&self) -> Result<Arc<dyn RecordStore>, PersistError> {
        match self.backend {
            Backend::Json => Ok(Arc::new(JsonFileStore::with_layout(
                &self.data_dir,
                self.layout.clone(),
            )?)),
            Backend::Sqlite => {
                std::fs::create_dir_all(&self.data_dir)?;
                Ok(Arc::new(SqliteRecordStore::open(
                    self.data_dir.join(&self.sqlite_file),
                )?))
            }
        }
    }

    /// Opens the store and builds the ledgers over it.
    pub fn open_inventory(&self) -> Result<Inventory, PersistError> {
        Ok(Inventory::new(self.open_store()?).with_default_client(self.default_client.clone()))
    }
}

/// Invalid configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Backend name not recognised.
    #[error("unknown backend '{value}' (expected 'json' or 'sqlite')")]
    UnknownBackend {
        /// Offending value.
        value: String,
    },
    /// The sentinel client cannot be empty.
    #[error("STOCKBOOK_DEFAULT_CLIENT must not be empty")]
    EmptyDefaultClient,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_overrides() {
        let config = StoreConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.default_client, "Sin nombre");
    }

    #[test]
    fn overrides_are_read() {
        let config = StoreConfig::from_lookup(lookup(&[
            (ENV_DATA_DIR, "/var/lib/stockbook"),
            (ENV_BACKEND, "SQLite"),
            (ENV_DEFAULT_CLIENT, "walk-in"),
        ]))
        .expect("config");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/stockbook"));
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.default_client, "walk-in");
    }

    #[test]
    fn bad_values_are_rejected() {
        assert_eq!(
            StoreConfig::from_lookup(lookup(&[(ENV_BACKEND, "csv")])),
            Err(ConfigError::UnknownBackend {
                value: "csv".to_string()
            })
        );
        assert_eq!(
            StoreConfig::from_lookup(lookup(&[(ENV_DEFAULT_CLIENT, "")])),
            Err(ConfigError::EmptyDefaultClient)
        );
    }
}
