//! Record store abstraction and its backends.

/// Pretty-printed JSON files with a commit journal.
pub mod json;
/// Lock-guarded in-process store.
pub mod memory;
/// SQLite-backed store.
pub mod sqlite;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One flat key-value record as persisted.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Independent record collections kept by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Product ledger.
    Products,
    /// Person ledger.
    Persons,
    /// Sales ledger.
    Sales,
}

impl Collection {
    /// Every collection, in a fixed order.
    pub const ALL: [Collection; 3] = [Collection::Products, Collection::Persons, Collection::Sales];

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Persons => "persons",
            Collection::Sales => "sales",
        }
    }
}

/// Full replacement contents for one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionWrite {
    /// Target collection.
    pub collection: Collection,
    /// New contents, in ledger order.
    pub records: Vec<Record>,
}

/// Store failure.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Filesystem failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Encoding failure.
    #[error("json error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Database failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Anything else.
    #[error("{0}")]
    Message(String),
}

/// Result alias for store operations.
pub type PersistResult<T> = Result<T, PersistError>;

/// Durable medium holding the three record collections.
///
/// Stores keep no cache: every `load` re-reads the medium. `load` never
/// fails; an absent, empty, or unparsable collection reads as empty.
pub trait RecordStore: Send + Sync {
    /// Reads the current contents of `collection`.
    fn load(&self, collection: Collection) -> Vec<Record>;

    /// Replaces every collection named in `writes` as one atomic unit.
    /// On error no collection has changed.
    fn commit(&self, writes: Vec<CollectionWrite>) -> PersistResult<()>;

    /// Replaces a single collection.
    fn save(&self, collection: Collection, records: Vec<Record>) -> PersistResult<()> {
        self.commit(vec![CollectionWrite {
            collection,
            records,
        }])
    }
}

/// Decodes a JSON array payload into records, skipping non-object entries.
pub(crate) fn decode_records(collection: Collection, payload: &[u8]) -> Vec<Record> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Vec::new();
    }

    let values: Vec<serde_json::Value> = match serde_json::from_slice(payload) {
        Ok(values) => values,
        Err(err) => {
            tracing::warn!(collection = collection.as_str(), error = %err, "unreadable collection, treating as empty");
            return Vec::new();
        }
    };

    values
        .into_iter()
        .filter_map(|value| match value {
            serde_json::Value::Object(rec) => Some(rec),
            other => {
                tracing::warn!(collection = collection.as_str(), value = %other, "skipping non-object record");
                None
            }
        })
        .collect()
}

/// Encodes records as a UTF-8 JSON array indented by four spaces.
pub(crate) fn encode_records(records: &[Record]) -> PersistResult<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}
