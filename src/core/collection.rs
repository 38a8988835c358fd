use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

use crate::persist::{Collection, CollectionWrite, PersistError, PersistResult, Record, RecordStore};

/// Typed view of one collection as read from the store.
///
/// Records that fail to decode are kept aside in `rejected` with their
/// original index and written back unchanged at that position (clamped to
/// the collection length), so a save never drops data it could not
/// understand.
#[derive(Debug, Clone)]
pub(crate) struct Loaded<T> {
    pub collection: Collection,
    pub records: Vec<T>,
    pub rejected: Vec<(usize, Record)>,
}

impl<T: Serialize + DeserializeOwned> Loaded<T> {
    pub fn load(store: &dyn RecordStore, collection: Collection) -> Self {
        let mut records = Vec::new();
        let mut rejected = Vec::new();

        for (idx, raw) in store.load(collection).into_iter().enumerate() {
            match serde_json::from_value::<T>(serde_json::Value::Object(raw.clone())) {
                Ok(rec) => records.push(rec),
                Err(err) => {
                    warn!(collection = collection.as_str(), error = %err, "skipping malformed record");
                    rejected.push((idx, raw));
                }
            }
        }

        Self {
            collection,
            records,
            rejected,
        }
    }

    pub fn into_write(self) -> PersistResult<CollectionWrite> {
        let mut out = Vec::with_capacity(self.records.len() + self.rejected.len());
        for rec in &self.records {
            match serde_json::to_value(rec)? {
                serde_json::Value::Object(map) => out.push(map),
                other => {
                    return Err(PersistError::Message(format!(
                        "record encoded as non-object: {other}"
                    )));
                }
            }
        }
        // ascending indices, so earlier inserts never shift later targets
        for (idx, raw) in self.rejected {
            let at = idx.min(out.len());
            out.insert(at, raw);
        }

        Ok(CollectionWrite {
            collection: self.collection,
            records: out,
        })
    }
}
