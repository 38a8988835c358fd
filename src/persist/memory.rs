use hashbrown::HashMap;
use parking_lot::RwLock;

use super::{Collection, CollectionWrite, PersistResult, Record, RecordStore};

/// In-process [`RecordStore`]. Commits swap collections under one write
/// lock, so readers see either the old or the new contents.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Record>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with `records` in `collection`.
    pub fn with_records(collection: Collection, records: Vec<Record>) -> Self {
        let store = Self::new();
        store.collections.write().insert(collection, records);
        store
    }
}

impl RecordStore for MemoryStore {
    fn load(&self, collection: Collection) -> Vec<Record> {
        self.collections
            .read()
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    fn commit(&self, writes: Vec<CollectionWrite>) -> PersistResult<()> {
        let mut collections = self.collections.write();
        for write in writes {
            collections.insert(write.collection, write.records);
        }
        Ok(())
    }
}
