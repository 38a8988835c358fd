//! SQLite-backed record store: one row per collection.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::warn;

use super::{
    Collection, CollectionWrite, PersistError, PersistResult, Record, RecordStore, decode_records,
    encode_records,
};

/// SQLite implementation of [`crate::persist::RecordStore`].
///
/// Each collection is stored as its pretty-printed JSON array; a commit
/// replaces every written row inside one transaction.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Opens or creates a database at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory database.
    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> PersistResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn read_payload(&self, collection: Collection) -> PersistResult<Option<String>> {
        let conn = self.conn.lock();
        let payload = conn
            .query_row(
                "SELECT payload FROM collections WHERE name = ?1",
                params![collection.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload)
    }
}

impl RecordStore for SqliteRecordStore {
    fn load(&self, collection: Collection) -> Vec<Record> {
        match self.read_payload(collection) {
            Ok(Some(payload)) => decode_records(collection, payload.as_bytes()),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(collection = collection.as_str(), error = %err, "cannot read collection, treating as empty");
                Vec::new()
            }
        }
    }

    fn commit(&self, writes: Vec<CollectionWrite>) -> PersistResult<()> {
        let mut encoded = Vec::with_capacity(writes.len());
        for write in &writes {
            let payload = String::from_utf8(encode_records(&write.records)?)
                .map_err(|err| PersistError::Message(format!("payload is not utf-8: {err}")))?;
            encoded.push((write.collection, payload));
        }

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO collections(name, ts_ms, payload) VALUES (?1, ?2, ?3)
                 ON CONFLICT(name) DO UPDATE SET ts_ms = excluded.ts_ms, payload = excluded.payload",
            )?;
            let ts_ms = now_ms();
            for (collection, payload) in &encoded {
                stmt.execute(params![collection.as_str(), ts_ms as i64, payload])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
