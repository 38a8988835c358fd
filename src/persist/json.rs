//! JSON file store: one pretty-printed array per collection.
//!
//! Single-collection saves write a temporary file beside the target and
//! rename it into place. Multi-collection commits first write a journal
//! holding every new collection; once the journal is renamed into place the
//! commit is durable, and the collection files are then replaced one by one.
//! A journal left behind by an interrupted commit is rolled forward on the
//! next open, load, or commit. Journal handling, commits, and loads share
//! one lock so a reader never replays a journal a writer already applied.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::{
    Collection, CollectionWrite, PersistError, PersistResult, Record, RecordStore, decode_records,
    encode_records,
};

const JOURNAL_FILE: &str = ".commit.journal";
const JOURNAL_FORMAT_VERSION: u16 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct JournalEnvelope {
    format_version: u16,
    writes: Vec<CollectionWrite>,
}

/// File names used for each collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFileLayout {
    /// Product collection file.
    pub products: String,
    /// Person collection file.
    pub persons: String,
    /// Sales collection file.
    pub sales: String,
}

impl Default for JsonFileLayout {
    fn default() -> Self {
        Self {
            products: "products.json".to_string(),
            persons: "persons.json".to_string(),
            sales: "sales.json".to_string(),
        }
    }
}

/// [`RecordStore`] over a directory of JSON files.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    layout: JsonFileLayout,
    io_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Opens a store rooted at `dir` with the default file names.
    ///
    /// The directory is created on first write, not here.
    pub fn open(dir: impl Into<PathBuf>) -> PersistResult<Self> {
        Self::with_layout(dir, JsonFileLayout::default())
    }

    /// Opens a store with custom file names and rolls forward any pending
    /// journal.
    pub fn with_layout(dir: impl Into<PathBuf>, layout: JsonFileLayout) -> PersistResult<Self> {
        let store = Self {
            dir: dir.into(),
            layout,
            io_lock: Mutex::new(()),
        };
        store.roll_forward()?;
        Ok(store)
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `collection`.
    pub fn path_for(&self, collection: Collection) -> PathBuf {
        let name = match collection {
            Collection::Products => &self.layout.products,
            Collection::Persons => &self.layout.persons,
            Collection::Sales => &self.layout.sales,
        };
        self.dir.join(name)
    }

    fn journal_path(&self) -> PathBuf {
        self.dir.join(JOURNAL_FILE)
    }

    /// Applies a committed journal if one is present. Returns true when a
    /// journal was applied.
    pub fn roll_forward(&self) -> PersistResult<bool> {
        let _guard = self.io_lock.lock();
        self.roll_forward_locked()
    }

    /// Caller holds `io_lock`.
    fn roll_forward_locked(&self) -> PersistResult<bool> {
        let Some(envelope) = self.read_journal()? else {
            return Ok(false);
        };
        warn!(dir = %self.dir.display(), "rolling forward interrupted commit");
        self.apply(&envelope.writes)?;
        fs::remove_file(self.journal_path())?;
        Ok(true)
    }

    fn read_journal(&self) -> PersistResult<Option<JournalEnvelope>> {
        let bytes = match fs::read(self.journal_path()) {
            Ok(bytes) => bytes,
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                ) =>
            {
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        let envelope: JournalEnvelope = serde_json::from_slice(&bytes)?;
        if envelope.format_version != JOURNAL_FORMAT_VERSION {
            return Err(PersistError::Message(format!(
                "unsupported journal format version: {}",
                envelope.format_version
            )));
        }
        Ok(Some(envelope))
    }

    fn read_collection(&self, collection: Collection) -> Vec<Record> {
        let path = self.path_for(collection);
        match fs::read(&path) {
            Ok(bytes) => decode_records(collection, &bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot read collection, treating as empty");
                Vec::new()
            }
        }
    }

    fn apply(&self, writes: &[CollectionWrite]) -> PersistResult<()> {
        for write in writes {
            let bytes = encode_records(&write.records)?;
            self.write_atomic(&self.path_for(write.collection), &bytes)?;
        }
        Ok(())
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> PersistResult<()> {
        fs::create_dir_all(&self.dir)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|err| PersistError::Io(err.error))?;
        Ok(())
    }
}

impl RecordStore for JsonFileStore {
    fn load(&self, collection: Collection) -> Vec<Record> {
        let _guard = self.io_lock.lock();
        if self.journal_path().exists() {
            if let Err(err) = self.roll_forward_locked() {
                warn!(error = %err, "journal roll-forward failed, reading through journal");
                if let Ok(Some(envelope)) = self.read_journal() {
                    if let Some(write) = envelope
                        .writes
                        .into_iter()
                        .find(|w| w.collection == collection)
                    {
                        return write.records;
                    }
                }
            }
        }
        self.read_collection(collection)
    }

    fn commit(&self, writes: Vec<CollectionWrite>) -> PersistResult<()> {
        let _guard = self.io_lock.lock();
        // a pending journal would later overwrite this commit
        self.roll_forward_locked()?;

        if writes.len() <= 1 {
            return self.apply(&writes);
        }

        let envelope = JournalEnvelope {
            format_version: JOURNAL_FORMAT_VERSION,
            writes,
        };
        self.write_atomic(&self.journal_path(), &serde_json::to_vec(&envelope)?)?;
        debug!(collections = envelope.writes.len(), "journal committed");

        // The journal is the commit point: failures past here are repaired
        // by roll-forward, not reported.
        if let Err(err) = self.apply(&envelope.writes) {
            warn!(error = %err, "journal apply failed, will roll forward on next access");
        } else if let Err(err) = fs::remove_file(self.journal_path()) {
            warn!(error = %err, "cannot remove applied journal");
        }
        Ok(())
    }
}
