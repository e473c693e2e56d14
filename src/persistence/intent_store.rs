use serde::Serialize;
use sled::{Batch, Db, Tree};

use crate::command::UpdateIntent;
use crate::utils::error::StoreError;

pub const FW_VERSION_KEY: &str = "savedVersionFW";
pub const UPDATE_FLAG_KEY: &str = "savedUpdateFlag";
pub const FW_SIZE_KEY: &str = "savedSizeFW";

/// Stored width of the version field; shorter versions are zero padded.
pub const VERSION_FIELD_WIDTH: usize = 10;

/// Raw view of the three keys, for inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntentRecord {
    pub pending: bool,
    pub candidate_version: Option<String>,
    pub expected_size: Option<u32>,
}

#[derive(Clone)]
pub struct IntentStore {
    db: Db,
    tree: Tree,
}

impl IntentStore {
    /// Open or create the store at `path`, using `namespace` as the tree name.
    pub fn open(path: &str, namespace: &str) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Self::from_db(db, namespace)
    }

    pub fn from_db(db: Db, namespace: &str) -> Result<Self, StoreError> {
        let tree = db.open_tree(namespace)?;
        Ok(Self { db, tree })
    }

    /// Record a pending update. The three keys land in one batch, so a crash
    /// never leaves the flag set next to a previous size. Writing the same
    /// values twice leaves the same state behind.
    pub fn write_pending(&self, candidate_version: &str, expected_size: u32) -> Result<(), StoreError> {
        let bytes = candidate_version.as_bytes();
        if bytes.len() > VERSION_FIELD_WIDTH {
            return Err(StoreError::VersionTooLong {
                len: bytes.len(),
                max: VERSION_FIELD_WIDTH,
            });
        }
        let mut field = [0u8; VERSION_FIELD_WIDTH];
        field[..bytes.len()].copy_from_slice(bytes);

        let mut batch = Batch::default();
        batch.insert(FW_VERSION_KEY, &field[..]);
        batch.insert(FW_SIZE_KEY, &expected_size.to_be_bytes()[..]);
        batch.insert(UPDATE_FLAG_KEY, &[1u8][..]);
        self.tree.apply_batch(batch)?;
        self.flush()?;

        tracing::info!(
            version = candidate_version,
            size = expected_size,
            "update intent recorded"
        );
        Ok(())
    }

    /// Consume the pending intent, if any.
    ///
    /// The flag is cleared and the size zeroed, in one flushed batch, before
    /// the intent is handed out, so a crash while acting on it cannot bring it
    /// back on the next boot and a later flag without a fresh size reads as
    /// corrupt. A pending record with an unusable version or size is cleared
    /// as well and reported as `StoreError::CorruptIntent`.
    pub fn read_and_clear(&self) -> Result<Option<UpdateIntent>, StoreError> {
        if !self.is_pending()? {
            return Ok(None);
        }
        let expected_size = self.read_size()?;
        let candidate_version = self.read_version()?;

        let mut batch = Batch::default();
        batch.insert(UPDATE_FLAG_KEY, &[0u8][..]);
        batch.insert(FW_SIZE_KEY, &0u32.to_be_bytes()[..]);
        self.tree.apply_batch(batch)?;
        self.flush()?;

        match (candidate_version, expected_size) {
            (Some(candidate_version), Some(expected_size)) if expected_size > 0 => {
                Ok(Some(UpdateIntent {
                    candidate_version,
                    expected_size,
                }))
            }
            (version, size) => {
                let problem = if version.is_none() {
                    "candidate version is missing or unreadable"
                } else if size.is_none() {
                    "expected size is missing"
                } else {
                    "expected size is zero"
                };
                Err(StoreError::CorruptIntent(problem.to_string()))
            }
        }
    }

    pub fn is_pending(&self) -> Result<bool, StoreError> {
        Ok(self
            .tree
            .get(UPDATE_FLAG_KEY)?
            .is_some_and(|v| v.first().is_some_and(|b| *b != 0)))
    }

    /// Zero the stored size so a stale value is never reused.
    pub fn reset_size(&self) -> Result<(), StoreError> {
        self.tree.insert(FW_SIZE_KEY, &0u32.to_be_bytes()[..])?;
        self.flush()
    }

    pub fn snapshot(&self) -> Result<IntentRecord, StoreError> {
        Ok(IntentRecord {
            pending: self.is_pending()?,
            candidate_version: self.read_version()?,
            expected_size: self.read_size()?,
        })
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    fn read_size(&self) -> Result<Option<u32>, StoreError> {
        let Some(raw) = self.tree.get(FW_SIZE_KEY)? else {
            return Ok(None);
        };
        Ok(<[u8; 4]>::try_from(&raw[..]).ok().map(u32::from_be_bytes))
    }

    fn read_version(&self) -> Result<Option<String>, StoreError> {
        let Some(raw) = self.tree.get(FW_VERSION_KEY)? else {
            return Ok(None);
        };
        let end = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());
        match std::str::from_utf8(&raw[..end]) {
            Ok(s) if !s.is_empty() => Ok(Some(s.to_string())),
            _ => Ok(None),
        }
    }
}

impl std::fmt::Debug for IntentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentStore")
            .field("db", &"sled::Db")
            .field("tree", &String::from_utf8_lossy(&self.tree.name()))
            .finish()
    }
}
