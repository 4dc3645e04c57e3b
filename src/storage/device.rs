//! Device-local session persistence.
//!
//! The token and the cached user projection are serialized together into a
//! single record, so a save or delete always covers both halves: the device
//! holds either a complete [`Session`] or nothing.

use redb::Database as RedbDatabase;
use std::path::Path;
use std::sync::Arc;

use super::db::DatabaseError;
use super::models::Session;
use super::tables::DEVICE_SESSION;

const CURRENT: &str = "current";

/// Persistent store for the session of the signed-in user on this device.
#[derive(Clone)]
pub struct ClientSessionStore {
    db: Arc<RedbDatabase>,
}

impl ClientSessionStore {
    /// Open or create the device store at the given directory
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        let db = RedbDatabase::create(data_dir.as_ref().join("session.redb"))?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(DEVICE_SESSION)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Read the persisted session, if any
    pub fn load(&self) -> Result<Option<Session>, DatabaseError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DEVICE_SESSION)?;

        match table.get(CURRENT)? {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    /// Persist a session, replacing any previous one
    pub fn save(&self, session: &Session) -> Result<(), DatabaseError> {
        debug_assert!(!session.token.is_empty(), "session token must not be empty");

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(DEVICE_SESSION)?;
            let data = rmp_serde::to_vec_named(session)?;
            table.insert(CURRENT, data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Delete the persisted session. Returns whether one existed.
    pub fn clear(&self) -> Result<bool, DatabaseError> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(DEVICE_SESSION)?;
            let removed = table.remove(CURRENT)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }
}
