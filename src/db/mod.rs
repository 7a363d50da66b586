use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{AppError, Result};
use crate::models::Snapshot;

/// Database handle type (Arc-wrapped for sharing across handlers)
pub type Db = Arc<JsonFileDb>;

/// Flat JSON snapshot file holding every user and plan
///
/// Each operation reads the whole file, mutates it in memory and writes the
/// whole file back. Operations are serialized by an in-process lock; other
/// processes writing the same file are not coordinated.
#[derive(Debug)]
pub struct JsonFileDb {
    path: PathBuf,
    lock: Mutex<()>,
}

/// Open or create the snapshot file at the given path
pub fn open_database(path: impl AsRef<Path>) -> Result<Db> {
    let path = path.as_ref().to_path_buf();
    tracing::info!("Opening database at: {:?}", path);

    // Create parent directory if it doesn't exist
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                tracing::error!("Failed to create database directory: {}", e);
                e
            })?;
        }
    }

    let db = JsonFileDb {
        path,
        lock: Mutex::new(()),
    };

    if !db.path.exists() {
        db.write_snapshot(&Snapshot::default())?;
        tracing::info!("Database initialized successfully");
    }

    Ok(Arc::new(db))
}

impl JsonFileDb {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read-only access to a fresh snapshot
    pub fn read<T>(&self, f: impl FnOnce(&Snapshot) -> Result<T>) -> Result<T> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let snapshot = self.read_snapshot()?;
        f(&snapshot)
    }

    /// Read-modify-write cycle
    ///
    /// The file is only rewritten when `f` succeeds.
    pub fn transact<T>(&self, f: impl FnOnce(&mut Snapshot) -> Result<T>) -> Result<T> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut snapshot = self.read_snapshot()?;
        let value = f(&mut snapshot)?;
        snapshot.touch();
        self.write_snapshot(&snapshot)?;
        Ok(value)
    }

    /// Liveness check used by the health endpoint
    ///
    /// A missing file is recreated empty, matching what reads already
    /// assume. Anything else that is not a regular file is unhealthy.
    pub fn ensure_readable(&self) -> bool {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match fs::metadata(&self.path) {
            Ok(meta) => meta.is_file(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!("Database file {:?} is missing, recreating it", self.path);
                match self.write_snapshot(&Snapshot::default()) {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::error!("Failed to recreate database file: {}", e);
                        false
                    }
                }
            }
            Err(_) => false,
        }
    }

    fn read_snapshot(&self) -> Result<Snapshot> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Snapshot::default()),
            Err(e) => return Err(AppError::Io(e)),
        };

        match serde_json::from_str(&data) {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                tracing::error!(
                    "Database file {:?} is not a valid snapshot, starting empty: {}",
                    self.path,
                    e
                );
                Ok(Snapshot::default())
            }
        }
    }

    /// Write to a sibling temp file, then rename over the target
    fn write_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_empty_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("users.json");
        let db = open_database(&path).unwrap();

        assert!(db.ensure_readable());
        let count = db.read(|s| Ok(s.users.len())).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_transact_persists_across_handles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");

        let db = open_database(&path).unwrap();
        let id = db
            .transact(|s| Ok(s.users.register("a@x.com", "alice", "password1")?.id.clone()))
            .unwrap();
        drop(db);

        let db = open_database(&path).unwrap();
        let found = db.read(|s| Ok(s.users.get(&id).is_some())).unwrap();
        assert!(found);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["users"][0]["username"], "alice");
        assert_eq!(raw["users"][0]["password"], "cGFzc3dvcmQx");
    }

    #[test]
    fn test_failed_transaction_does_not_write() {
        let dir = TempDir::new().unwrap();
        let db = open_database(dir.path().join("users.json")).unwrap();
        db.transact(|s| Ok(s.users.register("a@x.com", "alice", "password1").map(|_| ())?))
            .unwrap();

        let result = db.transact(|s| {
            s.users.register("b@x.com", "bob", "password1")?;
            s.users.register("a@x.com", "carol", "password1")?;
            Ok(())
        });
        assert!(matches!(result, Err(AppError::UserAlreadyExists)));

        let count = db.read(|s| Ok(s.users.len())).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_health_check_recreates_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        let db = open_database(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert!(db.ensure_readable());
        assert!(path.is_file());
    }

    #[test]
    fn test_health_check_fails_when_path_is_a_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        let db = open_database(&path).unwrap();
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        assert!(!db.ensure_readable());
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        fs::write(&path, "{ not json").unwrap();

        let db = open_database(&path).unwrap();
        let count = db.read(|s| Ok(s.users.len())).unwrap();
        assert_eq!(count, 0);
    }
}
