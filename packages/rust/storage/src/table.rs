//! Framework workbook persistence.
//!
//! A framework is stored as a JSON workbook:
//!
//! ```json
//! { "sheet": "Data Protection Framework 1",
//!   "columns": ["Control Ref", "Domain", "Keywords", "Observation"],
//!   "rows": [["GOV-1", "Governance and Operating Model", "DPO", ""]] }
//! ```
//!
//! Writers serialize through a [`WriterLock`] sidecar file and replace the
//! workbook atomically, so a failed run leaves the previous file intact.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use uuid::Uuid;

use clausemap_shared::{ClausemapError, Result, Table};

/// Load a framework workbook.
pub fn load_table(path: &Path) -> Result<Table> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ClausemapError::StorageNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(ClausemapError::io(path, e)),
    };

    let table: Table = serde_json::from_str(&content).map_err(|e| {
        ClausemapError::parse(format!("invalid framework {}: {e}", path.display()))
    })?;
    debug!(
        path = %path.display(),
        columns = table.columns.len(),
        rows = table.len(),
        "framework loaded"
    );
    Ok(table)
}

/// Save a framework workbook atomically (temp file in the same directory,
/// then rename over the destination).
pub fn save_table(path: &Path, table: &Table) -> Result<()> {
    let json = serde_json::to_string_pretty(table)
        .map_err(|e| ClausemapError::parse(format!("failed to serialize framework: {e}")))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| ClausemapError::io(&dir, e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "framework.json".to_string());
    let tmp = dir.join(format!(".{file_name}.{}.tmp", Uuid::now_v7()));

    let write = || -> std::io::Result<()> {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()?;
        std::fs::rename(&tmp, path)
    };
    if let Err(e) = write() {
        let _ = std::fs::remove_file(&tmp);
        return Err(ClausemapError::io(path, e));
    }

    info!(path = %path.display(), rows = table.len(), "framework saved");
    Ok(())
}

// ---------------------------------------------------------------------------
// Writer lock
// ---------------------------------------------------------------------------

/// Exclusive writer lock on a framework, held as `<framework>.lock`.
///
/// The lock file is removed when the guard drops.
#[derive(Debug)]
pub struct WriterLock {
    framework: PathBuf,
    lock_path: PathBuf,
}

impl WriterLock {
    /// Acquire the lock or fail with [`ClausemapError::StorageLocked`].
    pub fn acquire(framework: &Path) -> Result<Self> {
        let lock_path = lock_path_for(framework);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(mut file) => {
                // Owner pid helps an operator clear a stale lock.
                let _ = writeln!(file, "{}", std::process::id());
                debug!(lock = %lock_path.display(), "writer lock acquired");
                Ok(Self {
                    framework: framework.to_path_buf(),
                    lock_path,
                })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let holder = match read_owner(&lock_path) {
                    Some(pid) => format!("pid {pid}"),
                    None => "an unknown process".to_string(),
                };
                Err(ClausemapError::StorageLocked {
                    path: framework.to_path_buf(),
                    lock: lock_path,
                    holder,
                })
            }
            Err(e) => Err(ClausemapError::io(&lock_path, e)),
        }
    }

    pub fn framework(&self) -> &Path {
        &self.framework
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for WriterLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.lock_path) {
            tracing::warn!(lock = %self.lock_path.display(), error = %e, "failed to release writer lock");
        }
    }
}

/// Pid recorded by the writer that created the lock file.
fn read_owner(lock_path: &Path) -> Option<u32> {
    std::fs::read_to_string(lock_path).ok()?.trim().parse().ok()
}

fn lock_path_for(framework: &Path) -> PathBuf {
    let mut name = framework.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(ext: &str) -> PathBuf {
        std::env::temp_dir().join(format!("clausemap_table_{}.{ext}", Uuid::now_v7()))
    }

    fn sample() -> Table {
        Table {
            sheet: "Data Protection Framework 1".into(),
            columns: vec!["Control Ref".into(), "Domain".into(), "Observation".into()],
            rows: vec![
                vec!["GOV-1".into(), "Governance and Operating Model".into(), "".into()],
                vec!["SEC-1".into(), "Data Security".into(), "• existing".into()],
            ],
        }
    }

    #[test]
    fn save_then_load_preserves_order() {
        let path = temp_path("json");
        save_table(&path, &sample()).unwrap();
        let loaded = load_table(&path).unwrap();
        assert_eq!(loaded, sample());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_framework_is_not_found() {
        let path = temp_path("json");
        let err = load_table(&path).unwrap_err();
        assert!(matches!(err, ClausemapError::StorageNotFound(p) if p == path));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let path = temp_path("json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_table(&path).unwrap_err();
        assert!(matches!(err, ClausemapError::Parse { .. }));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn rows_default_when_absent() {
        let path = temp_path("json");
        std::fs::write(&path, r#"{"columns": ["Domain"]}"#).unwrap();
        let loaded = load_table(&path).unwrap();
        assert!(loaded.is_empty());
        assert_eq!(loaded.sheet, "");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn save_leaves_no_temp_files() {
        let dir = std::env::temp_dir().join(format!("clausemap_dir_{}", Uuid::now_v7()));
        let path = dir.join("framework.json");
        save_table(&path, &sample()).unwrap();
        let entries: Vec<_> = std::fs::read_dir(&dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn lock_contention_yields_locked() {
        let path = temp_path("json");
        let guard = WriterLock::acquire(&path).unwrap();
        assert!(guard.lock_path().exists());

        let err = WriterLock::acquire(&path).unwrap_err();
        match &err {
            ClausemapError::StorageLocked { lock, holder, .. } => {
                assert_eq!(lock, guard.lock_path());
                assert_eq!(holder, &format!("pid {}", std::process::id()));
            }
            other => panic!("expected StorageLocked, got {other:?}"),
        }
        let message = err.to_string();
        assert!(message.contains(".lock"));
        assert!(message.contains(&std::process::id().to_string()));

        drop(guard);
        let again = WriterLock::acquire(&path).expect("lock released on drop");
        assert_eq!(again.framework(), path.as_path());
    }

    #[test]
    fn stale_lock_without_pid_names_unknown_holder() {
        let path = temp_path("json");
        std::fs::write(lock_path_for(&path), "").unwrap();

        let err = WriterLock::acquire(&path).unwrap_err();
        assert!(err.to_string().contains("an unknown process"));
        std::fs::remove_file(lock_path_for(&path)).unwrap();
        assert!(WriterLock::acquire(&path).is_ok());
    }
}
