//! One-file-per-record directory backend.
//!
//! # Responsibility
//! - Persist each record as `<location>/<key>` where keys end in `.md`.
//! - Own the selected directory as explicit state.
//!
//! # Invariants
//! - Only regular `*.md` files are listed; unreadable files are skipped.
//! - Writes go through a hidden temp file and a rename, so a listed record is
//!   never half written.

use super::{
    ensure_flat_key, BoxedPicker, NoLocation, RawRecord, StoreBackend, StoreError, StoreResult,
};
use log::{debug, info, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const RECORD_EXTENSION: &str = "md";

/// Directory-backed record store.
pub struct DirectoryBackend {
    location: Option<PathBuf>,
    picker: BoxedPicker,
}

impl DirectoryBackend {
    /// Creates a backend with no location; `request_access` consults `picker`.
    pub fn new(picker: BoxedPicker) -> Self {
        Self {
            location: None,
            picker,
        }
    }

    /// Creates a backend bound to `dir`, creating it when missing.
    pub fn with_location(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let mut backend = Self::new(Box::new(NoLocation));
        backend.select(dir.into())?;
        Ok(backend)
    }

    fn select(&mut self, dir: PathBuf) -> StoreResult<()> {
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            action: "create directory",
            path: dir.clone(),
            source,
        })?;
        info!(
            "event=store_location module=store status=ok backend=directory path={}",
            dir.display()
        );
        self.location = Some(dir);
        Ok(())
    }

    fn require_location(&self) -> StoreResult<&Path> {
        self.location.as_deref().ok_or(StoreError::NotReady)
    }
}

impl StoreBackend for DirectoryBackend {
    fn kind(&self) -> &'static str {
        "directory"
    }

    fn is_ready(&self) -> bool {
        self.location.is_some()
    }

    fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    fn request_access(&mut self) -> StoreResult<bool> {
        if self.is_ready() {
            return Ok(true);
        }
        match self.picker.pick_location() {
            Some(dir) => {
                self.select(dir)?;
                Ok(true)
            }
            None => {
                info!("event=store_location module=store status=cancelled backend=directory");
                Ok(false)
            }
        }
    }

    fn list(&self) -> StoreResult<Vec<RawRecord>> {
        let Some(dir) = self.location.as_deref() else {
            return Ok(Vec::new());
        };

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(
                    "event=store_list module=store status=missing backend=directory path={}",
                    dir.display()
                );
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    action: "read directory",
                    path: dir.to_path_buf(),
                    source,
                })
            }
        };

        let mut records = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(
                        "event=store_list module=store status=skip backend=directory error={err}"
                    );
                    continue;
                }
            };
            let path = entry.path();
            let is_record = path.extension().and_then(|ext| ext.to_str()) == Some(RECORD_EXTENSION)
                && entry.file_type().map(|kind| kind.is_file()).unwrap_or(false);
            if !is_record {
                continue;
            }
            let Some(key) = path.file_name().and_then(|name| name.to_str()) else {
                warn!(
                    "event=store_list module=store status=skip backend=directory reason=non_utf8_name"
                );
                continue;
            };
            match fs::read_to_string(&path) {
                Ok(text) => records.push(RawRecord {
                    key: key.to_string(),
                    text,
                }),
                Err(err) => warn!(
                    "event=store_list module=store status=skip backend=directory key={key} error={err}"
                ),
            }
        }

        debug!(
            "event=store_list module=store status=ok backend=directory count={}",
            records.len()
        );
        Ok(records)
    }

    fn write(&mut self, key: &str, text: &str) -> StoreResult<()> {
        let dir = self.require_location()?;
        ensure_flat_key(key)?;

        let target = dir.join(key);
        let staging = dir.join(format!(".{key}.tmp"));
        fs::write(&staging, text).map_err(|source| StoreError::Io {
            action: "write",
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, &target).map_err(|source| StoreError::Io {
            action: "replace",
            path: target.clone(),
            source,
        })?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> StoreResult<()> {
        let dir = self.require_location()?;
        ensure_flat_key(key)?;

        let target = dir.join(key);
        match fs::remove_file(&target) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                action: "delete",
                path: target,
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DirectoryBackend;
    use crate::store::{FixedLocation, NoLocation, StoreBackend, StoreError};
    use std::fs;

    #[test]
    fn unconfigured_backend_lists_nothing_and_rejects_writes() {
        let mut backend = DirectoryBackend::new(Box::new(NoLocation));
        assert!(!backend.is_ready());
        assert!(backend.list().unwrap().is_empty());
        assert!(matches!(
            backend.write("a.md", "x"),
            Err(StoreError::NotReady)
        ));
        assert!(matches!(backend.delete("a.md"), Err(StoreError::NotReady)));
    }

    #[test]
    fn cancelled_request_keeps_backend_unready() {
        let mut backend = DirectoryBackend::new(Box::new(NoLocation));
        assert!(!backend.request_access().unwrap());
        assert!(!backend.is_ready());
    }

    #[test]
    fn request_access_creates_directory_and_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("nested").join("memos");
        let mut backend = DirectoryBackend::new(Box::new(FixedLocation(dir.clone())));

        assert!(backend.request_access().unwrap());
        assert!(dir.is_dir());
        assert!(backend.request_access().unwrap());
        assert_eq!(backend.location(), Some(dir.as_path()));
    }

    #[test]
    fn write_replaces_and_leaves_no_staging_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = DirectoryBackend::with_location(dir.path()).unwrap();

        backend.write("a.md", "first").unwrap();
        backend.write("a.md", "second").unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("a.md")).unwrap(), "second");
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["a.md".to_string()]);
    }

    #[test]
    fn list_skips_non_record_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join(".a.md.tmp"), "ignored").unwrap();
        fs::create_dir(dir.path().join("folder.md")).unwrap();
        fs::write(dir.path().join("b.md"), "kept").unwrap();

        let backend = DirectoryBackend::with_location(dir.path()).unwrap();
        let records = backend.list().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "b.md");
        assert_eq!(records[0].text, "kept");
    }

    #[test]
    fn delete_missing_record_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = DirectoryBackend::with_location(dir.path()).unwrap();
        backend.delete("absent.md").unwrap();

        backend.write("present.md", "x").unwrap();
        backend.delete("present.md").unwrap();
        assert!(!dir.path().join("present.md").exists());
    }

    #[test]
    fn list_of_removed_directory_is_empty() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("gone");
        let backend = DirectoryBackend::with_location(&dir).unwrap();
        fs::remove_dir(&dir).unwrap();
        assert!(backend.list().unwrap().is_empty());
    }
}
