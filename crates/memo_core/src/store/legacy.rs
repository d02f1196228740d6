//! Legacy flat-list source.
//!
//! Earlier revisions kept every memo in one JSON array under a single key.
//! This module reads that shape once so it can be imported, then clears it.

use super::{StoreError, StoreResult};
use crate::model::memo::StoredMemo;
use log::{error, info};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// JSON array file holding memos in the legacy flat-list shape.
#[derive(Debug, Clone)]
pub struct LegacyFlatFile {
    path: PathBuf,
}

impl LegacyFlatFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the legacy list.
    ///
    /// Returns `Ok(None)` when there is nothing to import: the file is
    /// missing, or its content is not a memo array. Malformed content is
    /// logged and left in place.
    pub fn read(&self) -> StoreResult<Option<Vec<StoredMemo>>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    action: "read legacy list",
                    path: self.path.clone(),
                    source,
                })
            }
        };

        match serde_json::from_str::<Vec<StoredMemo>>(&text) {
            Ok(memos) => {
                info!(
                    "event=legacy_read module=store status=ok count={}",
                    memos.len()
                );
                Ok(Some(memos))
            }
            Err(err) => {
                error!(
                    "event=legacy_read module=store status=error error_code=legacy_parse_failed line={} column={}",
                    err.line(),
                    err.column()
                );
                Ok(None)
            }
        }
    }

    /// Removes the legacy list. Missing files are not an error.
    pub fn clear(&self) -> StoreResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("event=legacy_clear module=store status=ok");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                action: "remove legacy list",
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LegacyFlatFile;
    use std::fs;

    #[test]
    fn missing_file_means_nothing_to_import() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = LegacyFlatFile::new(dir.path().join("memos.json"));
        assert_eq!(legacy.read().unwrap(), None);
        legacy.clear().unwrap();
    }

    #[test]
    fn malformed_file_is_reported_as_nothing_and_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memos.json");
        fs::write(&path, "{not json").unwrap();

        let legacy = LegacyFlatFile::new(&path);
        assert_eq!(legacy.read().unwrap(), None);
        assert!(path.exists());
    }

    #[test]
    fn reads_entries_with_and_without_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memos.json");
        fs::write(
            &path,
            r#"[
                {"id":"x","title":"X","body":"","createdAt":1,"updatedAt":1},
                {"id":"y","title":"Y","body":"b","createdAt":2,"updatedAt":3,"order":4}
            ]"#,
        )
        .unwrap();

        let memos = LegacyFlatFile::new(&path).read().unwrap().unwrap();
        assert_eq!(memos.len(), 2);
        assert_eq!(memos[0].order, None);
        assert_eq!(memos[1].order, Some(4));
    }
}
