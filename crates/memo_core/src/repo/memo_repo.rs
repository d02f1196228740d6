//! Memo repository contract and store-backed implementation.
//!
//! # Responsibility
//! - Compose codec, storage medium and normalization into
//!   load-all/save-one/delete-one.
//! - Own the "no location selected yet" state through the backend field.
//! - Import the legacy flat list once a location is available.
//!
//! # Invariants
//! - A record that fails to decode is skipped; loading continues.
//! - A record is only loaded from the key `"{id}.md"`; any other key is
//!   skipped, so save and delete always address the loaded record.
//! - `load_all` results are sorted by `order` and have unique ids.
//! - Writes validate the memo before touching the medium.
//! - No rule about minimum collection size lives here.

use crate::codec::{encode, try_decode};
use crate::model::memo::{
    record_key, validate_memo_id, Memo, MemoId, MemoValidationError, StoredMemo,
};
use crate::normalize::normalize;
use crate::store::{LegacyFlatFile, StoreBackend, StoreError};
use log::{info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Instant;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository errors surfaced to callers.
#[derive(Debug)]
pub enum RepoError {
    /// No storage location selected.
    NotReady,
    /// Memo failed write-time validation.
    Validation(MemoValidationError),
    /// Storage medium failure.
    Store(StoreError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotReady => write!(f, "no storage location selected"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotReady => None,
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotReady => Self::NotReady,
            other => Self::Store(other),
        }
    }
}

impl From<MemoValidationError> for RepoError {
    fn from(value: MemoValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Caller-facing persistence contract.
pub trait MemoRepository {
    /// Whether a storage location is selected and usable.
    fn ensure_location_accessible(&self) -> bool;
    /// Asks for a storage location. `Ok(false)` means the user cancelled.
    fn request_location(&mut self) -> RepoResult<bool>;
    /// Loads every decodable memo, normalized and sorted by order.
    fn load_all(&self) -> RepoResult<Vec<Memo>>;
    /// Creates or replaces the record of one memo.
    fn save_one(&mut self, memo: &Memo) -> RepoResult<()>;
    /// Removes the record of one memo; absent records are not an error.
    fn delete_one(&mut self, id: &str) -> RepoResult<()>;
    /// Imports the legacy flat list, if any.
    ///
    /// When the location is ready the imported memos are saved and the legacy
    /// list is cleared; otherwise they are only returned.
    fn import_legacy(&mut self) -> RepoResult<Vec<Memo>>;
}

/// Repository over any [`StoreBackend`].
pub struct StoreMemoRepository<B: StoreBackend> {
    backend: B,
    legacy: Option<LegacyFlatFile>,
}

impl<B: StoreBackend> StoreMemoRepository<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            legacy: None,
        }
    }

    /// Attaches a legacy flat list to import from.
    pub fn with_legacy(mut self, legacy: LegacyFlatFile) -> Self {
        self.legacy = Some(legacy);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn location(&self) -> Option<&Path> {
        self.backend.location()
    }
}

impl<B: StoreBackend> MemoRepository for StoreMemoRepository<B> {
    fn ensure_location_accessible(&self) -> bool {
        self.backend.is_ready()
    }

    fn request_location(&mut self) -> RepoResult<bool> {
        Ok(self.backend.request_access()?)
    }

    fn load_all(&self) -> RepoResult<Vec<Memo>> {
        if !self.backend.is_ready() {
            return Ok(Vec::new());
        }

        let started_at = Instant::now();
        let records = self.backend.list()?;
        let total = records.len();

        let mut decoded = Vec::with_capacity(total);
        let mut skipped = 0usize;
        for record in records {
            match try_decode(&record.text, &record.key) {
                Ok(memo) if record.key == memo.record_key() => {
                    decoded.push(StoredMemo::from(memo));
                }
                Ok(memo) => {
                    skipped += 1;
                    warn!(
                        "event=memo_decode module=repo status=skip error_code=key_mismatch key={} id={}",
                        record.key, memo.id
                    );
                }
                Err(failure) => {
                    skipped += 1;
                    warn!(
                        "event=memo_decode module=repo status=skip error_code=decode_failed error={failure}"
                    );
                }
            }
        }

        let memos = normalize(decoded);
        info!(
            "event=memo_load module=repo status=ok backend={} records={} loaded={} skipped={} duration_ms={}",
            self.backend.kind(),
            total,
            memos.len(),
            skipped,
            started_at.elapsed().as_millis()
        );
        Ok(memos)
    }

    fn save_one(&mut self, memo: &Memo) -> RepoResult<()> {
        memo.validate()?;
        self.backend.write(&memo.record_key(), &encode(memo))?;
        Ok(())
    }

    fn delete_one(&mut self, id: &str) -> RepoResult<()> {
        validate_memo_id(id)?;
        self.backend.delete(&record_key(id))?;
        info!("event=memo_delete module=repo status=ok backend={}", self.backend.kind());
        Ok(())
    }

    fn import_legacy(&mut self) -> RepoResult<Vec<Memo>> {
        let Some(legacy) = self.legacy.clone() else {
            return Ok(Vec::new());
        };
        let Some(records) = legacy.read()? else {
            return Ok(Vec::new());
        };

        let memos = drop_duplicate_ids(normalize(records));
        if memos.is_empty() || !self.backend.is_ready() {
            return Ok(memos);
        }

        for memo in &memos {
            self.save_one(memo)?;
        }
        legacy.clear()?;
        info!(
            "event=legacy_import module=repo status=ok backend={} count={}",
            self.backend.kind(),
            memos.len()
        );
        Ok(memos)
    }
}

/// Keeps the first memo for every id, preserving sequence.
fn drop_duplicate_ids(memos: Vec<Memo>) -> Vec<Memo> {
    let mut seen: HashSet<MemoId> = HashSet::with_capacity(memos.len());
    let before = memos.len();
    let unique: Vec<Memo> = memos
        .into_iter()
        .filter(|memo| seen.insert(memo.id.clone()))
        .collect();
    if unique.len() != before {
        warn!(
            "event=legacy_import module=repo status=duplicate_ids dropped={}",
            before - unique.len()
        );
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::{MemoRepository, RepoError, StoreMemoRepository};
    use crate::codec::encode;
    use crate::model::memo::Memo;
    use crate::store::{DirectoryBackend, NoLocation, SqliteBlobBackend, StoreBackend};

    #[test]
    fn unready_repository_loads_nothing_and_surfaces_not_ready() {
        let mut repo = StoreMemoRepository::new(DirectoryBackend::new(Box::new(NoLocation)));
        assert!(!repo.ensure_location_accessible());
        assert!(repo.load_all().unwrap().is_empty());

        let memo = Memo::with_id("m1", "t", "b", 0, 1);
        assert!(matches!(repo.save_one(&memo), Err(RepoError::NotReady)));
        assert!(matches!(repo.delete_one("m1"), Err(RepoError::NotReady)));
    }

    #[test]
    fn save_rejects_invalid_memo_before_writing() {
        let mut repo = StoreMemoRepository::new(SqliteBlobBackend::open_in_memory().unwrap());
        let memo = Memo::with_id("../escape", "t", "b", 0, 1);
        assert!(matches!(repo.save_one(&memo), Err(RepoError::Validation(_))));
        assert!(repo.load_all().unwrap().is_empty());
    }

    #[test]
    fn record_under_a_foreign_key_is_skipped() {
        let mut repo = StoreMemoRepository::new(SqliteBlobBackend::open_in_memory().unwrap());
        let first = Memo::with_id("dup", "first", "", 0, 1);
        let other = Memo::with_id("other", "other", "", 1, 1);
        repo.save_one(&first).unwrap();
        repo.save_one(&other).unwrap();

        let mut copy = first.clone();
        copy.title = "copy".to_string();
        copy.order = 2;
        repo.backend.write("dup (copy).md", &encode(&copy)).unwrap();
        let stray = Memo::with_id("stray", "stray", "", 3, 1);
        repo.backend.write("elsewhere.md", &encode(&stray)).unwrap();

        let loaded = repo.load_all().unwrap();
        let ids: Vec<&str> = loaded.iter().map(|memo| memo.id.as_str()).collect();
        assert_eq!(ids, vec!["dup", "other"]);
        assert_eq!(loaded[0].title, "first");
    }
}
