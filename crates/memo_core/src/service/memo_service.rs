//! Memo session service.
//!
//! # Responsibility
//! - Own the in-memory memo collection for one caller (UI, CLI, server).
//! - Drive startup: location check, legacy import, first-run seeding.
//! - Route mutations through the ordering engine and persist them in
//!   debounced batches.
//!
//! # Invariants
//! - Mutations require `SessionStatus::Ready`.
//! - After every successful call, orders are exactly `0..len`.
//! - A deletion is only applied in memory after its record was removed.
//! - A failed flush keeps the unsaved ids dirty.

use crate::model::memo::{now_epoch_ms, Memo, MemoId};
use crate::normalize::{default_title, initial_memos, is_contiguous, INITIAL_MEMO_COUNT};
use crate::repo::memo_repo::{MemoRepository, RepoError};
use crate::service::flush::FlushScheduler;
use crate::service::ordering::{self, OrderingError};
use log::{error, info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

/// Lifecycle of a memo session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// `open()` has not completed yet.
    Loading,
    /// No storage location; memos shown are not persisted.
    NeedLocation,
    /// Storage location selected; changes are persisted.
    Ready,
}

/// Failure category a caller can map to user feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotReady,
    LastItem,
    IndexOutOfRange,
    NotFound,
    Validation,
    Storage,
}

/// Errors from memo session operations.
#[derive(Debug)]
pub enum MemoServiceError {
    /// No storage location selected.
    NotReady,
    /// Attempted to delete the only remaining memo.
    LastItem,
    /// Move index outside the collection.
    IndexOutOfRange { index: usize, len: usize },
    /// Referenced memo is not in the collection.
    MemoNotFound(MemoId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl MemoServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotReady => ErrorKind::NotReady,
            Self::LastItem => ErrorKind::LastItem,
            Self::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            Self::MemoNotFound(_) => ErrorKind::NotFound,
            Self::Repo(RepoError::NotReady) => ErrorKind::NotReady,
            Self::Repo(RepoError::Validation(_)) => ErrorKind::Validation,
            Self::Repo(RepoError::Store(_)) => ErrorKind::Storage,
        }
    }
}

impl Display for MemoServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotReady => write!(f, "no storage location selected"),
            Self::LastItem => write!(f, "the last remaining memo cannot be deleted"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} is out of range for {len} memo(s)")
            }
            Self::MemoNotFound(id) => write!(f, "memo not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MemoServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for MemoServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotReady => Self::NotReady,
            other => Self::Repo(other),
        }
    }
}

impl From<OrderingError> for MemoServiceError {
    fn from(value: OrderingError) -> Self {
        match value {
            OrderingError::LastItem => Self::LastItem,
            OrderingError::IndexOutOfRange { index, len } => Self::IndexOutOfRange { index, len },
            OrderingError::NotFound(id) => Self::MemoNotFound(id),
        }
    }
}

pub type MemoServiceResult<T> = Result<T, MemoServiceError>;

/// Session facade over a memo repository.
pub struct MemoService<R: MemoRepository> {
    repo: R,
    memos: Vec<Memo>,
    status: SessionStatus,
    flush: FlushScheduler,
}

impl<R: MemoRepository> MemoService<R> {
    /// Creates a session with the default one-second quiet period.
    pub fn new(repo: R) -> Self {
        Self::with_scheduler(repo, FlushScheduler::default())
    }

    pub fn with_quiet_period(repo: R, quiet_period: Duration) -> Self {
        Self::with_scheduler(repo, FlushScheduler::new(quiet_period))
    }

    fn with_scheduler(repo: R, flush: FlushScheduler) -> Self {
        Self {
            repo,
            memos: Vec::new(),
            status: SessionStatus::Loading,
            flush,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Memos in display order.
    pub fn memos(&self) -> &[Memo] {
        &self.memos
    }

    pub fn get(&self, id: &str) -> Option<&Memo> {
        self.memos.iter().find(|memo| memo.id == id)
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Whether some changes are waiting for a flush.
    pub fn has_pending_changes(&self) -> bool {
        self.flush.is_pending()
    }

    /// Earliest instant at which `tick` will flush.
    pub fn next_flush_at(&self) -> Option<Instant> {
        self.flush.deadline()
    }

    /// Starts the session.
    ///
    /// With an accessible location, memos are loaded (or seeded) and the
    /// session becomes `Ready`. Otherwise legacy memos, or a fresh seed, are
    /// shown unsaved and the session waits in `NeedLocation`.
    pub fn open(&mut self) -> MemoServiceResult<SessionStatus> {
        self.status = SessionStatus::Loading;
        if self.repo.ensure_location_accessible() {
            self.load_ready()?;
            return Ok(self.status);
        }

        let legacy = self.repo.import_legacy()?;
        self.memos = if legacy.is_empty() {
            initial_memos(INITIAL_MEMO_COUNT, now_epoch_ms())
        } else {
            legacy
        };
        ordering::reindex(&mut self.memos);
        self.flush.cancel();
        self.status = SessionStatus::NeedLocation;
        info!(
            "event=session_open module=service status=need_location count={}",
            self.memos.len()
        );
        Ok(self.status)
    }

    /// Asks the repository for a location and, when granted, loads from it.
    ///
    /// Returns `Ok(false)` when the request was cancelled; the session state
    /// is unchanged in that case. A `Ready` session keeps its location and
    /// its unsaved changes.
    pub fn select_location(&mut self) -> MemoServiceResult<bool> {
        if self.status == SessionStatus::Ready {
            return Ok(true);
        }
        if !self.repo.request_location()? {
            info!("event=session_location module=service status=cancelled");
            return Ok(false);
        }
        self.repo.import_legacy()?;
        self.load_ready()?;
        Ok(true)
    }

    /// Imports the legacy flat list into the selected location and reloads.
    ///
    /// Pending changes are flushed first. Returns the number of imported
    /// memos.
    pub fn import_legacy(&mut self) -> MemoServiceResult<usize> {
        self.require_ready()?;
        self.flush_now()?;
        let imported = self.repo.import_legacy()?.len();
        if imported > 0 {
            self.load_ready()?;
        }
        Ok(imported)
    }

    fn load_ready(&mut self) -> MemoServiceResult<()> {
        let mut memos = self.repo.load_all()?;
        self.flush.cancel();

        if memos.is_empty() {
            memos = initial_memos(INITIAL_MEMO_COUNT, now_epoch_ms());
            for memo in &memos {
                self.repo.save_one(memo)?;
            }
            info!(
                "event=session_seed module=service status=ok count={}",
                memos.len()
            );
        } else if !is_contiguous(&memos) {
            let repaired = ordering::reindex(&mut memos);
            warn!(
                "event=session_repair module=service status=ok repaired={}",
                repaired.len()
            );
            self.flush.mark_all_dirty(repaired, Instant::now());
        }

        self.memos = memos;
        self.status = SessionStatus::Ready;
        info!(
            "event=session_open module=service status=ready count={}",
            self.memos.len()
        );
        Ok(())
    }

    fn require_ready(&self) -> MemoServiceResult<()> {
        if self.status == SessionStatus::Ready {
            Ok(())
        } else {
            Err(MemoServiceError::NotReady)
        }
    }

    /// Appends a memo. A missing title gets the default `new memo N`.
    pub fn add_memo(
        &mut self,
        title: Option<String>,
        body: impl Into<String>,
    ) -> MemoServiceResult<Memo> {
        self.require_ready()?;
        let title = title.unwrap_or_else(|| default_title(self.memos.len() as u32));
        let memo = ordering::insert_memo(&mut self.memos, title, body, now_epoch_ms());
        self.flush.mark_dirty(memo.id.clone(), Instant::now());
        Ok(memo)
    }

    /// Replaces title and body of one memo.
    pub fn update_memo(
        &mut self,
        id: &str,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> MemoServiceResult<Memo> {
        self.require_ready()?;
        let memo = ordering::update_content(&mut self.memos, id, title, body, now_epoch_ms())?;
        self.flush.mark_dirty(memo.id.clone(), Instant::now());
        Ok(memo)
    }

    /// Updates only the fields that are provided.
    pub fn patch_memo(
        &mut self,
        id: &str,
        title: Option<String>,
        body: Option<String>,
    ) -> MemoServiceResult<Memo> {
        self.require_ready()?;
        let current = self
            .get(id)
            .ok_or_else(|| MemoServiceError::MemoNotFound(id.to_string()))?;
        let title = title.unwrap_or_else(|| current.title.clone());
        let body = body.unwrap_or_else(|| current.body.clone());
        self.update_memo(id, title, body)
    }

    /// Deletes one memo and its record.
    ///
    /// The record is removed first; if that fails the collection is left as
    /// it was.
    pub fn delete_memo(&mut self, id: &str) -> MemoServiceResult<Memo> {
        self.require_ready()?;
        let mut next = self.memos.clone();
        let (removed, changed) = ordering::delete_memo(&mut next, id)?;

        if let Err(err) = self.repo.delete_one(id) {
            error!("event=memo_delete module=service status=error error={err}");
            return Err(err.into());
        }

        self.memos = next;
        self.flush.forget(id);
        self.flush.mark_all_dirty(changed, Instant::now());
        Ok(removed)
    }

    /// Moves the memo at `from` to index `to`.
    pub fn reorder(&mut self, from: usize, to: usize) -> MemoServiceResult<()> {
        self.require_ready()?;
        let changed = ordering::reorder(&mut self.memos, from, to)?;
        self.flush.mark_all_dirty(changed, Instant::now());
        Ok(())
    }

    /// Rearranges memos to follow `ordered_ids`.
    pub fn reorder_by_ids(&mut self, ordered_ids: &[MemoId]) -> MemoServiceResult<()> {
        self.require_ready()?;
        let changed = ordering::reorder_by_ids(&mut self.memos, ordered_ids)?;
        self.flush.mark_all_dirty(changed, Instant::now());
        Ok(())
    }

    /// Flushes dirty memos when the quiet period has elapsed.
    ///
    /// Returns the number of memos written.
    pub fn tick(&mut self, now: Instant) -> MemoServiceResult<usize> {
        if self.status != SessionStatus::Ready {
            return Ok(0);
        }
        let Some(ids) = self.flush.take_due(now) else {
            return Ok(0);
        };
        self.write_batch(ids, now)
    }

    /// Flushes every dirty memo immediately.
    pub fn flush_now(&mut self) -> MemoServiceResult<usize> {
        if !self.flush.is_pending() {
            return Ok(0);
        }
        self.require_ready()?;
        let ids = self.flush.take_all();
        self.write_batch(ids, Instant::now())
    }

    fn write_batch(&mut self, ids: Vec<MemoId>, now: Instant) -> MemoServiceResult<usize> {
        let started_at = Instant::now();
        let mut written = 0usize;
        for (index, id) in ids.iter().enumerate() {
            let Some(memo) = self.memos.iter().find(|memo| &memo.id == id) else {
                continue;
            };
            if let Err(err) = self.repo.save_one(memo) {
                error!(
                    "event=memo_flush module=service status=error written={} remaining={} error={}",
                    written,
                    ids.len() - index,
                    err
                );
                self.flush.mark_all_dirty(ids[index..].iter().cloned(), now);
                return Err(err.into());
            }
            written += 1;
        }
        info!(
            "event=memo_flush module=service status=ok written={} duration_ms={}",
            written,
            started_at.elapsed().as_millis()
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, MemoService, MemoServiceError, SessionStatus};
    use crate::repo::memo_repo::RepoError;

    #[test]
    fn error_kinds_follow_variants() {
        assert_eq!(MemoServiceError::LastItem.kind(), ErrorKind::LastItem);
        assert_eq!(
            MemoServiceError::IndexOutOfRange { index: 3, len: 1 }.kind(),
            ErrorKind::IndexOutOfRange
        );
        assert_eq!(
            MemoServiceError::from(RepoError::NotReady).kind(),
            ErrorKind::NotReady
        );
        assert_eq!(
            MemoServiceError::MemoNotFound("x".to_string()).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn new_session_starts_loading_and_rejects_mutations() {
        let repo = crate::repo::memo_repo::StoreMemoRepository::new(
            crate::store::DirectoryBackend::new(Box::new(crate::store::NoLocation)),
        );
        let mut service = MemoService::new(repo);
        assert_eq!(service.status(), SessionStatus::Loading);
        assert!(matches!(
            service.add_memo(None, ""),
            Err(MemoServiceError::NotReady)
        ));
    }
}
