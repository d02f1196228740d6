//! Memo domain model.
//!
//! # Responsibility
//! - Define the canonical memo record shared by storage and ordering code.
//! - Define the storage-shaped record whose `order` may be missing.
//! - Validate records before they are handed to a storage medium.
//!
//! # Invariants
//! - `id` is stable and never reused for another memo.
//! - `created_at <= updated_at`.
//! - `id` is safe to use as a file stem (`"{id}.md"`).

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Opaque memo identifier, also used as the storage key stem.
pub type MemoId = String;

/// Canonical memo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memo {
    /// Stable identifier, generated once at creation.
    pub id: MemoId,
    /// Display title. May be empty.
    pub title: String,
    /// Free text body, persisted verbatim.
    pub body: String,
    /// Unix epoch milliseconds, set once.
    pub created_at: i64,
    /// Unix epoch milliseconds, bumped on title/body edits only.
    pub updated_at: i64,
    /// Zero-based rank in the collection.
    pub order: u32,
}

/// Memo as read from a storage shape that may predate the `order` field.
///
/// The legacy flat list stored memos without `order`; normalization turns
/// these into [`Memo`] values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMemo {
    pub id: MemoId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub order: Option<u32>,
}

/// Validation errors for memo records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoValidationError {
    /// `id` is empty or whitespace only.
    EmptyId,
    /// `id` cannot be used as a storage key stem.
    UnsafeId(MemoId),
    /// `updated_at` is earlier than `created_at`.
    UpdatedBeforeCreated {
        id: MemoId,
        created_at: i64,
        updated_at: i64,
    },
}

impl Display for MemoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "memo id must not be empty"),
            Self::UnsafeId(id) => write!(f, "memo id `{id}` is not usable as a storage key"),
            Self::UpdatedBeforeCreated {
                id,
                created_at,
                updated_at,
            } => write!(
                f,
                "memo `{id}` has updated_at {updated_at} earlier than created_at {created_at}"
            ),
        }
    }
}

impl Error for MemoValidationError {}

impl Memo {
    /// Creates a memo with a freshly generated id.
    ///
    /// # Invariants
    /// - `created_at == updated_at == now_ms`.
    pub fn new(title: impl Into<String>, body: impl Into<String>, order: u32, now_ms: i64) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), title, body, order, now_ms)
    }

    /// Creates a memo with a caller-provided id.
    ///
    /// Used by import paths where identity already exists.
    pub fn with_id(
        id: impl Into<MemoId>,
        title: impl Into<String>,
        body: impl Into<String>,
        order: u32,
        now_ms: i64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            created_at: now_ms,
            updated_at: now_ms,
            order,
        }
    }

    /// Storage key for this memo.
    pub fn record_key(&self) -> String {
        record_key(&self.id)
    }

    /// Checks record invariants required before persistence.
    pub fn validate(&self) -> Result<(), MemoValidationError> {
        validate_memo_id(&self.id)?;
        if self.updated_at < self.created_at {
            return Err(MemoValidationError::UpdatedBeforeCreated {
                id: self.id.clone(),
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }
}

impl From<Memo> for StoredMemo {
    fn from(value: Memo) -> Self {
        Self {
            id: value.id,
            title: value.title,
            body: value.body,
            created_at: value.created_at,
            updated_at: value.updated_at,
            order: Some(value.order),
        }
    }
}

/// Returns the storage key (`"{id}.md"`) for a memo id.
pub fn record_key(id: &str) -> String {
    format!("{id}.md")
}

/// Validates that `id` can be used as a storage key stem.
pub fn validate_memo_id(id: &str) -> Result<(), MemoValidationError> {
    if id.trim().is_empty() {
        return Err(MemoValidationError::EmptyId);
    }
    let unsafe_id = id.starts_with('.')
        || id.contains(['/', '\\', '"'])
        || id.chars().any(char::is_control);
    if unsafe_id {
        return Err(MemoValidationError::UnsafeId(id.to_string()));
    }
    Ok(())
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
