//! Ordering and mutation engine.
//!
//! # Responsibility
//! - Insert, edit, delete and move memos in an in-memory sequence.
//! - Recompute `order` so it always equals the position in the sequence.
//!
//! # Invariants
//! - No I/O; persistence is a separate step.
//! - On error the sequence is left untouched.
//! - After every successful structural change, orders are exactly `0..len`.
//! - A one-element sequence cannot be emptied through `delete_memo`.

use crate::model::memo::{Memo, MemoId};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type OrderingResult<T> = Result<T, OrderingError>;

/// Rejected mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderingError {
    /// Deleting would empty the collection.
    LastItem,
    /// Move index outside `[0, len - 1]`.
    IndexOutOfRange { index: usize, len: usize },
    /// Referenced id is not part of the collection.
    NotFound(MemoId),
}

impl Display for OrderingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LastItem => write!(f, "the last remaining memo cannot be deleted"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} is out of range for {len} memo(s)")
            }
            Self::NotFound(id) => write!(f, "memo not found: {id}"),
        }
    }
}

impl Error for OrderingError {}

/// Appends a new memo with a fresh id and returns a copy of it.
pub fn insert_memo(
    memos: &mut Vec<Memo>,
    title: impl Into<String>,
    body: impl Into<String>,
    now_ms: i64,
) -> Memo {
    let memo = Memo::new(title, body, memos.len() as u32, now_ms);
    memos.push(memo.clone());
    memo
}

/// Replaces title and body of one memo and bumps `updated_at`.
///
/// `order` and `created_at` are untouched. `updated_at` never goes below
/// `created_at`, even when the clock moved backwards.
pub fn update_content(
    memos: &mut [Memo],
    id: &str,
    title: impl Into<String>,
    body: impl Into<String>,
    now_ms: i64,
) -> OrderingResult<Memo> {
    let memo = memos
        .iter_mut()
        .find(|memo| memo.id == id)
        .ok_or_else(|| OrderingError::NotFound(id.to_string()))?;
    memo.title = title.into();
    memo.body = body.into();
    memo.updated_at = now_ms.max(memo.created_at);
    Ok(memo.clone())
}

/// Removes one memo and closes the gap in `order`.
///
/// Returns the removed memo together with the ids of survivors whose order
/// changed.
pub fn delete_memo(memos: &mut Vec<Memo>, id: &str) -> OrderingResult<(Memo, Vec<MemoId>)> {
    if memos.len() == 1 {
        return Err(OrderingError::LastItem);
    }
    let index = position_of(memos, id)?;
    let removed = memos.remove(index);
    let changed = reindex(memos);
    Ok((removed, changed))
}

/// Moves the memo at `from` so it ends up at index `to`.
///
/// Splice semantics: the element is removed first, then inserted at `to` in
/// the shortened sequence. Returns the ids whose order changed.
pub fn reorder(memos: &mut Vec<Memo>, from: usize, to: usize) -> OrderingResult<Vec<MemoId>> {
    let len = memos.len();
    for index in [from, to] {
        if index >= len {
            return Err(OrderingError::IndexOutOfRange { index, len });
        }
    }
    let moved = memos.remove(from);
    memos.insert(to, moved);
    Ok(reindex(memos))
}

/// Rearranges memos to follow `ordered_ids`.
///
/// Listed ids come first in the given order; repeated ids count once; memos
/// not listed keep their relative order after them.
pub fn reorder_by_ids(
    memos: &mut Vec<Memo>,
    ordered_ids: &[MemoId],
) -> OrderingResult<Vec<MemoId>> {
    if let Some(unknown) = ordered_ids
        .iter()
        .find(|id| !memos.iter().any(|memo| &memo.id == *id))
    {
        return Err(OrderingError::NotFound(unknown.clone()));
    }

    let mut seen = HashSet::new();
    let mut rearranged = Vec::with_capacity(memos.len());
    for id in ordered_ids {
        if !seen.insert(id.as_str()) {
            continue;
        }
        if let Some(memo) = memos.iter().find(|memo| &memo.id == id) {
            rearranged.push(memo.clone());
        }
    }
    rearranged.extend(
        memos
            .iter()
            .filter(|memo| !seen.contains(memo.id.as_str()))
            .cloned(),
    );

    *memos = rearranged;
    Ok(reindex(memos))
}

/// Sets every `order` to its position. Returns the ids that changed.
pub fn reindex(memos: &mut [Memo]) -> Vec<MemoId> {
    let mut changed = Vec::new();
    for (index, memo) in memos.iter_mut().enumerate() {
        let order = index as u32;
        if memo.order != order {
            memo.order = order;
            changed.push(memo.id.clone());
        }
    }
    changed
}

/// Index of the memo with `id`.
pub fn position_of(memos: &[Memo], id: &str) -> OrderingResult<usize> {
    memos
        .iter()
        .position(|memo| memo.id == id)
        .ok_or_else(|| OrderingError::NotFound(id.to_string()))
}
