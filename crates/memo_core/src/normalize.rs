//! Load-time repair of memo collections.
//!
//! # Responsibility
//! - Give legacy records without `order` a position-based order.
//! - Return collections sorted by `order`.
//! - Build new memos and first-run seed collections with defaults.
//!
//! # Invariants
//! - Missing orders are filled from the input position, left to right.
//! - Sorting is stable: equal orders keep their input sequence.
//! - `normalize` is idempotent.

use crate::model::memo::{Memo, StoredMemo};
use log::debug;

/// Number of memos created on first run.
pub const INITIAL_MEMO_COUNT: usize = 2;

/// Fills missing orders and sorts ascending by order.
pub fn normalize(records: Vec<StoredMemo>) -> Vec<Memo> {
    let mut filled = 0usize;
    let mut memos: Vec<Memo> = records
        .into_iter()
        .enumerate()
        .map(|(position, record)| {
            let order = record.order.unwrap_or_else(|| {
                filled += 1;
                position as u32
            });
            Memo {
                id: record.id,
                title: record.title,
                body: record.body,
                created_at: record.created_at,
                updated_at: record.updated_at,
                order,
            }
        })
        .collect();

    if filled > 0 {
        debug!("event=normalize module=normalize status=ok filled_orders={filled}");
    }

    sort_by_order(&mut memos);
    memos
}

/// Stable sort by `order`.
pub fn sort_by_order(memos: &mut [Memo]) {
    memos.sort_by_key(|memo| memo.order);
}

/// Whether orders are exactly `0..len` in sequence.
pub fn is_contiguous(memos: &[Memo]) -> bool {
    memos
        .iter()
        .enumerate()
        .all(|(index, memo)| memo.order as usize == index)
}

/// Default title for a memo placed at `order`.
pub fn default_title(order: u32) -> String {
    format!("new memo {}", order + 1)
}

/// Creates a memo with default title and empty body at `order`.
pub fn new_memo(order: u32, now_ms: i64) -> Memo {
    Memo::new(default_title(order), "", order, now_ms)
}

/// Creates the first-run collection of `count` default memos.
pub fn initial_memos(count: usize, now_ms: i64) -> Vec<Memo> {
    (0..count).map(|index| new_memo(index as u32, now_ms)).collect()
}
