//! Memo domain model.
//!
//! # Responsibility
//! - Define the canonical memo record used by codec, storage and ordering code.
//!
//! # Invariants
//! - Every memo is identified by a stable `MemoId`.
//! - Order values describe a zero-based, gap-free ranking.

pub mod memo;
