//! Record codec for persisted memos.
//!
//! # Responsibility
//! - Translate between `Memo` values and their textual storage form.
//!
//! # Invariants
//! - Decode failures are values (`DecodeFailure`), never panics.

pub mod front_matter;

pub use front_matter::{decode, encode, try_decode, DecodeFailure, DecodeReason};
