//! Repository layer over storage media.
//!
//! # Responsibility
//! - Define the caller-facing load/save/delete contract.
//! - Keep codec and medium details out of service code.
//!
//! # Invariants
//! - Decode failures are recovered here and never reach callers.
//! - `NotReady` is surfaced, never swallowed.

pub mod memo_repo;
