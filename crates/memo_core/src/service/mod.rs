//! Memo use-case services.
//!
//! # Responsibility
//! - Hold the ordering engine, the flush scheduler and the session facade.
//! - Keep CLI/server layers decoupled from storage details.

pub mod flush;
pub mod memo_service;
pub mod ordering;
