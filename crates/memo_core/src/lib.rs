//! Core domain logic for the memo store.
//! This crate is the single source of truth for memo ordering and storage
//! invariants; CLI and server are thin callers.

pub mod codec;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod repo;
pub mod service;
pub mod store;

pub use codec::{decode, encode, try_decode, DecodeFailure, DecodeReason};
pub use config::{build_backend, build_repository, BackendKind, ConfigError, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::memo::{Memo, MemoId, MemoValidationError, StoredMemo};
pub use repo::memo_repo::{MemoRepository, RepoError, RepoResult, StoreMemoRepository};
pub use service::memo_service::{
    ErrorKind, MemoService, MemoServiceError, MemoServiceResult, SessionStatus,
};
pub use store::{
    DirectoryBackend, FixedLocation, LegacyFlatFile, LocationPicker, NoLocation,
    SqliteBlobBackend, StoreBackend, StoreError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
