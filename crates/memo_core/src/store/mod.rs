//! Raw record storage media.
//!
//! # Responsibility
//! - Define the capability set every persistence medium offers:
//!   readiness, access request, list, write, delete.
//! - Keep medium details (files, SQLite) behind one trait.
//!
//! # Invariants
//! - `list()` without an accessible location yields no records, not an error.
//! - `write()` is create-or-replace; `delete()` of a missing key succeeds.
//! - `write()`/`delete()` without a location fail with `StoreError::NotReady`.
//! - `request_access()` is idempotent once access is granted, and a cancelled
//!   request resolves to `Ok(false)`.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};

pub mod blob;
pub mod directory;
pub mod legacy;

pub use blob::SqliteBlobBackend;
pub use directory::DirectoryBackend;
pub use legacy::LegacyFlatFile;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from storage media.
#[derive(Debug)]
pub enum StoreError {
    /// No storage location has been selected yet.
    NotReady,
    /// Record key cannot be addressed on this medium.
    InvalidKey(String),
    /// Filesystem failure.
    Io {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },
    /// SQLite failure in the blob backend.
    Db(DbError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotReady => write!(f, "no storage location selected"),
            Self::InvalidKey(key) => write!(f, "invalid record key `{key}`"),
            Self::Io {
                action,
                path,
                source,
            } => write!(f, "failed to {action} `{}`: {source}", path.display()),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            Self::NotReady | Self::InvalidKey(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One stored record as raw text, addressed by its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Medium-level key, e.g. `"{id}.md"`.
    pub key: String,
    pub text: String,
}

/// Capability set of a memo storage medium.
pub trait StoreBackend {
    /// Short medium name used in log events.
    fn kind(&self) -> &'static str;
    /// Whether a location is configured and usable.
    fn is_ready(&self) -> bool;
    /// Currently selected location, if the medium has a filesystem path.
    fn location(&self) -> Option<&Path>;
    /// Asks for a location when none is selected yet.
    fn request_access(&mut self) -> StoreResult<bool>;
    /// Lists every record. Enumeration order is unspecified.
    fn list(&self) -> StoreResult<Vec<RawRecord>>;
    /// Creates or replaces one record.
    fn write(&mut self, key: &str, text: &str) -> StoreResult<()>;
    /// Removes one record; missing records are not an error.
    fn delete(&mut self, key: &str) -> StoreResult<()>;
}

impl<B: StoreBackend + ?Sized> StoreBackend for Box<B> {
    fn kind(&self) -> &'static str {
        (**self).kind()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn location(&self) -> Option<&Path> {
        (**self).location()
    }

    fn request_access(&mut self) -> StoreResult<bool> {
        (**self).request_access()
    }

    fn list(&self) -> StoreResult<Vec<RawRecord>> {
        (**self).list()
    }

    fn write(&mut self, key: &str, text: &str) -> StoreResult<()> {
        (**self).write(key, text)
    }

    fn delete(&mut self, key: &str) -> StoreResult<()> {
        (**self).delete(key)
    }
}

/// Source of a storage location when access is requested.
///
/// Interactive implementations may prompt the user; returning `None` means
/// the request was cancelled.
pub trait LocationPicker {
    fn pick_location(&mut self) -> Option<PathBuf>;
}

/// Picker that always answers with one preconfigured location.
#[derive(Debug, Clone)]
pub struct FixedLocation(pub PathBuf);

impl LocationPicker for FixedLocation {
    fn pick_location(&mut self) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}

/// Picker that always cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

impl LocationPicker for NoLocation {
    fn pick_location(&mut self) -> Option<PathBuf> {
        None
    }
}

/// Boxed picker shared by the backends.
pub type BoxedPicker = Box<dyn LocationPicker + Send>;

/// Rejects keys that would escape a single flat namespace.
pub(crate) fn ensure_flat_key(key: &str) -> StoreResult<()> {
    let flat = !key.is_empty()
        && !key.starts_with('.')
        && !key.contains(['/', '\\'])
        && !key.chars().any(char::is_control);
    if flat {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{ensure_flat_key, FixedLocation, LocationPicker, NoLocation};
    use std::path::PathBuf;

    #[test]
    fn flat_keys_are_accepted_and_paths_rejected() {
        assert!(ensure_flat_key("abc.md").is_ok());
        for key in ["", ".tmp", "../x.md", "a/b.md", "a\\b.md"] {
            assert!(ensure_flat_key(key).is_err(), "key {key:?} should be rejected");
        }
    }

    #[test]
    fn fixed_and_no_location_pickers() {
        let mut fixed = FixedLocation(PathBuf::from("/tmp/memos"));
        assert_eq!(fixed.pick_location(), Some(PathBuf::from("/tmp/memos")));
        assert_eq!(NoLocation.pick_location(), None);
    }
}
