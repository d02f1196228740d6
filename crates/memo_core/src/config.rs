//! Store configuration and backend wiring.
//!
//! # Responsibility
//! - Describe which medium, location and legacy file a session uses.
//! - Read that description from `MEMO_*` environment variables.
//! - Build the boxed backend and repository from it.
//!
//! # Invariants
//! - Without a configured location the backend starts not ready and defers to
//!   the supplied `LocationPicker`.
//! - For the SQLite medium a location is a directory; the database file lives
//!   inside it as `memos.sqlite3`.

use crate::repo::memo_repo::StoreMemoRepository;
use crate::service::flush::DEFAULT_QUIET_PERIOD;
use crate::store::{
    BoxedPicker, DirectoryBackend, LegacyFlatFile, LocationPicker, SqliteBlobBackend,
    StoreBackend, StoreResult,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_BACKEND: &str = "MEMO_BACKEND";
pub const ENV_DIR: &str = "MEMO_DIR";
pub const ENV_LEGACY_FILE: &str = "MEMO_LEGACY_FILE";
pub const ENV_FLUSH_QUIET_MS: &str = "MEMO_FLUSH_QUIET_MS";

/// Database file name used by the SQLite medium inside a location.
pub const SQLITE_FILE_NAME: &str = "memos.sqlite3";

/// Boxed backend as produced by [`build_backend`].
pub type DynBackend = Box<dyn StoreBackend + Send>;

/// Repository over the configured backend.
pub type ConfiguredRepository = StoreMemoRepository<DynBackend>;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Backend name is not one of `directory` / `sqlite`.
    UnknownBackend(String),
    /// Variable holds something that is not a valid value.
    InvalidValue { name: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownBackend(value) => {
                write!(f, "unknown backend `{value}`; expected directory|sqlite")
            }
            Self::InvalidValue { name, value } => write!(f, "invalid value for {name}: `{value}`"),
        }
    }
}

impl Error for ConfigError {}

/// Storage medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// One `.md` file per memo.
    #[default]
    Directory,
    /// Key/value rows in one SQLite file.
    Sqlite,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Sqlite => "sqlite",
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "directory" | "dir" | "files" => Ok(Self::Directory),
            "sqlite" | "blob" | "db" => Ok(Self::Sqlite),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Everything needed to open a memo session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: BackendKind,
    /// Preselected location; `None` means ask the picker.
    pub location: Option<PathBuf>,
    /// Legacy flat list to import from.
    pub legacy_path: Option<PathBuf>,
    pub flush_quiet_period: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Directory,
            location: None,
            legacy_path: None,
            flush_quiet_period: DEFAULT_QUIET_PERIOD,
        }
    }
}

impl StoreConfig {
    /// Reads `MEMO_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(value) = read(ENV_BACKEND) {
            config.backend = value.parse()?;
        }
        config.location = read(ENV_DIR).map(PathBuf::from);
        config.legacy_path = read(ENV_LEGACY_FILE).map(PathBuf::from);
        if let Some(value) = read(ENV_FLUSH_QUIET_MS) {
            let millis = value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    name: ENV_FLUSH_QUIET_MS,
                    value,
                })?;
            config.flush_quiet_period = Duration::from_millis(millis);
        }
        Ok(config)
    }
}

/// Maps a picked directory to the database file inside it.
struct DatabaseFilePicker(BoxedPicker);

impl LocationPicker for DatabaseFilePicker {
    fn pick_location(&mut self) -> Option<PathBuf> {
        self.0.pick_location().map(|dir| dir.join(SQLITE_FILE_NAME))
    }
}

/// Builds the configured medium, bound to `config.location` when present.
pub fn build_backend(config: &StoreConfig, picker: BoxedPicker) -> StoreResult<DynBackend> {
    let backend: DynBackend = match (config.backend, config.location.as_ref()) {
        (BackendKind::Directory, Some(dir)) => Box::new(DirectoryBackend::with_location(dir)?),
        (BackendKind::Directory, None) => Box::new(DirectoryBackend::new(picker)),
        (BackendKind::Sqlite, Some(dir)) => {
            Box::new(SqliteBlobBackend::open(dir.join(SQLITE_FILE_NAME))?)
        }
        (BackendKind::Sqlite, None) => {
            Box::new(SqliteBlobBackend::new(Box::new(DatabaseFilePicker(picker))))
        }
    };
    Ok(backend)
}

/// Builds the repository, attaching the legacy list when configured.
pub fn build_repository(
    config: &StoreConfig,
    picker: BoxedPicker,
) -> StoreResult<ConfiguredRepository> {
    let repo = StoreMemoRepository::new(build_backend(config, picker)?);
    Ok(match config.legacy_path.as_ref() {
        Some(path) => repo.with_legacy(LegacyFlatFile::new(path)),
        None => repo,
    })
}
