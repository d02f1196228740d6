//! Shared server state.
//!
//! # Responsibility
//! - Own the single memo session behind a mutex.
//! - Hand locations chosen over HTTP to the backend's picker.
//!
//! # Invariants
//! - Every request and the flush ticker go through `lock_session`.
//! - The session lock is never held across an `.await`.

use log::info;
use memo_core::config::{build_repository, ConfiguredRepository};
use memo_core::{
    ConfigError, LocationPicker, MemoService, MemoServiceError, StoreConfig, StoreError,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

pub type Session = MemoService<ConfiguredRepository>;

/// Startup failures of the server binary.
#[derive(Debug)]
pub enum StartupError {
    Config(ConfigError),
    Store(StoreError),
    Session(MemoServiceError),
    Io(io::Error),
}

impl Display for StartupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "invalid configuration: {err}"),
            Self::Store(err) => write!(f, "failed to open store: {err}"),
            Self::Session(err) => write!(f, "failed to open memo session: {err}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StartupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Session(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<ConfigError> for StartupError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<StoreError> for StartupError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<MemoServiceError> for StartupError {
    fn from(value: MemoServiceError) -> Self {
        Self::Session(value)
    }
}

impl From<io::Error> for StartupError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Location offered by a client, consumed by the next access request.
#[derive(Debug, Clone, Default)]
pub struct PendingLocation(Arc<Mutex<Option<PathBuf>>>);

impl PendingLocation {
    pub fn offer(&self, path: PathBuf) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(path);
    }

    pub fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

impl LocationPicker for PendingLocation {
    fn pick_location(&mut self) -> Option<PathBuf> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

pub struct AppState {
    session: Mutex<Session>,
    pub pending_location: PendingLocation,
    pub start_time: Instant,
}

impl AppState {
    /// Builds the repository from `config` and opens the session.
    pub fn open(config: &StoreConfig) -> Result<Arc<Self>, StartupError> {
        let pending_location = PendingLocation::default();
        let repo = build_repository(config, Box::new(pending_location.clone()))?;
        let mut session = MemoService::with_quiet_period(repo, config.flush_quiet_period);
        let status = session.open()?;
        info!(
            "event=server_session module=server status=ok backend={} session={:?} count={}",
            config.backend,
            status,
            session.memos().len()
        );

        Ok(Arc::new(Self {
            session: Mutex::new(session),
            pending_location,
            start_time: Instant::now(),
        }))
    }

    /// Locks the session, recovering it if a handler panicked while holding it.
    pub fn lock_session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
