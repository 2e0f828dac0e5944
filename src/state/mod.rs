//! Shared application state wiring configuration and the storage backend.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::{config::AppConfig, dao::roster_store::RosterStore, error::ServiceError};

/// Cheaply clonable handle to [`AppState`].
pub type SharedState = Arc<AppState>;

/// Central application state storing configuration and database handles.
pub struct AppState {
    config: Arc<AppConfig>,
    roster_store: RwLock<Option<Arc<dyn RosterStore>>>,
    reassign_gate: Mutex<()>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        Arc::new(Self {
            config: Arc::new(config),
            roster_store: RwLock::new(None),
            reassign_gate: Mutex::new(()),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    /// Obtain a handle to the current roster store, if one is installed.
    pub async fn roster_store(&self) -> Option<Arc<dyn RosterStore>> {
        let guard = self.roster_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the roster store or fail with [`ServiceError::Degraded`].
    pub async fn require_roster_store(&self) -> Result<Arc<dyn RosterStore>, ServiceError> {
        self.roster_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new roster store implementation and leave degraded mode.
    pub async fn install_roster_store(&self, store: Arc<dyn RosterStore>) {
        let mut guard = self.roster_store.write().await;
        *guard = Some(store);
    }

    /// Remove the current roster store and enter degraded mode.
    pub async fn clear_roster_store(&self) {
        let mut guard = self.roster_store.write().await;
        guard.take();
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.roster_store.read().await;
        guard.is_none()
    }

    /// Gate serializing decoy reassignment runs.
    ///
    /// The engine assumes single-flight invocation; two concurrent runs would
    /// balance against the same pre-run snapshot and skew the load
    /// distribution. Holding this lock for the duration of a run keeps
    /// concurrent HTTP triggers sequential.
    pub fn reassign_gate(&self) -> &Mutex<()> {
        &self.reassign_gate
    }
}
