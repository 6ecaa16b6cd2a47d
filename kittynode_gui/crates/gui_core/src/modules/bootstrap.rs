//! Orders "backend initialized" before "window visible".
//!
//! [`Bootstrap::show`] only accepts a [`BackendReady`] token, and the only way to
//! obtain one is a successful [`Bootstrap::initialize`]. Showing the window before
//! the backend is up is therefore not expressible.

use crate::modules::endpoint::EndpointSelector;
use crate::modules::protocol::{Command, EndpointParams};
use crate::modules::rpc::{invoke_unit, Backend, RpcError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

#[derive(Debug, Error)]
#[error("host error: {0}")]
pub struct HostError(pub String);

/// Window-visibility capability of the rendering host.
#[async_trait]
pub trait WindowHost: Send + Sync {
    async fn show_window(&self) -> Result<(), HostError>;
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("backend session was reset; initialize again")]
    StaleSession,
}

/// Proof that the backend finished initializing in a given session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendReady {
    session: u64,
}

#[derive(Default)]
struct Session {
    id: u64,
    initialized: bool,
}

pub struct Bootstrap {
    backend: Arc<dyn Backend>,
    endpoint: Arc<EndpointSelector>,
    window: Arc<dyn WindowHost>,
    session: Mutex<Session>,
    init_lock: AsyncMutex<()>,
    shown: AsyncMutex<bool>,
}

impl Bootstrap {
    pub fn new(
        backend: Arc<dyn Backend>,
        endpoint: Arc<EndpointSelector>,
        window: Arc<dyn WindowHost>,
    ) -> Self {
        Self {
            backend,
            endpoint,
            window,
            session: Mutex::new(Session::default()),
            init_lock: AsyncMutex::new(()),
            shown: AsyncMutex::new(false),
        }
    }

    pub fn initialized(&self) -> bool {
        self.session().initialized
    }

    pub async fn shown(&self) -> bool {
        *self.shown.lock().await
    }

    /// Runs the backend init RPC once per session. Later calls return the same token.
    /// An `uninitialize()` that lands while the RPC is in flight wins: the call
    /// then fails with [`BootstrapError::StaleSession`] and nothing is marked ready.
    pub async fn initialize(&self) -> Result<BackendReady, BootstrapError> {
        let _init = self.init_lock.lock().await;
        let session = {
            let state = self.session();
            if state.initialized {
                return Ok(BackendReady { session: state.id });
            }
            state.id
        };

        let params = EndpointParams {
            endpoint: self.endpoint.current(),
        };
        invoke_unit(self.backend.as_ref(), Command::Init, &params).await?;

        let mut state = self.session();
        if state.id != session {
            warn!("backend session reset during initialization");
            return Err(BootstrapError::StaleSession);
        }
        state.initialized = true;
        info!("backend initialized");
        Ok(BackendReady { session })
    }

    /// The token for the current session, if the backend is initialized.
    pub fn ready(&self) -> Option<BackendReady> {
        let state = self.session();
        state.initialized.then_some(BackendReady { session: state.id })
    }

    pub fn uninitialize(&self) {
        let mut state = self.session();
        state.id += 1;
        state.initialized = false;
        info!("backend uninitialized");
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Requests window visibility once. Yields to the scheduler first so the host
    /// has painted before the window appears.
    pub async fn show(&self, ready: &BackendReady) -> Result<(), BootstrapError> {
        if self.ready() != Some(*ready) {
            return Err(BootstrapError::StaleSession);
        }

        let mut shown = self.shown.lock().await;
        if *shown {
            return Ok(());
        }

        tokio::task::yield_now().await;
        self.window.show_window().await?;
        *shown = true;
        info!("window shown");
        Ok(())
    }
}
