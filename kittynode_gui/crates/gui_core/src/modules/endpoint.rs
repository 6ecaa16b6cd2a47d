use std::sync::{PoisonError, RwLock};
use tracing::info;

#[derive(Debug, Default, Clone)]
struct EndpointState {
    server_url: Option<String>,
    remote_access: bool,
}

impl EndpointState {
    fn current(&self) -> Option<String> {
        self.server_url.clone().filter(|_| self.remote_access)
    }
}

/// Routes RPC calls to the local backend or to a remote Kittynode server.
#[derive(Debug, Default)]
pub struct EndpointSelector {
    state: RwLock<EndpointState>,
}

impl EndpointSelector {
    pub fn new(server_url: Option<String>) -> Self {
        Self {
            state: RwLock::new(EndpointState {
                server_url: normalize_server_url(server_url),
                remote_access: false,
            }),
        }
    }

    pub fn server_url(&self) -> Option<String> {
        self.read().server_url
    }

    pub fn set_server_url(&self, server_url: Option<String>) {
        let server_url = normalize_server_url(server_url);
        info!(server_url = ?server_url, "server url changed");
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .server_url = server_url;
    }

    /// Replaces the server URL; clearing it also turns remote access off.
    /// Returns whether the endpoint placed into RPC params changed.
    pub fn replace_server_url(&self, server_url: Option<String>) -> bool {
        let server_url = normalize_server_url(server_url);
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let before = state.current();
        state.remote_access &= server_url.is_some();
        state.server_url = server_url;
        let changed = state.current() != before;
        info!(server_url = ?state.server_url, changed, "server url replaced");
        changed
    }

    pub fn remote_access(&self) -> bool {
        self.read().remote_access
    }

    pub fn enable_remote_access(&self) {
        self.set_remote_access(true);
    }

    pub fn disable_remote_access(&self) {
        self.set_remote_access(false);
    }

    /// The endpoint to place into RPC params; `None` targets the local backend.
    pub fn current(&self) -> Option<String> {
        self.read().current()
    }

    fn set_remote_access(&self, enabled: bool) {
        info!(enabled, "remote access toggled");
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remote_access = enabled;
    }

    fn read(&self) -> EndpointState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Trims whitespace and trailing slashes; a blank URL becomes `None`.
pub fn normalize_server_url(url: Option<String>) -> Option<String> {
    url.map(|u| u.trim().trim_end_matches('/').to_string())
        .filter(|u| !u.is_empty())
}
