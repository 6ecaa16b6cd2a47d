use crate::modules::endpoint::EndpointSelector;
use crate::modules::protocol::{Command, EndpointParams, SystemInfo};
use crate::modules::rpc::{invoke_validated, Backend};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info};

/// Cached hardware description of the backend host.
pub struct SystemInfoStore {
    backend: Arc<dyn Backend>,
    endpoint: Arc<EndpointSelector>,
    info: Mutex<Option<SystemInfo>>,
}

impl SystemInfoStore {
    pub fn new(backend: Arc<dyn Backend>, endpoint: Arc<EndpointSelector>) -> Self {
        Self {
            backend,
            endpoint,
            info: Mutex::new(None),
        }
    }

    pub fn get(&self) -> Option<SystemInfo> {
        self.info
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Refreshes the cache. On failure the previous value is kept.
    pub async fn fetch(&self) -> Option<SystemInfo> {
        let params = EndpointParams {
            endpoint: self.endpoint.current(),
        };
        match invoke_validated::<SystemInfo, _>(self.backend.as_ref(), Command::SystemInfo, &params)
            .await
        {
            Ok(info) => {
                info!("Successfully fetched system info.");
                *self.info.lock().unwrap_or_else(PoisonError::into_inner) = Some(info.clone());
                Some(info)
            }
            Err(e) => {
                error!("Failed to fetch system info: {e}.");
                self.get()
            }
        }
    }

    pub fn clear(&self) {
        *self.info.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
