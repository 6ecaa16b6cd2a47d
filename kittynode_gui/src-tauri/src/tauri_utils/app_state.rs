use crate::tauri_utils::host::TauriHost;
use crate::tauri_utils::settings;
use crate::tauri_utils::updater::TauriUpdateChannel;
use gui_core::bootstrap::Bootstrap;
use gui_core::config::GuiConfig;
use gui_core::endpoint::EndpointSelector;
use gui_core::health::{HealthPoller, Platform};
use gui_core::http_backend::HttpBackend;
use gui_core::packages::PackageManager;
use gui_core::rpc::Backend;
use gui_core::selection::SelectedPackage;
use gui_core::system_info::SystemInfoStore;
use gui_core::updates::UpdateManager;
use std::sync::Arc;
use std::time::Duration;
use tauri::AppHandle;

/// One instance of every manager for the lifetime of the app.
pub struct AppState {
    pub bootstrap: Arc<Bootstrap>,
    pub packages: Arc<PackageManager>,
    pub health: Arc<HealthPoller>,
    pub updates: Arc<UpdateManager>,
    pub endpoint: Arc<EndpointSelector>,
    pub system_info: Arc<SystemInfoStore>,
    pub selection: Arc<SelectedPackage>,
    pub poll_interval: Duration,
}

impl AppState {
    pub fn build(
        app: &AppHandle,
        config: GuiConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        // A URL saved from the settings page wins over the environment.
        let server_url = settings::load_server_url(app)?.or(config.server_url);
        let endpoint = Arc::new(EndpointSelector::new(server_url));
        if config.remote && endpoint.server_url().is_some() {
            endpoint.enable_remote_access();
        }

        let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(config.local_url)?);
        let host = Arc::new(TauriHost::new(app.clone()));
        let channel = Arc::new(TauriUpdateChannel::new(app.clone()));

        Ok(Self {
            bootstrap: Arc::new(Bootstrap::new(
                backend.clone(),
                endpoint.clone(),
                host.clone(),
            )),
            packages: Arc::new(PackageManager::new(backend.clone(), endpoint.clone())),
            health: Arc::new(HealthPoller::new(backend.clone(), Platform::current())),
            updates: Arc::new(UpdateManager::new(channel, host)),
            system_info: Arc::new(SystemInfoStore::new(backend, endpoint.clone())),
            selection: Arc::new(SelectedPackage::new()),
            endpoint,
            poll_interval: config.docker_poll_interval,
        })
    }

    /// Forgets everything fetched from the current backend.
    pub fn reset_backend_data(&self) {
        self.packages.clear();
        self.system_info.clear();
        self.selection.clear();
    }
}
