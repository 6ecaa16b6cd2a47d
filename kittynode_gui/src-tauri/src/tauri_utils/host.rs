use async_trait::async_trait;
use gui_core::bootstrap::{HostError, WindowHost};
use gui_core::updates::AppHost;
use tauri::{AppHandle, Manager};
use tracing::info;

const MAIN_WINDOW: &str = "main";

pub struct TauriHost {
    app: AppHandle,
}

impl TauriHost {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

#[async_trait]
impl WindowHost for TauriHost {
    async fn show_window(&self) -> Result<(), HostError> {
        let window = self
            .app
            .get_webview_window(MAIN_WINDOW)
            .ok_or_else(|| HostError(format!("window {MAIN_WINDOW:?} not found")))?;
        window.show().map_err(|e| HostError(e.to_string()))?;
        let _ = window.set_focus();
        Ok(())
    }
}

#[async_trait]
impl AppHost for TauriHost {
    async fn relaunch(&self) -> Result<(), HostError> {
        info!("relaunching Kittynode");
        self.app.restart()
    }
}
