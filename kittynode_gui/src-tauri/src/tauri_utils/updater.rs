use async_trait::async_trait;
use gui_core::updates::{DownloadEvent, UpdateChannel, UpdateError, UpdateInfo};
use std::sync::{Mutex, PoisonError};
use tauri::AppHandle;
use tauri_plugin_updater::{Update, UpdaterExt};

/// Update channel backed by the Tauri updater plugin. Keeps the handle from the
/// last successful check so it can be installed later.
pub struct TauriUpdateChannel {
    app: AppHandle,
    pending: Mutex<Option<Update>>,
}

impl TauriUpdateChannel {
    pub fn new(app: AppHandle) -> Self {
        Self {
            app,
            pending: Mutex::new(None),
        }
    }
}

#[async_trait]
impl UpdateChannel for TauriUpdateChannel {
    async fn check(&self) -> Result<Option<UpdateInfo>, UpdateError> {
        let updater = self
            .app
            .updater()
            .map_err(|e| UpdateError::Check(e.to_string()))?;
        let update = updater
            .check()
            .await
            .map_err(|e| UpdateError::Check(e.to_string()))?;

        let info = update.as_ref().map(|u| UpdateInfo {
            version: u.version.clone(),
            current_version: u.current_version.clone(),
            date: u.date.map(|d| d.to_string()),
            body: u.body.clone(),
        });
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = update;
        Ok(info)
    }

    async fn download_and_install(
        &self,
        info: &UpdateInfo,
        on_event: &mut (dyn FnMut(DownloadEvent) + Send),
    ) -> Result<(), UpdateError> {
        let update = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .filter(|u| u.version == info.version)
            .ok_or_else(|| UpdateError::Install(format!("no pending update for {}", info.version)))?;

        let mut started = false;
        update
            .download_and_install(
                |chunk_length, content_length| {
                    if !started {
                        started = true;
                        on_event(DownloadEvent::Started { content_length });
                    }
                    on_event(DownloadEvent::Progress {
                        chunk_length: chunk_length as u64,
                    });
                },
                || {},
            )
            .await
            .map_err(|e| UpdateError::Install(e.to_string()))?;
        on_event(DownloadEvent::Finished);
        Ok(())
    }
}
