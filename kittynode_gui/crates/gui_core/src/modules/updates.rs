//! Self-update lifecycle: throttled check, dismissal with expiry, and the
//! download-install-relaunch pipeline.

use crate::modules::bootstrap::HostError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;
use tracing::{error, info};

/// Both the check throttle and the dismissal expiry.
pub const UPDATE_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateInfo {
    pub version: String,
    pub current_version: String,
    pub date: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadEvent {
    Started { content_length: Option<u64> },
    Progress { chunk_length: u64 },
    Finished,
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("update check failed: {0}")]
    Check(String),
    #[error("update install failed: {0}")]
    Install(String),
}

/// The update-artifact distribution service.
#[async_trait]
pub trait UpdateChannel: Send + Sync {
    async fn check(&self) -> Result<Option<UpdateInfo>, UpdateError>;

    async fn download_and_install(
        &self,
        update: &UpdateInfo,
        on_event: &mut (dyn FnMut(DownloadEvent) + Send),
    ) -> Result<(), UpdateError>;
}

/// Process-level capabilities of the host.
#[async_trait]
pub trait AppHost: Send + Sync {
    /// Restarts the application. Hosts normally do not return from this.
    async fn relaunch(&self) -> Result<(), HostError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateState {
    NotChecked,
    UpToDate,
    Available,
    Dismissed,
    Installing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// No pending update, or an install is already running.
    Skipped,
    Installed,
    Failed,
}

#[derive(Default)]
struct UpdateSnapshot {
    current: Option<UpdateInfo>,
    last_checked: Option<Instant>,
    dismissed_at: Option<Instant>,
    processing: bool,
}

pub struct UpdateManager {
    channel: Arc<dyn UpdateChannel>,
    host: Arc<dyn AppHost>,
    window: Duration,
    state: Mutex<UpdateSnapshot>,
    check_flight: AsyncMutex<()>,
}

struct ProcessingGuard<'a>(&'a UpdateManager);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.state().processing = false;
    }
}

impl UpdateManager {
    pub fn new(channel: Arc<dyn UpdateChannel>, host: Arc<dyn AppHost>) -> Self {
        Self::with_window(channel, host, UPDATE_WINDOW)
    }

    pub fn with_window(
        channel: Arc<dyn UpdateChannel>,
        host: Arc<dyn AppHost>,
        window: Duration,
    ) -> Self {
        Self {
            channel,
            host,
            window,
            state: Mutex::new(UpdateSnapshot::default()),
            check_flight: AsyncMutex::new(()),
        }
    }

    /// Returns the cached descriptor, querying the channel first if the last
    /// successful check is older than the window.
    pub async fn get_update(&self) -> Option<UpdateInfo> {
        let _flight = self.check_flight.lock().await;
        let now = Instant::now();
        let due = match self.state().last_checked {
            None => true,
            Some(at) => now.saturating_duration_since(at) > self.window,
        };
        if !due {
            return self.current_update();
        }

        match self.channel.check().await {
            Ok(update) => {
                let mut state = self.state();
                state.current = update;
                state.last_checked = Some(now);
                info!(
                    available = ?state.current.as_ref().map(|u| u.version.as_str()),
                    "Successfully checked for update."
                );
                state.current.clone()
            }
            Err(e) => {
                error!("Failed to check for update: {e}.");
                self.current_update()
            }
        }
    }

    pub fn current_update(&self) -> Option<UpdateInfo> {
        self.state().current.clone()
    }

    pub fn has_update(&self) -> bool {
        self.state().current.is_some()
    }

    pub fn last_checked(&self) -> Option<Instant> {
        self.state().last_checked
    }

    pub fn dismiss(&self) {
        self.state().dismissed_at = Some(Instant::now());
        info!("update prompt dismissed");
    }

    /// True while inside the window that follows the most recent dismissal.
    pub fn is_dismissed(&self) -> bool {
        match self.state().dismissed_at {
            None => false,
            Some(at) => Instant::now() < at + self.window,
        }
    }

    pub fn is_processing(&self) -> bool {
        self.state().processing
    }

    pub fn state_kind(&self) -> UpdateState {
        let dismissed = self.is_dismissed();
        let state = self.state();
        if state.processing {
            UpdateState::Installing
        } else if state.last_checked.is_none() {
            UpdateState::NotChecked
        } else if state.current.is_none() {
            UpdateState::UpToDate
        } else if dismissed {
            UpdateState::Dismissed
        } else {
            UpdateState::Available
        }
    }

    /// Downloads and installs the pending update, then relaunches. Failures are
    /// logged and leave the update re-installable; nothing is retried.
    pub async fn install_update(&self) -> InstallOutcome {
        let update = {
            let mut state = self.state();
            let Some(update) = state.current.clone() else {
                return InstallOutcome::Skipped;
            };
            if state.processing {
                return InstallOutcome::Skipped;
            }
            state.processing = true;
            update
        };
        let _processing = ProcessingGuard(self);

        let mut downloaded: u64 = 0;
        let mut content_length: Option<u64> = None;
        let mut on_event = |event: DownloadEvent| match event {
            DownloadEvent::Started { content_length: len } => {
                content_length = len;
                info!("Started downloading {} bytes.", len.unwrap_or_default());
            }
            DownloadEvent::Progress { chunk_length } => {
                downloaded += chunk_length;
                info!(
                    "Downloaded {downloaded} from {}.",
                    content_length.unwrap_or_default()
                );
            }
            DownloadEvent::Finished => info!("Download finished."),
        };

        if let Err(e) = self
            .channel
            .download_and_install(&update, &mut on_event)
            .await
        {
            error!("Failed to update Kittynode: {e}.");
            return InstallOutcome::Failed;
        }
        info!(version = %update.version, "Update installed.");

        if let Err(e) = self.host.relaunch().await {
            error!("Failed to relaunch after update: {e}.");
            return InstallOutcome::Failed;
        }
        InstallOutcome::Installed
    }

    /// Forgets the cached descriptor, check time and dismissal.
    pub fn clear(&self) {
        let mut state = self.state();
        state.current = None;
        state.last_checked = None;
        state.dismissed_at = None;
    }

    fn state(&self) -> MutexGuard<'_, UpdateSnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
