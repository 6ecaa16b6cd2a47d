use crate::modules::protocol::Command;
use crate::modules::rpc::{invoke_validated, Backend};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DockerStatus {
    Unknown,
    Running,
    NotRunning,
}

impl DockerStatus {
    pub fn is_running(&self) -> Option<bool> {
        match self {
            DockerStatus::Unknown => None,
            DockerStatus::Running => Some(true),
            DockerStatus::NotRunning => Some(false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Desktop,
    /// No local container runtime to query.
    Mobile,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(any(target_os = "ios", target_os = "android")) {
            Platform::Mobile
        } else {
            Platform::Desktop
        }
    }
}

struct Sampler {
    backend: Arc<dyn Backend>,
    platform: Platform,
    status: watch::Sender<DockerStatus>,
    // Bumped on every start/stop; a poll tick only publishes while its epoch is current.
    // Both the bump and the check run inside the watch channel's write lock.
    epoch: AtomicU64,
}

impl Sampler {
    async fn query(&self) -> DockerStatus {
        if self.platform == Platform::Mobile {
            return DockerStatus::Running;
        }
        match invoke_validated::<bool, _>(self.backend.as_ref(), Command::IsDockerRunning, &())
            .await
        {
            Ok(true) => DockerStatus::Running,
            Ok(false) => DockerStatus::NotRunning,
            Err(e) => {
                error!("Failed to check Docker status: {e}");
                DockerStatus::NotRunning
            }
        }
    }

    fn publish(&self, status: DockerStatus) {
        let previous = self.status.send_replace(status);
        if previous != status {
            info!(?status, "docker status changed");
        }
    }

    /// Retires the current poller and returns the epoch for the next one.
    fn next_epoch(&self) -> u64 {
        let mut next = 0;
        self.status.send_if_modified(|_| {
            next = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
            false
        });
        next
    }

    /// Publishes on behalf of the poller started at `epoch`. Returns false once
    /// that poller has been retired, in which case nothing is written.
    fn publish_for(&self, epoch: u64, status: DockerStatus) -> bool {
        let mut current = true;
        let changed = self.status.send_if_modified(|value| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                current = false;
                return false;
            }
            let changed = *value != status;
            *value = status;
            changed
        });
        if changed {
            info!(?status, "docker status changed");
        }
        current
    }
}

/// Tri-state container-runtime health with at most one polling task.
pub struct HealthPoller {
    sampler: Arc<Sampler>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl HealthPoller {
    pub fn new(backend: Arc<dyn Backend>, platform: Platform) -> Self {
        let (status, _) = watch::channel(DockerStatus::Unknown);
        Self {
            sampler: Arc::new(Sampler {
                backend,
                platform,
                status,
                epoch: AtomicU64::new(0),
            }),
            task: Mutex::new(None),
        }
    }

    pub fn status(&self) -> DockerStatus {
        *self.sampler.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<DockerStatus> {
        self.sampler.status.subscribe()
    }

    /// Never fails; an unreachable backend reads as "not running".
    pub async fn check(&self) -> DockerStatus {
        let status = self.sampler.query().await;
        self.sampler.publish(status);
        status
    }

    /// Checks immediately, then every `interval`. Replaces any running poller.
    /// Must be called from within a tokio runtime.
    pub fn start_polling(&self, interval: Duration) {
        let period = interval.max(Duration::from_millis(1));
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = task.take() {
            previous.abort();
        }
        let epoch = self.sampler.next_epoch();
        let sampler = Arc::clone(&self.sampler);

        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let status = sampler.query().await;
                if !sampler.publish_for(epoch, status) {
                    return;
                }
            }
        }));
        debug!(interval_ms = period.as_millis() as u64, "docker polling started");
    }

    pub fn stop_polling(&self) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = task.take() {
            self.sampler.next_epoch();
            handle.abort();
            debug!("docker polling stopped");
        }
    }

    pub fn is_polling(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for HealthPoller {
    fn drop(&mut self) {
        self.stop_polling();
    }
}
