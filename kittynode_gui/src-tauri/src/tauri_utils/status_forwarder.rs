use gui_core::health::DockerStatus;
use serde::Serialize;
use tauri::{AppHandle, Emitter};
use tokio::sync::watch;
use tracing::debug;

const DOCKER_STATUS_EVENT: &str = "kittynode://docker-status";

#[derive(Serialize, Clone)]
struct DockerStatusEvent {
    status: DockerStatus,
    running: Option<bool>,
}

/// Pushes every health change to the webview until the poller goes away.
pub async fn run(mut rx: watch::Receiver<DockerStatus>, app: AppHandle) {
    emit_status(&app, *rx.borrow_and_update());
    while rx.changed().await.is_ok() {
        let status = *rx.borrow_and_update();
        emit_status(&app, status);
    }
    debug!("docker status forwarder stopped");
}

fn emit_status(app: &AppHandle, status: DockerStatus) {
    let _ = app.emit(
        DOCKER_STATUS_EVENT,
        DockerStatusEvent {
            status,
            running: status.is_running(),
        },
    );
}
