use crate::tauri_utils::app_state::AppState;
use crate::tauri_utils::settings;
use gui_core::endpoint::normalize_server_url;
use gui_core::health::DockerStatus;
use gui_core::protocol::{Package, PackageConfig, SystemInfo};
use gui_core::updates::{InstallOutcome, UpdateInfo, UpdateState};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tauri::{AppHandle, State};
use tracing::info;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatus {
    pub state: UpdateState,
    pub update: Option<UpdateInfo>,
    pub dismissed: bool,
    pub processing: bool,
}

#[tauri::command]
pub async fn initialize(state: State<'_, AppState>) -> Result<(), String> {
    state
        .bootstrap
        .initialize()
        .await
        .map(|_| ())
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn uninitialize(state: State<'_, AppState>) {
    state.bootstrap.uninitialize();
    state.reset_backend_data();
}

#[tauri::command]
pub async fn show_window(state: State<'_, AppState>) -> Result<(), String> {
    let ready = state
        .bootstrap
        .ready()
        .ok_or_else(|| "backend not initialized".to_string())?;
    state
        .bootstrap
        .show(&ready)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_packages(
    state: State<'_, AppState>,
) -> Result<HashMap<String, Package>, String> {
    state
        .packages
        .load_catalog()
        .await
        .map_err(|e| e.to_string())?;
    Ok(state.packages.catalog())
}

#[tauri::command]
pub async fn get_installed_packages(state: State<'_, AppState>) -> Result<Vec<Package>, String> {
    state
        .packages
        .load_installed()
        .await
        .map_err(|e| e.to_string())?;
    Ok(state.packages.installed())
}

#[tauri::command]
pub fn is_installed(state: State<'_, AppState>, name: Option<String>) -> bool {
    state.packages.is_installed(name.as_deref())
}

#[tauri::command]
pub async fn install_package(state: State<'_, AppState>, name: String) -> Result<(), String> {
    state
        .packages
        .install(&name)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn delete_package(
    state: State<'_, AppState>,
    name: String,
    include_images: bool,
) -> Result<(), String> {
    state
        .packages
        .delete(&name, include_images)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_package_config(
    state: State<'_, AppState>,
    name: String,
) -> Result<PackageConfig, String> {
    state
        .packages
        .get_config(&name)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn update_package_config(
    state: State<'_, AppState>,
    name: String,
    config: PackageConfig,
) -> Result<(), String> {
    state
        .packages
        .update_config(&name, config)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn docker_status(state: State<'_, AppState>) -> DockerStatus {
    state.health.status()
}

/// Async so the poller is spawned on the runtime.
#[tauri::command]
pub async fn start_docker_polling(
    state: State<'_, AppState>,
    interval_ms: Option<u64>,
) -> Result<(), String> {
    let interval = interval_ms
        .map(Duration::from_millis)
        .unwrap_or(state.poll_interval);
    state.health.start_polling(interval);
    Ok(())
}

#[tauri::command]
pub fn stop_docker_polling(state: State<'_, AppState>) {
    state.health.stop_polling();
}

#[tauri::command]
pub async fn get_update(state: State<'_, AppState>) -> Result<Option<UpdateInfo>, String> {
    Ok(state.updates.get_update().await)
}

#[tauri::command]
pub fn dismiss_update(state: State<'_, AppState>) {
    state.updates.dismiss();
}

#[tauri::command]
pub fn update_status(state: State<'_, AppState>) -> UpdateStatus {
    UpdateStatus {
        state: state.updates.state_kind(),
        update: state.updates.current_update(),
        dismissed: state.updates.is_dismissed(),
        processing: state.updates.is_processing(),
    }
}

#[tauri::command]
pub async fn install_update(state: State<'_, AppState>) -> Result<(), String> {
    match state.updates.install_update().await {
        InstallOutcome::Installed | InstallOutcome::Skipped => Ok(()),
        InstallOutcome::Failed => Err("failed to install update".to_string()),
    }
}

#[tauri::command]
pub async fn system_info(state: State<'_, AppState>) -> Result<Option<SystemInfo>, String> {
    Ok(state.system_info.fetch().await)
}

#[tauri::command]
pub fn set_server_url(
    app: AppHandle,
    state: State<'_, AppState>,
    server_url: Option<String>,
) -> Result<(), String> {
    // Persist first: a failed save leaves the in-memory endpoint untouched.
    let server_url = normalize_server_url(server_url);
    settings::save_server_url(&app, server_url.as_deref()).map_err(|e| e.to_string())?;
    if state.endpoint.replace_server_url(server_url) {
        state.reset_backend_data();
    }
    Ok(())
}

#[tauri::command]
pub fn set_remote_access(state: State<'_, AppState>, enabled: bool) -> Result<(), String> {
    if enabled == state.endpoint.remote_access() {
        return Ok(());
    }
    if enabled {
        if state.endpoint.server_url().is_none() {
            return Err("set a server url before enabling remote access".to_string());
        }
        state.endpoint.enable_remote_access();
    } else {
        state.endpoint.disable_remote_access();
    }
    state.reset_backend_data();
    info!(enabled, "remote access toggled");
    Ok(())
}

/// Selects a catalog entry by name; `None` or an unknown name clears the selection.
#[tauri::command]
pub fn select_package(state: State<'_, AppState>, name: Option<String>) -> Option<Package> {
    let package = name.and_then(|n| state.packages.catalog_entry(&n));
    state.selection.set(package.clone());
    package
}
