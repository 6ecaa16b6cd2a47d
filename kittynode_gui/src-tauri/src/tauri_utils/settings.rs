use serde_json::json;
use tauri_plugin_store::StoreExt;
use thiserror::Error;

const SETTINGS_FILE: &str = "settings.json";
const SERVER_URL_KEY: &str = "server_url";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings store error: {0}")]
    Store(#[from] tauri_plugin_store::Error),
}

pub fn load_server_url<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
) -> Result<Option<String>, SettingsError> {
    let store = app.store(SETTINGS_FILE)?;
    Ok(store
        .get(SERVER_URL_KEY)
        .and_then(|v| v.as_str().map(str::trim).map(str::to_string))
        .filter(|url| !url.is_empty()))
}

/// `None` removes the saved URL.
pub fn save_server_url<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
    server_url: Option<&str>,
) -> Result<(), SettingsError> {
    let store = app.store(SETTINGS_FILE)?;
    match server_url {
        Some(url) => store.set(SERVER_URL_KEY, json!(url)),
        None => {
            store.delete(SERVER_URL_KEY);
        }
    }
    store.save()?;
    Ok(())
}
