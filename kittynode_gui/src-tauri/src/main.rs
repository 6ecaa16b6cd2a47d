#[cfg(feature = "desktop")]
mod commands;
#[cfg(feature = "desktop")]
mod tauri_utils;

#[cfg(feature = "desktop")]
fn main() {
    use crate::tauri_utils::app_state::AppState;
    use crate::tauri_utils::status_forwarder;
    use gui_core::config::GuiConfig;
    use tauri::Manager;
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app, _argv, _cwd| {
            let _ = app.get_webview_window("main").map(|w| w.set_focus());
        }))
        .plugin(tauri_plugin_store::Builder::default().build())
        .plugin(tauri_plugin_updater::Builder::new().build())
        .plugin(tauri_plugin_process::init())
        .setup(|app| {
            let config = GuiConfig::from_env()?;
            let handle = app.handle().clone();
            let state = AppState::build(&handle, config)?;
            let status = state.health.subscribe();
            app.manage(state);

            tauri::async_runtime::spawn(async move {
                status_forwarder::run(status, handle).await;
            });

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::initialize,
            commands::uninitialize,
            commands::show_window,
            commands::get_packages,
            commands::get_installed_packages,
            commands::is_installed,
            commands::install_package,
            commands::delete_package,
            commands::get_package_config,
            commands::update_package_config,
            commands::docker_status,
            commands::start_docker_polling,
            commands::stop_docker_polling,
            commands::get_update,
            commands::dismiss_update,
            commands::update_status,
            commands::install_update,
            commands::system_info,
            commands::set_server_url,
            commands::set_remote_access,
            commands::select_package
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

#[cfg(not(feature = "desktop"))]
fn main() {
    eprintln!("The Kittynode desktop host is built with `--features desktop`; use kittynode-gui-cli for headless use.");
}
