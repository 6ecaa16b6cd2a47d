pub mod app_state;
pub mod host;
pub mod settings;
pub mod status_forwarder;
pub mod updater;
