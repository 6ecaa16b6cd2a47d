mod modules;

pub use modules::{
    bootstrap, config, endpoint, format, health, http_backend, keyed_lock, packages, protocol,
    rpc, selection, system_info, updates,
};
