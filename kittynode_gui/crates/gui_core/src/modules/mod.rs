pub mod bootstrap;
pub mod config;
pub mod endpoint;
pub mod format;
pub mod health;
pub mod http_backend;
pub mod keyed_lock;
pub mod packages;
pub mod protocol;
pub mod rpc;
pub mod selection;
pub mod system_info;
pub mod updates;
