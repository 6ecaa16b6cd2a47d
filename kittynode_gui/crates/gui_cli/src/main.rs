use anyhow::{anyhow, Context};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use gui_core::bootstrap::{Bootstrap, HostError, WindowHost};
use gui_core::config::GuiConfig;
use gui_core::endpoint::EndpointSelector;
use gui_core::format::{format_bytes, usage_percentage};
use gui_core::health::{DockerStatus, HealthPoller, Platform};
use gui_core::http_backend::HttpBackend;
use gui_core::packages::PackageManager;
use gui_core::protocol::PackageConfig;
use gui_core::system_info::SystemInfoStore;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kittynode-gui-cli")]
struct Args {
    /// Kittynode server to talk to instead of the local one.
    #[arg(long)]
    server_url: Option<String>,

    /// Route requests to the server URL (also enabled by KITTYNODE_REMOTE).
    #[arg(long, default_value_t = false)]
    remote: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Initialize the backend.
    Init,
    /// List the package catalog.
    Packages,
    /// List installed packages.
    Installed,
    Install {
        name: String,
    },
    Delete {
        name: String,
        #[arg(long, default_value_t = false)]
        include_images: bool,
    },
    #[command(subcommand)]
    Config(ConfigCmd),
    /// Print Docker status; with --watch keep polling until interrupted.
    Status {
        #[arg(long, default_value_t = false)]
        watch: bool,
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,
    },
    SystemInfo,
}

#[derive(Subcommand, Debug)]
enum ConfigCmd {
    Get {
        name: String,
    },
    /// Replace a package's configuration with the given KEY=VALUE pairs.
    Set {
        name: String,
        #[arg(value_name = "KEY=VALUE", required = true)]
        values: Vec<String>,
    },
}

/// Nothing to show in a terminal.
struct Headless;

#[async_trait]
impl WindowHost for Headless {
    async fn show_window(&self) -> Result<(), HostError> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let config = GuiConfig::from_env()?;
    let endpoint = Arc::new(EndpointSelector::new(config.server_url.clone()));
    if args.server_url.is_some() {
        endpoint.set_server_url(args.server_url.clone());
    }
    if args.remote || config.remote {
        if endpoint.server_url().is_none() {
            return Err(anyhow!("remote access needs --server-url or KITTYNODE_SERVER_URL"));
        }
        endpoint.enable_remote_access();
    }
    let backend = Arc::new(
        HttpBackend::new(config.local_url.clone()).context("failed to build http client")?,
    );

    match args.command {
        Cmd::Init => {
            let bootstrap = Bootstrap::new(backend, endpoint, Arc::new(Headless));
            bootstrap.initialize().await?;
            eprintln!("backend initialized");
        }
        Cmd::Packages => {
            let packages = PackageManager::new(backend, endpoint);
            let (catalog, installed) = tokio::join!(packages.load_catalog(), packages.load_installed());
            catalog?;
            installed?;
            let mut catalog: Vec<_> = packages.catalog().into_values().collect();
            catalog.sort_by(|a, b| a.name.cmp(&b.name));
            for package in catalog {
                let marker = if packages.is_installed(Some(&package.name)) {
                    "*"
                } else {
                    " "
                };
                print!("{marker} {package}");
            }
        }
        Cmd::Installed => {
            let packages = PackageManager::new(backend, endpoint);
            packages.load_installed().await?;
            for package in packages.installed() {
                println!("{}", package.name);
            }
        }
        Cmd::Install { name } => {
            let packages = PackageManager::new(backend, endpoint);
            packages.install(&name).await?;
            eprintln!("installed {name}");
        }
        Cmd::Delete {
            name,
            include_images,
        } => {
            let packages = PackageManager::new(backend, endpoint);
            packages.delete(&name, include_images).await?;
            eprintln!("deleted {name}");
        }
        Cmd::Config(ConfigCmd::Get { name }) => {
            let packages = PackageManager::new(backend, endpoint);
            let config = packages.get_config(&name).await?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Cmd::Config(ConfigCmd::Set { name, values }) => {
            let packages = PackageManager::new(backend, endpoint);
            packages.update_config(&name, parse_values(&values)?).await?;
            eprintln!("updated config for {name}");
        }
        Cmd::Status { watch, interval_ms } => {
            let health = HealthPoller::new(backend, Platform::current());
            if !watch {
                println!("{}", status_label(health.check().await));
                return Ok(());
            }
            let interval = interval_ms
                .map(Duration::from_millis)
                .unwrap_or(config.docker_poll_interval);
            let mut rx = health.subscribe();
            health.start_polling(interval);
            loop {
                tokio::select! {
                    changed = rx.changed() => {
                        changed?;
                        println!("{}", status_label(*rx.borrow_and_update()));
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            health.stop_polling();
        }
        Cmd::SystemInfo => {
            let store = SystemInfoStore::new(backend, endpoint);
            let info = store
                .fetch()
                .await
                .ok_or_else(|| anyhow!("system info unavailable"))?;
            let p = &info.processor;
            println!(
                "cpu: {} ({} cores, {:.2} GHz, {})",
                p.name, p.cores, p.frequency_ghz, p.architecture
            );
            println!("memory: {}", format_bytes(info.memory.total_bytes));
            for disk in &info.storage.disks {
                let used = disk.total_bytes.saturating_sub(disk.available_bytes);
                println!(
                    "disk {} on {}: {} of {} used ({}%) [{}]",
                    disk.name,
                    disk.mount_point,
                    format_bytes(used),
                    format_bytes(disk.total_bytes),
                    usage_percentage(used, disk.total_bytes),
                    disk.disk_type
                );
            }
        }
    }

    Ok(())
}

fn status_label(status: DockerStatus) -> &'static str {
    match status {
        DockerStatus::Unknown => "unknown",
        DockerStatus::Running => "running",
        DockerStatus::NotRunning => "not running",
    }
}

fn parse_values(pairs: &[String]) -> anyhow::Result<PackageConfig> {
    let mut config = PackageConfig::default();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got {pair:?}"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(anyhow!("empty key in {pair:?}"));
        }
        config.values.insert(key.to_string(), value.to_string());
    }
    Ok(config)
}
