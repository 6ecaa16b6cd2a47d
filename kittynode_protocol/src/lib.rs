use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Package {
    pub name: String,
    pub description: String,
    pub network_name: String,
    pub containers: Vec<Container>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Container {
    pub name: String,
    pub image: String,
    pub cmd: Vec<String>,
    pub port_bindings: HashMap<String, Vec<PortBinding>>,
    pub volume_bindings: Vec<Binding>,
    pub file_bindings: Vec<Binding>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PortBinding {
    pub host_ip: Option<String>,
    pub host_port: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub source: String,
    pub destination: String,
    pub options: Option<String>,
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {}", self.name, self.description)?;
        for container in &self.containers {
            writeln!(f, "  - {} ({})", container.name, container.image)?;
        }
        Ok(())
    }
}

/// Per-package key/value configuration. Always sent as a full replacement.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageConfig {
    pub values: HashMap<String, String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SystemInfo {
    pub processor: ProcessorInfo,
    pub memory: MemoryInfo,
    pub storage: StorageInfo,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProcessorInfo {
    pub name: String,
    pub cores: u32,
    pub frequency_ghz: f64,
    pub architecture: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MemoryInfo {
    pub total_bytes: u64,
    #[serde(default)]
    pub total_display: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StorageInfo {
    pub disks: Vec<DiskInfo>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DiskInfo {
    pub name: String,
    pub mount_point: String,
    pub total_bytes: u64,
    pub available_bytes: u64,
    #[serde(default)]
    pub total_display: String,
    #[serde(default)]
    pub available_display: String,
    pub disk_type: String,
}

/// Commands understood by the native backend.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Init,
    IsDockerRunning,
    GetPackages,
    GetInstalledPackages,
    InstallPackage,
    DeletePackage,
    GetPackageConfig,
    UpdatePackageConfig,
    SystemInfo,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Init => "init",
            Command::IsDockerRunning => "is_docker_running",
            Command::GetPackages => "get_packages",
            Command::GetInstalledPackages => "get_installed_packages",
            Command::InstallPackage => "install_package",
            Command::DeletePackage => "delete_package",
            Command::GetPackageConfig => "get_package_config",
            Command::UpdatePackageConfig => "update_package_config",
            Command::SystemInfo => "system_info",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointParams {
    pub endpoint: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PackageParams {
    pub name: String,
    pub endpoint: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeletePackageParams {
    pub name: String,
    pub include_images: bool,
    pub endpoint: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UpdatePackageConfigParams {
    pub name: String,
    pub config: PackageConfig,
    pub endpoint: Option<String>,
}
