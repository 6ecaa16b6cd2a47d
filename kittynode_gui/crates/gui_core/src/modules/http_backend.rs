use crate::modules::protocol::Command;
use crate::modules::rpc::{Backend, RpcError};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq)]
struct Route {
    method: Method,
    url: Url,
    body: Option<Value>,
}

/// Speaks to a Kittynode web server. Requests carrying an `endpoint` go there,
/// everything else goes to the local server.
pub struct HttpBackend {
    client: reqwest::Client,
    local_url: String,
}

impl HttpBackend {
    pub fn new(local_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            local_url: local_url.into(),
        })
    }

    fn route(&self, command: Command, params: &Value) -> Result<Route, RpcError> {
        let base = params
            .get("endpoint")
            .and_then(Value::as_str)
            .filter(|e| !e.is_empty())
            .unwrap_or(&self.local_url);
        let name = || {
            params
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| RpcError::Backend {
                    command,
                    message: "missing package name".to_string(),
                })
        };

        let (method, segments, body): (Method, Vec<&str>, Option<Value>) = match command {
            Command::Init => (Method::POST, vec!["init_kittynode"], None),
            Command::IsDockerRunning => (Method::GET, vec!["is_docker_running"], None),
            Command::GetPackages => (Method::GET, vec!["get_packages"], None),
            Command::GetInstalledPackages => (Method::GET, vec!["get_installed_packages"], None),
            Command::InstallPackage => (Method::POST, vec!["install_package", name()?], None),
            Command::DeletePackage => (Method::POST, vec!["delete_package", name()?], None),
            Command::GetPackageConfig => (Method::GET, vec!["get_package_config", name()?], None),
            Command::UpdatePackageConfig => (
                Method::POST,
                vec!["update_package_config", name()?],
                params.get("config").cloned(),
            ),
            Command::SystemInfo => (Method::GET, vec!["get_system_info"], None),
        };

        let mut url = Url::parse(base).map_err(|e| RpcError::Transport {
            command,
            message: format!("invalid endpoint {base:?}: {e}"),
        })?;
        url.path_segments_mut()
            .map_err(|_| RpcError::Transport {
                command,
                message: format!("endpoint {base:?} cannot be a base url"),
            })?
            .pop_if_empty()
            .extend(segments);
        if command == Command::DeletePackage {
            let include_images = params
                .get("includeImages")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            url.query_pairs_mut()
                .append_pair("include_images", if include_images { "true" } else { "false" });
        }

        Ok(Route { method, url, body })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn invoke(&self, command: Command, params: Value) -> Result<Value, RpcError> {
        let route = self.route(command, &params)?;
        debug!(%command, url = %route.url, "invoking backend");

        let mut request = self.client.request(route.method, route.url);
        if let Some(body) = route.body {
            request = request.json(&body);
        }
        let res = request.send().await.map_err(|e| RpcError::Transport {
            command,
            message: e.to_string(),
        })?;

        let status = res.status();
        if command == Command::IsDockerRunning && status == StatusCode::SERVICE_UNAVAILABLE {
            return Ok(Value::Bool(false));
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(RpcError::Backend {
                command,
                message: format!("status={status} body={body}"),
            });
        }

        match command {
            Command::IsDockerRunning => Ok(Value::Bool(true)),
            Command::Init
            | Command::InstallPackage
            | Command::DeletePackage
            | Command::UpdatePackageConfig => Ok(Value::Null),
            _ => {
                let body = res.text().await.map_err(|e| RpcError::Transport {
                    command,
                    message: e.to_string(),
                })?;
                decode_body(command, &body)
            }
        }
    }
}

/// A body that arrived but is not JSON is a malformed reply, not a network fault.
fn decode_body(command: Command, body: &str) -> Result<Value, RpcError> {
    serde_json::from_str(body).map_err(|source| RpcError::Shape { command, source })
}
