use crate::modules::health::DEFAULT_POLL_INTERVAL;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_LOCAL_URL: &str = "http://127.0.0.1:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key}={value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuiConfig {
    pub local_url: String,
    pub server_url: Option<String>,
    pub remote: bool,
    pub docker_poll_interval: Duration,
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self {
            local_url: DEFAULT_LOCAL_URL.to_string(),
            server_url: None,
            remote: false,
            docker_poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl GuiConfig {
    /// Reads `KITTYNODE_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            var(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = GuiConfig::default();

        if let Some(url) = get("KITTYNODE_LOCAL_URL") {
            config.local_url = parse_url("KITTYNODE_LOCAL_URL", url)?;
        }
        if let Some(url) = get("KITTYNODE_SERVER_URL") {
            config.server_url = Some(parse_url("KITTYNODE_SERVER_URL", url)?);
        }
        if let Some(flag) = get("KITTYNODE_REMOTE") {
            config.remote = match flag.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "KITTYNODE_REMOTE",
                        value: flag,
                        reason: "expected a boolean",
                    })
                }
            };
        }
        if let Some(ms) = get("KITTYNODE_DOCKER_POLL_MS") {
            config.docker_poll_interval = match ms.parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "KITTYNODE_DOCKER_POLL_MS",
                        value: ms,
                        reason: "expected a positive number of milliseconds",
                    })
                }
            };
        }

        Ok(config)
    }
}

fn parse_url(key: &'static str, value: String) -> Result<String, ConfigError> {
    match url::Url::parse(&value) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => {
            Ok(value.trim_end_matches('/').to_string())
        }
        _ => Err(ConfigError::Invalid {
            key,
            value,
            reason: "expected an http(s) url",
        }),
    }
}
