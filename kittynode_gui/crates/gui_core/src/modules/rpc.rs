use crate::modules::protocol::Command;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("{command} transport error: {message}")]
    Transport { command: Command, message: String },
    #[error("{command} failed: {message}")]
    Backend { command: Command, message: String },
    #[error("{command} returned an unexpected shape: {source}")]
    Shape {
        command: Command,
        #[source]
        source: serde_json::Error,
    },
    #[error("{command} params could not be encoded: {source}")]
    Encode {
        command: Command,
        #[source]
        source: serde_json::Error,
    },
}

impl RpcError {
    pub fn command(&self) -> Command {
        match self {
            RpcError::Transport { command, .. }
            | RpcError::Backend { command, .. }
            | RpcError::Shape { command, .. }
            | RpcError::Encode { command, .. } => *command,
        }
    }
}

/// The single remote-procedure primitive every manager talks through.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn invoke(&self, command: Command, params: Value) -> Result<Value, RpcError>;
}

/// Invokes `command` and checks the result against `T` before handing it out.
pub async fn invoke_validated<T, P>(
    backend: &dyn Backend,
    command: Command,
    params: &P,
) -> Result<T, RpcError>
where
    T: DeserializeOwned,
    P: Serialize + ?Sized,
{
    let params =
        serde_json::to_value(params).map_err(|source| RpcError::Encode { command, source })?;
    let raw = backend.invoke(command, params).await?;
    serde_json::from_value(raw).map_err(|source| RpcError::Shape { command, source })
}

/// Like [`invoke_validated`] for commands whose result carries no data.
pub async fn invoke_unit<P>(backend: &dyn Backend, command: Command, params: &P) -> Result<(), RpcError>
where
    P: Serialize + ?Sized,
{
    let params =
        serde_json::to_value(params).map_err(|source| RpcError::Encode { command, source })?;
    backend.invoke(command, params).await.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Fixed(Value);

    #[async_trait]
    impl Backend for Fixed {
        async fn invoke(&self, _command: Command, _params: Value) -> Result<Value, RpcError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn shape_mismatch_is_an_error() {
        let backend = Fixed(json!("not a bool"));
        let err = invoke_validated::<bool, _>(&backend, Command::IsDockerRunning, &json!(null))
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::Shape { command: Command::IsDockerRunning, .. }));
    }

    #[tokio::test]
    async fn unit_ignores_payload() {
        let backend = Fixed(json!({ "anything": 1 }));
        invoke_unit(&backend, Command::Init, &json!({ "endpoint": null }))
            .await
            .unwrap();
    }
}
