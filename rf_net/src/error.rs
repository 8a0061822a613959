//! Error types for rf_net control-plane operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("failed to bind control socket: {0}")]
    ConnectionFailed(#[source] std::io::Error),

    #[error("malformed control message: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("websocket protocol error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

pub type Result<T> = std::result::Result<T, NetError>;
