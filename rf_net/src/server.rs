//! WebSocket control bridge: accepts remote-control connections, relays
//! parsed [`ClientMessage`]s to the supervisor's command queue, and
//! broadcasts [`ServerMessage`] events to every connected client.
//!
//! Grounded on `websocket/server.rs`'s `WsServer`, stripped of the
//! room/session machinery the scanner has no use for — here every
//! connected client sees the same single control stream.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::{net::TcpListener, sync::{broadcast, mpsc}};
use tokio_tungstenite::{accept_async, tungstenite::Message as WsMessage};

use crate::{
    error::{NetError, Result},
    protocol::{ClientMessage, ServerMessage},
};

pub struct WsServerConfig {
    pub bind_addr: SocketAddr,
    pub broadcast_capacity: usize,
}

impl Default for WsServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".parse().unwrap(),
            broadcast_capacity: 1024,
        }
    }
}

/// The control bridge: owns the listener, fans client commands into
/// `command_tx`, and relays everything received on `event_rx` to all
/// connected sockets.
pub struct WsServer {
    config: WsServerConfig,
    command_tx: mpsc::Sender<ClientMessage>,
    event_tx: broadcast::Sender<ServerMessage>,
}

impl WsServer {
    pub fn new(config: WsServerConfig, command_tx: mpsc::Sender<ClientMessage>) -> Self {
        let (event_tx, _) = broadcast::channel(config.broadcast_capacity);
        Self { config, command_tx, event_tx }
    }

    /// A sender the supervisor uses to publish events to every connected
    /// control client.
    pub fn event_sender(&self) -> broadcast::Sender<ServerMessage> {
        self.event_tx.clone()
    }

    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.bind_addr).await.map_err(NetError::ConnectionFailed)?;

        loop {
            let (stream, addr) = match listener.accept().await {
                Ok(pair) => pair,
                Err(_) => continue,
            };
            let command_tx = self.command_tx.clone();
            let event_rx = self.event_tx.subscribe();
            tokio::spawn(handle_connection(stream, addr, command_tx, event_rx));
        }
    }
}

async fn handle_connection(stream: tokio::net::TcpStream, _addr: SocketAddr, command_tx: mpsc::Sender<ClientMessage>, mut event_rx: broadcast::Receiver<ServerMessage>) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(_) => return,
    };
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(WsMessage::Text(text))) => {
                        if let Ok(client_msg) = serde_json::from_str::<ClientMessage>(&text) {
                            if command_tx.send(client_msg).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(server_msg) => {
                        let json = serde_json::to_string(&server_msg).unwrap();
                        if write.send(WsMessage::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_binds_8080() {
        let config = WsServerConfig::default();
        assert_eq!(config.bind_addr.port(), 8080);
    }
}
