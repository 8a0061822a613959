//! # rf_net
//!
//! The supervisor's WebSocket control bridge: a JSON protocol carrying
//! channel commands in and scan-window/channel-status events out.

pub mod error;
pub mod protocol;
pub mod server;

pub use error::{NetError, Result};
pub use protocol::{ClientMessage, ServerMessage};
pub use server::{WsServer, WsServerConfig};
