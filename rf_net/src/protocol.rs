//! WebSocket JSON control protocol between the supervisor and remote
//! control clients (the desktop/remote UI), grounded on
//! `websocket/protocol.rs`'s tagged `ClientMessage`/`ServerMessage` pair.

use serde::{Deserialize, Serialize};

/// Commands a control client can issue to the supervisor.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "channel_enable")]
    ChannelEnable { channel_id: String, enabled: bool },

    #[serde(rename = "channel_disable_until")]
    ChannelDisableUntil { channel_id: String, until_unix_s: f64 },

    #[serde(rename = "channel_mute")]
    ChannelMute { channel_id: String, muted: bool },

    #[serde(rename = "channel_solo")]
    ChannelSolo { channel_id: String, solo: bool },

    #[serde(rename = "channel_hold")]
    ChannelHold { channel_id: String, hold: bool },

    #[serde(rename = "channel_force_active")]
    ChannelForceActive { channel_id: String, force_active: bool },

    #[serde(rename = "sync")]
    Sync,
}

/// Events the supervisor publishes to connected control clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "scan_window_start")]
    ScanWindowStart { window_id: String, receiver_id: String },

    #[serde(rename = "scan_window_done")]
    ScanWindowDone { window_id: String },

    #[serde(rename = "channel_status")]
    ChannelStatus {
        channel_id: String,
        status: String,
        rssi_dbfs: f64,
        noise_floor_dbfs: f64,
        volume_dbfs: Option<f64>,
    },

    #[serde(rename = "channel_config")]
    ChannelConfig {
        channel_id: String,
        freq_hz: f64,
        label: String,
        mode: String,
        enabled: bool,
        muted: bool,
        solo: Option<bool>,
        hold: bool,
        force_active: bool,
    },

    #[serde(rename = "scan_window_configs_changed")]
    ScanWindowConfigsChanged,

    #[serde(rename = "error")]
    Error { code: String, message: String },
}

impl ServerMessage {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_message_channel_mute_round_trips() {
        let json = r#"{"type": "channel_mute", "channel_id": "ch-0", "muted": true}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::ChannelMute { channel_id, muted } => {
                assert_eq!(channel_id, "ch-0");
                assert!(muted);
            }
            _ => panic!("expected ChannelMute"),
        }
    }

    #[test]
    fn client_message_channel_solo() {
        let json = r#"{"type": "channel_solo", "channel_id": "ch-1", "solo": false}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::ChannelSolo { channel_id, solo } if channel_id == "ch-1" && !solo
        ));
    }

    #[test]
    fn server_message_channel_status_serializes() {
        let msg = ServerMessage::ChannelStatus {
            channel_id: "ch-0".into(),
            status: "active".into(),
            rssi_dbfs: -40.0,
            noise_floor_dbfs: -80.0,
            volume_dbfs: Some(-12.0),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"channel_status\""));
        assert!(json.contains("\"channel_id\":\"ch-0\""));
    }

    #[test]
    fn server_message_error_helper() {
        let msg = ServerMessage::error("BAD_CHANNEL", "no such channel");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"code\":\"BAD_CHANNEL\""));
    }
}
