//! YAML configuration schema and loader.
//!
//! Raw `*_File` structs mirror the on-disk YAML layout exactly (optional
//! fields, defaults merged at parse time); `build()` converts them into the
//! domain objects the rest of the scanner consumes, minting stable channel
//! ids along the way. This two-phase shape — a `#[derive(Deserialize)]`
//! wire struct plus a fallible `build` step that resolves ids and
//! validates cross-references — keeps raw parsing and validation cleanly
//! separated.

use std::{fs, path::Path};

use rf_dsp::ChannelMode;
use serde::Deserialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },

    #[error("malformed YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unknown demodulation mode: {0}")]
    UnknownMode(String),

    #[error("unknown receiver type: {0}")]
    UnknownReceiverType(String),

    #[error("SOAPY receiver entry is missing its required `driver` field")]
    SoapyMissingDriver,
}

/// Default applied when the YAML omits `scanner.maxChannelsPerWindow`.
pub const DEFAULT_MAX_CHANNELS_PER_WINDOW: usize = 16;

// ---------------------------------------------------------------------
// Wire format (raw YAML shape)
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ScannerFile {
    #[serde(default)]
    scanner: ScannerSectionFile,
    receivers: Vec<ReceiverFile>,
    #[serde(default)]
    channel_defaults: ChannelDefaultsFile,
    channels: Vec<ChannelFile>,
    #[serde(default)]
    outputs: Vec<OutputFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ScannerSectionFile {
    #[serde(rename = "maxChannelsPerWindow")]
    max_channels_per_window: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ReceiverFile {
    #[serde(rename = "type")]
    kind: String,
    driver: Option<String>,
    #[serde(rename = "deviceArg")]
    device_arg: Option<String>,
    gain: Option<f64>,
    #[serde(default)]
    gains: std::collections::BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
struct ChannelDefaultsFile {
    mode: Option<String>,
    #[serde(rename = "audioGain_dB")]
    audio_gain_db: Option<f64>,
    #[serde(rename = "squelchThreshold")]
    squelch_threshold: Option<f64>,
    #[serde(rename = "dwellTime_s")]
    dwell_time_s: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChannelFile {
    freq: f64,
    label: Option<String>,
    mode: Option<String>,
    #[serde(rename = "audioGain_dB")]
    audio_gain_db: Option<f64>,
    #[serde(rename = "squelchThreshold")]
    squelch_threshold: Option<f64>,
    #[serde(rename = "dwellTime_s")]
    dwell_time_s: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OutputFile {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "serverIp")]
    server_ip: Option<String>,
    #[serde(rename = "serverPort")]
    server_port: Option<u16>,
    url: Option<String>,
    password: Option<String>,
    host: Option<String>,
    port: Option<u16>,
}

// ---------------------------------------------------------------------
// Domain objects
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ReceiverKind {
    RtlSdr,
    Soapy { driver: String },
}

#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    pub id: String,
    pub kind: ReceiverKind,
    pub device_arg: Option<String>,
    pub gain: Option<f64>,
    pub gains: std::collections::BTreeMap<String, f64>,
    /// Populated at worker start from the hardware's advertised rates, not
    /// from the config file.
    pub sample_rates: Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub id: String,
    pub freq_hz: f64,
    pub label: String,
    pub mode: ChannelMode,
    pub audio_gain_db: f64,
    pub squelch_threshold_dbfs: f64,
    pub dwell_time_s: f64,
    pub enabled: bool,
    pub muted: bool,
    pub hold: bool,
    pub force_active: bool,
    pub disabled_until: Option<f64>,
}

impl ChannelConfig {
    /// `enabled ∧ (disabled_until is null ∨ now ≥ disabled_until)`.
    pub fn effectively_enabled(&self, now_unix_s: f64) -> bool {
        self.enabled && self.disabled_until.map(|t| now_unix_s >= t).unwrap_or(true)
    }
}

#[derive(Debug, Clone)]
pub enum OutputConfig {
    Local,
    Udp { server_ip: String, server_port: u16 },
    Icecast { url: String, password: String },
    WebSocket { host: String, port: u16 },
}

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub max_channels_per_window: usize,
    pub receivers: Vec<ReceiverConfig>,
    pub channels: Vec<ChannelConfig>,
    pub outputs: Vec<OutputConfig>,
}

fn parse_mode(raw: &str) -> Result<ChannelMode> {
    match raw.to_ascii_uppercase().as_str() {
        "FM" => Ok(ChannelMode::Fm),
        "NFM" => Ok(ChannelMode::Nfm),
        "AM" => Ok(ChannelMode::Am),
        "USB" => Ok(ChannelMode::Usb),
        "LSB" => Ok(ChannelMode::Lsb),
        "NOAA" => Ok(ChannelMode::NoaaEas),
        "BFM_EAS" => Ok(ChannelMode::BfmEas),
        other => Err(ConfigError::UnknownMode(other.to_string())),
    }
}

/// Loads and builds a [`ScannerConfig`] from a YAML file at `path`.
pub fn load(path: &Path) -> Result<ScannerConfig> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let raw: ScannerFile = serde_yaml::from_str(&text)?;
    build(raw)
}

fn build(raw: ScannerFile) -> Result<ScannerConfig> {
    let max_channels_per_window = raw.scanner.max_channels_per_window.unwrap_or(DEFAULT_MAX_CHANNELS_PER_WINDOW);

    let mut receivers = Vec::with_capacity(raw.receivers.len());
    for (idx, r) in raw.receivers.into_iter().enumerate() {
        let kind = match r.kind.to_ascii_uppercase().as_str() {
            "RTL-SDR" | "RTL_SDR" => ReceiverKind::RtlSdr,
            "SOAPY" => ReceiverKind::Soapy {
                driver: r.driver.ok_or(ConfigError::SoapyMissingDriver)?,
            },
            other => return Err(ConfigError::UnknownReceiverType(other.to_string())),
        };
        receivers.push(ReceiverConfig {
            id: format!("rx-{idx}"),
            kind,
            device_arg: r.device_arg,
            gain: r.gain,
            gains: r.gains,
            sample_rates: Vec::new(),
        });
    }

    let defaults = raw.channel_defaults;
    let mut channels = Vec::with_capacity(raw.channels.len());
    for (idx, c) in raw.channels.into_iter().enumerate() {
        let mode_str = c.mode.or_else(|| defaults.mode.clone()).unwrap_or_else(|| "FM".to_string());
        let mode = parse_mode(&mode_str)?;
        channels.push(ChannelConfig {
            id: format!("ch-{idx}"),
            freq_hz: c.freq * 1_000_000.0,
            label: c.label.unwrap_or_else(|| format!("ch-{idx}")),
            mode,
            audio_gain_db: c.audio_gain_db.or(defaults.audio_gain_db).unwrap_or(0.0),
            squelch_threshold_dbfs: c.squelch_threshold.or(defaults.squelch_threshold).unwrap_or(-30.0),
            dwell_time_s: c.dwell_time_s.or(defaults.dwell_time_s).unwrap_or(2.0),
            enabled: true,
            muted: false,
            hold: false,
            force_active: false,
            disabled_until: None,
        });
    }

    let mut outputs = Vec::with_capacity(raw.outputs.len());
    for o in raw.outputs {
        let built = match o.kind.to_ascii_lowercase().as_str() {
            "local" => OutputConfig::Local,
            "udp" => OutputConfig::Udp {
                server_ip: o.server_ip.unwrap_or_default(),
                server_port: o.server_port.unwrap_or(0),
            },
            "icecast" => OutputConfig::Icecast {
                url: o.url.unwrap_or_default(),
                password: o.password.unwrap_or_default(),
            },
            "websocket" => OutputConfig::WebSocket {
                host: o.host.unwrap_or_default(),
                port: o.port.unwrap_or(0),
            },
            other => return Err(ConfigError::UnknownReceiverType(other.to_string())),
        };
        outputs.push(built);
    }

    Ok(ScannerConfig {
        max_channels_per_window,
        receivers,
        channels,
        outputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_YAML: &str = r#"
scanner:
  maxChannelsPerWindow: 8
receivers:
  - type: RTL-SDR
    gain: 30
channel_defaults:
  mode: FM
  dwellTime_s: 2.0
channels:
  - freq: 162.4
    label: NOAA1
    mode: NOAA
  - freq: 155.25
outputs:
  - type: local
  - type: udp
    serverIp: 127.0.0.1
    serverPort: 9000
"#;

    #[test]
    fn parses_full_example() {
        let raw: ScannerFile = serde_yaml::from_str(SAMPLE_YAML).unwrap();
        let config = build(raw).unwrap();

        assert_eq!(config.max_channels_per_window, 8);
        assert_eq!(config.receivers.len(), 1);
        assert_eq!(config.receivers[0].kind, ReceiverKind::RtlSdr);

        assert_eq!(config.channels.len(), 2);
        assert_eq!(config.channels[0].mode, ChannelMode::NoaaEas);
        assert_eq!(config.channels[0].freq_hz, 162_400_000.0);
        // inherits channel_defaults.mode
        assert_eq!(config.channels[1].mode, ChannelMode::Fm);
        assert_eq!(config.channels[1].dwell_time_s, 2.0);

        assert_eq!(config.outputs.len(), 2);
    }

    #[test]
    fn rejects_soapy_without_driver() {
        let yaml = r#"
receivers:
  - type: SOAPY
channels: []
"#;
        let raw: ScannerFile = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(build(raw), Err(ConfigError::SoapyMissingDriver)));
    }

    #[test]
    fn rejects_unknown_mode() {
        let yaml = r#"
receivers:
  - type: RTL-SDR
channels:
  - freq: 100.0
    mode: XYZ
"#;
        let raw: ScannerFile = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(build(raw), Err(ConfigError::UnknownMode(_))));
    }

    #[test]
    fn effectively_enabled_respects_disabled_until() {
        let mut ch = ChannelConfig {
            id: "ch-0".into(),
            freq_hz: 100.0,
            label: "x".into(),
            mode: ChannelMode::Fm,
            audio_gain_db: 0.0,
            squelch_threshold_dbfs: -30.0,
            dwell_time_s: 2.0,
            enabled: true,
            muted: false,
            hold: false,
            force_active: false,
            disabled_until: Some(100.0),
        };
        assert!(!ch.effectively_enabled(50.0));
        assert!(ch.effectively_enabled(100.0));
        ch.enabled = false;
        assert!(!ch.effectively_enabled(200.0));
    }
}
