//! Length-prefixed JSON framing over the pipes connecting the supervisor to
//! its receiver and mixer children, and the message types carried over
//! them: a 4-byte little-endian length prefix followed by a JSON document,
//! read and written with `std::io::{Read, Write}` so either side of a
//! `std::process::Child`'s stdin/stdout works unchanged.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScannerError};

/// Writes one length-prefixed JSON frame.
pub fn write_frame<W: Write, T: Serialize>(writer: &mut W, message: &T) -> Result<()> {
    let body = serde_json::to_vec(message).map_err(|e| ScannerError::Protocol(format!("encode failed: {e}")))?;
    let len = body.len() as u32;
    writer.write_all(&len.to_le_bytes()).map_err(io_err)?;
    writer.write_all(&body).map_err(io_err)?;
    writer.flush().map_err(io_err)?;
    Ok(())
}

/// Reads one length-prefixed JSON frame, or `Ok(None)` on clean EOF between
/// frames (the far end closed its pipe).
pub fn read_frame<R: Read, T: for<'de> Deserialize<'de>>(reader: &mut R) -> Result<Option<T>> {
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(io_err(e)),
    }
    let len = u32::from_le_bytes(len_bytes) as usize;
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).map_err(io_err)?;
    let message = serde_json::from_slice(&body).map_err(|e| ScannerError::Protocol(format!("decode failed: {e}")))?;
    Ok(Some(message))
}

fn io_err(e: io::Error) -> ScannerError {
    ScannerError::Protocol(format!("pipe I/O error: {e}"))
}

/// Commands the supervisor sends down a receiver worker's control pipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ReceiverCommand {
    Config { receiver_id: String, gain: Option<f64>, gains: std::collections::BTreeMap<String, f64> },
    ScanWindow { window: WindowSpec },
    ChannelMute { channel_id: String, muted: bool },
    ChannelSolo { channel_id: String, solo: Option<bool> },
    ChannelHold { channel_id: String, hold: bool },
    ChannelForceActive { channel_id: String, force_active: bool },
    Kill,
}

/// One fully resolved scan window, enough for a receiver to build its
/// `rf_dsp::ScanWindow` without consulting the config crate directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSpec {
    pub id: String,
    pub hardware_freq_hz: f64,
    pub rf_sample_rate: u32,
    pub audio_sample_rate: u32,
    pub minimum_scan_time_s: f64,
    pub channels: Vec<ChannelSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub id: String,
    pub label: String,
    pub freq_hz: f64,
    pub mode: String,
    pub audio_gain_db: f64,
    pub squelch_threshold_dbfs: f64,
    pub dwell_time_s: f64,
    pub muted: bool,
    pub solo: Option<bool>,
    pub hold: bool,
    pub force_active: bool,
}

/// Events a receiver worker emits up its event pipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ReceiverEvent {
    SampleRates { rates: Vec<u32> },
    WindowDone { window_id: String },
    ChannelStatus {
        channel_id: String,
        status: String,
        rssi_dbfs: f64,
        noise_floor_dbfs: f64,
        volume_dbfs: Option<f64>,
    },
    Failed { reason: String },
}

/// Commands the supervisor sends the mixer: which ring belongs to which
/// receiver and where the output should go.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MixerCommand {
    AddRing { receiver_id: String, ring_path: String },
    RemoveRing { receiver_id: String },
    Kill,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_round_trips_through_a_byte_buffer() {
        let mut buf = Vec::new();
        let cmd = ReceiverCommand::Kill;
        write_frame(&mut buf, &cmd).unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let decoded: Option<ReceiverCommand> = read_frame(&mut cursor).unwrap();
        assert!(matches!(decoded, Some(ReceiverCommand::Kill)));
    }

    #[test]
    fn read_frame_returns_none_on_clean_eof() {
        let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
        let decoded: Option<ReceiverCommand> = read_frame(&mut cursor).unwrap();
        assert!(decoded.is_none());
    }
}
