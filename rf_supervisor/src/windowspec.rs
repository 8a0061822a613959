//! Builds the wire `WindowSpec` the supervisor hands a receiver at
//! `scan_window` time, resolving the window's channel set and the
//! receiver's concrete RF sample rate.

use rf_config::ChannelConfig;
use rf_core::{
    error::ScannerError,
    ipc::{ChannelSpec, WindowSpec},
};
use rf_dsp::constants::MAX_RF_SAMPLERATE;
use rf_plan::WindowPlan;

/// Picks the smallest advertised rate that covers the window's bandwidth.
/// No advertised rate satisfying the bandwidth is fatal for that window:
/// there is no rate at which the hardware could actually carry it.
pub fn pick_rf_sample_rate(advertised: &[u32], bandwidth_hz: f64) -> Result<u32, ScannerError> {
    advertised
        .iter()
        .copied()
        .filter(|&r| r <= MAX_RF_SAMPLERATE && r as f64 >= bandwidth_hz)
        .min()
        .ok_or_else(|| {
            ScannerError::Rate(format!(
                "no advertised sample rate covers {bandwidth_hz} Hz bandwidth (advertised: {advertised:?})"
            ))
        })
}

pub fn build_window_spec(plan: &WindowPlan, channels: &[ChannelConfig], rf_sample_rate: u32, audio_sample_rate: u32) -> WindowSpec {
    let window_channels: Vec<ChannelSpec> = plan
        .channel_ids
        .iter()
        .filter_map(|id| channels.iter().find(|c| &c.id == id))
        .map(|c| ChannelSpec {
            id: c.id.clone(),
            label: c.label.clone(),
            freq_hz: c.freq_hz,
            mode: format!("{:?}", c.mode),
            audio_gain_db: c.audio_gain_db,
            squelch_threshold_dbfs: c.squelch_threshold_dbfs,
            dwell_time_s: c.dwell_time_s,
            muted: c.muted,
            solo: None,
            hold: c.hold,
            force_active: c.force_active,
        })
        .collect();

    let minimum_scan_time_s = window_channels.iter().map(|c| c.dwell_time_s).fold(0.0, f64::max);

    WindowSpec {
        id: plan.id.clone(),
        hardware_freq_hz: plan.hardware_freq_hz,
        rf_sample_rate,
        audio_sample_rate,
        minimum_scan_time_s,
        channels: window_channels,
    }
}
