//! A scan window: one receiver's active tuning, decoding every channel
//! that falls inside its bandwidth in parallel and summing their audio.

use num_complex::Complex32;

use crate::{
    dsp_channel::{ChannelStatusEvent, DspChannel},
    status::ChannelStatus,
};

/// One receiver's current tuning: a hardware center frequency, an RF
/// sample rate, and the channels whose frequencies fall inside it.
///
/// The audio summing junction is a plain, unweighted sum — grounded on the
/// original receiver's window mixer, which adds channel outputs directly
/// rather than normalizing for channel count. Any loudness normalization
/// happens downstream, in the mixer process's final int16 conversion.
pub struct ScanWindow {
    pub id: String,
    pub hardware_freq_hz: f64,
    pub rf_sample_rate: f64,
    pub audio_sample_rate: f64,
    channels: Vec<DspChannel>,
}

impl ScanWindow {
    pub fn new(id: String, hardware_freq_hz: f64, rf_sample_rate: f64, audio_sample_rate: f64, channels: Vec<DspChannel>) -> Self {
        Self {
            id,
            hardware_freq_hz,
            rf_sample_rate,
            audio_sample_rate,
            channels,
        }
    }

    pub fn channels(&self) -> &[DspChannel] {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut [DspChannel] {
        &mut self.channels
    }

    /// Processes one RF-rate IQ block, appending mixed mono audio to `audio_out`
    /// and status events for any channel whose status just changed to
    /// `status_events`. Only channels that actually produced an
    /// audio-rate sample this call (decimation boundary) are checked.
    pub fn process_block(&mut self, iq: &[Complex32], dt_s: f64, audio_out: &mut Vec<f32>, status_events: &mut Vec<ChannelStatusEvent>) {
        let mut per_channel_audio: Vec<Vec<f32>> = vec![Vec::new(); self.channels.len()];

        for &sample in iq {
            for (idx, channel) in self.channels.iter_mut().enumerate() {
                if let Some((audio, status, meters)) = channel.process_rf_sample(sample, dt_s) {
                    per_channel_audio[idx].push(audio);
                    if let Some(meters) = meters {
                        status_events.push(ChannelStatusEvent {
                            channel_id: channel.id.clone(),
                            status,
                            rssi_dbfs: meters.rssi_dbfs,
                            noise_floor_dbfs: meters.noise_floor_dbfs,
                            volume_dbfs: meters.volume_dbfs,
                        });
                    }
                }
            }
        }

        let max_len = per_channel_audio.iter().map(Vec::len).max().unwrap_or(0);
        audio_out.reserve(max_len);
        for i in 0..max_len {
            let mut sum = 0.0f32;
            for channel_audio in &per_channel_audio {
                if let Some(&s) = channel_audio.get(i) {
                    sum += s;
                }
            }
            audio_out.push(sum);
        }
    }

    /// A window is active if any of its channels is not `Idle`.
    pub fn is_active(&self) -> bool {
        self.channels.iter().any(|c| c.status() != ChannelStatus::Idle)
    }

    /// The minimum dwell this window must scan before it may be preempted:
    /// the maximum across its channels' per-mode minimums.
    pub fn minimum_scan_time_s(&self) -> f64 {
        self.channels
            .iter()
            .map(DspChannel::minimum_scan_time_s)
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        channel_mode::ChannelMode,
        dsp_channel::{ChannelBuildParams, ChannelPolicy},
    };

    fn make_channel(id: &str, freq_hz: f64, hardware_freq_hz: f64) -> DspChannel {
        let params = ChannelBuildParams {
            id: id.into(),
            label: id.into(),
            freq_hz,
            hardware_freq_hz,
            mode: ChannelMode::Fm,
            rf_sample_rate: 48_000.0,
            audio_sample_rate: 8_000.0,
        };
        let policy = ChannelPolicy {
            audio_gain_db: 0.0,
            squelch_threshold_dbfs: -30.0,
            dwell_s: 0.1,
            muted: false,
            solo: None,
            hold: false,
            force_active: true,
        };
        DspChannel::new(params, policy).expect("valid rates and in-band offset")
    }

    #[test]
    fn plain_sum_not_normalized_by_channel_count() {
        let ch_a = make_channel("a", 100_000_000.0, 100_000_000.0);
        let ch_b = make_channel("b", 100_000_100.0, 100_000_000.0);
        let mut window = ScanWindow::new("w1".into(), 100_000_000.0, 48_000.0, 8_000.0, vec![ch_a, ch_b]);

        let iq: Vec<Complex32> = (0..480).map(|_| Complex32::new(0.1, 0.0)).collect();
        let mut audio = Vec::new();
        let mut events = Vec::new();
        window.process_block(&iq, 1.0 / 48_000.0, &mut audio, &mut events);

        // two channels summed, not averaged: output magnitude should be able
        // to exceed what either channel alone would produce.
        assert!(!audio.is_empty());
        assert!(!events.is_empty());
    }

    #[test]
    fn window_active_while_any_channel_forced_active() {
        let ch_a = make_channel("a", 100_000_000.0, 100_000_000.0);
        let mut window = ScanWindow::new("w1".into(), 100_000_000.0, 48_000.0, 8_000.0, vec![ch_a]);
        let iq: Vec<Complex32> = (0..48).map(|_| Complex32::new(0.0, 0.0)).collect();
        let mut audio = Vec::new();
        let mut events = Vec::new();
        window.process_block(&iq, 1.0 / 48_000.0, &mut audio, &mut events);
        assert!(window.is_active());
    }
}
