//! The per-channel demodulation pipeline: frontend frequency translation,
//! squelch, mode-specific demodulation, the common audio tail, and
//! metering/status.
//!
//! Decimation is simplified to a single complex stage from the window's RF
//! rate straight to the audio rate, rather than the two-stage split that
//! exists purely as a CPU-spreading optimization. Squelch and RSSI sample
//! this same decimated complex stream.

use num_complex::Complex32;
use serde::{Deserialize, Serialize};

use crate::{
    channel_mode::{ChannelMode, EasGate},
    constants::{
        AUDIO_BANDPASS_HZ, FM_MAX_DEVIATION_HZ, NFM_MAX_DEVIATION_HZ, NOISEFLOOR_LOWPASS_A, RSSI_LOWPASS_TC,
        VOLUME_LOWPASS_ATTACK_TC, VOLUME_LOWPASS_DECAY_TC,
    },
    context::DspContext,
    demod::{AmDemodulator, EasToneDetector, FmDemodulator, SsbDemodulator},
    error::{DspError, Result},
    filters::{db_to_linear, linear_to_dbfs, BandPassFilter, OnePole},
    squelch::PowerSquelch,
    status::{ChannelMeters, ChannelStatus, StatusTracker},
    xlate::FreqXlatingDecimator,
};

/// Operator-mutable policy fields, distinct from the identity/tuning
/// fields fixed at window-build time. All setters are idempotent and take
/// effect before the next sample block.
#[derive(Debug, Clone)]
pub struct ChannelPolicy {
    pub audio_gain_db: f64,
    pub squelch_threshold_dbfs: f64,
    pub dwell_s: f64,
    pub muted: bool,
    /// Tri-state broadcast solo: `Some(true)` this channel is the soloed
    /// one, `Some(false)` some other channel is soloed, `None` no solo is
    /// active anywhere.
    pub solo: Option<bool>,
    pub hold: bool,
    pub force_active: bool,
}

enum Demod {
    Fm(FmDemodulator),
    Am(AmDemodulator),
    Ssb(SsbDemodulator),
    Eas { fm: FmDemodulator, detector: EasToneDetector, gate: EasGate },
}

/// A single radio channel's live demodulation state, owned by a
/// [`crate::window::ScanWindow`].
pub struct DspChannel {
    pub id: String,
    pub label: String,
    pub freq_hz: f64,
    pub mode: ChannelMode,
    policy: ChannelPolicy,

    decimator: FreqXlatingDecimator,
    squelch: PowerSquelch,
    status: StatusTracker,
    demod: Demod,
    tail_filter: BandPassFilter,

    volume_follower: OnePole,
    volume_attack_alpha: f64,
    volume_decay_alpha: f64,
    rssi_follower: OnePole,
    noise_floor: OnePole,

    audio_sample_rate: f64,
    elapsed_s: f64,
}

/// Parameters fixed when a channel's pipeline is built inside a window;
/// these never change for the channel's lifetime within that window.
pub struct ChannelBuildParams {
    pub id: String,
    pub label: String,
    pub freq_hz: f64,
    pub hardware_freq_hz: f64,
    pub mode: ChannelMode,
    pub rf_sample_rate: f64,
    pub audio_sample_rate: f64,
}

impl DspChannel {
    /// Fails if the rf-to-audio rate ratio isn't an integer (the decimator
    /// has no fractional-sample path) or if the channel's offset from the
    /// window's hardware center frequency falls outside the Nyquist range
    /// the RF sample rate can represent.
    pub fn new(params: ChannelBuildParams, policy: ChannelPolicy) -> Result<Self> {
        let offset_hz = params.freq_hz - params.hardware_freq_hz;
        let nyquist_hz = params.rf_sample_rate / 2.0;
        if offset_hz.abs() > nyquist_hz {
            return Err(DspError::OffsetOutOfBand {
                offset_hz: offset_hz as i64,
                rf_rate: params.rf_sample_rate as u32,
            });
        }
        let context = DspContext::new(params.rf_sample_rate, params.audio_sample_rate)?;
        let decimation = context.decimation;
        let decimator = FreqXlatingDecimator::new(offset_hz, params.rf_sample_rate, decimation);

        let demod = match params.mode {
            ChannelMode::Fm => Demod::Fm(FmDemodulator::new(FM_MAX_DEVIATION_HZ, params.audio_sample_rate, params.audio_sample_rate)),
            ChannelMode::Nfm => Demod::Fm(FmDemodulator::new(NFM_MAX_DEVIATION_HZ, params.audio_sample_rate, params.audio_sample_rate)),
            ChannelMode::Am => Demod::Am(AmDemodulator::new(params.audio_sample_rate, params.mode.fixed_gain_factor())),
            ChannelMode::Usb | ChannelMode::Lsb => {
                Demod::Ssb(SsbDemodulator::new(1_500.0, params.audio_sample_rate, params.mode.fixed_gain_factor()))
            }
            ChannelMode::NoaaEas | ChannelMode::BfmEas => Demod::Eas {
                fm: FmDemodulator::new(FM_MAX_DEVIATION_HZ, params.audio_sample_rate, params.audio_sample_rate),
                detector: EasToneDetector::new(params.audio_sample_rate, params.mode.eas_tone_bins_hz()),
                gate: EasGate::new(policy.dwell_s),
            },
        };

        Ok(Self {
            id: params.id,
            label: params.label,
            freq_hz: params.freq_hz,
            mode: params.mode,
            squelch: PowerSquelch::new(policy.squelch_threshold_dbfs, params.audio_sample_rate),
            status: StatusTracker::new(policy.dwell_s),
            policy,
            decimator,
            demod,
            tail_filter: BandPassFilter::new(AUDIO_BANDPASS_HZ.0, AUDIO_BANDPASS_HZ.1, params.audio_sample_rate),
            volume_follower: OnePole::new(0.0),
            volume_attack_alpha: crate::filters::tc_to_alpha(VOLUME_LOWPASS_ATTACK_TC, params.audio_sample_rate),
            volume_decay_alpha: crate::filters::tc_to_alpha(VOLUME_LOWPASS_DECAY_TC, params.audio_sample_rate),
            rssi_follower: OnePole::new(crate::filters::tc_to_alpha(RSSI_LOWPASS_TC, params.audio_sample_rate)),
            noise_floor: OnePole::new(NOISEFLOOR_LOWPASS_A),
            audio_sample_rate: params.audio_sample_rate,
            elapsed_s: 0.0,
        })
    }

    pub fn set_mute(&mut self, muted: bool) {
        self.policy.muted = muted;
    }

    pub fn set_solo(&mut self, solo: Option<bool>) {
        self.policy.solo = solo;
    }

    pub fn set_hold(&mut self, hold: bool) {
        self.policy.hold = hold;
    }

    pub fn set_force_active(&mut self, force_active: bool) {
        self.policy.force_active = force_active;
    }

    pub fn set_squelch_value(&mut self, threshold_dbfs: f64) {
        self.policy.squelch_threshold_dbfs = threshold_dbfs;
        self.squelch.set_threshold(threshold_dbfs);
    }

    pub fn set_audio_gain(&mut self, gain_db: f64) {
        self.policy.audio_gain_db = gain_db;
    }

    pub fn set_dwell(&mut self, dwell_s: f64) {
        self.policy.dwell_s = dwell_s;
        self.status.set_dwell(dwell_s);
        if let Demod::Eas { gate, .. } = &mut self.demod {
            gate.set_dwell(dwell_s);
        }
    }

    /// Whether audio from this channel should reach the window's mixing
    /// junction: muted channels never pass, and a channel that is not the
    /// soloed one while some other channel holds solo is silenced too.
    fn audio_passes(&self) -> bool {
        !self.policy.muted && self.policy.solo != Some(false)
    }

    /// Processes one RF-rate complex sample for this channel.
    ///
    /// Returns `Some((audio_sample, status, meters))` on the decimation
    /// boundary (once per `audio_sample_rate` tick), `None` otherwise.
    /// `audio_sample` is zero when the channel is muted or solo'd out, but
    /// the channel's status machine and meters still advance regardless.
    pub fn process_rf_sample(&mut self, iq: Complex32, _dt_s: f64) -> Option<(f32, ChannelStatus, Option<ChannelMeters>)> {
        let decimated = self.decimator.process(iq)?;
        self.elapsed_s += 1.0 / self.audio_sample_rate;

        let power_dbfs = self.squelch.process(decimated);
        let squelch_open = self.squelch.is_open(power_dbfs);

        let mut audio = match &mut self.demod {
            Demod::Fm(fm) => fm.process(decimated),
            Demod::Am(am) => am.process(decimated),
            Demod::Ssb(ssb) => ssb.process(decimated),
            Demod::Eas { fm, detector, gate } => {
                let muted_audio = fm.process(decimated);
                let tone_result = detector.push(decimated);
                let gate_open = if let Some(present) = tone_result {
                    let frame_period_s = crate::constants::EAS_FFT_SIZE as f64 / self.audio_sample_rate;
                    gate.advance(present, frame_period_s)
                } else {
                    gate.is_open()
                };
                if gate_open { muted_audio } else { 0.0 }
            }
        };

        let (activity_open, activity_warming) = if self.mode.is_eas() {
            match &self.demod {
                Demod::Eas { gate, .. } => (gate.is_open(), gate.is_warming()),
                _ => unreachable!(),
            }
        } else {
            (squelch_open, false)
        };

        let status = self.status.update(self.elapsed_s, activity_open, activity_warming, self.policy.hold, self.policy.force_active);

        // Noise floor only integrates while the channel is inactive.
        if !matches!(status, ChannelStatus::Active | ChannelStatus::ForceActive) {
            self.noise_floor.step(power_dbfs);
        }
        let rssi_dbfs = self.rssi_follower.step(power_dbfs);

        audio = self.tail_filter.process(audio as f64) as f32;
        let gain = db_to_linear::<f32>(self.policy.audio_gain_db as f32) * self.mode.fixed_gain_factor() as f32;
        audio *= gain;

        let volume_linear = self.volume_follower.step_asym(audio.abs() as f64, self.volume_attack_alpha, self.volume_decay_alpha);

        let output_audio = if self.audio_passes() { audio } else { 0.0 };

        let meters = Some(ChannelMeters {
            rssi_dbfs: Some(rssi_dbfs),
            noise_floor_dbfs: Some(self.noise_floor.value()),
            volume_dbfs: Some(linear_to_dbfs(volume_linear)),
        });

        Some((output_audio, status, meters))
    }

    pub fn status(&self) -> ChannelStatus {
        self.status.current()
    }

    pub fn minimum_scan_time_s(&self) -> f64 {
        if self.mode.is_eas() {
            crate::constants::MIN_SCAN_TIME_EAS_S
        } else {
            crate::constants::MIN_SCAN_TIME_STANDARD_S
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelStatusEvent {
    pub channel_id: String,
    pub status: ChannelStatus,
    pub rssi_dbfs: Option<f64>,
    pub noise_floor_dbfs: Option<f64>,
    pub volume_dbfs: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(mode: ChannelMode) -> DspChannel {
        let params = ChannelBuildParams {
            id: "ch1".into(),
            label: "Test".into(),
            freq_hz: 162_400_000.0,
            hardware_freq_hz: 162_400_000.0,
            mode,
            rf_sample_rate: 48_000.0,
            audio_sample_rate: 8_000.0,
        };
        let policy = ChannelPolicy {
            audio_gain_db: 0.0,
            squelch_threshold_dbfs: -30.0,
            dwell_s: 1.0,
            muted: false,
            solo: None,
            hold: false,
            force_active: false,
        };
        DspChannel::new(params, policy).expect("valid rates and in-band offset")
    }

    #[test]
    fn channel_starts_idle() {
        let mut channel = build(ChannelMode::Fm);
        for _ in 0..6 {
            channel.process_rf_sample(Complex32::new(0.0, 0.0), 1.0 / 48_000.0);
        }
        assert_eq!(channel.status(), ChannelStatus::Idle);
    }

    #[test]
    fn force_active_opens_regardless_of_signal() {
        let mut channel = build(ChannelMode::Fm);
        channel.set_force_active(true);
        let mut last_status = ChannelStatus::Idle;
        for _ in 0..60 {
            if let Some((_, status, _)) = channel.process_rf_sample(Complex32::new(0.0, 0.0), 1.0 / 48_000.0) {
                last_status = status;
            }
        }
        assert_eq!(last_status, ChannelStatus::ForceActive);
    }

    #[test]
    fn muted_channel_outputs_silence_but_still_tracks_status() {
        let mut channel = build(ChannelMode::Fm);
        channel.set_mute(true);
        channel.set_force_active(true);
        let mut last_audio = 1.0;
        for _ in 0..60 {
            if let Some((audio, _, _)) = channel.process_rf_sample(Complex32::new(1.0, 0.0), 1.0 / 48_000.0) {
                last_audio = audio;
            }
        }
        assert_eq!(last_audio, 0.0);
        assert_eq!(channel.status(), ChannelStatus::ForceActive);
    }

    #[test]
    fn solo_false_silences_audio() {
        let mut channel = build(ChannelMode::Fm);
        channel.set_solo(Some(false));
        channel.set_force_active(true);
        let mut last_audio = 1.0;
        for _ in 0..60 {
            if let Some((audio, _, _)) = channel.process_rf_sample(Complex32::new(1.0, 0.0), 1.0 / 48_000.0) {
                last_audio = audio;
            }
        }
        assert_eq!(last_audio, 0.0);
    }

    fn policy() -> ChannelPolicy {
        ChannelPolicy {
            audio_gain_db: 0.0,
            squelch_threshold_dbfs: -30.0,
            dwell_s: 1.0,
            muted: false,
            solo: None,
            hold: false,
            force_active: false,
        }
    }

    #[test]
    fn rejects_non_integer_decimation_ratio() {
        let params = ChannelBuildParams {
            id: "ch1".into(),
            label: "Test".into(),
            freq_hz: 162_400_000.0,
            hardware_freq_hz: 162_400_000.0,
            mode: ChannelMode::Fm,
            rf_sample_rate: 48_001.0,
            audio_sample_rate: 8_000.0,
        };
        let err = DspChannel::new(params, policy()).unwrap_err();
        assert!(matches!(err, DspError::NonIntegerDecimation { .. }));
    }

    #[test]
    fn rejects_offset_beyond_nyquist() {
        let params = ChannelBuildParams {
            id: "ch1".into(),
            label: "Test".into(),
            freq_hz: 162_400_000.0,
            hardware_freq_hz: 162_400_000.0 - 30_000.0,
            mode: ChannelMode::Fm,
            rf_sample_rate: 48_000.0,
            audio_sample_rate: 8_000.0,
        };
        let err = DspChannel::new(params, policy()).unwrap_err();
        assert!(matches!(err, DspError::OffsetOutOfBand { .. }));
    }
}
