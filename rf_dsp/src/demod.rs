//! Per-mode demodulators. Each one consumes the complex stream at its
//! designated intermediate rate and produces one real audio-rate sample.

use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

use crate::{
    agc::{AttackDecayAgc, FeedForwardAgc},
    constants::{EAS_FFT_SIZE, EAS_REFERENCE_BAND_HZ, EAS_TONE_THRESHOLD_DB, FM_DEEMPHASIS_TAU},
    filters::OnePole,
};

/// Narrowband/wideband FM discriminator with de-emphasis.
///
/// `max_deviation_hz` scales the discriminator output back to a
/// full-scale audio range; `tau` is the de-emphasis time constant (fixed
/// at [`FM_DEEMPHASIS_TAU`] by every caller, but left configurable so EAS's
/// muted FM tap can skip de-emphasis if ever needed).
#[derive(Debug, Clone)]
pub struct FmDemodulator {
    prev: Complex32,
    deemph: OnePole,
    gain: f64,
}

impl FmDemodulator {
    pub fn new(max_deviation_hz: f64, quad_rate: f64, sample_rate: f64) -> Self {
        let alpha = crate::filters::tc_to_alpha(FM_DEEMPHASIS_TAU, sample_rate);
        Self {
            prev: Complex32::new(1.0, 0.0),
            deemph: OnePole::new(alpha),
            gain: quad_rate / (2.0 * std::f64::consts::PI * max_deviation_hz),
        }
    }

    #[inline]
    pub fn process(&mut self, sample: Complex32) -> f32 {
        let prod = sample * self.prev.conj();
        self.prev = sample;
        let discriminator = prod.im.atan2(prod.re) as f64 * self.gain;
        self.deemph.step(discriminator) as f32
    }
}

/// AM envelope demodulator: feed-forward AGC normalizes the magnitude
/// envelope, then a fixed post-gain brings AM loudness in line with FM.
#[derive(Debug, Clone)]
pub struct AmDemodulator {
    agc: FeedForwardAgc,
    post_gain: f64,
}

impl AmDemodulator {
    pub fn new(sample_rate: f64, post_gain: f64) -> Self {
        Self {
            agc: FeedForwardAgc::new(0.2, 0.5, sample_rate),
            post_gain,
        }
    }

    #[inline]
    pub fn process(&mut self, sample: Complex32) -> f32 {
        let mag = sample.norm() as f64;
        (self.agc.process(mag) * self.post_gain) as f32
    }
}

/// SSB demodulator: an AGC'd intermediate-frequency mix down to baseband
/// audio via a BFO cosine, for either the upper or lower sideband
/// (sideband selection happens upstream, in the IF band-pass filter that
/// feeds this stage).
#[derive(Debug, Clone)]
pub struct SsbDemodulator {
    agc: AttackDecayAgc,
    if_phase: f64,
    if_phase_inc: f64,
    lowpass: OnePole,
    post_gain: f64,
}

impl SsbDemodulator {
    pub fn new(if_freq_hz: f64, sample_rate: f64, post_gain: f64) -> Self {
        Self {
            agc: AttackDecayAgc::new(0.1, 1e-4, 0.05, 3.0),
            if_phase: 0.0,
            if_phase_inc: 2.0 * std::f64::consts::PI * if_freq_hz / sample_rate,
            lowpass: OnePole::new(crate::filters::tc_to_alpha(1.0 / (2.0 * std::f64::consts::PI * 3_000.0), sample_rate)),
            post_gain,
        }
    }

    #[inline]
    pub fn process(&mut self, sample: Complex32) -> f32 {
        let i = self.agc.process(sample.re as f64);
        let q = self.agc.process(sample.im as f64);
        let bfo = self.if_phase.cos();
        self.if_phase += self.if_phase_inc;
        if self.if_phase > std::f64::consts::PI {
            self.if_phase -= 2.0 * std::f64::consts::PI;
        }
        let mixed = i * bfo + q * self.if_phase.sin();
        (self.lowpass.step(mixed) * self.post_gain) as f32
    }
}

/// Log-power FFT tone detector for EAS attention tones.
///
/// Accumulates [`EAS_FFT_SIZE`] complex samples, then checks whether each
/// configured tone bin exceeds the mean power of [`EAS_REFERENCE_BAND_HZ`]
/// by [`EAS_TONE_THRESHOLD_DB`] and is a local peak among its neighbors.
/// The 3-consecutive-frame trigger counter and post-trigger dwell are
/// state owned by the caller (see `channel_mode::EasGate`); this type only
/// answers "is the tone present in the frame that just filled."
pub struct EasToneDetector {
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex32>,
    sample_rate: f64,
    tone_bins_hz: Vec<f64>,
}

impl EasToneDetector {
    pub fn new(sample_rate: f64, tone_bins_hz: &[f64]) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(EAS_FFT_SIZE),
            buffer: Vec::with_capacity(EAS_FFT_SIZE),
            sample_rate,
            tone_bins_hz: tone_bins_hz.to_vec(),
        }
    }

    fn bin_for_hz(&self, hz: f64) -> usize {
        ((hz / self.sample_rate) * EAS_FFT_SIZE as f64).round() as usize % EAS_FFT_SIZE
    }

    /// Feeds one complex sample. Returns `Some(true/false)` once an FFT
    /// frame has filled (tone present or not), `None` while still filling.
    pub fn push(&mut self, sample: Complex32) -> Option<bool> {
        self.buffer.push(sample);
        if self.buffer.len() < EAS_FFT_SIZE {
            return None;
        }

        let mut spectrum = std::mem::replace(&mut self.buffer, Vec::with_capacity(EAS_FFT_SIZE));
        self.fft.process(&mut spectrum);

        let log_power: Vec<f64> = spectrum.iter().map(|c| 10.0 * (c.norm_sqr() as f64 + 1e-12).log10()).collect();

        let (lo_bin, hi_bin) = (self.bin_for_hz(EAS_REFERENCE_BAND_HZ.0), self.bin_for_hz(EAS_REFERENCE_BAND_HZ.1));
        let (lo_bin, hi_bin) = (lo_bin.min(hi_bin), lo_bin.max(hi_bin).max(lo_bin.min(hi_bin) + 1));
        let reference_power: f64 = log_power[lo_bin..hi_bin.min(log_power.len())].iter().sum::<f64>()
            / (hi_bin - lo_bin).max(1) as f64;

        let present = self.tone_bins_hz.iter().any(|&hz| {
            let bin = self.bin_for_hz(hz);
            if bin == 0 || bin + 1 >= log_power.len() {
                return false;
            }
            let is_peak = log_power[bin] >= log_power[bin - 1] && log_power[bin] >= log_power[bin + 1];
            is_peak && (log_power[bin] - reference_power) >= EAS_TONE_THRESHOLD_DB
        });

        Some(present)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fm_demod_of_constant_carrier_is_near_zero() {
        let mut fm = FmDemodulator::new(5_000.0, 8_000.0, 8_000.0);
        let mut last = 1.0;
        for _ in 0..100 {
            last = fm.process(Complex32::new(1.0, 0.0)) as f64;
        }
        assert!(last.abs() < 0.01);
    }

    #[test]
    fn am_demod_tracks_envelope() {
        let mut am = AmDemodulator::new(8_000.0, 3.0);
        let mut last = 0.0;
        for _ in 0..5000 {
            last = am.process(Complex32::new(2.0, 0.0));
        }
        assert!(last > 0.0);
    }

    #[test]
    fn eas_tone_detector_fills_and_detects_reasonably() {
        let mut det = EasToneDetector::new(8_000.0, &[1050.0]);
        let mut last = None;
        for i in 0..EAS_FFT_SIZE {
            let t = i as f64 / 8_000.0;
            let x = (2.0 * std::f64::consts::PI * 1050.0 * t).sin();
            last = det.push(Complex32::new(x as f32, 0.0));
        }
        assert!(last.is_some());
    }
}
