//! Per-channel processing context: the rates a [`crate::dsp_channel::DspChannel`]
//! was built against.

use crate::error::{DspError, Result};

/// Sample-rate and framing parameters for one channel's pipeline: just the
/// two rates the decimation chain actually needs, rather than a generic
/// multi-channel audio context.
#[derive(Debug, Clone, Copy)]
pub struct DspContext {
    /// Rate of the IQ samples entering the channel, in Hz (the window's
    /// hardware sample rate).
    pub rf_sample_rate: f64,
    /// Rate of the demodulated mono audio leaving the channel, in Hz.
    pub audio_sample_rate: f64,
    /// Decimation factor from `rf_sample_rate` to `audio_sample_rate`.
    pub decimation: usize,
}

impl DspContext {
    /// Rejects a ratio that isn't (within floating-point tolerance) an
    /// integer: the decimator drops whole samples per output tick, so a
    /// fractional ratio would silently drift the audio rate away from
    /// `audio_sample_rate`.
    pub fn new(rf_sample_rate: f64, audio_sample_rate: f64) -> Result<Self> {
        let ratio = rf_sample_rate / audio_sample_rate;
        let decimation = ratio.round().max(1.0) as usize;
        if (ratio - decimation as f64).abs() > 1e-6 {
            return Err(DspError::NonIntegerDecimation {
                rf_rate: rf_sample_rate as u32,
                audio_rate: audio_sample_rate as u32,
            });
        }
        Ok(Self {
            rf_sample_rate,
            audio_sample_rate,
            decimation,
        })
    }
}
