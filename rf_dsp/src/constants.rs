//! Tunables shared across the per-channel DSP pipeline.
//!
//! Time constants below are given in seconds and converted to one-pole
//! filter coefficients via [`crate::filters::tc_to_alpha`] at the rate each
//! stage actually runs at.

/// Mono audio output rate of the whole scanner, in Hz. Window construction
/// picks the closest clean divisor of each receiver's RF rate to this.
pub const AUDIO_SAMPLERATE: u32 = 8_000;

/// Upper bound considered when a receiver's advertised sample rates are
/// filtered down to a usable set.
pub const MAX_RF_SAMPLERATE: u32 = 2_048_000;

/// Time constant of the power-squelch one-pole IIR.
pub const SQUELCH_TC: f64 = 0.0125;

/// Attack time constant of the volume envelope follower.
pub const VOLUME_LOWPASS_ATTACK_TC: f64 = 0.01;

/// Decay time constant of the volume envelope follower.
pub const VOLUME_LOWPASS_DECAY_TC: f64 = 0.5;

/// Time constant of the RSSI power one-pole IIR.
pub const RSSI_LOWPASS_TC: f64 = 0.05;

/// Coefficient of the noise-floor one-pole IIR (applied directly, not via
/// `tc_to_alpha`, since it is specified as a per-sample coefficient rather
/// than a time constant).
pub const NOISEFLOOR_LOWPASS_A: f64 = 0.0002;

/// Rate at which `rssi_dBFS` / `volume_dBFS` / noise floor are recomputed
/// and emitted in channel status events.
pub const STATUS_UPDATE_RATE_HZ: f64 = 10.0;

/// Minimum scan time for a window containing only standard (non-EAS) modes.
pub const MIN_SCAN_TIME_STANDARD_S: f64 = 0.1;

/// Minimum scan time for a window containing at least one EAS channel, long
/// enough for the EAS tone-detection FFT to fill once.
pub const MIN_SCAN_TIME_EAS_S: f64 = 0.2;

/// Number of consecutive positive EAS tone-detector frames required to open
/// the gate.
pub const EAS_TRIGGER_FRAMES: u32 = 3;

/// EAS tone-detector FFT size. A detector frame completes once every
/// `EAS_FFT_SIZE / audio_sample_rate` seconds of audio, since
/// [`crate::demod::EasToneDetector::push`] only returns a result once its
/// buffer of this size fills.
pub const EAS_FFT_SIZE: usize = 1024;

/// Reference band an EAS tone bin must exceed, in Hz.
pub const EAS_REFERENCE_BAND_HZ: (f64, f64) = (1100.0, 1200.0);

/// How far above the reference band an EAS tone bin must sit, in dB.
pub const EAS_TONE_THRESHOLD_DB: f64 = 20.0;

/// NOAA weather-radio attention tone, in Hz.
pub const NOAA_EAS_TONES_HZ: &[f64] = &[1050.0];

/// Broadcast-FM EAS two-tone attention signal, in Hz.
pub const BFM_EAS_TONES_HZ: &[f64] = &[853.0, 960.0];

/// Common audio-tail band-pass edges, in Hz.
pub const AUDIO_BANDPASS_HZ: (f64, f64) = (200.0, 3500.0);

/// NBFM/WBFM de-emphasis time constant.
pub const FM_DEEMPHASIS_TAU: f64 = 75e-6;

/// Maximum deviation for wide FM, in Hz.
pub const FM_MAX_DEVIATION_HZ: f64 = 5_000.0;

/// Maximum deviation for narrow FM, in Hz.
pub const NFM_MAX_DEVIATION_HZ: f64 = 2_500.0;
