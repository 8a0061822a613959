//! The boundary to the SDR hardware driver, treated as an external
//! collaborator out of scope for this crate. `IqSource` is that boundary:
//! a real build wires in a driver crate (e.g. `soapysdr` or `rtlsdr_mt`)
//! behind this trait; this crate ships only the synthetic source used for
//! development and the worker's own tests.

use num_complex::Complex32;

pub trait IqSource: Send {
    /// The rates this source (and the driver behind it) can tune to.
    fn sample_rates(&self) -> Vec<u32>;

    /// Tunes the source to `hardware_freq_hz` at `rf_sample_rate`.
    fn tune(&mut self, hardware_freq_hz: f64, rf_sample_rate: u32);

    /// Fills `buf` with the next block of complex baseband samples,
    /// returning how many were written.
    fn read(&mut self, buf: &mut [Complex32]) -> usize;
}

/// A deterministic synthetic source: a single tone plus noise floor,
/// useful for exercising the worker state machine without real hardware.
pub struct SyntheticSource {
    rates: Vec<u32>,
    rf_sample_rate: u32,
    phase: f32,
    phase_inc: f32,
    noise_state: u32,
}

impl SyntheticSource {
    pub fn new(rates: Vec<u32>) -> Self {
        let rf_sample_rate = rates.first().copied().unwrap_or(crate::DEFAULT_RF_SAMPLERATE);
        Self {
            rates,
            rf_sample_rate,
            phase: 0.0,
            phase_inc: 0.0,
            noise_state: 0x1234_5678,
        }
    }

    fn next_noise(&mut self) -> f32 {
        // xorshift32
        self.noise_state ^= self.noise_state << 13;
        self.noise_state ^= self.noise_state >> 17;
        self.noise_state ^= self.noise_state << 5;
        (self.noise_state as f32 / u32::MAX as f32) * 2.0 - 1.0
    }
}

impl IqSource for SyntheticSource {
    fn sample_rates(&self) -> Vec<u32> {
        self.rates.clone()
    }

    fn tune(&mut self, _hardware_freq_hz: f64, rf_sample_rate: u32) {
        self.rf_sample_rate = rf_sample_rate;
        self.phase_inc = std::f32::consts::TAU * 1_000.0 / rf_sample_rate as f32;
    }

    fn read(&mut self, buf: &mut [Complex32]) -> usize {
        for sample in buf.iter_mut() {
            let tone = Complex32::new(self.phase.cos(), self.phase.sin()) * 0.2;
            let noise = Complex32::new(self.next_noise(), self.next_noise()) * 0.01;
            *sample = tone + noise;
            self.phase += self.phase_inc;
            if self.phase > std::f32::consts::TAU {
                self.phase -= std::f32::consts::TAU;
            }
        }
        buf.len()
    }
}
