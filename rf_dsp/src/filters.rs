//! One-pole IIR helpers and the TPT state-variable band-pass filter used on
//! the audio tail of every channel mode.

use rf_core::Sample;

/// Converts a time constant (seconds) to a one-pole IIR coefficient at the
/// given sample rate: `alpha = 1 - exp(-1 / (tc * rate))`.
#[inline]
pub fn tc_to_alpha(tc_s: f64, sample_rate: f64) -> f64 {
    1.0 - (-1.0 / (tc_s * sample_rate)).exp()
}

/// A single-pole low-pass IIR, `y[n] = y[n-1] + alpha * (x[n] - y[n-1])`.
///
/// Grounded on the asymmetric-attack/decay envelope idiom used by volume
/// and RSSI metering in the original receiver: two alphas are supported via
/// [`OnePole::step_asym`] for callers that need a fast attack / slow decay
/// follower.
#[derive(Debug, Clone, Copy)]
pub struct OnePole {
    alpha: f64,
    state: f64,
}

impl OnePole {
    pub fn new(alpha: f64) -> Self {
        Self { alpha, state: 0.0 }
    }

    #[inline]
    pub fn step(&mut self, x: f64) -> f64 {
        self.state += self.alpha * (x - self.state);
        self.state
    }

    #[inline]
    pub fn step_asym(&mut self, x: f64, attack_alpha: f64, decay_alpha: f64) -> f64 {
        let alpha = if x > self.state { attack_alpha } else { decay_alpha };
        self.state += alpha * (x - self.state);
        self.state
    }

    pub fn value(&self) -> f64 {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}

/// TPT (topology-preserving transform) state-variable filter in band-pass
/// configuration, operating on real-valued audio.
///
/// Coefficient derivation and the `ic1eq`/`ic2eq` integrator-state pattern
/// follow the standard TPT SVF derivation; this variant only ever runs one
/// channel (one scan channel = one mono audio stream) and exposes band-pass
/// rather than low-pass output.
#[derive(Debug, Clone, Copy)]
pub struct BandPassFilter {
    g: f64,
    k: f64,
    a1: f64,
    a2: f64,
    a3: f64,
    ic1eq: f64,
    ic2eq: f64,
}

impl BandPassFilter {
    /// `low_hz`/`high_hz` are the band edges; `q` controls transition
    /// steepness (the filter's resonance parameter).
    pub fn new(low_hz: f64, high_hz: f64, sample_rate: f64) -> Self {
        let center = (low_hz * high_hz).sqrt();
        let bandwidth = (high_hz - low_hz).max(1.0);
        let q = (center / bandwidth).max(0.5);
        let g = (std::f64::consts::PI * center / sample_rate).tan();
        let k = 1.0 / q;
        let a1 = 1.0 / (1.0 + g * (g + k));
        let a2 = g * a1;
        let a3 = g * a2;
        Self {
            g,
            k,
            a1,
            a2,
            a3,
            ic1eq: 0.0,
            ic2eq: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        let v3 = x - self.ic2eq;
        let v1 = self.a1 * self.ic1eq + self.a2 * v3;
        let v2 = self.ic2eq + self.a2 * self.ic1eq + self.a3 * v3;
        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;
        // band-pass output
        self.k * v1
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}

/// Converts a decibel value to a linear amplitude ratio, `10^(db/20)`.
#[inline]
pub fn db_to_linear<S: Sample>(db: S) -> S {
    S::from_f64(10.0_f64.powf(db.to_f64() / 20.0))
}

/// Converts a linear amplitude to decibels full-scale, clamping silence to
/// a floor instead of producing `-inf`.
#[inline]
pub fn linear_to_dbfs(linear: f64) -> f64 {
    const FLOOR_DB: f64 = -200.0;
    if linear <= 0.0 {
        FLOOR_DB
    } else {
        (20.0 * linear.log10()).max(FLOOR_DB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_round_trip() {
        let linear: f32 = db_to_linear(-6.0206);
        assert!((linear - 0.5).abs() < 0.001);
        assert!((linear_to_dbfs(linear as f64) - (-6.0206)).abs() < 0.01);
    }

    #[test]
    fn one_pole_settles_to_input() {
        let mut f = OnePole::new(0.1);
        let mut last = 0.0;
        for _ in 0..500 {
            last = f.step(1.0);
        }
        assert!((last - 1.0).abs() < 1e-3);
    }

    #[test]
    fn band_pass_attenuates_dc() {
        let mut bp = BandPassFilter::new(200.0, 3500.0, 8000.0);
        let mut last = 0.0;
        for _ in 0..2000 {
            last = bp.process(1.0);
        }
        assert!(last.abs() < 0.05);
    }

    #[test]
    fn band_pass_passes_tone_in_band() {
        let mut bp = BandPassFilter::new(200.0, 3500.0, 8000.0);
        let freq = 1000.0;
        let mut energy = 0.0;
        for i in 0..4000 {
            let x = (2.0 * std::f64::consts::PI * freq * i as f64 / 8000.0).sin();
            let y = bp.process(x);
            if i > 2000 {
                energy += y * y;
            }
        }
        assert!(energy > 100.0);
    }
}
