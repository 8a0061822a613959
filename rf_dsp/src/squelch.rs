//! Power squelch on the translated complex IQ stream.

use num_complex::Complex32;

use crate::{constants::SQUELCH_TC, filters::OnePole};

/// Tracks mean power of a complex stream through a one-pole IIR and reports
/// whether it currently exceeds a dBFS threshold.
///
/// The IIR time constant is fixed at [`SQUELCH_TC`] per the receiver's
/// frontend description; only the threshold is per-channel.
#[derive(Debug, Clone)]
pub struct PowerSquelch {
    power: OnePole,
    threshold_dbfs: f64,
}

impl PowerSquelch {
    pub fn new(threshold_dbfs: f64, sample_rate: f64) -> Self {
        Self {
            power: OnePole::new(crate::filters::tc_to_alpha(SQUELCH_TC, sample_rate)),
            threshold_dbfs,
        }
    }

    pub fn set_threshold(&mut self, threshold_dbfs: f64) {
        self.threshold_dbfs = threshold_dbfs;
    }

    /// Feeds one complex sample and returns the smoothed power in dBFS.
    #[inline]
    pub fn process(&mut self, sample: Complex32) -> f64 {
        let power = (sample.norm_sqr()) as f64;
        let smoothed = self.power.step(power);
        crate::filters::linear_to_dbfs(smoothed.sqrt())
    }

    #[inline]
    pub fn is_open(&self, power_dbfs: f64) -> bool {
        power_dbfs >= self.threshold_dbfs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squelch_closed_on_silence() {
        let mut sq = PowerSquelch::new(-40.0, 48_000.0);
        let mut last = -200.0;
        for _ in 0..2000 {
            last = sq.process(Complex32::new(0.0, 0.0));
        }
        assert!(!sq.is_open(last));
    }

    #[test]
    fn squelch_opens_above_threshold() {
        let mut sq = PowerSquelch::new(-20.0, 48_000.0);
        let mut last = -200.0;
        for _ in 0..2000 {
            last = sq.process(Complex32::new(1.0, 0.0));
        }
        assert!(sq.is_open(last));
    }
}
