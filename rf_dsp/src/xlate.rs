//! Frequency-translating decimator: the common frontend of every channel
//! mode, shifting a channel's offset to DC and decimating to an
//! intermediate complex rate.

use num_complex::Complex32;

use crate::filters::OnePole;

/// Mixes a complex stream down by `offset_hz` with an NCO, low-pass
/// filters it to avoid aliasing, and decimates by an integer factor.
///
/// Decimation factors of 8 or more can be split into two stages to spread
/// CPU cost; this implementation keeps a single complex one-pole
/// anti-alias filter per stage and chains two instances when the caller
/// needs two-stage decimation, rather than building a dedicated two-stage
/// type.
pub struct FreqXlatingDecimator {
    phase: f64,
    phase_inc: f64,
    lp_i: OnePole,
    lp_q: OnePole,
    decimation: usize,
    counter: usize,
}

impl FreqXlatingDecimator {
    pub fn new(offset_hz: f64, rf_sample_rate: f64, decimation: usize) -> Self {
        let out_rate = rf_sample_rate / decimation as f64;
        // anti-alias cutoff just under the output Nyquist
        let alpha = crate::filters::tc_to_alpha(1.0 / (out_rate * std::f64::consts::PI), rf_sample_rate);
        Self {
            phase: 0.0,
            phase_inc: -2.0 * std::f64::consts::PI * offset_hz / rf_sample_rate,
            lp_i: OnePole::new(alpha),
            lp_q: OnePole::new(alpha),
            decimation: decimation.max(1),
            counter: 0,
        }
    }

    /// Feeds one RF-rate complex sample. Returns `Some(sample)` on the
    /// decimation boundary, `None` otherwise.
    #[inline]
    pub fn process(&mut self, sample: Complex32) -> Option<Complex32> {
        let (s, c) = self.phase.sin_cos();
        let mixed = sample * Complex32::new(c as f32, s as f32);
        self.phase += self.phase_inc;
        if self.phase > std::f64::consts::PI {
            self.phase -= 2.0 * std::f64::consts::PI;
        } else if self.phase < -std::f64::consts::PI {
            self.phase += 2.0 * std::f64::consts::PI;
        }

        let i = self.lp_i.step(mixed.re as f64);
        let q = self.lp_q.step(mixed.im as f64);

        self.counter += 1;
        if self.counter >= self.decimation {
            self.counter = 0;
            Some(Complex32::new(i as f32, q as f32))
        } else {
            None
        }
    }
}

/// Splits a total decimation factor into `(xlat, inter)` stages: when
/// `total >= 8` and it factors with `inter > 1`, split it two ways;
/// otherwise a single stage handles everything.
pub fn split_decimation(total: usize) -> (usize, usize) {
    if total < 8 {
        return (total, 1);
    }
    for xlat in (2..=((total as f64).sqrt() as usize + 1)).rev() {
        if total % xlat == 0 {
            let inter = total / xlat;
            if inter > 1 {
                return (xlat, inter);
            }
        }
    }
    (total, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimates_by_requested_factor() {
        let mut dec = FreqXlatingDecimator::new(0.0, 48_000.0, 4);
        let mut outputs = 0;
        for _ in 0..400 {
            if dec.process(Complex32::new(1.0, 0.0)).is_some() {
                outputs += 1;
            }
        }
        assert_eq!(outputs, 100);
    }

    #[test]
    fn split_decimation_below_eight_is_single_stage() {
        assert_eq!(split_decimation(4), (4, 1));
    }

    #[test]
    fn split_decimation_factors_large_values() {
        let (xlat, inter) = split_decimation(32);
        assert_eq!(xlat * inter, 32);
        assert!(inter > 1);
    }
}
