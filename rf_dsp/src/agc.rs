//! Automatic gain control stages used by the AM and SSB demodulators.

use crate::filters::OnePole;

/// Feed-forward AGC: tracks a running average magnitude over `window_s` and
/// scales towards `reference` before the next stage.
///
/// Grounded on the AM chain's description: a single symmetric one-pole
/// average, not an attack/decay pair.
#[derive(Debug, Clone, Copy)]
pub struct FeedForwardAgc {
    envelope: OnePole,
    reference: f64,
}

impl FeedForwardAgc {
    pub fn new(window_s: f64, reference: f64, sample_rate: f64) -> Self {
        let alpha = crate::filters::tc_to_alpha(window_s, sample_rate);
        Self {
            envelope: OnePole::new(alpha),
            reference,
        }
    }

    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        let level = self.envelope.step(x.abs()).max(1e-9);
        x * (self.reference / level)
    }
}

/// Attack/decay AGC with an explicit gain ceiling, used by the USB/LSB
/// chain ("AGC-2" in the original receiver).
#[derive(Debug, Clone, Copy)]
pub struct AttackDecayAgc {
    attack: f64,
    decay: f64,
    reference: f64,
    max_gain: f64,
    level: f64,
    gain: f64,
}

impl AttackDecayAgc {
    pub fn new(attack: f64, decay: f64, reference: f64, max_gain: f64) -> Self {
        Self {
            attack,
            decay,
            reference,
            max_gain,
            level: reference,
            gain: 1.0,
        }
    }

    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        let mag = x.abs();
        let alpha = if mag > self.level { self.attack } else { self.decay };
        self.level += alpha * (mag - self.level);
        self.gain = (self.reference / self.level.max(1e-9)).min(self.max_gain);
        x * self.gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_forward_agc_normalizes_toward_reference() {
        let mut agc = FeedForwardAgc::new(0.2, 0.5, 8000.0);
        let mut last = 0.0;
        for _ in 0..20_000 {
            last = agc.process(2.0);
        }
        assert!((last.abs() - 0.5).abs() < 0.05);
    }

    #[test]
    fn attack_decay_agc_clamps_to_max_gain() {
        let mut agc = AttackDecayAgc::new(0.1, 1e-4, 0.05, 3.0);
        let mut last = 0.0;
        for _ in 0..10 {
            last = agc.process(0.001);
        }
        assert!(last.abs() <= 0.001 * 3.0 + 1e-6);
    }
}
