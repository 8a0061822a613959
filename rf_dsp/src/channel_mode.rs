//! The channel demodulation mode and the EAS tone-trigger state machine.

use serde::{Deserialize, Serialize};

use crate::constants::{BFM_EAS_TONES_HZ, EAS_TRIGGER_FRAMES, NOAA_EAS_TONES_HZ};

/// Demodulation mode, a closed set per channel configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelMode {
    Fm,
    Nfm,
    Am,
    Usb,
    Lsb,
    NoaaEas,
    BfmEas,
}

impl ChannelMode {
    pub fn is_eas(self) -> bool {
        matches!(self, ChannelMode::NoaaEas | ChannelMode::BfmEas)
    }

    pub fn eas_tone_bins_hz(self) -> &'static [f64] {
        match self {
            ChannelMode::NoaaEas => NOAA_EAS_TONES_HZ,
            ChannelMode::BfmEas => BFM_EAS_TONES_HZ,
            _ => &[],
        }
    }

    /// Fixed loudness-normalization factor applied on top of the channel's
    /// configured gain, per mode.
    pub fn fixed_gain_factor(self) -> f64 {
        match self {
            ChannelMode::Am => 3.0,
            ChannelMode::Usb | ChannelMode::Lsb => 50.0,
            _ => 1.0,
        }
    }
}

/// Tracks the EAS tone-detector's 3-consecutive-frame trigger and the
/// post-trigger dwell that follows the last positive frame.
#[derive(Debug, Clone)]
pub struct EasGate {
    consecutive_positive: u32,
    open: bool,
    seconds_since_last_positive: f64,
    dwell_s: f64,
}

impl EasGate {
    pub fn new(dwell_s: f64) -> Self {
        Self {
            consecutive_positive: 0,
            open: false,
            seconds_since_last_positive: f64::INFINITY,
            dwell_s,
        }
    }

    pub fn set_dwell(&mut self, dwell_s: f64) {
        self.dwell_s = dwell_s;
    }

    /// Feeds one tone-detector frame result and advances elapsed time by
    /// `frame_period_s`. Returns whether the gate is open after this frame.
    pub fn advance(&mut self, tone_present: bool, frame_period_s: f64) -> bool {
        if tone_present {
            self.consecutive_positive += 1;
            self.seconds_since_last_positive = 0.0;
            if self.consecutive_positive >= EAS_TRIGGER_FRAMES {
                self.open = true;
            }
        } else {
            self.consecutive_positive = 0;
            self.seconds_since_last_positive += frame_period_s;
        }

        if self.open && self.seconds_since_last_positive > self.dwell_s {
            self.open = false;
        }
        self.open
    }

    /// Non-zero but below the trigger threshold: the channel is "warming
    /// up" towards Active but hasn't crossed it yet.
    pub fn is_warming(&self) -> bool {
        self.consecutive_positive > 0 && self.consecutive_positive < EAS_TRIGGER_FRAMES
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eas_trigger_opens_on_third_frame_and_holds_for_dwell() {
        let mut gate = EasGate::new(5.0);

        assert!(!gate.advance(true, 0.03)); // t=0.10, 1st positive
        assert!(!gate.advance(true, 0.03)); // t=0.13, 2nd positive (still warming)
        assert!(gate.is_warming());
        assert!(gate.advance(true, 0.04)); // t=0.17, 3rd positive -> opens

        // t=0.20: no tone. Gate stays open through the dwell window.
        assert!(gate.advance(false, 0.03));
        assert!(gate.is_open());
    }

    #[test]
    fn eas_gate_closes_after_dwell_elapses() {
        let mut gate = EasGate::new(0.1);
        gate.advance(true, 0.03);
        gate.advance(true, 0.03);
        assert!(gate.advance(true, 0.03));

        assert!(gate.advance(false, 0.2));
        assert!(!gate.is_open());
    }
}
