//! Channel activity status: the state machine behind each channel's
//! `ChannelStatus` event, plus the metering measurements attached to it.

use serde::{Deserialize, Serialize};

/// A channel's current activity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelStatus {
    Idle,
    Active,
    Dwell,
    Hold,
    ForceActive,
}

/// Metering snapshot attached to a status event. Populated only at the
/// periodic status-update rate, not every sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelMeters {
    pub rssi_dbfs: Option<f64>,
    pub noise_floor_dbfs: Option<f64>,
    pub volume_dbfs: Option<f64>,
}

/// Drives the `Idle -> Active -> Dwell -> Idle` state machine, with
/// `Hold`/`ForceActive` as operator overrides that sit outside that cycle.
///
/// Monotonicity is structural: `Dwell` is only reachable by falling out of
/// `Active` and checking elapsed time against `dwell_s`, so a fresh `Idle`
/// channel can never report `Dwell` without an intervening `Active`.
#[derive(Debug, Clone)]
pub struct StatusTracker {
    current: ChannelStatus,
    last_active_s: Option<f64>,
    dwell_s: f64,
}

impl StatusTracker {
    pub fn new(dwell_s: f64) -> Self {
        Self {
            current: ChannelStatus::Idle,
            last_active_s: None,
            dwell_s,
        }
    }

    pub fn set_dwell(&mut self, dwell_s: f64) {
        self.dwell_s = dwell_s;
    }

    pub fn current(&self) -> ChannelStatus {
        self.current
    }

    /// Advances the state machine. `now_s` is a monotonic clock local to
    /// the owning scan window (elapsed seconds since the window started).
    /// `activity_open` is squelch-open (or, for an EAS channel, the tone
    /// gate being open); `warming` is the EAS-only "trigger counter is
    /// non-zero but below three" condition, which forces `Dwell` even
    /// though `last_active_s` hasn't been set yet.
    ///
    /// Precedence matches the literal status contract:
    /// `ForceActive > Active > Dwell > Hold > Idle`.
    pub fn update(&mut self, now_s: f64, activity_open: bool, warming: bool, hold: bool, force_active: bool) -> ChannelStatus {
        let dwelling = warming || matches!(self.last_active_s, Some(t) if now_s - t < self.dwell_s);

        self.current = if force_active {
            self.last_active_s = Some(now_s);
            ChannelStatus::ForceActive
        } else if activity_open {
            self.last_active_s = Some(now_s);
            ChannelStatus::Active
        } else if dwelling {
            ChannelStatus::Dwell
        } else if hold {
            ChannelStatus::Hold
        } else {
            ChannelStatus::Idle
        };
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Testable Property 9: after a transition to Idle, the channel cannot
    /// return to Dwell without first going through Active.
    #[test]
    fn status_monotonicity_idle_cannot_skip_to_dwell() {
        let mut tracker = StatusTracker::new(1.0);
        assert_eq!(tracker.update(0.0, false, false, false, false), ChannelStatus::Idle);
        // Still idle with no prior activity, regardless of elapsed time.
        assert_eq!(tracker.update(5.0, false, false, false, false), ChannelStatus::Idle);

        assert_eq!(tracker.update(5.0, true, false, false, false), ChannelStatus::Active);
        assert_eq!(tracker.update(5.5, false, false, false, false), ChannelStatus::Dwell);
        assert_eq!(tracker.update(7.0, false, false, false, false), ChannelStatus::Idle);
        // Back to Idle: cannot reach Dwell again without another Active.
        assert_eq!(tracker.update(7.2, false, false, false, false), ChannelStatus::Idle);
    }

    #[test]
    fn force_active_overrides_everything() {
        let mut tracker = StatusTracker::new(1.0);
        assert_eq!(tracker.update(0.0, false, false, false, true), ChannelStatus::ForceActive);
    }

    #[test]
    fn hold_overrides_squelch_closed() {
        let mut tracker = StatusTracker::new(1.0);
        tracker.update(0.0, true, false, false, false);
        // Past the dwell window, so this exercises Hold and not Dwell.
        assert_eq!(tracker.update(2.0, false, false, true, false), ChannelStatus::Hold);
    }

    /// Active takes precedence over Hold: a channel with `hold=true` whose
    /// squelch is currently open must still report Active, not Hold.
    #[test]
    fn active_overrides_hold_when_squelch_open() {
        let mut tracker = StatusTracker::new(1.0);
        assert_eq!(tracker.update(0.0, true, false, true, false), ChannelStatus::Active);
    }

    /// An EAS channel 1-2 frames into a trigger (warming, not yet open)
    /// reports Dwell, not Idle.
    #[test]
    fn eas_warming_reports_dwell_not_idle() {
        let mut tracker = StatusTracker::new(1.0);
        assert_eq!(tracker.update(0.0, false, true, false, false), ChannelStatus::Dwell);
    }
}
