//! Receiver scheduler: the least-recently-scanned window ledger the
//! supervisor's main loop consults once per tick to keep every idle
//! receiver pointed at whichever window has gone longest without a scan.

use std::collections::BTreeMap;

use crate::planner::WindowPlan;

/// Per-receiver scheduling state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    Idle,
    Running(usize),
}

/// The scheduling ledger: `last_scanned: window_id -> timestamp` and
/// `assigned: receiver_id -> window_id | none`.
pub struct Scheduler {
    windows: Vec<WindowPlan>,
    last_scanned: BTreeMap<String, f64>,
    receivers: Vec<ReceiverState>,
}

impl Scheduler {
    pub fn new(windows: Vec<WindowPlan>, receiver_count: usize) -> Self {
        let last_scanned = windows.iter().map(|w| (w.id.clone(), 0.0)).collect();
        Scheduler {
            windows,
            last_scanned,
            receivers: vec![ReceiverState::Idle; receiver_count],
        }
    }

    pub fn windows(&self) -> &[WindowPlan] {
        &self.windows
    }

    pub fn receiver_state(&self, receiver_idx: usize) -> ReceiverState {
        self.receivers[receiver_idx]
    }

    fn running_window_ids(&self) -> Vec<&str> {
        self.receivers
            .iter()
            .filter_map(|r| match r {
                ReceiverState::Running(idx) => Some(self.windows[*idx].id.as_str()),
                ReceiverState::Idle => None,
            })
            .collect()
    }

    /// Picks the least-recently-scanned window among those not currently
    /// running on any receiver, ties broken by iteration order (the
    /// windows' original index order).
    fn pick_next_window(&self) -> Option<usize> {
        let running = self.running_window_ids();
        self.windows
            .iter()
            .enumerate()
            .filter(|(_, w)| !running.contains(&w.id.as_str()))
            .min_by(|(_, a), (_, b)| {
                let ta = self.last_scanned[&a.id];
                let tb = self.last_scanned[&b.id];
                ta.partial_cmp(&tb).unwrap()
            })
            .map(|(idx, _)| idx)
    }

    /// Step 3 of the supervisor main loop: for each idle receiver, assign
    /// the least-recently-scanned non-running window. Returns the
    /// `(receiver_idx, window_id)` assignments made this tick, in receiver
    /// order, so the caller can emit `ScanWindowStart` events.
    pub fn assign_idle_receivers(&mut self) -> Vec<(usize, String)> {
        let mut assignments = Vec::new();
        for receiver_idx in 0..self.receivers.len() {
            if self.receivers[receiver_idx] != ReceiverState::Idle {
                continue;
            }
            let Some(window_idx) = self.pick_next_window() else { break };
            self.receivers[receiver_idx] = ReceiverState::Running(window_idx);
            assignments.push((receiver_idx, self.windows[window_idx].id.clone()));
        }
        assignments
    }

    /// Step 4: a receiver reports `window_done(id)` at wall-clock `now`.
    pub fn window_done(&mut self, receiver_idx: usize, now: f64) {
        if let ReceiverState::Running(window_idx) = self.receivers[receiver_idx] {
            self.last_scanned.insert(self.windows[window_idx].id.clone(), now);
        }
        self.receivers[receiver_idx] = ReceiverState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(id: &str) -> WindowPlan {
        WindowPlan {
            id: id.into(),
            hardware_freq_hz: 0.0,
            bandwidth_hz: 2_048_000.0,
            channel_ids: Vec::new(),
        }
    }

    #[test]
    fn scheduler_assigns_least_recently_scanned_window_first() {
        let windows = vec![plan("W1"), plan("W2"), plan("W3")];
        let mut scheduler = Scheduler::new(windows, 2);

        let initial = scheduler.assign_idle_receivers();
        assert_eq!(initial, vec![(0, "W1".to_string()), (1, "W2".to_string())]);

        scheduler.window_done(0, 1.0);
        let next = scheduler.assign_idle_receivers();
        assert_eq!(next, vec![(0, "W3".to_string())]);

        scheduler.window_done(1, 2.0);
        let next = scheduler.assign_idle_receivers();
        assert_eq!(next, vec![(1, "W1".to_string())]);
    }

    #[test]
    fn no_assignment_when_all_windows_running() {
        let windows = vec![plan("W1")];
        let mut scheduler = Scheduler::new(windows, 2);
        let first = scheduler.assign_idle_receivers();
        assert_eq!(first, vec![(0, "W1".to_string())]);
        let second = scheduler.assign_idle_receivers();
        assert!(second.is_empty());
    }
}
