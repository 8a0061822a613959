//! The window planner: a pure greedy sweep over enabled channel
//! frequencies that groups them into the fewest hardware-tunable windows
//! a receiver's bandwidth allows.

use rf_config::ChannelConfig;

/// One planned scan window: a hardware center frequency and the channels
/// that fall inside it. The receiver worker later chooses the concrete RF
/// sample rate from its advertised set; this plan only fixes frequency
/// grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowPlan {
    pub id: String,
    pub hardware_freq_hz: f64,
    pub bandwidth_hz: f64,
    pub channel_ids: Vec<String>,
}

/// Builds the minimal set of windows covering every enabled channel
/// exactly once.
///
/// `bandwidth_hz` is `min over receivers of max(sampleRates <= MAX_RF_SAMPLERATE)`;
/// `edge_margin_hz` is typically fixed at 200 kHz by the caller but left as a
/// parameter for testability.
pub fn build_windows(channels: &[ChannelConfig], bandwidth_hz: f64, max_channels_per_window: usize, edge_margin_hz: f64) -> Vec<WindowPlan> {
    let mut assigned = vec![false; channels.len()];
    let mut windows = Vec::new();
    let mut window_idx = 0;

    loop {
        let next_unassigned = channels
            .iter()
            .enumerate()
            .filter(|(idx, _)| !assigned[*idx])
            .min_by(|(_, a), (_, b)| a.freq_hz.partial_cmp(&b.freq_hz).unwrap());

        let Some((_, lo_channel)) = next_unassigned else { break };
        let f_lo = lo_channel.freq_hz;
        let hardware_freq_hz = f_lo + bandwidth_hz / 2.0 - edge_margin_hz;
        let f_hi = 2.0 * hardware_freq_hz - f_lo;

        let mut matched: Vec<usize> = channels
            .iter()
            .enumerate()
            .filter(|(idx, c)| !assigned[*idx] && c.freq_hz >= f_lo && c.freq_hz <= f_hi)
            .map(|(idx, _)| idx)
            .collect();
        matched.sort_by(|&a, &b| channels[a].freq_hz.partial_cmp(&channels[b].freq_hz).unwrap());
        if matched.len() > max_channels_per_window {
            matched.truncate(max_channels_per_window);
        }

        let channel_ids = matched.iter().map(|&idx| channels[idx].id.clone()).collect();
        for idx in matched {
            assigned[idx] = true;
        }

        windows.push(WindowPlan {
            id: format!("win-{window_idx}"),
            hardware_freq_hz,
            bandwidth_hz,
            channel_ids,
        });
        window_idx += 1;
    }

    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_dsp::ChannelMode;

    fn channel(id: &str, freq_hz: f64) -> ChannelConfig {
        ChannelConfig {
            id: id.into(),
            freq_hz,
            label: id.into(),
            mode: ChannelMode::Fm,
            audio_gain_db: 0.0,
            squelch_threshold_dbfs: -30.0,
            dwell_time_s: 2.0,
            enabled: true,
            muted: false,
            hold: false,
            force_active: false,
            disabled_until: None,
        }
    }

    #[test]
    fn planner_keeps_distant_channel_out_of_single_receiver_window() {
        let channels = vec![
            channel("a", 162_400_000.0),
            channel("b", 162_425_000.0),
            channel("c", 162_550_000.0),
            channel("d", 163_000_000.0),
            channel("e", 165_000_000.0),
        ];

        let windows = build_windows(&channels, 2_048_000.0, 16, 200_000.0);

        assert_eq!(windows.len(), 2);

        let w1 = &windows[0];
        assert!((w1.hardware_freq_hz - 163_224_000.0).abs() < 1.0);
        assert_eq!(w1.channel_ids, vec!["a", "b", "c", "d"]);

        let w2 = &windows[1];
        assert_eq!(w2.channel_ids, vec!["e"]);
    }

    #[test]
    fn every_channel_covered_exactly_once() {
        let channels: Vec<ChannelConfig> = (0..40).map(|i| channel(&format!("c{i}"), 150_000_000.0 + i as f64 * 12_500.0)).collect();
        let windows = build_windows(&channels, 2_048_000.0, 16, 200_000.0);

        let mut seen: Vec<&String> = windows.iter().flat_map(|w| &w.channel_ids).collect();
        seen.sort();
        let mut expected: Vec<&String> = channels.iter().map(|c| &c.id).collect();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn respects_max_channels_per_window() {
        let channels: Vec<ChannelConfig> = (0..20).map(|i| channel(&format!("c{i}"), 150_000_000.0 + i as f64 * 1_000.0)).collect();
        let windows = build_windows(&channels, 2_048_000.0, 5, 200_000.0);
        assert!(windows.iter().all(|w| w.channel_ids.len() <= 5));
    }
}
