//! The receiver worker's state machine: `Idle -> RunningWindow -> Idle`.

use std::time::Instant;

use num_complex::Complex32;
use rf_core::{
    RingProducer,
    ipc::{ReceiverCommand, ReceiverEvent, WindowSpec},
};
use rf_dsp::{ChannelBuildParams, ChannelMode, ChannelPolicy, DspChannel, ScanWindow};
use tracing::{info, warn};

use crate::source::IqSource;

const RF_BLOCK_LEN: usize = 4096;

#[derive(Debug, PartialEq, Eq)]
enum State {
    Idle,
    RunningWindow,
}

pub struct ReceiverWorker {
    source: Box<dyn IqSource>,
    ring: RingProducer,
    state: State,
    window: Option<ScanWindow>,
    deadline: Option<Instant>,
    iq_buf: Vec<Complex32>,
    audio_buf: Vec<f32>,
}

impl ReceiverWorker {
    pub fn new(source: Box<dyn IqSource>, ring: RingProducer) -> Self {
        Self {
            source,
            ring,
            state: State::Idle,
            window: None,
            deadline: None,
            iq_buf: vec![Complex32::new(0.0, 0.0); RF_BLOCK_LEN],
            audio_buf: Vec::with_capacity(RF_BLOCK_LEN),
        }
    }

    pub fn advertised_rates(&self) -> Vec<u32> {
        self.source.sample_rates()
    }

    /// Applies one command from the control pipe. Returns `true` if the
    /// worker should exit (a `Kill`).
    pub fn apply_command(&mut self, command: ReceiverCommand) -> bool {
        match command {
            ReceiverCommand::Config { .. } => {}
            ReceiverCommand::ScanWindow { window } => self.start_window(window),
            ReceiverCommand::ChannelMute { channel_id, muted } => self.with_channel(&channel_id, |c| c.set_mute(muted)),
            ReceiverCommand::ChannelSolo { channel_id, solo } => self.with_channel(&channel_id, |c| c.set_solo(solo)),
            ReceiverCommand::ChannelHold { channel_id, hold } => self.with_channel(&channel_id, |c| c.set_hold(hold)),
            ReceiverCommand::ChannelForceActive { channel_id, force_active } => {
                self.with_channel(&channel_id, |c| c.set_force_active(force_active))
            }
            ReceiverCommand::Kill => return true,
        }
        false
    }

    fn with_channel(&mut self, channel_id: &str, f: impl FnOnce(&mut DspChannel)) {
        if let Some(window) = &mut self.window {
            if let Some(channel) = window.channels_mut().iter_mut().find(|c| c.id == channel_id) {
                f(channel);
            }
        }
    }

    fn start_window(&mut self, spec: WindowSpec) {
        if self.state != State::Idle {
            warn!("scan_window received while not idle; ignoring");
            return;
        }
        self.source.tune(spec.hardware_freq_hz, spec.rf_sample_rate);
        let rf_sample_rate = spec.rf_sample_rate as f64;
        let audio_sample_rate = spec.audio_sample_rate as f64;

        let channels: Vec<DspChannel> = spec
            .channels
            .iter()
            .filter_map(|c| {
                let params = ChannelBuildParams {
                    id: c.id.clone(),
                    label: c.label.clone(),
                    freq_hz: c.freq_hz,
                    hardware_freq_hz: spec.hardware_freq_hz,
                    mode: parse_mode(&c.mode),
                    rf_sample_rate,
                    audio_sample_rate,
                };
                let policy = ChannelPolicy {
                    audio_gain_db: c.audio_gain_db,
                    squelch_threshold_dbfs: c.squelch_threshold_dbfs,
                    dwell_s: c.dwell_time_s,
                    muted: c.muted,
                    solo: c.solo,
                    hold: c.hold,
                    force_active: c.force_active,
                };
                match DspChannel::new(params, policy) {
                    Ok(channel) => Some(channel),
                    Err(e) => {
                        warn!(channel_id = %c.id, "dropping channel from window: {e}");
                        None
                    }
                }
            })
            .collect();

        let window = ScanWindow::new(spec.id.clone(), spec.hardware_freq_hz, rf_sample_rate, audio_sample_rate, channels);
        self.deadline = Some(Instant::now() + std::time::Duration::from_secs_f64(window.minimum_scan_time_s()));
        self.window = Some(window);
        self.state = State::RunningWindow;
        info!(window_id = %spec.id, "scan window started");
    }

    /// One iteration of the worker's sample-processing loop. Returns the
    /// events that should be written to the event pipe this tick.
    pub fn tick(&mut self, dt_s: f64) -> Vec<ReceiverEvent> {
        let mut events = Vec::new();
        let State::RunningWindow = self.state else { return events };
        let Some(window) = &mut self.window else { return events };

        let n = self.source.read(&mut self.iq_buf);
        self.audio_buf.clear();
        let mut status_events = Vec::new();
        window.process_block(&self.iq_buf[..n], dt_s, &mut self.audio_buf, &mut status_events);

        if !self.audio_buf.is_empty() {
            self.ring.write(&self.audio_buf, true);
        }
        for event in status_events {
            events.push(ReceiverEvent::ChannelStatus {
                channel_id: event.channel_id,
                status: format!("{:?}", event.status),
                rssi_dbfs: event.rssi_dbfs,
                noise_floor_dbfs: event.noise_floor_dbfs,
                volume_dbfs: event.volume_dbfs,
            });
        }

        let past_deadline = self.deadline.map(|d| Instant::now() >= d).unwrap_or(false);
        if !window.is_active() && past_deadline {
            let window_id = window.id.clone();
            self.window = None;
            self.deadline = None;
            self.state = State::Idle;
            events.push(ReceiverEvent::WindowDone { window_id });
        }

        events
    }
}

fn parse_mode(raw: &str) -> ChannelMode {
    match raw {
        "Nfm" => ChannelMode::Nfm,
        "Am" => ChannelMode::Am,
        "Usb" => ChannelMode::Usb,
        "Lsb" => ChannelMode::Lsb,
        "NoaaEas" => ChannelMode::NoaaEas,
        "BfmEas" => ChannelMode::BfmEas,
        _ => ChannelMode::Fm,
    }
}
