//! # rf_supervisor
//!
//! The scanner's orchestration process: loads configuration, spawns one
//! `rf_receiver` child per configured hardware receiver and one `rf_mixer`
//! child for the output stage, runs the scheduling main loop, and
//! optionally hosts a remote-control WebSocket bridge.

mod ledger;
mod mixer_handle;
mod receiver_handle;
mod windowspec;

use std::{
    path::PathBuf,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use clap::Parser;
use rf_config::ScannerConfig;
use rf_core::ipc::{MixerCommand, ReceiverCommand, ReceiverEvent};
use rf_net::{ClientMessage, ServerMessage, WsServer, WsServerConfig};
use rf_plan::{Scheduler, build_windows};
use tracing::{error, info, warn};

use crate::{ledger::ChannelLedger, mixer_handle::MixerHandle, receiver_handle::ReceiverHandle, windowspec::{build_window_spec, pick_rf_sample_rate}};

const EDGE_MARGIN_HZ: f64 = 200_000.0;
const TICK: Duration = Duration::from_millis(1);
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(name = "rf_supervisor")]
#[command(about = "Scanner supervisor: drives receiver workers and the audio mixer")]
struct Args {
    /// Path to the scanner's YAML configuration.
    #[arg(long)]
    config: PathBuf,

    /// Host interface for the optional remote-control WebSocket bridge.
    #[arg(long)]
    control_ws_host: Option<String>,

    /// Port for the optional remote-control WebSocket bridge.
    #[arg(long, default_value_t = 8080)]
    control_ws_port: u16,

    /// Path to the `rf_receiver` binary (defaults to the one alongside this process).
    #[arg(long, default_value = "rf_receiver")]
    receiver_binary: PathBuf,

    /// Path to the `rf_mixer` binary (defaults to the one alongside this process).
    #[arg(long, default_value = "rf_mixer")]
    mixer_binary: PathBuf,
}

fn unix_now() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("fatal supervisor error: {e}");
            Err(e)
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config: ScannerConfig = rf_config::load(&args.config).context("loading scanner configuration")?;
    let scratch_dir = tempfile::tempdir().context("creating scratch directory for shared-memory rings")?;

    let mut receivers = Vec::with_capacity(config.receivers.len());
    for rc in &config.receivers {
        let ring_path = scratch_dir.path().join(format!("ring-{}.bin", rc.id));
        rf_core::ring::create(&ring_path, rf_dsp::constants::AUDIO_SAMPLERATE as usize).context("creating shared-memory ring")?;
        let handle = ReceiverHandle::spawn(&args.receiver_binary, rc.id.clone(), ring_path)?;
        receivers.push(handle);
    }

    // Startup handshake: block briefly for each receiver's first `sample_rates` event.
    for receiver in &mut receivers {
        let deadline = Instant::now() + HANDSHAKE_TIMEOUT;
        while Instant::now() < deadline {
            let events = receiver.drain_events();
            if let Some(ReceiverEvent::SampleRates { rates }) = events.into_iter().find(|e| matches!(e, ReceiverEvent::SampleRates { .. })) {
                receiver.advertised_rates = rates;
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        if receiver.advertised_rates.is_empty() {
            warn!(receiver_id = %receiver.receiver_id, "no sample_rates handshake received within timeout");
        }
    }

    let bandwidth_hz = receivers
        .iter()
        .map(|r| {
            r.advertised_rates
                .iter()
                .copied()
                .filter(|&rate| rate <= rf_dsp::constants::MAX_RF_SAMPLERATE)
                .max()
                .unwrap_or(rf_dsp::constants::MAX_RF_SAMPLERATE) as f64
        })
        .fold(f64::INFINITY, f64::min);
    let bandwidth_hz = if bandwidth_hz.is_finite() { bandwidth_hz } else { rf_dsp::constants::MAX_RF_SAMPLERATE as f64 };

    let mut mixer = MixerHandle::spawn(&args.mixer_binary, &args.config, rf_dsp::constants::AUDIO_SAMPLERATE).context("spawning mixer")?;
    for receiver in &receivers {
        mixer.send(&MixerCommand::AddRing {
            receiver_id: receiver.receiver_id.clone(),
            ring_path: receiver.ring_path.display().to_string(),
        })?;
    }

    let mut ledger = ChannelLedger::new(config.channels.clone());
    let mut windows = build_windows(&ledger.enabled_channels(unix_now()), bandwidth_hz, config.max_channels_per_window, EDGE_MARGIN_HZ);
    let mut scheduler = Scheduler::new(windows.clone(), receivers.len());

    let (command_tx, command_rx) = std::sync::mpsc::channel::<ClientMessage>();
    let ws_event_tx = args.control_ws_host.map(|host| spawn_control_bridge(host, args.control_ws_port, command_tx));

    info!(num_receivers = receivers.len(), "supervisor ready");
    let mut stop = false;
    while !stop {
        let now = unix_now();
        let mut config_dirty = false;

        while let Ok(client_cmd) = command_rx.try_recv() {
            let (dirty, receiver_commands) = ledger.apply(client_cmd);
            config_dirty |= dirty;
            for command in &receiver_commands {
                broadcast_receiver_command(&mut receivers, command);
            }
        }

        if ledger.reenable_expired(now) {
            config_dirty = true;
        }

        if config_dirty {
            windows = build_windows(&ledger.enabled_channels(now), bandwidth_hz, config.max_channels_per_window, EDGE_MARGIN_HZ);
            scheduler = Scheduler::new(windows.clone(), receivers.len());
            publish(&ws_event_tx, ServerMessage::ScanWindowConfigsChanged);
        }

        for (receiver_idx, window_id) in scheduler.assign_idle_receivers() {
            let Some(plan) = windows.iter().find(|w| w.id == window_id) else { continue };
            let channel_configs: Vec<_> = ledger.enabled_channels(now);
            let rf_sample_rate = match pick_rf_sample_rate(&receivers[receiver_idx].advertised_rates, plan.bandwidth_hz) {
                Ok(rate) => rate,
                Err(e) => {
                    error!(%window_id, "window cannot be built: {e}");
                    scheduler.window_done(receiver_idx, now);
                    continue;
                }
            };
            let spec = build_window_spec(plan, &channel_configs, rf_sample_rate, rf_dsp::constants::AUDIO_SAMPLERATE);
            let receiver_id = receivers[receiver_idx].receiver_id.clone();
            if let Err(e) = receivers[receiver_idx].send(&ReceiverCommand::ScanWindow { window: spec }) {
                error!("failed to dispatch scan_window to {receiver_id}: {e}");
                continue;
            }
            receivers[receiver_idx].current_window_id = Some(window_id.clone());
            publish(&ws_event_tx, ServerMessage::ScanWindowStart { window_id, receiver_id });
        }

        for receiver_idx in 0..receivers.len() {
            let events = receivers[receiver_idx].drain_events();
            for event in events {
                match event {
                    ReceiverEvent::SampleRates { rates } => receivers[receiver_idx].advertised_rates = rates,
                    ReceiverEvent::WindowDone { window_id } => {
                        scheduler.window_done(receiver_idx, now);
                        receivers[receiver_idx].current_window_id = None;
                        publish(&ws_event_tx, ServerMessage::ScanWindowDone { window_id });
                    }
                    ReceiverEvent::ChannelStatus { channel_id, status, rssi_dbfs, noise_floor_dbfs, volume_dbfs } => {
                        publish(&ws_event_tx, ServerMessage::ChannelStatus { channel_id, status, rssi_dbfs, noise_floor_dbfs, volume_dbfs });
                    }
                    ReceiverEvent::Failed { reason } => {
                        error!(receiver_id = %receivers[receiver_idx].receiver_id, %reason, "receiver worker reported failure");
                        stop = true;
                    }
                }
            }
            if !receivers[receiver_idx].is_alive() {
                error!(receiver_id = %receivers[receiver_idx].receiver_id, "receiver worker process died unexpectedly");
                stop = true;
            }
        }

        if !mixer.is_alive() {
            error!("mixer process died unexpectedly");
            stop = true;
        }

        std::thread::sleep(TICK);
    }

    info!("stopping: tearing down workers and mixer");
    for receiver in &mut receivers {
        receiver.kill();
    }
    mixer.kill();
    Ok(())
}

fn broadcast_receiver_command(receivers: &mut [ReceiverHandle], command: &ReceiverCommand) {
    for receiver in receivers.iter_mut() {
        if let Err(e) = receiver.send(command) {
            warn!(receiver_id = %receiver.receiver_id, "failed to forward command: {e}");
        }
    }
}

fn publish(event_tx: &Option<tokio::sync::broadcast::Sender<ServerMessage>>, message: ServerMessage) {
    if let Some(tx) = event_tx {
        let _ = tx.send(message);
    }
}

/// Spins up a dedicated tokio runtime thread hosting the control
/// WebSocket bridge, and bridges its parsed commands onto the main loop's
/// plain `std::sync::mpsc` queue.
fn spawn_control_bridge(host: String, port: u16, command_tx: std::sync::mpsc::Sender<ClientMessage>) -> tokio::sync::broadcast::Sender<ServerMessage> {
    let (tokio_tx, mut tokio_rx) = tokio::sync::mpsc::channel::<ClientMessage>(256);
    let bind_addr = format!("{host}:{port}").parse().unwrap_or_else(|_| "0.0.0.0:8080".parse().unwrap());
    let server = WsServer::new(WsServerConfig { bind_addr, broadcast_capacity: 1024 }, tokio_tx);
    let event_tx = server.event_sender();

    std::thread::spawn(move || {
        let Ok(runtime) = tokio::runtime::Builder::new_multi_thread().worker_threads(1).enable_all().build() else { return };
        runtime.block_on(async move {
            tokio::spawn(async move {
                while let Some(msg) = tokio_rx.recv().await {
                    if command_tx.send(msg).is_err() {
                        break;
                    }
                }
            });
            if let Err(e) = server.run().await {
                error!("control websocket bridge failed: {e}");
            }
        });
    });

    event_tx
}
