//! # rf_mixer
//!
//! The mixer process: attaches to every receiver's shared-memory ring,
//! sums and saturates their streams into a single mono int16 feed, and
//! fans that feed out to whichever sinks the configuration enabled. Ring
//! attach/detach and shutdown cross on stdin as length-prefixed JSON
//! `MixerCommand` frames, matching `rf_receiver`'s control-pipe framing.

mod mixer;
mod sinks;

use std::{
    io::{self, BufReader},
    path::PathBuf,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use rf_config::OutputConfig;
use rf_core::{RingConsumer, ipc::MixerCommand};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::{
    mixer::Mixer,
    sinks::{IcecastSink, LocalSink, Sink, UdpSink, WebSocketSink},
};

const TICK: Duration = Duration::from_millis(1);

#[derive(Parser, Debug)]
#[command(name = "rf_mixer")]
#[command(about = "Scanner audio mixer: sums receiver rings into one output feed")]
struct Args {
    /// Path to the scanner's YAML configuration, read only for its `outputs` section.
    #[arg(long)]
    config: PathBuf,

    /// Mono sample rate of the mixed output stream.
    #[arg(long, default_value_t = rf_dsp::constants::AUDIO_SAMPLERATE)]
    audio_sample_rate: u32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).init();

    let args = Args::parse();
    let config = rf_config::load(&args.config).context("loading scanner configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread().worker_threads(1).enable_all().build()?;
    let sinks = build_sinks(&config.outputs, args.audio_sample_rate, &runtime)?;
    let mut mixer = Mixer::new(args.audio_sample_rate, sinks);

    let (command_tx, command_rx) = std::sync::mpsc::channel::<MixerCommand>();
    std::thread::spawn(move || {
        let stdin = io::stdin();
        let mut reader = BufReader::new(stdin.lock());
        loop {
            match rf_core::ipc::read_frame::<_, MixerCommand>(&mut reader) {
                Ok(Some(command)) => {
                    if command_tx.send(command).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    error!("control pipe decode error: {e}");
                    break;
                }
            }
        }
    });

    info!("mixer ready");
    loop {
        while let Ok(command) = command_rx.try_recv() {
            match command {
                MixerCommand::AddRing { receiver_id, ring_path } => match RingConsumer::attach(std::path::Path::new(&ring_path)) {
                    Ok(consumer) => mixer.add_ring(receiver_id, consumer),
                    Err(e) => warn!("failed to attach ring for {receiver_id}: {e}"),
                },
                MixerCommand::RemoveRing { receiver_id } => mixer.remove_ring(&receiver_id),
                MixerCommand::Kill => {
                    info!("received kill command, exiting");
                    return Ok(());
                }
            }
        }

        mixer.tick();
        std::thread::sleep(TICK);
    }
}

fn build_sinks(outputs: &[OutputConfig], audio_sample_rate: u32, runtime: &tokio::runtime::Runtime) -> Result<Vec<Box<dyn Sink>>> {
    let mut sinks: Vec<Box<dyn Sink>> = Vec::new();
    for output in outputs {
        match output {
            OutputConfig::Local => sinks.push(Box::new(LocalSink::new(audio_sample_rate))),
            OutputConfig::Udp { server_ip, server_port } => {
                sinks.push(Box::new(UdpSink::new(server_ip.clone(), *server_port)))
            }
            OutputConfig::Icecast { url, password } => {
                sinks.push(Box::new(IcecastSink::new(url.clone(), password.clone())))
            }
            OutputConfig::WebSocket { host, port } => {
                let (tx, _rx) = broadcast::channel(64);
                let bind_addr = format!("{host}:{port}");
                let server_tx = tx.clone();
                runtime.spawn(async move {
                    if let Err(e) = run_websocket_broadcast(bind_addr, server_tx).await {
                        error!("websocket sink server failed: {e}");
                    }
                });
                sinks.push(Box::new(WebSocketSink::new(tx, audio_sample_rate)));
            }
        }
    }
    Ok(sinks)
}

/// A minimal accept loop that upgrades every connection to a websocket and
/// streams it every frame the mixer broadcasts; no incoming messages are
/// expected or read from these listeners.
async fn run_websocket_broadcast(bind_addr: String, tx: broadcast::Sender<Vec<u8>>) -> anyhow::Result<()> {
    use futures_util::SinkExt;
    use tokio::net::TcpListener;

    let listener = TcpListener::bind(&bind_addr).await.with_context(|| format!("binding websocket sink on {bind_addr}"))?;
    loop {
        let (stream, _) = listener.accept().await?;
        let mut rx = tx.subscribe();
        tokio::spawn(async move {
            let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else { return };
            while let Ok(frame) = rx.recv().await {
                if ws.send(tokio_tungstenite::tungstenite::Message::Binary(frame)).await.is_err() {
                    break;
                }
            }
        });
    }
}
