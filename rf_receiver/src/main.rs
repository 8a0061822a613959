//! # rf_receiver
//!
//! One receiver worker process: tunes to a scan window handed down by the
//! supervisor, runs every channel's DSP pipeline against the incoming IQ
//! stream, and writes mixed mono audio to its shared-memory ring. Control
//! commands and status/lifecycle events cross on the process's own
//! stdin/stdout as length-prefixed JSON frames, standing in for the
//! inherited-handles control channel a single-process design would use.

mod source;
mod worker;

use std::{
    io::{self, BufReader},
    path::PathBuf,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use rf_core::{
    RingProducer,
    ipc::{ReceiverCommand, ReceiverEvent},
};
use tracing::{error, info};

use crate::{source::SyntheticSource, worker::ReceiverWorker};

pub(crate) const DEFAULT_RF_SAMPLERATE: u32 = rf_dsp::constants::MAX_RF_SAMPLERATE;
const TICK: Duration = Duration::from_millis(1);

#[derive(Parser, Debug)]
#[command(name = "rf_receiver")]
#[command(about = "Scanner receiver worker: tunes and demodulates one scan window at a time")]
struct Args {
    /// Path to the shared-memory ring file this worker writes audio into.
    #[arg(long)]
    ring_path: PathBuf,

    /// Candidate RF sample rates this (simulated) source advertises.
    #[arg(long, value_delimiter = ',', default_value = "2048000,1024000,256000")]
    rates: Vec<u32>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).init();

    let args = Args::parse();
    let ring = RingProducer::attach(&args.ring_path).context("attaching to shared-memory ring")?;
    let source = Box::new(SyntheticSource::new(args.rates));
    let mut worker = ReceiverWorker::new(source, ring);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    rf_core::ipc::write_frame(&mut out, &ReceiverEvent::SampleRates { rates: worker.advertised_rates() })
        .context("sending startup sample_rates handshake")?;

    let (command_tx, command_rx) = std::sync::mpsc::channel::<ReceiverCommand>();
    std::thread::spawn(move || {
        let stdin = io::stdin();
        let mut reader = BufReader::new(stdin.lock());
        loop {
            match rf_core::ipc::read_frame::<_, ReceiverCommand>(&mut reader) {
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

    info!("receiver worker ready");
    loop {
        while let Ok(command) = command_rx.try_recv() {
            if worker.apply_command(command) {
                info!("received kill command, exiting");
                return Ok(());
            }
        }

        let events = worker.tick(TICK.as_secs_f64());
        for event in events {
            if let Err(e) = rf_core::ipc::write_frame(&mut out, &event) {
                error!("event pipe write error: {e}");
                return Ok(());
            }
        }

        std::thread::sleep(TICK);
    }
}
