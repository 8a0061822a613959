//! One receiver worker child process as seen by the supervisor: config,
//! current window, control pipe, process handle, advertised rates.

use std::{
    io::{BufReader, Write},
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    sync::mpsc,
};

use anyhow::{Context, Result};
use rf_core::ipc::{ReceiverCommand, ReceiverEvent};
use tracing::error;

pub struct ReceiverHandle {
    pub receiver_id: String,
    pub ring_path: PathBuf,
    child: Child,
    stdin: std::process::ChildStdin,
    events: mpsc::Receiver<ReceiverEvent>,
    pub advertised_rates: Vec<u32>,
    pub current_window_id: Option<String>,
}

impl ReceiverHandle {
    pub fn spawn(binary: &Path, receiver_id: String, ring_path: PathBuf) -> Result<Self> {
        let mut child = Command::new(binary)
            .arg("--ring-path")
            .arg(&ring_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .with_context(|| format!("spawning receiver worker {receiver_id}"))?;

        let stdin = child.stdin.take().context("receiver worker stdin not piped")?;
        let stdout = child.stdout.take().context("receiver worker stdout not piped")?;

        let (tx, events) = mpsc::channel();
        let reader_label = receiver_id.clone();
        std::thread::spawn(move || {
            let mut reader = BufReader::new(stdout);
            loop {
                match rf_core::ipc::read_frame::<_, ReceiverEvent>(&mut reader) {
                    Ok(Some(event)) => {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        error!("receiver {reader_label} event pipe decode error: {e}");
                        break;
                    }
                }
            }
        });

        Ok(Self {
            receiver_id,
            ring_path,
            child,
            stdin,
            events,
            advertised_rates: Vec::new(),
            current_window_id: None,
        })
    }

    pub fn send(&mut self, command: &ReceiverCommand) -> Result<()> {
        rf_core::ipc::write_frame(&mut self.stdin, command).context("writing receiver control frame")?;
        Ok(())
    }

    /// Drains every event currently buffered from the worker without blocking.
    pub fn drain_events(&mut self) -> Vec<ReceiverEvent> {
        self.events.try_iter().collect()
    }

    pub fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    pub fn kill(&mut self) {
        let _ = self.send(&ReceiverCommand::Kill);
        let _ = self.stdin.flush();
        let _ = self.child.wait();
    }
}
