//! The audio mixer child process as seen by the supervisor: a one-way
//! control pipe (`AddRing`/`RemoveRing`/`Kill`) and a liveness check.

use std::{
    path::Path,
    process::{Child, Command, Stdio},
};

use anyhow::{Context, Result};
use rf_core::ipc::MixerCommand;

pub struct MixerHandle {
    child: Child,
    stdin: std::process::ChildStdin,
}

impl MixerHandle {
    pub fn spawn(binary: &Path, config_path: &Path, audio_sample_rate: u32) -> Result<Self> {
        let mut child = Command::new(binary)
            .arg("--config")
            .arg(config_path)
            .arg("--audio-sample-rate")
            .arg(audio_sample_rate.to_string())
            .stdin(Stdio::piped())
            .spawn()
            .context("spawning mixer process")?;
        let stdin = child.stdin.take().context("mixer stdin not piped")?;
        Ok(Self { child, stdin })
    }

    pub fn send(&mut self, command: &MixerCommand) -> Result<()> {
        rf_core::ipc::write_frame(&mut self.stdin, command).context("writing mixer control frame")?;
        Ok(())
    }

    pub fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    pub fn kill(&mut self) {
        let _ = self.send(&MixerCommand::Kill);
        let _ = self.child.wait();
    }
}
