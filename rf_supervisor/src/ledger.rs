//! The channel-config ledger the supervisor owns and mutates on behalf of
//! external commands. Channel configs are kept as plain owned records keyed
//! by id rather than objects a UI could hold long-lived references into.

use rf_config::ChannelConfig;
use rf_core::ipc::ReceiverCommand;
use rf_net::ClientMessage;

/// One channel's full runtime state: its static config plus the tri-state
/// solo bit, which `rf_config::ChannelConfig` has no field for since solo
/// is purely a supervisor-side broadcast concept.
struct ChannelRuntime {
    config: ChannelConfig,
    solo: bool,
}

pub struct ChannelLedger {
    channels: Vec<ChannelRuntime>,
}

impl ChannelLedger {
    pub fn new(channels: Vec<ChannelConfig>) -> Self {
        Self {
            channels: channels.into_iter().map(|config| ChannelRuntime { config, solo: false }).collect(),
        }
    }

    fn index_of(&self, channel_id: &str) -> Option<usize> {
        self.channels.iter().position(|c| c.config.id == channel_id)
    }

    /// The channels currently effectively enabled, for the planner.
    pub fn enabled_channels(&self, now_unix_s: f64) -> Vec<ChannelConfig> {
        self.channels.iter().filter(|c| c.config.effectively_enabled(now_unix_s)).map(|c| c.config.clone()).collect()
    }

    pub fn channel(&self, channel_id: &str) -> Option<ChannelConfig> {
        self.index_of(channel_id).map(|idx| self.channels[idx].config.clone())
    }

    pub fn all(&self) -> impl Iterator<Item = &ChannelConfig> {
        self.channels.iter().map(|c| &c.config)
    }

    /// Re-enables any channel whose `disabled_until` has elapsed. Returns
    /// whether anything changed (the planner's windows may need rebuilding).
    pub fn reenable_expired(&mut self, now_unix_s: f64) -> bool {
        let mut dirty = false;
        for c in &mut self.channels {
            if let Some(until) = c.config.disabled_until {
                if now_unix_s >= until {
                    c.config.disabled_until = None;
                    dirty = true;
                }
            }
        }
        dirty
    }

    /// Applies one client command, returning `(config_dirty, receiver_commands)`.
    /// `config_dirty` means the enabled-channel set changed and the window
    /// plan must be rebuilt; `receiver_commands` are broadcast verbatim to
    /// every receiver process (the receiver that owns the target channel
    /// applies it, others no-op).
    pub fn apply(&mut self, command: ClientMessage) -> (bool, Vec<ReceiverCommand>) {
        match command {
            ClientMessage::ChannelEnable { channel_id, enabled } => {
                let Some(idx) = self.index_of(&channel_id) else { return (false, Vec::new()) };
                let changed = self.channels[idx].config.enabled != enabled;
                self.channels[idx].config.enabled = enabled;
                (changed, Vec::new())
            }
            ClientMessage::ChannelDisableUntil { channel_id, until_unix_s } => {
                let Some(idx) = self.index_of(&channel_id) else { return (false, Vec::new()) };
                self.channels[idx].config.disabled_until = Some(until_unix_s);
                (true, Vec::new())
            }
            ClientMessage::ChannelMute { channel_id, muted } => {
                let Some(idx) = self.index_of(&channel_id) else { return (false, Vec::new()) };
                self.channels[idx].config.muted = muted;
                (false, vec![ReceiverCommand::ChannelMute { channel_id, muted }])
            }
            ClientMessage::ChannelSolo { channel_id, solo } => {
                let Some(idx) = self.index_of(&channel_id) else { return (false, Vec::new()) };
                self.channels[idx].solo = solo;
                (false, self.solo_broadcast_commands())
            }
            ClientMessage::ChannelHold { channel_id, hold } => {
                let Some(idx) = self.index_of(&channel_id) else { return (false, Vec::new()) };
                self.channels[idx].config.hold = hold;
                (false, vec![ReceiverCommand::ChannelHold { channel_id, hold }])
            }
            ClientMessage::ChannelForceActive { channel_id, force_active } => {
                let Some(idx) = self.index_of(&channel_id) else { return (false, Vec::new()) };
                self.channels[idx].config.force_active = force_active;
                (false, vec![ReceiverCommand::ChannelForceActive { channel_id, force_active }])
            }
            ClientMessage::Sync => (false, Vec::new()),
        }
    }

    /// Recomputes every channel's effective solo state and returns one
    /// `ChannelSolo` command per channel to broadcast: when no channel is
    /// soloed, every channel — not only previously-soloed ones — receives
    /// `solo=None`.
    fn solo_broadcast_commands(&self) -> Vec<ReceiverCommand> {
        let solos: Vec<bool> = self.channels.iter().map(|c| c.solo).collect();
        let broadcast = rf_plan::solo_broadcast(&solos);
        self.channels
            .iter()
            .zip(broadcast)
            .map(|(c, solo)| ReceiverCommand::ChannelSolo { channel_id: c.config.id.clone(), solo })
            .collect()
    }
}
