//! Solo accounting: transforms per-channel mute/solo bits into the
//! broadcast value every channel should receive, per the supervisor's
//! "Solo accounting" rule.

/// Computes the effective mute broadcast for every channel given the raw
/// `(muted, solo)` bits configured on each.
///
/// When any channel has `solo == true`, every channel's effective mute is
/// `!solo` (the soloed channel(s) play, everything else is silenced).
/// When no channel is soloed, each channel's effective mute is just its own
/// `muted` bit.
pub fn effective_mutes(channels: &[(bool, bool)]) -> Vec<bool> {
    let any_solo = channels.iter().any(|&(_, solo)| solo);
    channels
        .iter()
        .map(|&(muted, solo)| if any_solo { !solo } else { muted })
        .collect()
}

/// Computes the tri-state solo broadcast every channel should receive: the
/// scanner's `ChannelSolo` event always carries `Option<bool>`. `Some(true)`
/// for the soloed channel(s), `Some(false)` for every other channel while a
/// solo is active, and `None` for everyone once no channel is soloed any
/// more — including channels that were never soloed themselves.
pub fn solo_broadcast(channels: &[bool]) -> Vec<Option<bool>> {
    let any_solo = channels.iter().any(|&solo| solo);
    if !any_solo {
        return vec![None; channels.len()];
    }
    channels.iter().map(|&solo| Some(solo)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_solo_uses_own_mute_bit() {
        let channels = [(true, false), (false, false)];
        assert_eq!(effective_mutes(&channels), vec![true, false]);
    }

    #[test]
    fn solo_mutes_everyone_else() {
        let channels = [(false, false), (false, true), (true, false)];
        assert_eq!(effective_mutes(&channels), vec![true, false, true]);
    }

    /// Open-question resolution: clearing the last solo broadcasts `None`
    /// to every channel, not just the ones that had been soloed.
    #[test]
    fn clearing_last_solo_broadcasts_none_to_everyone() {
        let none_soloed = [false, false, false];
        assert_eq!(solo_broadcast(&none_soloed), vec![None, None, None]);
    }

    #[test]
    fn active_solo_broadcasts_some_to_everyone() {
        let one_soloed = [false, true, false];
        assert_eq!(solo_broadcast(&one_soloed), vec![Some(false), Some(true), Some(false)]);
    }
}
