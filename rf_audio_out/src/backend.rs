use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{error::Result, source::PcmSource};

/// Handle returned from `Player::play()` that allows stopping playback.
pub struct PlayHandle {
    stop_flag: Arc<AtomicBool>,
}

impl PlayHandle {
    pub(crate) fn new(stop_flag: Arc<AtomicBool>) -> Self {
        Self { stop_flag }
    }

    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::SeqCst)
    }
}

/// A local audio output backend. Backends receive a [`PcmSource`] and are
/// responsible for feeding it to the sound card.
pub trait Backend: Send + 'static {
    fn play(self: Box<Self>, source: Box<dyn PcmSource>, stop_flag: Arc<AtomicBool>) -> Result<()>;
}
