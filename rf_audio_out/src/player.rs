use std::sync::{Arc, atomic::AtomicBool};

#[cfg(feature = "rodio")]
use crate::backends::RodioBackend;
use crate::{
    backend::{Backend, PlayHandle},
    error::Result,
    source::PcmSource,
};

/// Local playback sink: plays a [`PcmSource`] (the mixer's output stream)
/// through a configurable backend.
pub struct Player {
    backend: Box<dyn Backend>,
}

#[cfg(feature = "rodio")]
impl Player {
    /// Create a new player with the default rodio backend.
    pub fn new() -> Result<Self> {
        let backend = RodioBackend::try_default()?;
        Ok(Self { backend: Box::new(backend) })
    }
}

impl Player {
    /// Create a new player with a custom backend.
    pub fn with_backend<B: Backend>(backend: B) -> Self {
        Self { backend: Box::new(backend) }
    }

    /// Start non-blocking playback of `source`. Returns a [`PlayHandle`]
    /// that can be used to stop playback.
    pub fn play(self, source: Box<dyn PcmSource>) -> Result<PlayHandle> {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let handle = PlayHandle::new(Arc::clone(&stop_flag));
        self.backend.play(source, stop_flag)?;
        Ok(handle)
    }
}
