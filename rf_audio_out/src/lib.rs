//! # rf_audio_out
//!
//! Local audio playback: the `Local` output sink plays the mixer's
//! already-mixed, int16-clamped PCM stream through the system's default
//! sound card, via a configurable backend (rodio by default, cpal for
//! direct control).

mod backend;
pub mod backends;
mod error;
mod player;
mod source;

pub use backend::{Backend, PlayHandle};
pub use error::{PlayerError, Result};
pub use player::Player;
pub use source::PcmSource;
