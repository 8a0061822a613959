use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlayerError>;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("no audio output device available")]
    NoOutputDevice,

    #[error("failed to initialize audio device: {0}")]
    DeviceInitFailed(String),

    #[error("playback failed: {0}")]
    PlaybackFailed(String),
}
