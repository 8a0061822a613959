//! Errors raised while building or running a channel's DSP pipeline.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DspError>;

#[derive(Debug, Error, PartialEq)]
pub enum DspError {
    #[error("rf sample rate {rf_rate} Hz is not a multiple of audio rate {audio_rate} Hz")]
    NonIntegerDecimation { rf_rate: u32, audio_rate: u32 },

    #[error("channel offset {offset_hz} Hz exceeds half the rf sample rate {rf_rate} Hz")]
    OffsetOutOfBand { offset_hz: i64, rf_rate: u32 },

    #[error("unsupported channel mode for this pipeline: {0}")]
    UnsupportedMode(String),
}
