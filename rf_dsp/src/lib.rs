//! # rf_dsp
//!
//! The per-channel demodulation pipeline: frequency translation, squelch,
//! mode-specific demodulation (FM/NFM/AM/USB/LSB/NOAA-EAS/BFM-EAS), the
//! common audio tail, metering, and the scan-window mixing junction that
//! composes channels together.

pub mod agc;
pub mod channel_mode;
pub mod constants;
pub mod context;
pub mod demod;
pub mod dsp_channel;
pub mod error;
pub mod filters;
pub mod squelch;
pub mod status;
pub mod window;
pub mod xlate;

pub use channel_mode::ChannelMode;
pub use dsp_channel::{ChannelBuildParams, ChannelPolicy, ChannelStatusEvent, DspChannel};
pub use error::{DspError, Result};
pub use status::{ChannelMeters, ChannelStatus};
pub use window::ScanWindow;
