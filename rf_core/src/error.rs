//! Error taxonomy shared across the scanner's process boundaries.

use thiserror::Error;

/// Cross-cutting runtime errors shared by every process in the scanner.
/// `ConfigError` lives in `rf_config` instead, since it is raised purely
/// during config parsing, before any process has split off.
#[derive(Debug, Error)]
pub enum ScannerError {
    /// Hardware open/tune failure. Fatal for the owning receiver.
    #[error("device error: {0}")]
    Device(String),

    /// No advertised rate satisfies a window's bandwidth, or no clean audio
    /// divisor exists. Fatal: the window cannot be built.
    #[error("rate error: {0}")]
    Rate(String),

    /// A sink failed transiently (UDP send, Icecast connect, WebSocket
    /// bind). Non-fatal; the sink enters its own reconnect backoff.
    #[error("transient sink error: {0}")]
    TransientSink(String),

    /// The mixer's per-ring deque exceeded its target length. Non-fatal;
    /// oldest samples are dropped.
    #[error("buffer overrun on ring {ring}: dropped {dropped} samples")]
    BufferOverrun { ring: String, dropped: usize },

    /// An unknown message type arrived on a control pipe or queue.
    /// Non-fatal; the message is logged and ignored.
    #[error("protocol error: {0}")]
    Protocol(String),
}

pub type Result<T> = std::result::Result<T, ScannerError>;
