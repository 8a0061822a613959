//! # rf_plan
//!
//! Pure, process-agnostic planning logic that drives the supervisor's main
//! loop: the window planner (a static partition of enabled channel
//! frequencies into scan windows) and the scheduler (the
//! least-recently-scanned ledger that assigns windows to idle receivers),
//! plus the solo-accounting transformation applied before broadcasting
//! mute state to receivers.

pub mod planner;
pub mod scheduler;
pub mod solo;

pub use planner::{build_windows, WindowPlan};
pub use scheduler::{ReceiverState, Scheduler};
pub use solo::{effective_mutes, solo_broadcast};
