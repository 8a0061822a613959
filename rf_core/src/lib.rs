//! # rf_core
//!
//! Foundational, allocation-light utilities shared by every process in the
//! scanner: the `Sample` abstraction, denormal handling, a stack-allocated
//! vector for the DSP hot path, and the shared-memory SPSC ring buffer that
//! carries audio between a receiver process and the mixer process.

#![cfg_attr(feature = "simd", feature(portable_simd))]

pub mod buffer;
pub mod denormal;
pub mod error;
pub mod ipc;
pub mod math;
pub mod ring;
pub mod sample;
#[cfg(feature = "simd")]
pub mod simd;
pub mod stack_vec;

pub use buffer::Buffer;
pub use denormal::{flush_denormal_f32, flush_denormal_f64, flush_denormals_f32_batch, flush_denormals_f64_batch};
pub use error::{Result, ScannerError};
pub use ring::{RingConsumer, RingProducer};
pub use sample::Sample;
pub use stack_vec::StackVec;
