//! The mixing core: a per-receiver deque fed from a
//! shared-memory ring, a wall-clock-driven sample-emission schedule, and
//! saturating sum-then-round to int16 fanned out to every configured sink.

use std::{
    collections::VecDeque,
    time::Instant,
};

use rf_core::RingConsumer;
use tracing::warn;

use crate::sinks::Sink;

const BUFFER_LEN: usize = 10_000;
const BUFFER_TARGET_LEN: usize = 4_000;

struct RingInput {
    receiver_id: String,
    consumer: RingConsumer,
    queue: VecDeque<f32>,
    scratch: Vec<f32>,
}

pub struct Mixer {
    audio_sample_rate: u32,
    inputs: Vec<RingInput>,
    sinks: Vec<Box<dyn Sink>>,
    start_time: Instant,
    samples_emitted: u64,
    scratch: Vec<i16>,
}

impl Mixer {
    pub fn new(audio_sample_rate: u32, sinks: Vec<Box<dyn Sink>>) -> Self {
        Self {
            audio_sample_rate,
            inputs: Vec::new(),
            sinks,
            start_time: Instant::now(),
            samples_emitted: 0,
            scratch: Vec::new(),
        }
    }

    pub fn add_ring(&mut self, receiver_id: String, consumer: RingConsumer) {
        self.inputs.retain(|i| i.receiver_id != receiver_id);
        self.inputs.push(RingInput { receiver_id, consumer, queue: VecDeque::with_capacity(BUFFER_LEN), scratch: Vec::new() });
    }

    pub fn remove_ring(&mut self, receiver_id: &str) {
        self.inputs.retain(|i| i.receiver_id != receiver_id);
    }

    /// Pulls fresh samples from every ring into its deque, dropping the
    /// oldest samples (and logging) when a deque exceeds its target length.
    fn fill_queues(&mut self) {
        for input in &mut self.inputs {
            input.scratch.clear();
            // A wrap boundary needs up to two reads to fully drain what's available;
            // the second call is a harmless no-op once the ring is caught up.
            input.consumer.read(&mut input.scratch);
            input.consumer.read(&mut input.scratch);
            input.queue.extend(input.scratch.drain(..));
            while input.queue.len() > BUFFER_TARGET_LEN {
                input.queue.pop_front();
                warn!(receiver_id = %input.receiver_id, "mixer input buffer overflow, dropping oldest sample");
            }
        }
    }

    /// One tick of the mixer loop: pulls available samples, computes how
    /// many frames the wall clock says should have been emitted by now,
    /// mixes and writes that many frames to every sink.
    pub fn tick(&mut self) {
        self.fill_queues();

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let should_have_emitted = (elapsed * self.audio_sample_rate as f64).floor() as u64;
        let samples_to_emit = should_have_emitted.saturating_sub(self.samples_emitted) as usize;
        if samples_to_emit == 0 {
            return;
        }

        self.scratch.clear();
        for _ in 0..samples_to_emit {
            let mut sum = 0.0f32;
            for input in &mut self.inputs {
                sum += input.queue.pop_front().unwrap_or(0.0);
            }
            self.scratch.push(mix_to_i16(sum));
        }
        self.samples_emitted += samples_to_emit as u64;

        for sink in &mut self.sinks {
            sink.send(&self.scratch);
        }
    }
}

/// Clamps a floating mixed sample to `[-1, 1]` and rounds to int16,
/// saturating at the codec's representable extremes.
pub fn mix_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    let scaled = (clamped * 32767.0).round();
    scaled.clamp(-32767.0, 32767.0) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_to_i16_passes_through_mid_range_values() {
        assert_eq!(mix_to_i16(0.0), 0);
        assert_eq!(mix_to_i16(0.5), 16384);
        assert_eq!(mix_to_i16(-0.5), -16384);
    }

    #[test]
    fn mix_to_i16_saturates_on_overflowing_sums() {
        // Three channels each near full scale would overflow a naive sum.
        assert_eq!(mix_to_i16(0.9 + 0.9 + 0.9), 32767);
        assert_eq!(mix_to_i16(-0.9 - 0.9 - 0.9), -32767);
    }

    #[test]
    fn mix_to_i16_rounds_rather_than_truncates() {
        // 0.49999 scaled is 16383.47ish; rounding must not floor it away.
        let near_half = 16383.6 / 32767.0;
        assert_eq!(mix_to_i16(near_half), 16384);
    }
}
