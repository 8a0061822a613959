//! A source of mixed, already-clamped `int16` PCM, pulled one sample at a
//! time by the output backend. This is the local-playback counterpart of
//! the mixer's UDP/Icecast/WebSocket sinks: the mixer computes
//! `samples_to_emit` once per tick and this trait's implementor hands
//! them out on demand to the sound-card callback.
pub trait PcmSource: Iterator<Item = i16> + Send + 'static {
    /// Sample rate in Hz (the scanner's fixed `AUDIO_SAMPLERATE`).
    fn sample_rate(&self) -> u32;
}
