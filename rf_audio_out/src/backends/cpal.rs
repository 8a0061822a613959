use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::{backend::Backend, error::{PlayerError, Result}, source::PcmSource};

/// Low-level local-playback backend using cpal directly.
pub struct CpalBackend {
    _private: (),
}

impl CpalBackend {
    pub fn try_default() -> Result<Self> {
        let host = cpal::default_host();
        if host.default_output_device().is_none() {
            return Err(PlayerError::NoOutputDevice);
        }
        Ok(Self { _private: () })
    }
}

impl Backend for CpalBackend {
    fn play(self: Box<Self>, source: Box<dyn PcmSource>, stop_flag: Arc<AtomicBool>) -> Result<()> {
        let sample_rate = source.sample_rate();
        let source = Arc::new(Mutex::new(source));

        std::thread::spawn(move || {
            let host = cpal::default_host();
            let device = match host.default_output_device() {
                Some(d) => d,
                None => {
                    eprintln!("no audio output device available");
                    return;
                }
            };

            let config = cpal::StreamConfig {
                channels: 1,
                sample_rate: cpal::SampleRate(sample_rate),
                buffer_size: cpal::BufferSize::Default,
            };

            let source_clone = Arc::clone(&source);
            let stop_flag_clone = Arc::clone(&stop_flag);

            let build = device.build_output_stream(
                &config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    let mut source = source_clone.lock().unwrap();
                    for sample in data.iter_mut() {
                        *sample = if stop_flag_clone.load(Ordering::SeqCst) { 0 } else { source.next().unwrap_or(0) };
                    }
                },
                move |err| eprintln!("audio stream error: {err}"),
                None,
            );

            let stream = match build {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("failed to build output stream: {e}");
                    return;
                }
            };

            if let Err(e) = stream.play() {
                eprintln!("failed to start playback: {e}");
                return;
            }

            while !stop_flag.load(Ordering::SeqCst) {
                std::thread::sleep(std::time::Duration::from_millis(10));
            }
            drop(stream);
        });

        Ok(())
    }
}
