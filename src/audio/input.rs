use crate::audio::AudioSource;
use crate::{Result, ScribeError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::{unbounded, Receiver};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Microphone input backed by the default cpal input device
///
/// The capture callback downmixes to mono and sends chunks into an unbounded
/// channel; it never mutates anything beyond the shared recording flag.
pub struct MicSource {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    is_recording: Arc<Mutex<bool>>,
}

impl MicSource {
    /// Create a source on the default input device
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| ScribeError::AudioDeviceError("No input device available".into()))?;

        info!(
            "Using input device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config = device
            .default_input_config()
            .map_err(|e| {
                ScribeError::AudioDeviceError(format!("Failed to get input config: {}", e))
            })?
            .into();

        Ok(Self {
            device,
            config,
            stream: None,
            is_recording: Arc::new(Mutex::new(false)),
        })
    }

    /// Get the number of input channels before downmixing
    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /// Check if the stream is currently open
    pub fn is_recording(&self) -> bool {
        *self.is_recording.lock()
    }
}

impl AudioSource for MicSource {
    fn start(&mut self) -> Result<Receiver<Vec<f32>>> {
        if *self.is_recording.lock() {
            return Err(ScribeError::AudioDeviceError(
                "Input stream already open".into(),
            ));
        }

        let channels = self.config.channels as usize;
        let is_recording = Arc::clone(&self.is_recording);
        let (audio_tx, audio_rx) = unbounded();

        let err_fn = |err| {
            error!("Audio input stream error: {}", err);
        };

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !*is_recording.lock() {
                        return;
                    }

                    // Average all channels to create mono
                    let samples = if channels == 1 {
                        data.to_vec()
                    } else {
                        data.chunks(channels)
                            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                            .collect()
                    };

                    if let Err(e) = audio_tx.try_send(samples) {
                        debug!("Failed to send audio data: {}", e);
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| {
                ScribeError::AudioDeviceError(format!("Failed to build input stream: {}", e))
            })?;

        stream.play().map_err(|e| {
            ScribeError::AudioDeviceError(format!("Failed to start input stream: {}", e))
        })?;

        *self.is_recording.lock() = true;
        self.stream = Some(stream);

        info!("Started audio recording");
        Ok(audio_rx)
    }

    fn stop(&mut self) -> Result<()> {
        *self.is_recording.lock() = false;

        if let Some(stream) = self.stream.take() {
            drop(stream);
            info!("Stopped audio recording");
        }

        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }
}

impl Drop for MicSource {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
