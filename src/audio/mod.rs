//! Microphone input and WAV output
//!
//! This module provides:
//! - The `AudioSource` capability toggled by the voice state machine
//! - A cpal-backed microphone source (behind the `audio-io` feature)
//! - WAV clip writing via hound

#[cfg(feature = "audio-io")]
mod input;
mod wav;

#[cfg(feature = "audio-io")]
pub use input::MicSource;
pub use wav::write_wav;

use crate::Result;
use crossbeam_channel::Receiver;

/// A source of mono f32 sample chunks
///
/// The stream delivers chunks asynchronously on the returned channel; the
/// consumer only drains it after `stop`, it never blocks waiting for audio.
pub trait AudioSource {
    /// Open the stream; sample chunks arrive on the returned channel until
    /// `stop` is called
    fn start(&mut self) -> Result<Receiver<Vec<f32>>>;

    /// Close the stream; already-delivered chunks remain readable
    fn stop(&mut self) -> Result<()>;

    /// Sample rate of the delivered chunks
    fn sample_rate(&self) -> u32;
}
