use crate::{Result, ScribeError};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs;
use std::path::Path;

/// Write mono f32 samples to a WAV file
///
/// An empty sample slice still produces a valid zero-length clip.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let wav_err = |e: hound::Error| ScribeError::IOError(e.to_string());

    let mut writer = WavWriter::create(path, spec).map_err(wav_err)?;
    for &sample in samples {
        writer.write_sample(sample).map_err(wav_err)?;
    }
    writer.finalize().map_err(wav_err)?;

    Ok(())
}
