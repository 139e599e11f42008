//! Capability interfaces for the external collaborators
//!
//! The core never depends on a particular capture backend or UI toolkit, only
//! on these narrow synchronous contracts. Implementations are injected at
//! controller construction time, so tests run against fakes.

use crate::Result;
use std::path::Path;

/// Full-frame screen capture
pub trait ScreenCapture {
    /// Write a full-frame image to `out_path`; device or permission failures
    /// surface as errors
    fn capture(&self, out_path: &Path) -> Result<()>;
}

/// Interactive image annotation
pub trait Annotator {
    /// Open an edit surface for `input`; returns false when the operator
    /// cancelled without saving, true when `output` holds the edited image
    fn annotate(&self, input: &Path, output: &Path) -> Result<bool>;
}

/// Best-effort speech-to-text
pub trait Transcriber {
    /// Transcribe the audio file, returning an empty string when the backend
    /// is unavailable; never fails for a missing capability
    fn transcribe(&self, wav_path: &Path) -> String;
}

/// Transcriber for environments without a speech-to-text backend
pub struct NullTranscriber;

impl Transcriber for NullTranscriber {
    fn transcribe(&self, _wav_path: &Path) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_transcriber_returns_empty() {
        let transcriber = NullTranscriber;
        assert_eq!(transcriber.transcribe(Path::new("missing.wav")), "");
    }
}
