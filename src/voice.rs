//! Toggle-driven voice note capture
//!
//! A single `toggle` entry point flips between `Idle` and `Recording`, so a
//! caller can never double-start the stream. The in-flight recording is bound
//! to the step that was last when recording started; it is not retargeted if
//! further steps are captured before the stop.

use crate::audio::{write_wav, AudioSource};
use crate::capture::Transcriber;
use crate::session::SessionContext;
use crate::{Result, ScribeError};
use crossbeam_channel::Receiver;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Paths written by a completed recording cycle, relative to the session dir
#[derive(Debug, Clone)]
pub struct VoiceSummary {
    pub wav: String,
    pub raw: String,
    pub clean: String,
    /// Whether transcription produced any text
    pub transcribed: bool,
}

/// One in-flight recording; exists only while the stream is open
struct InFlight {
    target_step_id: u32,
    rx: Receiver<Vec<f32>>,
}

/// Voice capture state machine
///
/// `in_flight` is `None` while idle. The audio source and transcriber are
/// injected at construction, so environments without a speech backend use
/// `NullTranscriber` and keep the best-effort contract.
pub struct VoiceCapture {
    source: Box<dyn AudioSource>,
    transcriber: Box<dyn Transcriber>,
    in_flight: Option<InFlight>,
}

impl VoiceCapture {
    pub fn new(source: Box<dyn AudioSource>, transcriber: Box<dyn Transcriber>) -> Self {
        Self {
            source,
            transcriber,
            in_flight: None,
        }
    }

    /// Check if a recording is in flight
    pub fn is_recording(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Discard any in-flight recording without writing files
    ///
    /// Invoked at session boundaries so a recording started in one session
    /// can never attach to a step of the next one. The buffered audio is
    /// dropped, not persisted.
    pub fn reset(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            if let Err(e) = self.source.stop() {
                warn!("Failed to stop audio stream on reset: {}", e);
            }
            warn!(
                "VOICE recording discarded: step={}",
                in_flight.target_step_id
            );
        }
    }

    /// Toggle the recording state
    ///
    /// Idle: opens the stream against the last step and returns `Ok(None)`;
    /// fails with `NoActiveStep` when the document has no steps.
    /// Recording: closes the stream, writes the clip and both transcript
    /// files, attaches their paths to the target step, persists, and returns
    /// the summary. If the target step was removed by an undo while
    /// recording, the files stay on disk but `TargetStepMissing` is returned
    /// and the document is left untouched.
    pub fn toggle(&mut self, ctx: &mut SessionContext) -> Result<Option<VoiceSummary>> {
        match self.in_flight.take() {
            None => self.start(ctx).map(|_| None),
            Some(in_flight) => self.stop(ctx, in_flight).map(Some),
        }
    }

    fn start(&mut self, ctx: &SessionContext) -> Result<()> {
        let target_step_id = match ctx.document.steps.last() {
            Some(step) => step.id,
            None => return Err(ScribeError::NoActiveStep),
        };

        let rx = self.source.start()?;
        info!("VOICE recording started: step={}", target_step_id);

        self.in_flight = Some(InFlight { target_step_id, rx });
        Ok(())
    }

    fn stop(&mut self, ctx: &mut SessionContext, in_flight: InFlight) -> Result<VoiceSummary> {
        let InFlight { target_step_id, rx } = in_flight;
        self.source.stop()?;

        let mut samples = Vec::new();
        while let Ok(chunk) = rx.try_recv() {
            samples.extend_from_slice(&chunk);
        }

        let wav_rel = format!("transcripts/step_{:03}.wav", target_step_id);
        let raw_rel = format!("transcripts/step_{:03}_raw.txt", target_step_id);
        let clean_rel = format!("transcripts/step_{:03}_clean.txt", target_step_id);

        let wav_abs = ctx.session_dir.join(&wav_rel);
        write_wav(&wav_abs, &samples, self.source.sample_rate())?;

        let raw_text = self.transcriber.transcribe(&wav_abs);
        // The clean transcript starts as a copy and is corrected by hand later.
        let clean_text = raw_text.clone();
        write_text(&ctx.session_dir.join(&raw_rel), &raw_text)?;
        write_text(&ctx.session_dir.join(&clean_rel), &clean_text)?;
        let transcribed = !raw_text.is_empty();

        let step = match ctx
            .document
            .steps
            .iter_mut()
            .find(|step| step.id == target_step_id)
        {
            Some(step) => step,
            None => {
                warn!(
                    "VOICE target step {} removed while recording, files kept: {}",
                    target_step_id, wav_rel
                );
                return Err(ScribeError::TargetStepMissing {
                    step_id: target_step_id,
                });
            }
        };

        step.text.voice_transcript_raw = raw_rel.clone();
        step.text.voice_transcript_clean = clean_rel.clone();
        ctx.persist()?;

        info!(
            "VOICE recording attached: step={} wav={} transcribed={}",
            target_step_id, wav_rel, transcribed
        );

        Ok(VoiceSummary {
            wav: wav_rel,
            raw: raw_rel,
            clean: clean_rel,
            transcribed,
        })
    }
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    Ok(())
}
