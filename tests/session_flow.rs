//! End-to-end controller scenarios with fake collaborators

use crossbeam_channel::{unbounded, Receiver};
use scribe::audio::AudioSource;
use scribe::capture::{Annotator, ScreenCapture, Transcriber};
use scribe::config::ScribeConfig;
use scribe::controller::{Controller, SMOKE_TEST_DIR, TRASH_DIR};
use scribe::payload::{SessionDocument, PAYLOAD_FILENAME};
use scribe::{Result, ScribeError};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct FakeScreen;

impl ScreenCapture for FakeScreen {
    fn capture(&self, out_path: &Path) -> Result<()> {
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(out_path, b"png")?;
        Ok(())
    }
}

struct FakeAnnotator {
    saved: bool,
}

impl Annotator for FakeAnnotator {
    fn annotate(&self, _input: &Path, output: &Path) -> Result<bool> {
        if self.saved {
            fs::write(output, b"annotated")?;
        }
        Ok(self.saved)
    }
}

struct FakeMic {
    samples: Vec<f32>,
}

impl AudioSource for FakeMic {
    fn start(&mut self) -> Result<Receiver<Vec<f32>>> {
        let (tx, rx) = unbounded();
        tx.send(self.samples.clone()).unwrap();
        Ok(rx)
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        16_000
    }
}

struct FixedTranscriber(&'static str);

impl Transcriber for FixedTranscriber {
    fn transcribe(&self, _wav_path: &Path) -> String {
        self.0.to_string()
    }
}

fn config_in(root: &TempDir) -> ScribeConfig {
    ScribeConfig {
        sessions_root: root.path().join("sessions"),
        logs_root: root.path().join("logs"),
        ..ScribeConfig::default()
    }
}

fn controller_in(root: &TempDir) -> Controller {
    controller_with_annotator(root, FakeAnnotator { saved: true })
}

fn controller_with_annotator(root: &TempDir, annotator: FakeAnnotator) -> Controller {
    Controller::new(
        config_in(root),
        Box::new(FakeScreen),
        Box::new(annotator),
        Box::new(FakeMic {
            samples: vec![0.1; 1600],
        }),
        Box::new(FixedTranscriber("kliknij zaloguj")),
    )
}

fn read_payload(session_dir: &Path) -> SessionDocument {
    let text = fs::read_to_string(session_dir.join(PAYLOAD_FILENAME)).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn end_to_end_demo_scenario() {
    let root = TempDir::new().unwrap();
    let mut controller = controller_in(&root);

    let session_dir = controller.start_session("Demo").unwrap();
    assert!(session_dir.exists());

    let first = controller.capture_step().unwrap();
    assert_eq!(first, 1);

    assert!(controller.toggle_pause());
    let second = controller.capture_step().unwrap();
    assert_eq!(second, 2);

    let on_disk = read_payload(&session_dir);
    assert_eq!(on_disk.steps.len(), 2);
    assert!(!on_disk.steps[0].privacy.paused);
    assert!(on_disk.steps[1].privacy.paused);

    assert!(controller.undo_last_step().unwrap());
    let status = controller.status();
    assert_eq!(status.steps, 1);
    assert_eq!(read_payload(&session_dir).steps.len(), 1);

    // The freed identifier is reassigned to the next capture.
    assert_eq!(controller.capture_step().unwrap(), 2);
    assert!(controller.undo_last_step().unwrap());

    let ended = controller.end_session().unwrap();
    assert_eq!(ended, session_dir);
    assert!(!controller.is_active());
    assert!(controller.end_session().is_none());
}

#[test]
fn step_ids_stay_contiguous_under_interleaving() {
    let root = TempDir::new().unwrap();
    let mut controller = controller_in(&root);
    let session_dir = controller.start_session("ids").unwrap();

    controller.capture_step().unwrap();
    controller.capture_step().unwrap();
    controller.undo_last_step().unwrap();
    controller.capture_step().unwrap();
    controller.capture_step().unwrap();
    controller.undo_last_step().unwrap();
    controller.undo_last_step().unwrap();
    controller.capture_step().unwrap();

    let on_disk = read_payload(&session_dir);
    for (index, step) in on_disk.steps.iter().enumerate() {
        assert_eq!(step.id as usize, index + 1);
    }
    assert_eq!(on_disk.steps.len(), 2);
}

#[test]
fn undo_on_empty_session_returns_false() {
    let root = TempDir::new().unwrap();
    let mut controller = controller_in(&root);

    // Without any session at all.
    assert!(!controller.undo_last_step().unwrap());

    let session_dir = controller.start_session("empty").unwrap();
    let before = fs::metadata(session_dir.join(PAYLOAD_FILENAME))
        .unwrap()
        .modified()
        .unwrap();
    assert!(!controller.undo_last_step().unwrap());
    let after = fs::metadata(session_dir.join(PAYLOAD_FILENAME))
        .unwrap()
        .modified()
        .unwrap();
    assert_eq!(before, after);
}

#[test]
fn capture_without_session_is_a_precondition_error() {
    let root = TempDir::new().unwrap();
    let mut controller = controller_in(&root);

    let err = controller.capture_step().unwrap_err();
    assert!(matches!(err, ScribeError::NoActiveSession));
    assert!(err.is_precondition());
}

#[test]
fn second_start_fails_while_active() {
    let root = TempDir::new().unwrap();
    let mut controller = controller_in(&root);

    controller.start_session("one").unwrap();
    let err = controller.start_session("two").unwrap_err();
    assert!(matches!(err, ScribeError::SessionAlreadyActive));

    // A fresh controller over the same root is independent.
    let mut other = controller_in(&root);
    other.start_session("two").unwrap();
}

#[test]
fn annotate_links_asset_and_respects_cancel() {
    let root = TempDir::new().unwrap();
    let mut controller = controller_in(&root);

    assert!(!controller.annotate_last_step().unwrap());

    let session_dir = controller.start_session("annot").unwrap();
    assert!(!controller.annotate_last_step().unwrap());

    controller.capture_step().unwrap();
    assert!(controller.annotate_last_step().unwrap());

    let on_disk = read_payload(&session_dir);
    assert_eq!(on_disk.steps[0].assets.annotated, "steps/step_001_annot.png");
    assert!(session_dir.join("steps/step_001_annot.png").exists());

    // Operator cancel leaves the document untouched.
    let root2 = TempDir::new().unwrap();
    let mut cancelling = controller_with_annotator(&root2, FakeAnnotator { saved: false });
    let session_dir2 = cancelling.start_session("annot").unwrap();
    cancelling.capture_step().unwrap();
    assert!(!cancelling.annotate_last_step().unwrap());
    assert_eq!(read_payload(&session_dir2).steps[0].assets.annotated, "");
}

#[test]
fn voice_toggle_attaches_paths_to_step() {
    let root = TempDir::new().unwrap();
    let mut controller = controller_in(&root);
    let session_dir = controller.start_session("voice").unwrap();
    controller.capture_step().unwrap();

    assert!(controller.toggle_voice().unwrap().is_none());
    let summary = controller.toggle_voice().unwrap().unwrap();
    assert!(summary.transcribed);

    let on_disk = read_payload(&session_dir);
    let step = &on_disk.steps[0];
    assert_eq!(step.text.voice_transcript_raw, "transcripts/step_001_raw.txt");
    assert_eq!(
        step.text.voice_transcript_clean,
        "transcripts/step_001_clean.txt"
    );
    assert!(session_dir.join("transcripts/step_001.wav").exists());
    assert!(session_dir.join("transcripts/step_001_raw.txt").exists());
    assert!(session_dir.join("transcripts/step_001_clean.txt").exists());
}

#[test]
fn voice_toggle_without_steps_fails_and_stays_idle() {
    let root = TempDir::new().unwrap();
    let mut controller = controller_in(&root);
    controller.start_session("voice").unwrap();

    let err = controller.toggle_voice().unwrap_err();
    assert!(matches!(err, ScribeError::NoActiveStep));

    // Still idle: the next toggle starts a fresh recording cycle.
    controller.capture_step().unwrap();
    assert!(controller.toggle_voice().unwrap().is_none());
    assert!(controller.toggle_voice().unwrap().is_some());
}

#[test]
fn voice_recording_does_not_survive_session_boundary() {
    let root = TempDir::new().unwrap();
    let mut controller = controller_in(&root);

    let first_dir = controller.start_session("first").unwrap();
    controller.capture_step().unwrap();
    assert!(controller.toggle_voice().unwrap().is_none());

    // Ending the session discards the in-flight recording.
    controller.end_session().unwrap();

    let second_dir = controller.start_session("second").unwrap();
    controller.capture_step().unwrap();

    // The first toggle in the new session starts a fresh recording; it must
    // not stop the stale one and link the old audio into the new step.
    assert!(controller.toggle_voice().unwrap().is_none());
    let summary = controller.toggle_voice().unwrap().unwrap();
    assert_eq!(summary.wav, "transcripts/step_001.wav");

    assert!(second_dir.join(&summary.wav).exists());
    assert!(!first_dir.join("transcripts/step_001.wav").exists());

    let first_doc = read_payload(&first_dir);
    assert_eq!(first_doc.steps[0].text.voice_transcript_raw, "");
    let second_doc = read_payload(&second_dir);
    assert_eq!(
        second_doc.steps[0].text.voice_transcript_raw,
        "transcripts/step_001_raw.txt"
    );
}

#[test]
fn cleanup_moves_only_empty_sessions() {
    let root = TempDir::new().unwrap();
    let sessions_root = root.path().join("sessions");
    let mut controller = controller_in(&root);

    // An empty session and a non-empty one.
    let empty_dir = controller.start_session("empty one").unwrap();
    controller.end_session().unwrap();
    let full_dir = controller.start_session("full one").unwrap();
    controller.capture_step().unwrap();
    controller.end_session().unwrap();

    // Directories the sweep must skip.
    let smoke = sessions_root.join(SMOKE_TEST_DIR);
    fs::create_dir_all(&smoke).unwrap();
    write_empty_payload(&smoke);
    let unreadable = sessions_root.join("20240101_000000__broken");
    fs::create_dir_all(&unreadable).unwrap();
    fs::write(unreadable.join(PAYLOAD_FILENAME), "{not json").unwrap();
    let no_payload = sessions_root.join("20240101_000000__bare");
    fs::create_dir_all(&no_payload).unwrap();

    let report = controller.cleanup_empty_sessions(&sessions_root).unwrap();
    assert_eq!(report.moved, 1);
    assert_eq!(report.trash_dir, sessions_root.join(TRASH_DIR));

    assert!(!empty_dir.exists());
    assert!(full_dir.exists());
    assert!(smoke.exists());
    assert!(unreadable.exists());
    assert!(no_payload.exists());

    let moved: Vec<PathBuf> = fs::read_dir(&report.trash_dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(moved.len(), 1);
    let moved_name = moved[0].file_name().unwrap().to_str().unwrap();
    let original_name = empty_dir.file_name().unwrap().to_str().unwrap();
    assert!(moved_name.starts_with(original_name));
}

#[test]
fn cleanup_of_clean_root_moves_nothing() {
    let root = TempDir::new().unwrap();
    let sessions_root = root.path().join("sessions");
    fs::create_dir_all(&sessions_root).unwrap();
    let controller = controller_in(&root);

    let report = controller.cleanup_empty_sessions(&sessions_root).unwrap();
    assert_eq!(report.moved, 0);
    assert!(report.trash_dir.exists());
}

fn write_empty_payload(session_dir: &Path) {
    let document = SessionDocument::new("fixture");
    let text = serde_json::to_string_pretty(&document).unwrap();
    fs::write(session_dir.join(PAYLOAD_FILENAME), text).unwrap();
}
