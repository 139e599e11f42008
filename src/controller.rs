//! Session controller
//!
//! Orchestrates capture, annotation, pause, undo, and voice toggling for a
//! single active session. Every operator intent maps to one state transition
//! that mutates the in-memory document, invokes at most one collaborator, and
//! persists before returning. Owns all mutable session state; multiple
//! controllers are independently instantiable.

use crate::audio::AudioSource;
use crate::capture::{Annotator, ScreenCapture, Transcriber};
use crate::config::ScribeConfig;
use crate::payload::{SessionDocument, Step, PAYLOAD_FILENAME};
use crate::session::{create_session, session_timestamp, SessionContext};
use crate::voice::{VoiceCapture, VoiceSummary};
use crate::{Result, ScribeError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory under the sessions root holding discarded empty sessions
pub const TRASH_DIR: &str = "_trash";

/// Reserved smoke-test session directory, never cleaned up
pub const SMOKE_TEST_DIR: &str = "_smoke_test";

/// Snapshot of controller state for a panel frontend
#[derive(Debug, Clone)]
pub struct ControllerStatus {
    pub project_name: Option<String>,
    pub steps: usize,
    pub paused: bool,
    pub last_action: Option<&'static str>,
}

/// Outcome of an empty-session sweep
#[derive(Debug, Clone)]
pub struct CleanupReport {
    pub moved: usize,
    pub trash_dir: PathBuf,
}

pub struct Controller {
    config: ScribeConfig,
    ctx: Option<SessionContext>,
    next_step_id: u32,
    paused: bool,
    last_action: Option<&'static str>,
    voice: VoiceCapture,
    screen: Box<dyn ScreenCapture>,
    annotator: Box<dyn Annotator>,
}

impl Controller {
    pub fn new(
        config: ScribeConfig,
        screen: Box<dyn ScreenCapture>,
        annotator: Box<dyn Annotator>,
        audio: Box<dyn AudioSource>,
        transcriber: Box<dyn Transcriber>,
    ) -> Self {
        Self {
            config,
            ctx: None,
            next_step_id: 1,
            paused: false,
            last_action: None,
            voice: VoiceCapture::new(audio, transcriber),
            screen,
            annotator,
        }
    }

    pub fn status(&self) -> ControllerStatus {
        ControllerStatus {
            project_name: self.ctx.as_ref().map(|ctx| ctx.project_name.clone()),
            steps: self
                .ctx
                .as_ref()
                .map(|ctx| ctx.document.steps.len())
                .unwrap_or(0),
            paused: self.paused,
            last_action: self.last_action,
        }
    }

    pub fn is_active(&self) -> bool {
        self.ctx.is_some()
    }

    /// Start a new session; exactly one may be active per controller
    pub fn start_session(&mut self, project_name: &str) -> Result<PathBuf> {
        if self.ctx.is_some() {
            return Err(ScribeError::SessionAlreadyActive);
        }

        let ctx = create_session(project_name, &self.config)?;
        let session_dir = ctx.session_dir.clone();
        self.ctx = Some(ctx);
        self.next_step_id = 1;
        self.paused = false;
        self.voice.reset();
        self.last_action = Some("S");

        info!("START session: {}", project_name);
        Ok(session_dir)
    }

    /// Capture a screenshot step tagged with the current pause flag
    pub fn capture_step(&mut self) -> Result<u32> {
        let ctx = self.ctx.as_mut().ok_or(ScribeError::NoActiveSession)?;

        let step_id = self.next_step_id;
        let screenshot_rel = format!("steps/step_{:03}.png", step_id);
        let screenshot_abs = ctx.session_dir.join(&screenshot_rel);
        self.screen.capture(&screenshot_abs)?;

        let mut step = Step::new(step_id, "", "", "");
        step.assets.screenshot = screenshot_rel.clone();
        step.privacy.paused = self.paused;
        ctx.append_step(step)?;

        self.next_step_id += 1;
        self.last_action = Some("K");
        info!(
            "ADD step: {} screenshot={} paused={}",
            step_id, screenshot_rel, self.paused
        );
        Ok(step_id)
    }

    /// Annotate the last step's screenshot
    ///
    /// Returns false when there is nothing to do (no session, no steps, no
    /// screenshot) or when the operator cancelled the edit; neither case
    /// mutates the document.
    pub fn annotate_last_step(&mut self) -> Result<bool> {
        let ctx = match self.ctx.as_mut() {
            Some(ctx) => ctx,
            None => {
                info!("ANNOTATE step: ok=false steps=0");
                return Ok(false);
            }
        };

        let (step_id, screenshot_rel) = match ctx.document.steps.last() {
            Some(step) => (step.id, step.assets.screenshot.clone()),
            None => {
                info!("ANNOTATE step: ok=false steps=0");
                return Ok(false);
            }
        };

        if screenshot_rel.is_empty() {
            info!("ANNOTATE step: ok=false screenshot=missing");
            return Ok(false);
        }

        let input_abs = ctx.session_dir.join(&screenshot_rel);
        let annotated_rel = format!("steps/step_{:03}_annot.png", step_id);
        let annotated_abs = ctx.session_dir.join(&annotated_rel);

        let saved = self.annotator.annotate(&input_abs, &annotated_abs)?;
        if !saved {
            info!("ANNOTATE step: ok=false step={}", step_id);
            return Ok(false);
        }

        if let Some(step) = ctx.document.steps.last_mut() {
            step.assets.annotated = annotated_rel.clone();
        }
        ctx.persist()?;

        self.last_action = Some("E");
        info!("ANNOTATE step: ok=true step={} output={}", step_id, annotated_rel);
        Ok(true)
    }

    /// Flip the advisory pause flag
    ///
    /// Recorded per-step at capture time for downstream review; it never
    /// suppresses or blocks a capture operation.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.last_action = Some("||");
        info!("PAUSE toggled: {}", self.paused);
        self.paused
    }

    /// Toggle voice recording against the last step
    pub fn toggle_voice(&mut self) -> Result<Option<VoiceSummary>> {
        let ctx = self.ctx.as_mut().ok_or(ScribeError::NoActiveSession)?;
        let result = self.voice.toggle(ctx)?;

        if let Some(summary) = &result {
            self.last_action = Some("G");
            info!("VOICE step: wav={}", summary.wav);
        }
        Ok(result)
    }

    /// Remove the last step; false on an empty session
    pub fn undo_last_step(&mut self) -> Result<bool> {
        let ctx = match self.ctx.as_mut() {
            Some(ctx) => ctx,
            None => {
                info!("UNDO step: ok=false steps=0");
                return Ok(false);
            }
        };

        if !ctx.remove_last_step()? {
            info!("UNDO step: ok=false steps=0");
            return Ok(false);
        }

        self.next_step_id = ctx.document.steps.len() as u32 + 1;
        self.last_action = Some("↩");
        info!("UNDO step: ok=true steps={}", ctx.document.steps.len());
        Ok(true)
    }

    /// End the session, returning its directory; `None` when nothing is active
    ///
    /// An in-flight recording is discarded, not carried into the next session.
    pub fn end_session(&mut self) -> Option<PathBuf> {
        let ctx = self.ctx.take()?;
        self.voice.reset();
        self.paused = false;
        self.last_action = None;

        info!("END session: {}", ctx.session_dir.display());
        Some(ctx.session_dir)
    }

    /// Move sessions with no steps into the trash directory
    ///
    /// Skips the trash and smoke-test directories; sessions whose payload is
    /// missing or unreadable are skipped, never deleted.
    pub fn cleanup_empty_sessions(&self, sessions_root: &Path) -> Result<CleanupReport> {
        let trash_dir = sessions_root.join(TRASH_DIR);
        fs::create_dir_all(&trash_dir)?;

        let stamp = session_timestamp();
        let mut moved = 0;

        for entry in fs::read_dir(sessions_root)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == TRASH_DIR || name == SMOKE_TEST_DIR {
                continue;
            }

            let payload_text = match fs::read_to_string(path.join(PAYLOAD_FILENAME)) {
                Ok(text) => text,
                Err(_) => {
                    debug!("CLEANUP skip (payload unreadable): {}", name);
                    continue;
                }
            };
            let document: SessionDocument = match serde_json::from_str(&payload_text) {
                Ok(document) => document,
                Err(_) => {
                    debug!("CLEANUP skip (payload malformed): {}", name);
                    continue;
                }
            };
            if !document.steps.is_empty() {
                continue;
            }

            let dest = unique_trash_dest(&trash_dir, &name, &stamp);
            fs::rename(&path, &dest)?;
            info!("CLEANUP moved empty session: {} -> {}", name, dest.display());
            moved += 1;
        }

        Ok(CleanupReport { moved, trash_dir })
    }
}

/// Pick a destination name inside the trash, disambiguating collisions with
/// a numeric suffix
fn unique_trash_dest(trash_dir: &Path, name: &str, stamp: &str) -> PathBuf {
    let mut dest = trash_dir.join(format!("{}__{}", name, stamp));
    let mut attempt = 2;
    while dest.exists() {
        dest = trash_dir.join(format!("{}__{}_{}", name, stamp, attempt));
        attempt += 1;
    }
    dest
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unique_trash_dest_suffixes_collisions() {
        let dir = TempDir::new().unwrap();
        let trash = dir.path();

        let first = unique_trash_dest(trash, "old_session", "20240101_120000");
        assert_eq!(
            first.file_name().unwrap().to_str().unwrap(),
            "old_session__20240101_120000"
        );

        fs::create_dir_all(&first).unwrap();
        let second = unique_trash_dest(trash, "old_session", "20240101_120000");
        assert_eq!(
            second.file_name().unwrap().to_str().unwrap(),
            "old_session__20240101_120000_2"
        );

        fs::create_dir_all(&second).unwrap();
        let third = unique_trash_dest(trash, "old_session", "20240101_120000");
        assert_eq!(
            third.file_name().unwrap().to_str().unwrap(),
            "old_session__20240101_120000_3"
        );
    }
}
