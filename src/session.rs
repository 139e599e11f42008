//! Session lifecycle: on-disk layout creation and loading
//!
//! A session lives in `<sessions_root>/<timestamp>__<slug>/` with the payload
//! file at the directory root and subdirectories for step assets, transcripts,
//! notes, and logs.

use crate::config::ScribeConfig;
use crate::payload::{SessionDocument, Step, PAYLOAD_FILENAME};
use crate::persist::atomic_write_json;
use crate::Result;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Subdirectories created inside every session directory
pub const SESSION_SUBDIRS: [&str; 4] = ["steps", "transcripts", "notes", "logs"];

/// Fallback slug when a project name reduces to nothing
pub const DEFAULT_SLUG: &str = "projekt";

const SLUG_MAX_LEN: usize = 60;

/// Derive a filesystem-safe slug from a human-supplied project name
///
/// Lowercase, runs of whitespace and hyphens collapsed to a single
/// underscore, every other non `[a-z0-9_]` character stripped, truncated
/// to 60 characters.
pub fn slugify(text: &str) -> String {
    let mut collapsed = String::new();
    for ch in text.trim().to_lowercase().chars() {
        if ch.is_whitespace() || ch == '-' {
            if !collapsed.ends_with('_') {
                collapsed.push('_');
            }
        } else {
            collapsed.push(ch);
        }
    }

    let mut slug: String = collapsed
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect();
    slug.truncate(SLUG_MAX_LEN);

    if slug.is_empty() {
        DEFAULT_SLUG.to_string()
    } else {
        slug
    }
}

/// Timestamp prefix for session directory names
pub fn session_timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// In-memory handle to one session
///
/// Exclusively owned by a single controller for the lifetime of the session.
#[derive(Debug)]
pub struct SessionContext {
    pub project_name: String,
    pub session_dir: PathBuf,
    pub payload_path: PathBuf,
    pub document: SessionDocument,
}

impl SessionContext {
    /// Append a step and persist; never reorders existing steps
    pub fn append_step(&mut self, step: Step) -> Result<()> {
        self.document.steps.push(step);
        atomic_write_json(&self.payload_path, &self.document)
    }

    /// Remove the tail step and persist; returns false on an empty document
    ///
    /// Strictly LIFO. Repeated calls keep popping the tail, so remaining
    /// identifiers stay contiguous without renumbering.
    pub fn remove_last_step(&mut self) -> Result<bool> {
        if self.document.steps.pop().is_none() {
            return Ok(false);
        }
        atomic_write_json(&self.payload_path, &self.document)?;
        Ok(true)
    }

    /// Persist the document as-is
    pub fn persist(&self) -> Result<()> {
        atomic_write_json(&self.payload_path, &self.document)
    }
}

/// Create a session's on-disk layout and return its in-memory handle
///
/// Directory creation is idempotent; the empty document is persisted before
/// the context is returned.
pub fn create_session(project_name: &str, config: &ScribeConfig) -> Result<SessionContext> {
    let dir_name = format!("{}__{}", session_timestamp(), slugify(project_name));
    let session_dir = config.sessions_root.join(dir_name);

    for subdir in SESSION_SUBDIRS {
        fs::create_dir_all(session_dir.join(subdir))?;
    }

    let document = SessionDocument::new(project_name);
    let payload_path = session_dir.join(PAYLOAD_FILENAME);
    atomic_write_json(&payload_path, &document)?;

    info!("Created session: {}", session_dir.display());

    Ok(SessionContext {
        project_name: project_name.to_string(),
        session_dir,
        payload_path,
        document,
    })
}

/// Load an existing session from its directory
///
/// The project name is derived from the persisted metadata.
pub fn load_session(session_dir: &Path) -> Result<SessionContext> {
    let payload_path = session_dir.join(PAYLOAD_FILENAME);
    let text = fs::read_to_string(&payload_path)?;
    let document: SessionDocument = serde_json::from_str(&text)?;
    let project_name = document.session_meta.project_name.clone();

    Ok(SessionContext {
        project_name,
        session_dir: session_dir.to_path_buf(),
        payload_path,
        document,
    })
}
