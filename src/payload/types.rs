use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// File name of the payload inside a session directory
pub const PAYLOAD_FILENAME: &str = "ai_payload.json";

/// Purpose tag recorded in the session metadata
pub const PAYLOAD_PURPOSE: &str = "automation_for_ai";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvInfo {
    pub os: String,
    pub runtime: String,
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMeta {
    pub project_name: String,
    pub created_at: String,
    pub purpose: String,
    pub env: EnvInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepAssets {
    pub screenshot: String,
    pub annotated: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepText {
    pub voice_transcript_raw: String,
    pub voice_transcript_clean: String,
    pub notes_clean: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepPrivacy {
    pub paused: bool,
    pub redactions_applied: Vec<String>,
}

/// One recorded moment within a session
///
/// Only the last step of a document is ever removed, and an existing step is
/// never edited in place except to attach asset and transcript paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: u32,
    pub ts: String,
    pub url: String,
    pub title: String,
    pub assets: StepAssets,
    pub text: StepText,
    /// Reserved for out-of-scope collaborators; opaque to the core
    pub between_steps_summary: Value,
    /// Reserved for out-of-scope collaborators; opaque to the core
    pub probe: Value,
    pub privacy: StepPrivacy,
}

impl Step {
    pub fn new(
        id: u32,
        url: impl Into<String>,
        title: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            id,
            ts: now_local_iso(),
            url: url.into(),
            title: title.into(),
            assets: StepAssets::default(),
            text: StepText {
                notes_clean: note.into(),
                ..StepText::default()
            },
            between_steps_summary: json!({
                "clicks": 0,
                "keys_summary": [],
                "navigations": 0,
            }),
            probe: json!({
                "clicked_element": null,
                "network_summary": [],
            }),
            privacy: StepPrivacy::default(),
        }
    }
}

/// Root persisted entity of a session
///
/// Invariant: `steps[i].id == i + 1` whenever the document is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDocument {
    pub session_meta: SessionMeta,
    pub steps: Vec<Step>,
    pub raw_logs: Map<String, Value>,
}

impl SessionDocument {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            session_meta: SessionMeta {
                project_name: project_name.into(),
                created_at: now_local_iso(),
                purpose: PAYLOAD_PURPOSE.to_string(),
                env: EnvInfo {
                    os: std::env::consts::OS.to_string(),
                    runtime: format!(
                        "{}/{}",
                        env!("CARGO_PKG_NAME"),
                        env!("CARGO_PKG_VERSION")
                    ),
                    language: "pl-PL".to_string(),
                },
            },
            steps: Vec::new(),
            raw_logs: Map::new(),
        }
    }
}

/// ISO-8601 timestamp in the local time zone
pub(crate) fn now_local_iso() -> String {
    Local::now().to_rfc3339()
}
