pub mod audio;
pub mod capture;
pub mod config;
pub mod controller;
pub mod payload;
pub mod persist;
pub mod session;
pub mod voice;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ScribeError {
    #[error("No active session")]
    NoActiveSession,

    #[error("A session is already active")]
    SessionAlreadyActive,

    #[error("No step to attach the recording to")]
    NoActiveStep,

    #[error("Recording target step {step_id} no longer exists")]
    TargetStepMissing { step_id: u32 },

    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("Capture error: {0}")]
    CaptureError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<std::io::Error> for ScribeError {
    fn from(e: std::io::Error) -> Self {
        ScribeError::IOError(e.to_string())
    }
}

impl From<serde_json::Error> for ScribeError {
    fn from(e: serde_json::Error) -> Self {
        ScribeError::SerializationError(e.to_string())
    }
}

impl ScribeError {
    /// Check if this error signals caller misuse rather than a device or I/O failure
    ///
    /// Precondition errors are surfaced synchronously and are never retried.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ScribeError::NoActiveSession
                | ScribeError::SessionAlreadyActive
                | ScribeError::NoActiveStep
                | ScribeError::TargetStepMissing { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ScribeError>;
