//! Session payload document
//!
//! This module provides:
//! - The persisted session document and step shapes
//! - Pure constructors with stable on-disk defaults

mod types;

pub use types::{
    EnvInfo, SessionDocument, SessionMeta, Step, StepAssets, StepPrivacy, StepText,
    PAYLOAD_FILENAME, PAYLOAD_PURPOSE,
};
