//! Atomic persistence of the session payload
//!
//! The payload file is the sole durable state of a session, so a reader must
//! observe either the previous or the new fully-written content. The write
//! goes to a temporary file in the same directory, is synced, then renamed
//! over the destination.

use crate::payload::SessionDocument;
use crate::Result;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Durably write `document` to `path`, never leaving a partial file behind
///
/// Invoked after every mutating controller operation; callers never batch
/// writes. All I/O failures propagate to the caller.
pub fn atomic_write_json(path: &Path, document: &SessionDocument) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_vec_pretty(document)?;
    let tmp_path = tmp_path_for(path);

    let mut tmp = fs::File::create(&tmp_path)?;
    tmp.write_all(&json)?;
    tmp.sync_all()?;
    drop(tmp);

    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut os_string = path.as_os_str().to_owned();
    os_string.push(".tmp");
    PathBuf::from(os_string)
}
