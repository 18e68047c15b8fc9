//! Assembles the JSON profile out of the populated trace model and the
//! classifier results, and writes it to `<output_prefix>.json`.

mod file_info;
mod profile;

pub use file_info::{FileInfo, FilePatterns};
pub use profile::{build_profile, ProfileEntry, WorkflowProfile};

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize profile: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OutputError>;

/// Writes the profile as pretty-printed JSON to `<output_prefix>.json` and
/// returns the path.
pub fn write_profile(profile: &WorkflowProfile, output_prefix: &Path) -> Result<PathBuf> {
    let mut path = output_prefix.as_os_str().to_owned();
    path.push(".json");
    let path = PathBuf::from(path);

    let mut json = serde_json::to_string_pretty(profile)?;
    json.push('\n');
    std::fs::write(&path, json).map_err(|source| OutputError::Io {
        path: path.clone(),
        source,
    })?;

    info!(path = %path.display(), "profile written");
    Ok(path)
}
