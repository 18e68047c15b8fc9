//! Pipeline driver: open the trace, replay it into the model, classify
//! access patterns per handle and per file, and emit the JSON profile.

pub mod analysis;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Runs the whole pipeline and returns the path of the written profile.
///
/// The output prefix defaults to the trace path with its extension
/// stripped, so `run/trace.otf2` produces `run/trace.json`.
pub fn run(input: &Path, output_prefix: Option<&Path>) -> Result<PathBuf> {
    let reader = trace_reader::open_trace(input)?;
    let outcome = reader
        .read()
        .with_context(|| format!("reading trace archive {}", input.display()))?;
    for ingest_error in &outcome.ingest_errors {
        warn!(
            handle = ingest_error.handle,
            error = %ingest_error.error,
            "handle excluded from analysis"
        );
    }

    let data = &outcome.data;
    let skip = analysis::poisoned_handles(&outcome.ingest_errors);
    let per_handle = analysis::classify_handles(data, &skip);
    let per_file = analysis::classify_files(data, &skip);
    info!(
        handles = per_handle.len(),
        files = per_file.len(),
        "access patterns classified"
    );

    let trace_name = input.to_string_lossy().into_owned();
    let profile = profile_output::build_profile(data, &per_file, &trace_name);

    let prefix = match output_prefix {
        Some(prefix) => prefix.to_path_buf(),
        None => input.with_extension(""),
    };
    let path = profile_output::write_profile(&profile, &prefix)?;
    Ok(path)
}
