//! Per-file statistics as they appear under the profile's `Files` key.

use access_pattern::AnalysisResult;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use trace_model::{Definitions, FileId, TraceData};

/// Result of the global (cross-handle) classification of one file.
#[derive(Debug, Default)]
pub struct FilePatterns {
    /// Classification of the file's merged access stream.
    pub result: AnalysisResult,
    /// Number of accesses in that merged stream.
    pub merged_accesses: u64,
}

/// Everything emitted for one file. Key names are fixed; consumers match
/// on them literally.
#[derive(Debug, Serialize)]
pub struct FileInfo {
    #[serde(rename = "FileName")]
    pub file_name: String,
    #[serde(rename = "IoParadigm")]
    pub io_paradigm: Vec<String>,
    #[serde(rename = "AccessModes")]
    pub access_modes: String,
    #[serde(rename = "ParentFile")]
    pub parent_file: Option<Box<FileInfo>>,
    #[serde(rename = "#Bytes read")]
    pub bytes_read: u64,
    #[serde(rename = "#Bytes write")]
    pub bytes_write: u64,
    #[serde(rename = "Ticks spent")]
    pub ticks_spent: u64,
    #[serde(rename = "Nr accesses from different locations")]
    pub nr_accesses_from_different_locations: u64,
    #[serde(rename = "Ticks spent per Access Pattern")]
    pub ticks_per_pattern: BTreeMap<String, u64>,
    #[serde(rename = "I/O sizes per Access Pattern")]
    pub sizes_per_pattern: BTreeMap<String, u64>,
}

impl FileInfo {
    /// Collects the per-file roll-up: paradigms and modes from the file's
    /// handles, byte/tick totals from the I/O aggregates, and the two
    /// per-pattern objects from the global classification.
    pub fn collect(data: &TraceData, id: FileId, patterns: Option<&FilePatterns>) -> FileInfo {
        let defs = &data.definitions;
        let file = defs.files.get(id);

        let mut paradigms = BTreeSet::new();
        let mut modes = BTreeSet::new();
        for &handle_ref in &file.handles {
            let Some(handle) = defs.iohandles.get(handle_ref) else {
                continue;
            };
            if let Some(paradigm) = defs.io_paradigms.get(handle.io_paradigm) {
                paradigms.insert(paradigm.name.clone());
            }
            modes.extend(handle.modes.iter().cloned());
        }

        let io = data.io_per_file.get(&id).copied().unwrap_or_default();
        let (ticks_per_pattern, sizes_per_pattern, merged_accesses) = match patterns {
            Some(patterns) => (
                pattern_map(&patterns.result, |s| s.ticks_spent),
                pattern_map(&patterns.result, |s| s.io_size),
                patterns.merged_accesses,
            ),
            None => (BTreeMap::new(), BTreeMap::new(), 0),
        };

        FileInfo {
            file_name: file.path.clone(),
            io_paradigm: paradigms.into_iter().collect(),
            access_modes: modes.into_iter().collect::<Vec<_>>().concat(),
            parent_file: parent_of(defs, id).map(|parent| {
                // The pattern objects belong to the file itself; parents
                // only carry their identity and totals.
                Box::new(FileInfo::collect(data, parent, None))
            }),
            bytes_read: io.read.num_bytes,
            bytes_write: io.write.num_bytes,
            ticks_spent: io.ticks_spent(),
            nr_accesses_from_different_locations: merged_accesses,
            ticks_per_pattern,
            sizes_per_pattern,
        }
    }
}

/// First parent file reachable through the file's handles, skipping
/// self-references.
fn parent_of(defs: &Definitions, id: FileId) -> Option<FileId> {
    let file = defs.files.get(id);
    for &handle_ref in &file.handles {
        let handle = defs.iohandles.get(handle_ref)?;
        let parent_handle = handle.parent.and_then(|p| defs.iohandles.get(p));
        if let Some(parent) = parent_handle {
            if parent.file != id {
                return Some(parent.file);
            }
        }
    }
    None
}

fn pattern_map(result: &AnalysisResult, value: impl Fn(access_pattern::PatternStatistics) -> u64) -> BTreeMap<String, u64> {
    result
        .stats_per_pattern
        .iter()
        .map(|(pattern, stats)| (pattern.as_str().to_string(), value(*stats)))
        .collect()
}
