//! Classification driver.
//!
//! Classification is pure over each handle's access vector, so this is a
//! straight loop: per-handle results first, then the per-file merge. Both
//! skip handles whose ingest failed; their record streams are untrusted.

use access_pattern::{detect_local_access_pattern, merge_accesses, AnalysisResult};
use profile_output::FilePatterns;
use std::collections::{BTreeMap, HashSet};
use trace_model::{FileId, HandleRef, TraceData};
use trace_reader::HandleIngestError;
use tracing::debug;

pub fn poisoned_handles(errors: &[HandleIngestError]) -> HashSet<HandleRef> {
    errors.iter().map(|e| e.handle).collect()
}

/// Local classification of every healthy handle.
pub fn classify_handles(
    data: &TraceData,
    skip: &HashSet<HandleRef>,
) -> BTreeMap<HandleRef, AnalysisResult> {
    let mut results = BTreeMap::new();
    for (handle_ref, handle) in data.definitions.iohandles.iter() {
        if skip.contains(&handle_ref) {
            continue;
        }
        let result = handle.access_pattern();
        debug!(
            handle = handle_ref,
            intervals = result.pattern_per_interval.len(),
            "handle classified"
        );
        results.insert(handle_ref, result);
    }
    results
}

/// Global classification: each file's healthy handles merged into one
/// stream by completion time.
pub fn classify_files(
    data: &TraceData,
    skip: &HashSet<HandleRef>,
) -> BTreeMap<FileId, FilePatterns> {
    let mut results = BTreeMap::new();
    for (file_id, file) in data.definitions.files.iter() {
        let streams: Vec<(u64, &[access_pattern::IoAccess])> = file
            .handles
            .iter()
            .copied()
            .filter(|h| !skip.contains(h))
            .filter_map(|h| {
                data.definitions
                    .iohandles
                    .get(h)
                    .map(|handle| (h, handle.accesses.as_slice()))
            })
            .collect();

        let merged = merge_accesses(streams);
        results.insert(
            file_id,
            FilePatterns {
                result: detect_local_access_pattern(&merged),
                merged_accesses: merged.len() as u64,
            },
        );
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use access_pattern::{AccessPattern, IoAccess};
    use trace_model::IoHandle;

    fn data_with_two_handles() -> TraceData {
        let mut data = TraceData::default();
        let file = data.definitions.files.intern("/shared.dat");
        for (handle_ref, base) in [(1u64, 0u64), (2, 4)] {
            let mut handle = IoHandle::new(handle_ref, file, 0, None);
            // Handle 1 writes blocks 0,8,16,..., handle 2 blocks 4,12,20,...
            for i in 0..3u64 {
                let t = base + i * 8;
                handle
                    .accesses
                    .push(IoAccess::transfer(t + 2, t, base + i * 8, 4, 2));
            }
            data.definitions.files.attach_handle(file, handle_ref);
            data.definitions.iohandles.add(handle_ref, handle);
        }
        data
    }

    #[test]
    fn per_handle_results_are_local() {
        let data = data_with_two_handles();
        let results = classify_handles(&data, &HashSet::new());
        assert_eq!(results.len(), 2);
        for result in results.values() {
            // Each handle alone is strided with stride 8.
            assert_eq!(
                result.intervals().map(|(_, p)| p).collect::<Vec<_>>(),
                vec![AccessPattern::Strided]
            );
        }
    }

    #[test]
    fn file_merge_sees_the_union() {
        let data = data_with_two_handles();
        let files = classify_files(&data, &HashSet::new());
        let patterns = files.values().next().unwrap();
        assert_eq!(patterns.merged_accesses, 6);
        // Interleaved by completion time the union is contiguous.
        assert_eq!(
            patterns.result.intervals().map(|(_, p)| p).collect::<Vec<_>>(),
            vec![AccessPattern::Contiguous]
        );
    }

    #[test]
    fn poisoned_handles_are_excluded_everywhere() {
        let data = data_with_two_handles();
        let skip: HashSet<_> = [2u64].into();

        let handles = classify_handles(&data, &skip);
        assert!(handles.contains_key(&1));
        assert!(!handles.contains_key(&2));

        let files = classify_files(&data, &skip);
        assert_eq!(files.values().next().unwrap().merged_accesses, 3);
    }
}
