use crate::local::detect_local_access_pattern;
use crate::stats::AnalysisResult;
use crate::IoAccess;

/// Merges the non-meta access streams of every handle open on one file into
/// a single stream ordered by `(end_time, start_time, handle id)`.
///
/// The handle id only breaks timestamp ties, keeping the merge
/// deterministic across runs.
pub fn merge_accesses<'a, I>(handles: I) -> Vec<IoAccess>
where
    I: IntoIterator<Item = (u64, &'a [IoAccess])>,
{
    let mut tagged: Vec<(IoAccess, u64)> = Vec::new();
    for (handle, accesses) in handles {
        tagged.extend(
            accesses
                .iter()
                .filter(|access| !access.is_meta)
                .map(|access| (*access, handle)),
        );
    }
    tagged.sort_by_key(|(access, handle)| (access.end_time, access.start_time, *handle));
    tagged.into_iter().map(|(access, _)| access).collect()
}

/// Classifies the union of all handles' accesses to one file as a single
/// logical stream. Overlapping writes are not reconciled.
pub fn detect_global_access_pattern<'a, I>(handles: I) -> AnalysisResult
where
    I: IntoIterator<Item = (u64, &'a [IoAccess])>,
{
    detect_local_access_pattern(&merge_accesses(handles))
}
