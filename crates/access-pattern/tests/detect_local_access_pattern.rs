//! End-to-end fixtures for the local classifier: homogeneous streams, a
//! pattern change mid-stream, and the under-threshold/empty edge cases.

use access_pattern::{
    detect_local_access_pattern, AccessPattern, AnalysisResult, IoAccess, PatternStatistics,
    TimeInterval,
};
use std::collections::BTreeMap;

/// `(end_time, start_time, fpos, size, duration)` transfer records.
fn transfers(specs: &[(u64, u64, u64, u64, u64)]) -> Vec<IoAccess> {
    specs
        .iter()
        .map(|&(end, start, fpos, size, duration)| {
            IoAccess::transfer(end, start, fpos, size, duration)
        })
        .collect()
}

fn stats(io_size: u64, ticks_spent: u64) -> PatternStatistics {
    PatternStatistics {
        io_size,
        ticks_spent,
    }
}

/// The stats map always carries all four labels for non-empty input.
fn stats_with(entries: &[(AccessPattern, PatternStatistics)]) -> BTreeMap<AccessPattern, PatternStatistics> {
    let mut map: BTreeMap<_, _> = AccessPattern::ALL
        .into_iter()
        .map(|p| (p, PatternStatistics::ZERO))
        .collect();
    for &(pattern, value) in entries {
        map.insert(pattern, value);
    }
    map
}

#[test]
fn contiguous_only() {
    let accesses = transfers(&[
        (3, 0, 0, 5, 3),
        (30, 8, 5, 1, 7),
        (33, 31, 6, 67, 3),
        (130, 100, 73, 5, 14),
        (132, 131, 78, 10, 27),
        (135, 132, 88, 5, 33),
    ]);
    let result = detect_local_access_pattern(&accesses);

    assert_eq!(
        result.pattern_per_interval,
        [(TimeInterval::new(0, 135), AccessPattern::Contiguous)].into()
    );
    assert_eq!(
        result.stats_per_pattern,
        stats_with(&[(AccessPattern::Contiguous, stats(93, 87))])
    );
}

#[test]
fn strided_only() {
    let accesses = transfers(&[
        (3, 0, 1000, 5, 3),
        (30, 8, 2000, 1, 7),
        (33, 31, 3000, 67, 3),
        (130, 100, 4000, 5, 14),
        (132, 131, 5000, 10, 27),
        (135, 132, 6000, 5, 33),
    ]);
    let result = detect_local_access_pattern(&accesses);

    assert_eq!(
        result.pattern_per_interval,
        [(TimeInterval::new(0, 135), AccessPattern::Strided)].into()
    );
    assert_eq!(
        result.stats_per_pattern,
        stats_with(&[(AccessPattern::Strided, stats(93, 87))])
    );
}

#[test]
fn strided_with_varying_sizes() {
    let accesses = transfers(&[
        (3, 0, 0, 5, 0),
        (30, 8, 40, 1, 0),
        (33, 31, 80, 23, 0),
        (130, 100, 120, 5, 0),
        (132, 131, 160, 10, 0),
    ]);
    let result = detect_local_access_pattern(&accesses);

    assert_eq!(
        result.pattern_per_interval,
        [(TimeInterval::new(0, 132), AccessPattern::Strided)].into()
    );
}

#[test]
fn random_only() {
    // Primes for offsets should be random enough.
    let accesses = transfers(&[
        (3, 0, 1, 5, 3),
        (30, 8, 5, 1, 7),
        (33, 31, 11, 67, 3),
        (130, 100, 17, 5, 14),
        (132, 131, 23, 10, 27),
        (135, 132, 31, 5, 33),
    ]);
    let result = detect_local_access_pattern(&accesses);

    assert_eq!(
        result.pattern_per_interval,
        [(TimeInterval::new(0, 135), AccessPattern::Random)].into()
    );
    assert_eq!(
        result.stats_per_pattern,
        stats_with(&[(AccessPattern::Random, stats(93, 87))])
    );
}

#[test]
fn strided_then_contiguous() {
    let accesses = transfers(&[
        // Strided block, stride 1000.
        (3, 0, 1000, 5, 3),
        (30, 8, 2000, 1, 7),
        (33, 31, 3000, 67, 3),
        (130, 100, 4000, 5, 14),
        (132, 131, 5000, 10, 27),
        (135, 132, 6000, 5, 33),
        // Contiguous block starting over at the file head.
        (139, 137, 0, 5, 3),
        (141, 140, 5, 1, 7),
        (146, 144, 6, 67, 3),
        (148, 147, 73, 5, 14),
        (151, 150, 78, 10, 27),
        (185, 162, 88, 5, 35),
    ]);
    let result = detect_local_access_pattern(&accesses);

    assert_eq!(
        result.pattern_per_interval,
        [
            (TimeInterval::new(0, 135), AccessPattern::Strided),
            (TimeInterval::new(137, 185), AccessPattern::Contiguous),
        ]
        .into()
    );
    assert_eq!(
        result.stats_per_pattern,
        stats_with(&[
            (AccessPattern::Strided, stats(93, 87)),
            (AccessPattern::Contiguous, stats(93, 89)),
        ])
    );
}

#[test]
fn under_threshold_is_none() {
    let accesses = transfers(&[(3, 0, 0, 5, 3), (30, 8, 5000, 11, 7)]);
    let result = detect_local_access_pattern(&accesses);

    assert_eq!(
        result.pattern_per_interval,
        [(TimeInterval::new(0, 30), AccessPattern::None)].into()
    );
    assert_eq!(
        result.stats_per_pattern,
        stats_with(&[(AccessPattern::None, stats(16, 10))])
    );
}

#[test]
fn empty_input_is_empty_output() {
    let result = detect_local_access_pattern(&[]);
    assert_eq!(result, AnalysisResult::default());
    assert!(result.is_empty());
}

#[test]
fn meta_only_input_is_empty_output() {
    let accesses = vec![IoAccess::meta(1, 0, 1), IoAccess::meta(5, 4, 1)];
    assert!(detect_local_access_pattern(&accesses).is_empty());
}
