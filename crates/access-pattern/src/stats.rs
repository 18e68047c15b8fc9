use crate::{AccessPattern, IoAccess, TimeInterval};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::{Add, AddAssign};

/// Bytes moved and ticks spent by the accesses attributed to one pattern.
///
/// Forms a commutative monoid under componentwise saturating addition with
/// `(0, 0)` as identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PatternStatistics {
    pub io_size: u64,
    pub ticks_spent: u64,
}

impl PatternStatistics {
    pub const ZERO: PatternStatistics = PatternStatistics {
        io_size: 0,
        ticks_spent: 0,
    };

    /// The contribution of a single access.
    pub fn of(access: &IoAccess) -> Self {
        PatternStatistics {
            io_size: access.size,
            ticks_spent: access.duration,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Removes a previously added contribution. Callers must only remove
    /// what they added; going negative is a logic error.
    pub(crate) fn without(self, rhs: PatternStatistics) -> Self {
        debug_assert!(self.io_size >= rhs.io_size && self.ticks_spent >= rhs.ticks_spent);
        PatternStatistics {
            io_size: self.io_size.saturating_sub(rhs.io_size),
            ticks_spent: self.ticks_spent.saturating_sub(rhs.ticks_spent),
        }
    }
}

impl Add for PatternStatistics {
    type Output = PatternStatistics;

    fn add(self, rhs: PatternStatistics) -> PatternStatistics {
        PatternStatistics {
            io_size: self.io_size.saturating_add(rhs.io_size),
            ticks_spent: self.ticks_spent.saturating_add(rhs.ticks_spent),
        }
    }
}

impl AddAssign for PatternStatistics {
    fn add_assign(&mut self, rhs: PatternStatistics) {
        *self = *self + rhs;
    }
}

/// Outcome of classifying one access stream: the chronological interval
/// labeling and the per-pattern totals.
///
/// For a non-empty stream `stats_per_pattern` carries all four labels, with
/// zero statistics where a pattern never occurred; for an empty stream both
/// maps are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    pub pattern_per_interval: BTreeMap<TimeInterval, AccessPattern>,
    pub stats_per_pattern: BTreeMap<AccessPattern, PatternStatistics>,
}

impl AnalysisResult {
    pub fn is_empty(&self) -> bool {
        self.pattern_per_interval.is_empty() && self.stats_per_pattern.is_empty()
    }

    /// Statistics attributed to `pattern`, zero if it never occurred.
    pub fn stats(&self, pattern: AccessPattern) -> PatternStatistics {
        self.stats_per_pattern
            .get(&pattern)
            .copied()
            .unwrap_or(PatternStatistics::ZERO)
    }

    /// Labeled intervals in chronological order.
    pub fn intervals(&self) -> impl Iterator<Item = (TimeInterval, AccessPattern)> + '_ {
        self.pattern_per_interval.iter().map(|(iv, p)| (*iv, *p))
    }

    pub(crate) fn seed_labels(&mut self) {
        for pattern in AccessPattern::ALL {
            self.stats_per_pattern
                .insert(pattern, PatternStatistics::ZERO);
        }
    }

    pub(crate) fn commit(
        &mut self,
        interval: TimeInterval,
        pattern: AccessPattern,
        stats: PatternStatistics,
    ) {
        self.pattern_per_interval.insert(interval, pattern);
        *self
            .stats_per_pattern
            .entry(pattern)
            .or_insert(PatternStatistics::ZERO) += stats;
    }
}
