use crate::stats::{AnalysisResult, PatternStatistics};
use crate::window::AccessWindow;
use crate::{AccessPattern, IoAccess, TimeInterval, Timestamp, NR_ACCESSES_THRESHOLD};

/// Classifies three consecutive accesses by their offsets and sizes.
///
/// Contiguity wins over equal strides, which win over everything else:
/// `a.fpos + a.size == b.fpos == c.fpos - b.size` is CONTIGUOUS, equal raw
/// offset differences are STRIDED, anything else is RANDOM. Zero sizes are
/// not special-cased here; callers exclude meta records before classifying.
pub fn classify_triad(a: &IoAccess, b: &IoAccess, c: &IoAccess) -> AccessPattern {
    if a.fpos.wrapping_add(a.size) == b.fpos && b.fpos.wrapping_add(b.size) == c.fpos {
        AccessPattern::Contiguous
    } else if stride(a, b) == stride(b, c) {
        AccessPattern::Strided
    } else {
        AccessPattern::Random
    }
}

/// Offset difference between consecutive accesses. Wrapping keeps backward
/// strides exact in the mod-2^64 ring.
fn stride(a: &IoAccess, b: &IoAccess) -> u64 {
    b.fpos.wrapping_sub(a.fpos)
}

/// Segments one handle's access sequence into labeled time intervals with
/// per-pattern statistics.
///
/// Meta records are dropped up front. An empty stream yields an empty
/// result; fewer than [`NR_ACCESSES_THRESHOLD`] transfers yield a single
/// NONE interval spanning them. Everything else runs through the streaming
/// state machine in one pass with `O(1)` auxiliary state.
pub fn detect_local_access_pattern(accesses: &[IoAccess]) -> AnalysisResult {
    let data: Vec<IoAccess> = accesses.iter().filter(|a| !a.is_meta).copied().collect();

    let mut result = AnalysisResult::default();
    let (first, last) = match (data.first(), data.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return result,
    };
    result.seed_labels();

    if data.len() < NR_ACCESSES_THRESHOLD {
        let mut stats = PatternStatistics::ZERO;
        for access in &data {
            stats += PatternStatistics::of(access);
        }
        result.commit(
            TimeInterval::new(first.start_time, last.end_time),
            AccessPattern::None,
            stats,
        );
        return result;
    }

    let mut machine = Machine::start(&data[..NR_ACCESSES_THRESHOLD], result);
    for access in &data[NR_ACCESSES_THRESHOLD..] {
        machine.step(*access);
    }
    machine.finish(last.end_time)
}

/// Streaming classifier state. `state` is the label the open interval is
/// heading towards; `count` is the number of accesses the open interval
/// owns (the access currently being stepped is counted once its branch
/// decides where it belongs).
struct Machine {
    window: AccessWindow,
    state: AccessPattern,
    interval_start: Timestamp,
    curr_stats: PatternStatistics,
    count: usize,
    /// Whether the offsets seen at the last (re)initialization point were
    /// equi-distant; only consulted while in CONTIGUOUS.
    equi_distant: bool,
    /// Record pushed out of the window by the current step.
    evicted: Option<IoAccess>,
    result: AnalysisResult,
}

impl Machine {
    fn start(seed: &[IoAccess], result: AnalysisResult) -> Machine {
        debug_assert_eq!(seed.len(), NR_ACCESSES_THRESHOLD);

        let mut window = AccessWindow::new();
        let mut curr_stats = PatternStatistics::ZERO;
        for access in seed {
            window.push(*access);
            curr_stats += PatternStatistics::of(access);
        }
        let (state, equi_distant) = {
            let [a, b, c] = window.as_triad();
            (classify_triad(a, b, c), stride(a, b) == stride(b, c))
        };

        Machine {
            window,
            state,
            interval_start: seed[0].start_time,
            curr_stats,
            count: NR_ACCESSES_THRESHOLD,
            equi_distant,
            evicted: None,
            result,
        }
    }

    fn step(&mut self, access: IoAccess) {
        self.evicted = self.window.push(access);
        self.curr_stats += PatternStatistics::of(&access);

        match self.state {
            AccessPattern::Contiguous => self.step_contiguous(access),
            AccessPattern::Strided => self.step_strided(access),
            AccessPattern::Random => self.step_random(access),
            AccessPattern::None => unreachable!("state machine never runs under NONE"),
        }
    }

    fn step_contiguous(&mut self, access: IoAccess) {
        let prev = *self.window.at(-1);
        if access.fpos == prev.fpos.wrapping_add(prev.size) {
            self.count += 1;
        } else if self.count > NR_ACCESSES_THRESHOLD {
            self.close_before(access);
        } else if self.equi_distant {
            // The short contiguous run also had equi-distant offsets;
            // reinterpret it retroactively instead of closing.
            self.state = AccessPattern::Strided;
            self.count += 1;
        } else {
            self.state = AccessPattern::Random;
            self.count += 1;
        }
    }

    fn step_strided(&mut self, access: IoAccess) {
        let a = *self.window.at(-2);
        let b = *self.window.at(-1);

        if classify_triad(&a, &b, &access) == AccessPattern::Contiguous
            && self.take_over_window(AccessPattern::Contiguous)
        {
            return;
        }

        if stride(&b, &access) == stride(&a, &b) {
            // Equal stride continues the run; equi-distance is preserved.
            self.count += 1;
        } else if self.count < NR_ACCESSES_THRESHOLD {
            self.state = AccessPattern::Random;
            self.count += 1;
        } else {
            self.close_before(access);
        }
    }

    fn step_random(&mut self, access: IoAccess) {
        let a = *self.window.at(-2);
        let b = *self.window.at(-1);

        let live = classify_triad(&a, &b, &access);
        if live == AccessPattern::Random || !self.take_over_window(live) {
            self.count += 1;
        }
    }

    /// Full break: the open interval closes one access before `access`,
    /// which seeds a fresh interval re-initialized from the latest triad.
    fn close_before(&mut self, access: IoAccess) {
        let prev_end = self.window.at(-1).end_time;
        let committed = self.curr_stats.without(PatternStatistics::of(&access));
        self.result.commit(
            TimeInterval::new(self.interval_start, prev_end),
            self.state,
            committed,
        );

        self.interval_start = access.start_time;
        self.curr_stats = PatternStatistics::of(&access);
        self.count = 1;
        self.reclassify_from_window();
    }

    /// The three window records form `label` and want to become the head of
    /// a `label` interval. When the open interval is exactly the window
    /// triad it is relabeled in place; when closing it would retain at
    /// least [`NR_ACCESSES_THRESHOLD`] accesses it is split, the closed
    /// part keeping the old state and the triad moving to a new interval.
    /// Returns false when the run is too short to close and too long to
    /// relabel, in which case the caller absorbs the observation.
    fn take_over_window(&mut self, label: AccessPattern) -> bool {
        let triad_stats = {
            let [a, b, c] = self.window.as_triad();
            PatternStatistics::of(a) + PatternStatistics::of(b) + PatternStatistics::of(c)
        };

        if self.count == 2 {
            debug_assert_eq!(self.interval_start, self.window.at(-2).start_time);
            debug_assert_eq!(self.curr_stats, triad_stats);
            self.count = NR_ACCESSES_THRESHOLD;
        } else if self.count >= 2 + NR_ACCESSES_THRESHOLD {
            let evicted = self
                .evicted
                .expect("a full run must have evicted a window record");
            let committed = self.curr_stats.without(triad_stats);
            self.result.commit(
                TimeInterval::new(self.interval_start, evicted.end_time),
                self.state,
                committed,
            );

            self.interval_start = self.window.at(-2).start_time;
            self.curr_stats = triad_stats;
            self.count = NR_ACCESSES_THRESHOLD;
        } else {
            return false;
        }

        self.reclassify_from_window();
        debug_assert_eq!(self.state, label);
        true
    }

    /// Re-derives the state and the equi-distance flag from the window.
    fn reclassify_from_window(&mut self) {
        let (state, equi_distant) = {
            let [a, b, c] = self.window.as_triad();
            (classify_triad(a, b, c), stride(a, b) == stride(b, c))
        };
        self.state = state;
        self.equi_distant = equi_distant;
    }

    fn finish(mut self, end: Timestamp) -> AnalysisResult {
        if self.count > 0 {
            self.result.commit(
                TimeInterval::new(self.interval_start, end),
                self.state,
                self.curr_stats,
            );
        }
        self.result
    }
}
