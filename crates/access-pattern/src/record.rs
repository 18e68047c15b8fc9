use serde::Serialize;

/// Tick timestamp taken from the trace; resolution is reported by the trace
/// metadata, not here.
pub type Timestamp = u64;

/// One completed I/O operation on one handle.
///
/// `fpos` is the absolute file position at which the operation began,
/// relative to the file size before the traced program ran; offsets are
/// self-consistent across the trace, not against the real filesystem.
/// `duration` is the transfer time the reader measured, which may differ
/// from `end_time - start_time`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoAccess {
    pub end_time: Timestamp,
    pub start_time: Timestamp,
    pub fpos: u64,
    pub size: u64,
    pub duration: u64,
    /// Open/close/seek/stat; meta operations never contribute to a pattern.
    pub is_meta: bool,
}

impl IoAccess {
    /// A completed data transfer.
    pub fn transfer(
        end_time: Timestamp,
        start_time: Timestamp,
        fpos: u64,
        size: u64,
        duration: u64,
    ) -> Self {
        debug_assert!(start_time <= end_time);
        IoAccess {
            end_time,
            start_time,
            fpos,
            size,
            duration,
            is_meta: false,
        }
    }

    /// A metadata operation (open/close/seek/stat); moves no bytes.
    pub fn meta(end_time: Timestamp, start_time: Timestamp, duration: u64) -> Self {
        debug_assert!(start_time <= end_time);
        IoAccess {
            end_time,
            start_time,
            fpos: 0,
            size: 0,
            duration,
            is_meta: true,
        }
    }
}

/// Inclusive range of ticks labeled with one pattern.
///
/// Ordered by `begin`, then `end`, so a sorted map of intervals is in
/// chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TimeInterval {
    pub begin: Timestamp,
    pub end: Timestamp,
}

impl TimeInterval {
    pub fn new(begin: Timestamp, end: Timestamp) -> Self {
        debug_assert!(begin <= end, "interval bounds out of order");
        TimeInterval { begin, end }
    }

    /// Whether `t` falls inside the (inclusive) interval.
    pub fn contains(&self, t: Timestamp) -> bool {
        self.begin <= t && t <= self.end
    }
}
