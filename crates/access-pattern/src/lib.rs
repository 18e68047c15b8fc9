//! Access-pattern detection over per-handle I/O streams.
//!
//! Given the sequence of operations performed through one open-file handle,
//! [`detect_local_access_pattern`] segments the handle's lifetime into
//! consecutive time intervals, labels each with an [`AccessPattern`], and
//! accumulates per-pattern [`PatternStatistics`] (bytes moved, ticks spent).
//! [`detect_global_access_pattern`] merges the streams of every handle open
//! on one file and classifies the union as a single logical stream.
//!
//! Detection runs in a single pass over the stream with a sliding
//! [`AccessWindow`] of the last three transfers:
//!
//! ```text
//! accesses:  a0 a1 a2 a3 a4 a5 a6 a7 ...
//!                      [a3 a4 a5]          <- window
//!            |— STRIDED —|—— CONTIGUOUS ...
//! ```
//!
//! Classification is pure: it takes the access slice by reference, touches no
//! global state, and returns an owned [`AnalysisResult`]. Callers may
//! therefore classify many handles in parallel.

mod global;
mod local;
mod pattern;
mod record;
mod stats;
mod window;

pub use global::{detect_global_access_pattern, merge_accesses};
pub use local::{classify_triad, detect_local_access_pattern};
pub use pattern::AccessPattern;
pub use record::{IoAccess, TimeInterval, Timestamp};
pub use stats::{AnalysisResult, PatternStatistics};
pub use window::AccessWindow;

/// Number of accesses from which on we can start speaking of access
/// patterns; a single access cannot showcase a pattern.
pub const NR_ACCESSES_THRESHOLD: usize = 3;

/// Share of offsets/sizes that must agree for a "nearly equal" variant of
/// the classifier. Reserved for future EQUALLY_SIZED-style labels; unused by
/// the four-label model.
pub const ALMOST_EQUAL_THRESHOLD: f64 = 0.95;
