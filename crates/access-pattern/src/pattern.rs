use serde::Serialize;
use std::fmt;

/// Access pattern of a run of I/O operations, determined by the requested
/// offsets and sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessPattern {
    /// Too few I/O requests to determine a pattern (fewer than
    /// [`NR_ACCESSES_THRESHOLD`](crate::NR_ACCESSES_THRESHOLD)).
    None,
    /// No holes between accesses (`last_fpos + last_size == next_fpos`).
    Contiguous,
    /// Equal distances between offsets, without reading all bytes in
    /// between (which would be contiguous).
    Strided,
    /// None of the above.
    Random,
}

impl AccessPattern {
    /// All labels, in emission order.
    pub const ALL: [AccessPattern; 4] = [
        AccessPattern::None,
        AccessPattern::Contiguous,
        AccessPattern::Strided,
        AccessPattern::Random,
    ];

    /// The string form used in the emitted profile.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessPattern::None => "NONE",
            AccessPattern::Contiguous => "CONTIGUOUS",
            AccessPattern::Strided => "STRIDED",
            AccessPattern::Random => "RANDOM",
        }
    }
}

impl fmt::Display for AccessPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
