use std::path::PathBuf;
use thiserror::Error;
use trace_model::HandleRef;

/// Fatal reader errors: the archive as a whole cannot be processed.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("can't process OTF files, only OTF2 is supported")]
    OtfUnsupported,

    #[error("can't process JSON input files, support was dropped")]
    JsonUnsupported,

    #[error("unknown trace file type: {}", .path.display())]
    UnknownFileType { path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a trace archive (bad magic)")]
    BadMagic,

    #[error("unsupported archive version {0}")]
    UnsupportedVersion(u32),

    #[error("truncated archive: record stream ended inside record {record}")]
    Truncated { record: u64 },

    #[error("unknown record tag {tag:#04x} at offset {offset}")]
    UnknownRecordTag { tag: u8, offset: usize },

    #[error("malformed string at offset {offset}")]
    InvalidString { offset: usize },

    #[error("malformed varint at offset {offset}")]
    InvalidVarint { offset: usize },

    #[error("record stream ended unexpectedly at offset {offset}")]
    UnexpectedEof { offset: usize },

    #[error("invalid I/O mode byte {byte:#04x} at offset {offset}")]
    InvalidIoMode { byte: u8, offset: usize },
}

pub type Result<T> = std::result::Result<T, ReaderError>;

/// Per-handle ingest errors. One of these aborts the affected handle's
/// analysis; the rest of the trace keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("operation completed out of order (end time {end_time} after {previous})")]
    OutOfOrder { end_time: u64, previous: u64 },

    #[error("operation complete without a matching begin (matching id {matching_id})")]
    OrphanCompletion { matching_id: u64 },

    #[error("matching id {matching_id} reused while still in flight")]
    DuplicateMatchingId { matching_id: u64 },

    #[error("event references undefined I/O handle")]
    UnknownHandle,
}

/// An ingest error attributed to the handle it poisoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleIngestError {
    pub handle: HandleRef,
    pub error: IngestError,
}
