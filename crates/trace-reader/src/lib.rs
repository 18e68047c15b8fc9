//! Trace archive reading and the ingest seam.
//!
//! The profiler consumes OTF2 trace archives. This crate owns the boundary:
//! [`open_trace`] validates the input path (only the `.otf2` extension is
//! accepted), [`Otf2Reader`] decodes the archive into a
//! [`trace_model::TraceData`], and the ingest adapter inside it turns raw
//! I/O begin/complete/seek events into the per-handle access records the
//! classifier runs on.
//!
//! # Archive layout
//!
//! The archive is a single file: a fixed little-endian header followed by a
//! stream of tagged records.
//!
//! ```text
//! +--------------------------------------+
//! | magic "OTF2TRC\0"            (8 B)   |
//! | version                      (4 B)   |
//! | reserved                     (4 B)   |
//! | trace id                     (8 B)   |
//! | timer resolution             (8 B)   |
//! | record count                 (8 B)   |
//! +--------------------------------------+
//! | record: tag (1 B) + fields           |
//! | record: tag (1 B) + fields           |
//! | ...                                  |
//! +--------------------------------------+
//! ```
//!
//! Record fields are ULEB128 varints; strings are length-prefixed UTF-8.
//! Definition records (system tree, paradigms, regions, metrics, I/O
//! handles) and event records (enter/leave, metric samples, MPI traffic,
//! I/O operations) share one stream; events referencing undefined handles
//! are ingest errors for that handle, not fatal.

#[macro_use]
extern crate static_assertions;

mod archive;
mod decode;
mod error;
mod format;
mod ingest;
pub mod writer;

pub use archive::{Otf2Reader, ReadOutcome};
pub use error::{HandleIngestError, IngestError, ReaderError, Result};
pub use format::IoMode;

use std::path::Path;

/// Opens the trace at `path`, dispatching on the file extension.
///
/// `.otf2` is the only supported trace format; `.otf` and `.json` inputs
/// get a dedicated diagnostic since both used to be common requests.
pub fn open_trace(path: &Path) -> Result<Otf2Reader> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("otf2") => Otf2Reader::open(path),
        Some("otf") => Err(ReaderError::OtfUnsupported),
        Some("json") => Err(ReaderError::JsonUnsupported),
        _ => Err(ReaderError::UnknownFileType {
            path: path.to_path_buf(),
        }),
    }
}
