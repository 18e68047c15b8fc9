//! In-memory model of one trace: global definitions, the file/handle
//! registry, the call-path tree, and the additive I/O aggregates the
//! profile is built from.
//!
//! The model is populated by the trace reader and consumed read-only by the
//! classifier driver and the profile emitter. The per-file size counter is
//! the only interior-mutable cell (see [`registry::File`]); everything else
//! follows a single-writer discipline.

// Internal collection type aliases (not re-exported)
mod collections;

pub mod call_path;
pub mod definitions;
pub mod registry;
pub mod stats;

pub use call_path::{CallPathError, CallPathTree, NodeData};
pub use definitions::{
    DefTable, Definitions, Metric, MetricKind, Paradigm, Region, SystemClass, SystemTree,
};
pub use registry::{File, FileId, FileRegistry, IoHandle};
pub use stats::{CollopData, FunctionData, IoData, MessageData, PerModeIo};

/// Reference ids as they appear in the trace definitions.
pub type RegionRef = u64;
pub type ParadigmId = u32;
pub type MetricRef = u64;
pub type HandleRef = u64;
pub type LocationRef = u64;

use collections::HashMap;

/// Everything the reader accumulates for one trace.
#[derive(Debug, Default)]
pub struct TraceData {
    pub definitions: Definitions,
    pub call_path: CallPathTree,
    /// Identifier the trace carries for itself.
    pub trace_id: u64,
    /// Ticks per second, from the clock-properties definition.
    pub timer_resolution: u64,
    /// I/O summary per I/O paradigm.
    pub io_per_paradigm: HashMap<ParadigmId, IoData>,
    /// Read/write I/O split per file.
    pub io_per_file: HashMap<FileId, PerModeIo>,
    /// Read/write I/O split per issuing region.
    pub io_per_region: HashMap<RegionRef, PerModeIo>,
}
