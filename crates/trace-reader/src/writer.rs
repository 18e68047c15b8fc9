//! Archive writer, the inverse of the reader.
//!
//! The profiler itself never writes traces; this exists so tests and
//! tooling can produce well-formed synthetic archives without an
//! instrumented application run.

use crate::decode::{write_optional, write_string, write_uvarint};
use crate::format::{
    ArchiveHeader, IoMode, Tag, CLASS_LOCATION, CLASS_LOCATION_GROUP, CLASS_NODE, CLASS_OTHER,
    MAGIC, METRIC_DOUBLE, METRIC_INT64, METRIC_UINT64, VERSION,
};
use std::path::Path;
use trace_model::{MetricKind, SystemClass};
use zerocopy::IntoBytes;

#[derive(Debug)]
pub struct ArchiveWriter {
    trace_id: u64,
    timer_resolution: u64,
    records: u64,
    buf: Vec<u8>,
}

impl ArchiveWriter {
    pub fn new(trace_id: u64, timer_resolution: u64) -> Self {
        ArchiveWriter {
            trace_id,
            timer_resolution,
            records: 0,
            buf: Vec::new(),
        }
    }

    // ── Definition records ───────────────────────────────────────────

    pub fn def_system_tree_node(
        &mut self,
        id: u64,
        parent: Option<u64>,
        class: SystemClass,
        name: &str,
    ) {
        self.tag(Tag::DefSystemTreeNode);
        write_uvarint(&mut self.buf, id);
        write_optional(&mut self.buf, parent);
        self.buf.push(match class {
            SystemClass::Node => CLASS_NODE,
            SystemClass::LocationGroup => CLASS_LOCATION_GROUP,
            SystemClass::Location => CLASS_LOCATION,
            SystemClass::Other => CLASS_OTHER,
        });
        write_string(&mut self.buf, name);
    }

    pub fn def_paradigm(&mut self, id: u32, name: &str) {
        self.tag(Tag::DefParadigm);
        write_uvarint(&mut self.buf, id as u64);
        write_string(&mut self.buf, name);
    }

    pub fn def_io_paradigm(&mut self, id: u32, name: &str) {
        self.tag(Tag::DefIoParadigm);
        write_uvarint(&mut self.buf, id as u64);
        write_string(&mut self.buf, name);
    }

    pub fn def_region(
        &mut self,
        id: u64,
        paradigm: u32,
        begin_source_line: Option<u32>,
        end_source_line: Option<u32>,
        file_name: &str,
        name: &str,
    ) {
        self.tag(Tag::DefRegion);
        write_uvarint(&mut self.buf, id);
        write_uvarint(&mut self.buf, paradigm as u64);
        write_optional(&mut self.buf, begin_source_line.map(u64::from));
        write_optional(&mut self.buf, end_source_line.map(u64::from));
        write_string(&mut self.buf, file_name);
        write_string(&mut self.buf, name);
    }

    pub fn def_metric(&mut self, id: u64, kind: MetricKind, name: &str, description: &str) {
        self.tag(Tag::DefMetric);
        write_uvarint(&mut self.buf, id);
        self.buf.push(match kind {
            MetricKind::Uint64 => METRIC_UINT64,
            MetricKind::Int64 => METRIC_INT64,
            MetricKind::Double => METRIC_DOUBLE,
        });
        write_string(&mut self.buf, name);
        write_string(&mut self.buf, description);
    }

    pub fn def_io_handle(&mut self, id: u64, paradigm: u32, parent: Option<u64>, path: &str) {
        self.tag(Tag::DefIoHandle);
        write_uvarint(&mut self.buf, id);
        write_uvarint(&mut self.buf, paradigm as u64);
        write_optional(&mut self.buf, parent);
        write_string(&mut self.buf, path);
    }

    // ── Event records ────────────────────────────────────────────────

    pub fn enter(&mut self, location: u64, time: u64, region: u64) {
        self.event(Tag::Enter, location, time);
        write_uvarint(&mut self.buf, region);
    }

    pub fn leave(&mut self, location: u64, time: u64) {
        self.event(Tag::Leave, location, time);
    }

    pub fn metric_sample(&mut self, location: u64, time: u64, metric: u64, value: u64) {
        self.event(Tag::MetricSample, location, time);
        write_uvarint(&mut self.buf, metric);
        write_uvarint(&mut self.buf, value);
    }

    pub fn mpi_send(&mut self, location: u64, time: u64, bytes: u64) {
        self.event(Tag::MpiSend, location, time);
        write_uvarint(&mut self.buf, bytes);
    }

    pub fn mpi_recv(&mut self, location: u64, time: u64, bytes: u64) {
        self.event(Tag::MpiRecv, location, time);
        write_uvarint(&mut self.buf, bytes);
    }

    pub fn mpi_collective(&mut self, location: u64, time: u64, bytes_send: u64, bytes_recv: u64) {
        self.event(Tag::MpiCollective, location, time);
        write_uvarint(&mut self.buf, bytes_send);
        write_uvarint(&mut self.buf, bytes_recv);
    }

    pub fn io_create_handle(&mut self, location: u64, time: u64, handle: u64, duration: u64) {
        self.event(Tag::IoCreateHandle, location, time);
        write_uvarint(&mut self.buf, handle);
        write_uvarint(&mut self.buf, duration);
    }

    pub fn io_destroy_handle(&mut self, location: u64, time: u64, handle: u64, duration: u64) {
        self.event(Tag::IoDestroyHandle, location, time);
        write_uvarint(&mut self.buf, handle);
        write_uvarint(&mut self.buf, duration);
    }

    pub fn io_seek(&mut self, location: u64, time: u64, handle: u64, offset: u64, duration: u64) {
        self.event(Tag::IoSeek, location, time);
        write_uvarint(&mut self.buf, handle);
        write_uvarint(&mut self.buf, offset);
        write_uvarint(&mut self.buf, duration);
    }

    pub fn io_operation_begin(
        &mut self,
        location: u64,
        time: u64,
        handle: u64,
        matching_id: u64,
        mode: IoMode,
        requested: u64,
    ) {
        self.event(Tag::IoOperationBegin, location, time);
        write_uvarint(&mut self.buf, handle);
        write_uvarint(&mut self.buf, matching_id);
        self.buf.push(mode.as_byte());
        write_uvarint(&mut self.buf, requested);
    }

    pub fn io_operation_complete(
        &mut self,
        location: u64,
        time: u64,
        handle: u64,
        matching_id: u64,
        bytes: u64,
    ) {
        self.event(Tag::IoOperationComplete, location, time);
        write_uvarint(&mut self.buf, handle);
        write_uvarint(&mut self.buf, matching_id);
        write_uvarint(&mut self.buf, bytes);
    }

    // ── Output ───────────────────────────────────────────────────────

    pub fn into_bytes(self) -> Vec<u8> {
        let header = ArchiveHeader {
            magic: MAGIC,
            version: VERSION.into(),
            reserved: 0.into(),
            trace_id: self.trace_id.into(),
            timer_resolution: self.timer_resolution.into(),
            record_count: self.records.into(),
        };
        let mut out = header.as_bytes().to_vec();
        out.extend_from_slice(&self.buf);
        out
    }

    pub fn finish(self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.into_bytes())
    }

    fn tag(&mut self, tag: Tag) {
        self.buf.push(tag as u8);
        self.records += 1;
    }

    fn event(&mut self, tag: Tag, location: u64, time: u64) {
        self.tag(tag);
        write_uvarint(&mut self.buf, location);
        write_uvarint(&mut self.buf, time);
    }
}
