//! The OTF2 archive reader: maps the file, validates the header, then
//! replays the record stream into a [`TraceData`].

use crate::decode::Cursor;
use crate::error::{HandleIngestError, ReaderError, Result};
use crate::format::{
    ArchiveHeader, IoMode, Tag, CLASS_LOCATION, CLASS_LOCATION_GROUP, CLASS_NODE, MAGIC,
    METRIC_DOUBLE, METRIC_INT64, METRIC_UINT64, VERSION,
};
use crate::ingest::{IngestState, MetaEvent};
use memmap2::Mmap;
use rustc_hash::FxHashMap;
use std::fs::File;
use std::mem::size_of;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use trace_model::{
    CollopData, IoHandle, Metric, MetricKind, Paradigm, Region, SystemClass, TraceData,
};
use zerocopy::FromBytes;

/// Everything the reader produced: the populated model plus the per-handle
/// ingest errors that poisoned individual handles along the way.
#[derive(Debug)]
pub struct ReadOutcome {
    pub data: TraceData,
    pub ingest_errors: Vec<HandleIngestError>,
}

#[derive(Debug)]
pub struct Otf2Reader {
    path: PathBuf,
    map: Mmap,
}

impl Otf2Reader {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let io_err = |source| ReaderError::Io {
            path: path.to_path_buf(),
            source,
        };
        let fd = File::open(path).map_err(io_err)?;
        // SAFETY: read-only private mapping of a file the profiler never
        // writes to while running.
        let map = unsafe { Mmap::map(&fd) }.map_err(io_err)?;

        let reader = Otf2Reader {
            path: path.to_path_buf(),
            map,
        };
        reader.header()?;
        Ok(reader)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replays the whole record stream. Fatal archive corruption is an
    /// error; malformed I/O traffic only poisons the affected handles and
    /// is reported in the outcome.
    pub fn read(&self) -> Result<ReadOutcome> {
        let header = self.header()?;
        let mut data = TraceData {
            trace_id: header.trace_id.get(),
            timer_resolution: header.timer_resolution.get(),
            ..TraceData::default()
        };
        let mut ingest = IngestState::default();
        let mut sys_nodes: FxHashMap<u64, usize> = FxHashMap::default();

        let mut cursor = Cursor::new(&self.map[size_of::<ArchiveHeader>()..]);
        let record_count = header.record_count.get();
        for record in 0..record_count {
            let offset = cursor.offset();
            let tag_byte = cursor
                .read_u8()
                .ok_or(ReaderError::Truncated { record })?;
            let tag = Tag::from_u8(tag_byte).ok_or(ReaderError::UnknownRecordTag {
                tag: tag_byte,
                offset,
            })?;
            self.replay(tag, &mut cursor, &mut data, &mut ingest, &mut sys_nodes)?;
        }
        if !cursor.is_at_end() {
            warn!(
                trailing = self.map.len() - size_of::<ArchiveHeader>() - cursor.offset(),
                "trailing bytes after the last record"
            );
        }
        if data.call_path.open_frames() > 0 {
            warn!(
                open_frames = data.call_path.open_frames(),
                "trace ended inside open regions"
            );
        }

        debug!(
            records = record_count,
            handles = data.definitions.iohandles.len(),
            files = data.definitions.files.len(),
            "archive replayed"
        );
        Ok(ReadOutcome {
            data,
            ingest_errors: ingest.into_errors(),
        })
    }

    fn header(&self) -> Result<&ArchiveHeader> {
        let (header, _rest) =
            ArchiveHeader::ref_from_prefix(&self.map).map_err(|_| ReaderError::BadMagic)?;
        if header.magic != MAGIC {
            return Err(ReaderError::BadMagic);
        }
        if header.version.get() != VERSION {
            return Err(ReaderError::UnsupportedVersion(header.version.get()));
        }
        Ok(header)
    }

    fn replay(
        &self,
        tag: Tag,
        cursor: &mut Cursor<'_>,
        data: &mut TraceData,
        ingest: &mut IngestState,
        sys_nodes: &mut FxHashMap<u64, usize>,
    ) -> Result<()> {
        match tag {
            Tag::DefSystemTreeNode => {
                let id = cursor.read_uvarint()?;
                let parent = cursor.read_optional()?;
                let class = match cursor.read_byte()? {
                    CLASS_NODE => SystemClass::Node,
                    CLASS_LOCATION_GROUP => SystemClass::LocationGroup,
                    CLASS_LOCATION => SystemClass::Location,
                    _ => SystemClass::Other,
                };
                let name = cursor.read_string()?;

                let parent = parent.and_then(|p| {
                    let found = sys_nodes.get(&p).copied();
                    if found.is_none() {
                        warn!(node = id, parent = p, "system-tree parent undefined");
                    }
                    found
                });
                let index = data.definitions.system_tree.insert(name, class, parent);
                sys_nodes.insert(id, index);
            }
            Tag::DefParadigm => {
                let id = cursor.read_uvarint()? as u32;
                let name = cursor.read_string()?;
                data.definitions.paradigms.add(id, Paradigm { name });
            }
            Tag::DefIoParadigm => {
                let id = cursor.read_uvarint()? as u32;
                let name = cursor.read_string()?;
                data.definitions.io_paradigms.add(id, Paradigm { name });
            }
            Tag::DefRegion => {
                let id = cursor.read_uvarint()?;
                let paradigm = cursor.read_uvarint()? as u32;
                let begin_source_line = cursor.read_optional()?.map(|l| l as u32);
                let end_source_line = cursor.read_optional()?.map(|l| l as u32);
                let file_name = cursor.read_string()?;
                let name = cursor.read_string()?;
                data.definitions.regions.add(
                    id,
                    Region {
                        name,
                        paradigm,
                        begin_source_line,
                        end_source_line,
                        file_name,
                    },
                );
            }
            Tag::DefMetric => {
                let id = cursor.read_uvarint()?;
                let kind = match cursor.read_byte()? {
                    METRIC_UINT64 => MetricKind::Uint64,
                    METRIC_INT64 => MetricKind::Int64,
                    METRIC_DOUBLE => MetricKind::Double,
                    other => {
                        warn!(metric = id, other, "unknown metric kind, assuming u64");
                        MetricKind::Uint64
                    }
                };
                let name = cursor.read_string()?;
                let description = cursor.read_string()?;
                data.definitions.metrics.add(
                    id,
                    Metric {
                        name,
                        description,
                        kind,
                    },
                );
            }
            Tag::DefIoHandle => {
                let id = cursor.read_uvarint()?;
                let paradigm = cursor.read_uvarint()? as u32;
                let parent = cursor.read_optional()?;
                let path = cursor.read_string()?;

                let file = data.definitions.files.intern(&path);
                data.definitions.files.attach_handle(file, id);
                data.definitions
                    .iohandles
                    .add(id, IoHandle::new(id, file, paradigm, parent));
            }
            Tag::Enter => {
                let (location, time) = event_head(cursor)?;
                let region = cursor.read_uvarint()?;
                data.call_path.enter(location, region, time);
            }
            Tag::Leave => {
                let (location, time) = event_head(cursor)?;
                if data.call_path.leave(location, time).is_err() {
                    warn!(location, time, "leave without matching enter");
                }
            }
            Tag::MetricSample => {
                let (location, _time) = event_head(cursor)?;
                let metric = cursor.read_uvarint()?;
                let value = cursor.read_uvarint()?;
                if let Some(node) = data.call_path.current_data(location) {
                    *node.metrics.entry(metric).or_insert(0) += value;
                }
            }
            Tag::MpiSend => {
                let (location, _time) = event_head(cursor)?;
                let bytes = cursor.read_uvarint()?;
                if let Some(node) = data.call_path.current_data(location) {
                    node.m_data.count_send += 1;
                    node.m_data.bytes_send += bytes;
                }
            }
            Tag::MpiRecv => {
                let (location, _time) = event_head(cursor)?;
                let bytes = cursor.read_uvarint()?;
                if let Some(node) = data.call_path.current_data(location) {
                    node.m_data.count_recv += 1;
                    node.m_data.bytes_recv += bytes;
                }
            }
            Tag::MpiCollective => {
                let (location, _time) = event_head(cursor)?;
                let bytes_send = cursor.read_uvarint()?;
                let bytes_recv = cursor.read_uvarint()?;
                if let Some(node) = data.call_path.current_data(location) {
                    node.c_data += CollopData {
                        count_send: 1,
                        count_recv: 1,
                        bytes_send,
                        bytes_recv,
                    };
                }
            }
            Tag::IoCreateHandle => {
                let ev = meta_event(cursor)?;
                ingest.on_io_create(data, ev);
            }
            Tag::IoDestroyHandle => {
                let ev = meta_event(cursor)?;
                ingest.on_io_destroy(data, ev);
            }
            Tag::IoSeek => {
                let (location, time) = event_head(cursor)?;
                let handle = cursor.read_uvarint()?;
                let offset = cursor.read_uvarint()?;
                let duration = cursor.read_uvarint()?;
                ingest.on_io_seek(
                    data,
                    MetaEvent {
                        location,
                        time,
                        handle,
                        duration,
                    },
                    offset,
                );
            }
            Tag::IoOperationBegin => {
                let (location, time) = event_head(cursor)?;
                let handle = cursor.read_uvarint()?;
                let matching_id = cursor.read_uvarint()?;
                let mode_offset = cursor.offset();
                let mode_byte = cursor.read_byte()?;
                let _requested = cursor.read_uvarint()?;
                // An unreadable mode byte means a miswritten archive, not a
                // handle-level problem.
                let mode = IoMode::from_byte(mode_byte).ok_or(ReaderError::InvalidIoMode {
                    byte: mode_byte,
                    offset: mode_offset,
                })?;
                ingest.on_io_begin(data, location, time, handle, matching_id, mode);
            }
            Tag::IoOperationComplete => {
                let (location, time) = event_head(cursor)?;
                let handle = cursor.read_uvarint()?;
                let matching_id = cursor.read_uvarint()?;
                let bytes = cursor.read_uvarint()?;
                ingest.on_io_complete(data, location, time, handle, matching_id, bytes);
            }
        }
        Ok(())
    }
}

fn event_head(cursor: &mut Cursor<'_>) -> Result<(u64, u64)> {
    let location = cursor.read_uvarint()?;
    let time = cursor.read_uvarint()?;
    Ok((location, time))
}

fn meta_event(cursor: &mut Cursor<'_>) -> Result<MetaEvent> {
    let (location, time) = event_head(cursor)?;
    let handle = cursor.read_uvarint()?;
    let duration = cursor.read_uvarint()?;
    Ok(MetaEvent {
        location,
        time,
        handle,
        duration,
    })
}
