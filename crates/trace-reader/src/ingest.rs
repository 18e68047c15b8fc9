//! Ingest adapter: raw I/O events in, access records out.
//!
//! Operation-begin events wait in a pending table keyed by `(handle,
//! matching id)` until their completion arrives. The completed pair becomes
//! one access record: start at the begin timestamp, end at the completion
//! timestamp, duration measured between the two, file position taken from
//! the handle's tracked cursor. Open, close, and seek become meta records.
//!
//! A malformed event poisons only its handle: the error is recorded, the
//! handle's further events are ignored, and every other handle proceeds.

use crate::error::{HandleIngestError, IngestError};
use crate::format::IoMode;
use access_pattern::IoAccess;
use rustc_hash::{FxHashMap, FxHashSet};
use trace_model::{HandleRef, IoData, LocationRef, PerModeIo, TraceData};

#[derive(Debug, Clone, Copy)]
struct PendingOp {
    begin_time: u64,
    mode: IoMode,
}

#[derive(Debug, Default)]
pub(crate) struct IngestState {
    /// Tracked file position per handle, advanced by completions and moved
    /// by seeks.
    fpos: FxHashMap<HandleRef, u64>,
    /// Last completion timestamp per handle, for the ordering check.
    last_end: FxHashMap<HandleRef, u64>,
    pending: FxHashMap<(HandleRef, u64), PendingOp>,
    poisoned: FxHashSet<HandleRef>,
    errors: Vec<HandleIngestError>,
}

impl IngestState {
    pub fn on_io_create(&mut self, data: &mut TraceData, ev: MetaEvent) {
        self.meta_op(data, ev);
    }

    pub fn on_io_destroy(&mut self, data: &mut TraceData, ev: MetaEvent) {
        self.meta_op(data, ev);
    }

    pub fn on_io_seek(&mut self, data: &mut TraceData, ev: MetaEvent, offset: u64) {
        if self.meta_op(data, ev) {
            self.fpos.insert(ev.handle, offset);
        }
    }

    pub fn on_io_begin(
        &mut self,
        data: &mut TraceData,
        location: LocationRef,
        time: u64,
        handle: HandleRef,
        matching_id: u64,
        mode: IoMode,
    ) {
        if self.poisoned.contains(&handle) {
            return;
        }
        let Some(io_handle) = data.definitions.iohandles.get_mut(handle) else {
            self.poison(handle, IngestError::UnknownHandle);
            return;
        };
        io_handle.location.get_or_insert(location);
        io_handle.modes.insert(mode.as_str().to_string());

        let key = (handle, matching_id);
        if self.pending.contains_key(&key) {
            self.poison(handle, IngestError::DuplicateMatchingId { matching_id });
            return;
        }
        self.pending.insert(
            key,
            PendingOp {
                begin_time: time,
                mode,
            },
        );
    }

    pub fn on_io_complete(
        &mut self,
        data: &mut TraceData,
        location: LocationRef,
        time: u64,
        handle: HandleRef,
        matching_id: u64,
        bytes: u64,
    ) {
        if self.poisoned.contains(&handle) {
            return;
        }
        let Some(op) = self.pending.remove(&(handle, matching_id)) else {
            self.poison(handle, IngestError::OrphanCompletion { matching_id });
            return;
        };
        if time < op.begin_time {
            self.poison(
                handle,
                IngestError::OutOfOrder {
                    end_time: time,
                    previous: op.begin_time,
                },
            );
            return;
        }
        let previous = self.last_end.get(&handle).copied().unwrap_or(0);
        if time < previous {
            self.poison(
                handle,
                IngestError::OutOfOrder {
                    end_time: time,
                    previous,
                },
            );
            return;
        }
        self.last_end.insert(handle, time);

        let duration = time - op.begin_time;
        let fpos = self.fpos.get(&handle).copied().unwrap_or(0);

        let (file, paradigm) = {
            let Some(io_handle) = data.definitions.iohandles.get_mut(handle) else {
                self.poison(handle, IngestError::UnknownHandle);
                return;
            };
            io_handle
                .accesses
                .push(IoAccess::transfer(time, op.begin_time, fpos, bytes, duration));
            (io_handle.file, io_handle.io_paradigm)
        };

        let end_pos = fpos.saturating_add(bytes);
        self.fpos.insert(handle, end_pos);
        if op.mode == IoMode::Write {
            data.definitions.files.get(file).grow_to(end_pos);
        }

        data.io_per_paradigm
            .entry(paradigm)
            .or_default()
            .record_transfer(bytes, duration);
        directed(data.io_per_file.entry(file).or_default(), op.mode)
            .record_transfer(bytes, duration);
        if let Some(region) = data.call_path.current_region(location) {
            directed(data.io_per_region.entry(region).or_default(), op.mode)
                .record_transfer(bytes, duration);
        }
    }

    /// Errors collected so far, in event order.
    pub fn into_errors(self) -> Vec<HandleIngestError> {
        self.errors
    }

    /// Common path of open/close/seek: a meta access record plus the meta
    /// time bookkeeping. Returns false when the handle is unusable.
    fn meta_op(&mut self, data: &mut TraceData, ev: MetaEvent) -> bool {
        if self.poisoned.contains(&ev.handle) {
            return false;
        }
        let (file, paradigm) = {
            let Some(io_handle) = data.definitions.iohandles.get_mut(ev.handle) else {
                self.poison(ev.handle, IngestError::UnknownHandle);
                return false;
            };
            io_handle.location.get_or_insert(ev.location);
            let start = ev.time.saturating_sub(ev.duration);
            io_handle
                .accesses
                .push(IoAccess::meta(ev.time, start, ev.duration));
            (io_handle.file, io_handle.io_paradigm)
        };

        data.io_per_paradigm
            .entry(paradigm)
            .or_default()
            .record_meta(ev.duration);
        data.io_per_file
            .entry(file)
            .or_default()
            .meta
            .record_meta(ev.duration);
        if let Some(region) = data.call_path.current_region(ev.location) {
            data.io_per_region
                .entry(region)
                .or_default()
                .meta
                .record_meta(ev.duration);
        }
        true
    }

    fn poison(&mut self, handle: HandleRef, error: IngestError) {
        tracing::warn!(handle, %error, "ingest error, aborting this handle's analysis");
        self.poisoned.insert(handle);
        self.errors.push(HandleIngestError { handle, error });
    }
}

/// Fields shared by the three metadata events.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MetaEvent {
    pub location: LocationRef,
    pub time: u64,
    pub handle: HandleRef,
    pub duration: u64,
}

fn directed(per_mode: &mut PerModeIo, mode: IoMode) -> &mut IoData {
    match mode {
        IoMode::Read => &mut per_mode.read,
        IoMode::Write => &mut per_mode.write,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trace_model::IoHandle;

    const LOC: LocationRef = 7;
    const HANDLE: HandleRef = 1;

    fn data_with_handle() -> TraceData {
        let mut data = TraceData::default();
        let file = data.definitions.files.intern("/scratch/out.dat");
        data.definitions.files.attach_handle(file, HANDLE);
        data.definitions
            .iohandles
            .add(HANDLE, IoHandle::new(HANDLE, file, 0, None));
        data
    }

    fn accesses(data: &TraceData) -> &[IoAccess] {
        &data.definitions.iohandles.get(HANDLE).unwrap().accesses
    }

    #[test]
    fn begin_complete_pairs_become_transfers() {
        let mut data = data_with_handle();
        let mut ingest = IngestState::default();

        ingest.on_io_begin(&mut data, LOC, 10, HANDLE, 1, IoMode::Write);
        ingest.on_io_complete(&mut data, LOC, 25, HANDLE, 1, 100);
        ingest.on_io_begin(&mut data, LOC, 30, HANDLE, 2, IoMode::Write);
        ingest.on_io_complete(&mut data, LOC, 41, HANDLE, 2, 50);

        let recorded = accesses(&data);
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0], IoAccess::transfer(25, 10, 0, 100, 15));
        // The second operation continues at the advanced position.
        assert_eq!(recorded[1], IoAccess::transfer(41, 30, 100, 50, 11));
        assert!(ingest.into_errors().is_empty());

        let file = data.definitions.files.lookup("/scratch/out.dat").unwrap();
        assert_eq!(data.definitions.files.get(file).size(), 150);
        assert_eq!(data.io_per_file[&file].write.num_bytes, 150);
        assert_eq!(data.io_per_file[&file].write.transfer_time, 26);
    }

    #[test]
    fn seek_moves_the_tracked_position() {
        let mut data = data_with_handle();
        let mut ingest = IngestState::default();

        ingest.on_io_seek(
            &mut data,
            MetaEvent {
                location: LOC,
                time: 5,
                handle: HANDLE,
                duration: 2,
            },
            4096,
        );
        ingest.on_io_begin(&mut data, LOC, 10, HANDLE, 1, IoMode::Read);
        ingest.on_io_complete(&mut data, LOC, 12, HANDLE, 1, 8);

        let recorded = accesses(&data);
        assert_eq!(recorded.len(), 2);
        assert!(recorded[0].is_meta);
        assert_eq!(recorded[1].fpos, 4096);
        // Reads never move the size counter.
        let file = data.definitions.files.lookup("/scratch/out.dat").unwrap();
        assert_eq!(data.definitions.files.get(file).size(), 0);
    }

    #[test]
    fn orphan_completion_poisons_the_handle() {
        let mut data = data_with_handle();
        let mut ingest = IngestState::default();

        ingest.on_io_complete(&mut data, LOC, 10, HANDLE, 9, 100);
        // Later well-formed traffic on the same handle is ignored.
        ingest.on_io_begin(&mut data, LOC, 20, HANDLE, 1, IoMode::Read);
        ingest.on_io_complete(&mut data, LOC, 30, HANDLE, 1, 8);

        assert!(accesses(&data).is_empty());
        let errors = ingest.into_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].handle, HANDLE);
        assert!(matches!(
            errors[0].error,
            IngestError::OrphanCompletion { matching_id: 9 }
        ));
    }

    #[test]
    fn out_of_order_completion_poisons_the_handle() {
        let mut data = data_with_handle();
        let mut ingest = IngestState::default();

        ingest.on_io_begin(&mut data, LOC, 10, HANDLE, 1, IoMode::Read);
        ingest.on_io_complete(&mut data, LOC, 50, HANDLE, 1, 8);
        ingest.on_io_begin(&mut data, LOC, 20, HANDLE, 2, IoMode::Read);
        ingest.on_io_complete(&mut data, LOC, 40, HANDLE, 2, 8);

        let errors = ingest.into_errors();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0].error, IngestError::OutOfOrder { .. }));
    }

    #[test]
    fn duplicate_matching_id_poisons_the_handle() {
        let mut data = data_with_handle();
        let mut ingest = IngestState::default();

        ingest.on_io_begin(&mut data, LOC, 10, HANDLE, 1, IoMode::Read);
        ingest.on_io_begin(&mut data, LOC, 11, HANDLE, 1, IoMode::Read);

        let errors = ingest.into_errors();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0].error,
            IngestError::DuplicateMatchingId { matching_id: 1 }
        ));
    }

    #[test]
    fn undefined_handles_are_per_handle_errors() {
        let mut data = data_with_handle();
        let mut ingest = IngestState::default();

        ingest.on_io_begin(&mut data, LOC, 10, 999, 1, IoMode::Read);
        // The defined handle is unaffected.
        ingest.on_io_begin(&mut data, LOC, 12, HANDLE, 1, IoMode::Read);
        ingest.on_io_complete(&mut data, LOC, 14, HANDLE, 1, 4);

        assert_eq!(accesses(&data).len(), 1);
        let errors = ingest.into_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].handle, 999);
    }

    #[test]
    fn open_and_close_record_meta_time() {
        let mut data = data_with_handle();
        let mut ingest = IngestState::default();

        ingest.on_io_create(
            &mut data,
            MetaEvent {
                location: LOC,
                time: 4,
                handle: HANDLE,
                duration: 3,
            },
        );
        ingest.on_io_destroy(
            &mut data,
            MetaEvent {
                location: LOC,
                time: 90,
                handle: HANDLE,
                duration: 1,
            },
        );

        let recorded = accesses(&data);
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0], IoAccess::meta(4, 1, 3));
        assert_eq!(data.io_per_paradigm[&0].nontransfer_time, 4);
        let file = data.definitions.files.lookup("/scratch/out.dat").unwrap();
        assert_eq!(data.io_per_file[&file].meta.nontransfer_time, 4);
    }
}
