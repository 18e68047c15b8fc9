//! Files and open-file handles.
//!
//! Many handles can point at one file, so files live in a registry keyed by
//! path and handles carry a [`FileId`] instead of a shared back-reference.
//! The file's size counter is the one piece of trace-wide mutable state the
//! ingest touches from potentially many workers, so it sits behind a mutex;
//! everything else on [`File`] is written once during definition reading.

use crate::collections::HashMap;
use crate::{HandleRef, LocationRef, ParadigmId};
use access_pattern::{detect_local_access_pattern, AnalysisResult, IoAccess};
use parking_lot::Mutex;
use std::collections::BTreeSet;

/// Index into the [`FileRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(pub u32);

/// A logical file referenced by one or more handles.
#[derive(Debug)]
pub struct File {
    pub path: String,
    /// Handles that performed I/O on this file, in definition order.
    pub handles: Vec<HandleRef>,
    /// High-water mark of positions written, relative to the (unknown) file
    /// size before the traced program ran.
    size: Mutex<u64>,
}

impl File {
    fn new(path: String) -> Self {
        File {
            path,
            handles: Vec::new(),
            size: Mutex::new(0),
        }
    }

    pub fn size(&self) -> u64 {
        *self.size.lock()
    }

    /// Raises the size counter to `end` if it grew. Monotone; concurrent
    /// writers may call this freely.
    pub fn grow_to(&self, end: u64) {
        let mut size = self.size.lock();
        if end > *size {
            *size = end;
        }
    }
}

/// Registry of all files seen in the trace, keyed by path.
#[derive(Debug, Default)]
pub struct FileRegistry {
    by_path: HashMap<String, FileId>,
    files: Vec<File>,
}

impl FileRegistry {
    /// Returns the file for `path`, creating it on first sight.
    pub fn intern(&mut self, path: &str) -> FileId {
        if let Some(id) = self.by_path.get(path) {
            return *id;
        }
        let id = FileId(self.files.len() as u32);
        self.files.push(File::new(path.to_string()));
        self.by_path.insert(path.to_string(), id);
        id
    }

    pub fn get(&self, id: FileId) -> &File {
        &self.files[id.0 as usize]
    }

    pub fn lookup(&self, path: &str) -> Option<FileId> {
        self.by_path.get(path).copied()
    }

    pub fn attach_handle(&mut self, id: FileId, handle: HandleRef) {
        self.files[id.0 as usize].handles.push(handle);
    }

    pub fn iter(&self) -> impl Iterator<Item = (FileId, &File)> {
        self.files
            .iter()
            .enumerate()
            .map(|(idx, file)| (FileId(idx as u32), file))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// An open-file instance owned by a single location.
///
/// The handle owns the per-handle access vector; the classifier reads it by
/// reference and returns an owned result.
#[derive(Debug)]
pub struct IoHandle {
    pub self_ref: HandleRef,
    pub file: FileId,
    pub io_paradigm: ParadigmId,
    pub parent: Option<HandleRef>,
    /// Set once the handle is first used by an event.
    pub location: Option<LocationRef>,
    /// Modes the handle was opened/used in ("R", "W"); ordered so the
    /// concatenated form is deterministic.
    pub modes: BTreeSet<String>,
    /// Completed operations in completion order.
    pub accesses: Vec<IoAccess>,
}

impl IoHandle {
    pub fn new(
        self_ref: HandleRef,
        file: FileId,
        io_paradigm: ParadigmId,
        parent: Option<HandleRef>,
    ) -> Self {
        IoHandle {
            self_ref,
            file,
            io_paradigm,
            parent,
            location: None,
            modes: BTreeSet::new(),
            accesses: Vec::new(),
        }
    }

    /// Local access patterns are computed per handle: a local pattern does
    /// not stretch across opening and closing a file.
    pub fn access_pattern(&self) -> AnalysisResult {
        detect_local_access_pattern(&self.accesses)
    }

    /// Concatenation of the modes this handle was used in.
    pub fn merged_modes(&self) -> String {
        self.modes.iter().map(String::as_str).collect()
    }
}
