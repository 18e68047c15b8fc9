//! Global trace definitions: regions, paradigms, metrics, the system tree,
//! and the generic id-keyed table they all live in.

use crate::collections::HashMap;
use crate::registry::{FileRegistry, IoHandle};
use crate::{HandleRef, MetricRef, ParadigmId, RegionRef};
use tracing::warn;

/// Id-keyed definition table. Lookups of unknown ids are not an error at
/// this layer; the reader decides whether a dangling reference is fatal.
#[derive(Debug)]
pub struct DefTable<Id, T> {
    entries: HashMap<Id, T>,
}

impl<Id, T> Default for DefTable<Id, T> {
    fn default() -> Self {
        DefTable {
            entries: HashMap::default(),
        }
    }
}

impl<Id, T> DefTable<Id, T>
where
    Id: std::hash::Hash + Eq + Copy + std::fmt::Debug,
{
    pub fn add(&mut self, id: Id, value: T) {
        if self.entries.insert(id, value).is_some() {
            warn!(?id, "definition redefined, keeping the newer entry");
        }
    }

    pub fn get(&self, id: Id) -> Option<&T> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: Id) -> Option<&mut T> {
        self.entries.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Id, &T)> {
        self.entries.iter().map(|(id, value)| (*id, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A source region (function or code block) as defined by the trace.
#[derive(Debug, Clone)]
pub struct Region {
    pub name: String,
    pub paradigm: ParadigmId,
    pub begin_source_line: Option<u32>,
    pub end_source_line: Option<u32>,
    pub file_name: String,
}

impl Region {
    /// `name:begin-end` key used for per-region roll-ups; unknown source
    /// lines print as `?`.
    pub fn source_key(&self) -> String {
        let line = |l: Option<u32>| l.map_or_else(|| "?".to_string(), |l| l.to_string());
        format!(
            "{}:{}-{}",
            self.name,
            line(self.begin_source_line),
            line(self.end_source_line)
        )
    }
}

/// A programming paradigm (MPI, OpenMP, POSIX I/O, ...) referenced by
/// regions and I/O handles.
#[derive(Debug, Clone)]
pub struct Paradigm {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Uint64,
    Int64,
    Double,
}

/// A hardware/software counter definition.
#[derive(Debug, Clone)]
pub struct Metric {
    pub name: String,
    pub description: String,
    pub kind: MetricKind,
}

/// Coarse class of a system-tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemClass {
    Node,
    LocationGroup,
    Location,
    Other,
}

#[derive(Debug, Clone)]
pub struct SystemNode {
    pub name: String,
    pub class: SystemClass,
    pub parent: Option<usize>,
}

/// System topology of the traced machine, flattened to parent links. The
/// emitter only needs per-class counts, but the names are kept for
/// diagnostics.
#[derive(Debug, Default)]
pub struct SystemTree {
    nodes: Vec<SystemNode>,
}

impl SystemTree {
    /// Inserts a node and returns its index. `parent` must already exist.
    pub fn insert(&mut self, name: String, class: SystemClass, parent: Option<usize>) -> usize {
        debug_assert!(parent.map_or(true, |p| p < self.nodes.len()));
        self.nodes.push(SystemNode {
            name,
            class,
            parent,
        });
        self.nodes.len() - 1
    }

    pub fn nodes(&self) -> &[SystemNode] {
        &self.nodes
    }

    pub fn count(&self, class: SystemClass) -> usize {
        self.nodes.iter().filter(|n| n.class == class).count()
    }
}

/// All global definitions read from one trace.
#[derive(Debug, Default)]
pub struct Definitions {
    pub regions: DefTable<RegionRef, Region>,
    pub paradigms: DefTable<ParadigmId, Paradigm>,
    pub io_paradigms: DefTable<ParadigmId, Paradigm>,
    pub metrics: DefTable<MetricRef, Metric>,
    pub iohandles: DefTable<HandleRef, IoHandle>,
    pub files: FileRegistry,
    pub system_tree: SystemTree,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn def_table_add_and_get() {
        let mut table: DefTable<u64, Region> = DefTable::default();
        table.add(
            7,
            Region {
                name: "main".into(),
                paradigm: 0,
                begin_source_line: Some(10),
                end_source_line: Some(42),
                file_name: "main.c".into(),
            },
        );
        assert_eq!(table.get(7).unwrap().name, "main");
        assert!(table.get(8).is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn region_source_key_prints_unknown_lines() {
        let region = Region {
            name: "do_io".into(),
            paradigm: 0,
            begin_source_line: None,
            end_source_line: Some(9),
            file_name: "io.c".into(),
        };
        assert_eq!(region.source_key(), "do_io:?-9");
    }

    #[test]
    fn system_tree_counts_per_class() {
        let mut tree = SystemTree::default();
        let machine = tree.insert("cluster".into(), SystemClass::Other, None);
        let node = tree.insert("node01".into(), SystemClass::Node, Some(machine));
        let rank = tree.insert("rank 0".into(), SystemClass::LocationGroup, Some(node));
        tree.insert("thread 0".into(), SystemClass::Location, Some(rank));
        tree.insert("thread 1".into(), SystemClass::Location, Some(rank));

        assert_eq!(tree.count(SystemClass::Node), 1);
        assert_eq!(tree.count(SystemClass::LocationGroup), 1);
        assert_eq!(tree.count(SystemClass::Location), 2);
    }
}
