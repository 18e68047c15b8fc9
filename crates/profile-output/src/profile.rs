//! The top-level profile document.

use crate::file_info::{FileInfo, FilePatterns};
use serde::Serialize;
use std::collections::BTreeMap;
use trace_model::{FileId, MetricKind, TraceData};

/// Arbitrary labeled u64 data under one profile key. Zero and undefined
/// (`u64::MAX`) values are dropped so the emitted objects only carry
/// information.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct ProfileEntry {
    entries: BTreeMap<String, u64>,
}

impl ProfileEntry {
    pub fn add_data(&mut self, key: &str, value: u64) {
        if value == 0 || value == u64::MAX {
            return;
        }
        *self.entries.entry(key.to_string()).or_insert(0) += value;
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.entries.get(key).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Serialize)]
pub struct TraceIdentity {
    #[serde(rename = "FileName")]
    pub file_name: String,
    #[serde(rename = "Id")]
    pub id: u64,
}

/// The emitted profile, one object per trace.
#[derive(Debug, Serialize)]
pub struct WorkflowProfile {
    #[serde(rename = "Trace")]
    pub trace: TraceIdentity,
    #[serde(rename = "JobId")]
    pub job_id: u64,
    #[serde(rename = "NodeCount")]
    pub node_count: u32,
    #[serde(rename = "ProcessCount")]
    pub process_count: u32,
    #[serde(rename = "ThreadCount")]
    pub thread_count: u32,
    #[serde(rename = "TimerResolution")]
    pub timer_resolution: u64,
    #[serde(rename = "HardwareCounters")]
    pub counters: BTreeMap<String, u64>,
    #[serde(rename = "Functions", skip_serializing_if = "BTreeMap::is_empty")]
    pub functions_by_paradigm: BTreeMap<String, ProfileEntry>,
    #[serde(rename = "Messages", skip_serializing_if = "BTreeMap::is_empty")]
    pub messages_by_paradigm: BTreeMap<String, ProfileEntry>,
    #[serde(rename = "CollectiveOperations", skip_serializing_if = "BTreeMap::is_empty")]
    pub collops_by_paradigm: BTreeMap<String, ProfileEntry>,
    #[serde(rename = "IOOperations", skip_serializing_if = "BTreeMap::is_empty")]
    pub io_ops_by_paradigm: BTreeMap<String, ProfileEntry>,
    #[serde(rename = "Files")]
    pub file_data: Vec<FileInfo>,
    #[serde(rename = "Regions", skip_serializing_if = "BTreeMap::is_empty")]
    pub io_per_region: BTreeMap<String, ProfileEntry>,
    #[serde(rename = "ParallelRegionTime")]
    pub parallel_region_time: u64,
    #[serde(rename = "SerialRegionTime")]
    pub serial_time: u64,
    #[serde(rename = "TotalFunctions")]
    pub num_functions: u64,
    #[serde(rename = "TotalCalls")]
    pub num_invocations: u64,
}

/// Folds the populated model and the per-file classifications into the
/// profile document.
pub fn build_profile(
    data: &TraceData,
    patterns: &BTreeMap<FileId, FilePatterns>,
    trace_file: &str,
) -> WorkflowProfile {
    use trace_model::SystemClass;

    let defs = &data.definitions;
    let mut profile = WorkflowProfile {
        trace: TraceIdentity {
            file_name: trace_file.to_string(),
            id: data.trace_id,
        },
        job_id: 0,
        node_count: defs.system_tree.count(SystemClass::Node) as u32,
        process_count: defs.system_tree.count(SystemClass::LocationGroup) as u32,
        thread_count: defs.system_tree.count(SystemClass::Location) as u32,
        timer_resolution: data.timer_resolution,
        counters: BTreeMap::new(),
        functions_by_paradigm: BTreeMap::new(),
        messages_by_paradigm: BTreeMap::new(),
        collops_by_paradigm: BTreeMap::new(),
        io_ops_by_paradigm: BTreeMap::new(),
        file_data: Vec::new(),
        io_per_region: BTreeMap::new(),
        parallel_region_time: 0,
        serial_time: 0,
        num_functions: 0,
        num_invocations: 0,
    };

    for node in data.call_path.nodes() {
        let Some(region) = defs.regions.get(node.region) else {
            continue;
        };
        let paradigm = defs
            .paradigms
            .get(region.paradigm)
            .map_or("COMPUTE", |p| p.name.as_str())
            .to_string();

        profile.num_functions += 1;
        let mut excl_time = 0;

        for node_data in node.node_data.values() {
            profile.num_invocations += node_data.f_data.count;
            excl_time = excl_time.max(node_data.f_data.excl_time);

            profile
                .functions_by_paradigm
                .entry(paradigm.clone())
                .or_default()
                .add_data("Count", node_data.f_data.count);

            let messages = profile
                .messages_by_paradigm
                .entry(paradigm.clone())
                .or_default();
            messages.add_data("Bytes", node_data.m_data.bytes_send);
            messages.add_data("Bytes", node_data.m_data.bytes_recv);
            messages.add_data("Count", node_data.m_data.count_send);
            messages.add_data("Count", node_data.m_data.count_recv);

            let collops = profile
                .collops_by_paradigm
                .entry(paradigm.clone())
                .or_default();
            collops.add_data("Bytes", node_data.c_data.bytes_send);
            collops.add_data("Bytes", node_data.c_data.bytes_recv);
            collops.add_data("Count", node_data.c_data.count_send);
            collops.add_data("Count", node_data.c_data.count_recv);

            for (metric_ref, value) in &node_data.metrics {
                let Some(metric) = defs.metrics.get(*metric_ref) else {
                    continue;
                };
                if metric.kind == MetricKind::Uint64 {
                    *profile.counters.entry(metric.name.clone()).or_insert(0) += value;
                }
            }
        }

        if node.node_data.len() == 1 {
            profile.serial_time += excl_time;
        } else {
            profile.parallel_region_time += excl_time;
        }
        profile
            .functions_by_paradigm
            .entry(paradigm)
            .or_default()
            .add_data("Time", excl_time);
    }

    for (paradigm_id, io_data) in &data.io_per_paradigm {
        let Some(paradigm) = defs.io_paradigms.get(*paradigm_id) else {
            continue;
        };
        let entry = profile
            .io_ops_by_paradigm
            .entry(paradigm.name.clone())
            .or_default();
        entry.add_data("Bytes", io_data.num_bytes);
        entry.add_data("Count", io_data.num_operations);
        entry.add_data("TransferOperationTime", io_data.transfer_time);
        entry.add_data("MetaOperationTime", io_data.nontransfer_time);
    }

    for (id, _file) in defs.files.iter() {
        profile
            .file_data
            .push(FileInfo::collect(data, id, patterns.get(&id)));
    }

    for (region_ref, io) in &data.io_per_region {
        let Some(region) = defs.regions.get(*region_ref) else {
            continue;
        };
        let entry = profile.io_per_region.entry(region.source_key()).or_default();
        entry.add_data("#Bytes read", io.read.num_bytes);
        entry.add_data("#Bytes write", io.write.num_bytes);
        entry.add_data("Ticks spent", io.ticks_spent());
    }

    profile
}
