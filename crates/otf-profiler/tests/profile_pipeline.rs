//! End-to-end pipeline test: write a synthetic archive, profile it, and
//! check the emitted JSON.

use tempfile::TempDir;
use trace_model::{MetricKind, SystemClass};
use trace_reader::writer::ArchiveWriter;
use trace_reader::IoMode;

const LOC: u64 = 2;

fn synthetic_trace() -> ArchiveWriter {
    let mut w = ArchiveWriter::new(4242, 1_000_000);
    w.def_system_tree_node(0, None, SystemClass::Node, "node01");
    w.def_system_tree_node(1, Some(0), SystemClass::LocationGroup, "rank 0");
    w.def_system_tree_node(2, Some(1), SystemClass::Location, "thread 0");
    w.def_paradigm(0, "COMPUTE");
    w.def_paradigm(1, "MPI");
    w.def_io_paradigm(0, "POSIX");
    w.def_region(1, 0, Some(1), Some(80), "bench.c", "main");
    w.def_region(2, 1, Some(30), Some(44), "bench.c", "halo");
    w.def_metric(9, MetricKind::Uint64, "PAPI_TOT_INS", "instructions");
    w.def_io_handle(7, 0, None, "/scratch/out.dat");

    w.enter(LOC, 0, 1);
    w.metric_sample(LOC, 2, 9, 5_000);
    w.enter(LOC, 10, 2);
    w.mpi_send(LOC, 11, 1024);
    w.mpi_recv(LOC, 13, 2048);
    w.leave(LOC, 20);

    w.io_create_handle(LOC, 25, 7, 2);
    // Four contiguous writes of 64 bytes, then a seek and two reads: the
    // trailing pair is below the pattern threshold on its own but the file
    // level stream stays one handle here.
    for i in 0..4u64 {
        let t = 30 + i * 10;
        w.io_operation_begin(LOC, t, 7, i, IoMode::Write, 64);
        w.io_operation_complete(LOC, t + 4, 7, i, 64);
    }
    w.io_seek(LOC, 75, 7, 0, 1);
    w.io_operation_begin(LOC, 80, 7, 10, IoMode::Read, 64);
    w.io_operation_complete(LOC, 83, 7, 10, 64);
    w.io_destroy_handle(LOC, 90, 7, 1);
    w.leave(LOC, 100);
    w
}

#[test]
fn pipeline_emits_the_expected_profile() {
    let dir = TempDir::new().unwrap();
    let trace = dir.path().join("bench.otf2");
    synthetic_trace().finish(&trace).unwrap();

    let written = otf_profiler::run(&trace, None).unwrap();
    assert_eq!(written, dir.path().join("bench.json"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&written).unwrap()).unwrap();

    assert_eq!(json["Trace"]["Id"], 4242);
    assert_eq!(json["NodeCount"], 1);
    assert_eq!(json["ProcessCount"], 1);
    assert_eq!(json["ThreadCount"], 1);
    assert_eq!(json["TimerResolution"], 1_000_000);
    assert_eq!(json["HardwareCounters"]["PAPI_TOT_INS"], 5_000);
    assert_eq!(json["TotalFunctions"], 2);
    assert_eq!(json["TotalCalls"], 2);

    assert_eq!(json["Messages"]["MPI"]["Bytes"], 3072);
    assert_eq!(json["Messages"]["MPI"]["Count"], 2);
    assert_eq!(json["IOOperations"]["POSIX"]["Bytes"], 64 * 5);
    assert_eq!(json["IOOperations"]["POSIX"]["Count"], 8);

    let files = json["Files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    let file = &files[0];
    assert_eq!(file["FileName"], "/scratch/out.dat");
    assert_eq!(file["IoParadigm"], serde_json::json!(["POSIX"]));
    assert_eq!(file["AccessModes"], "RW");
    assert_eq!(file["ParentFile"], serde_json::Value::Null);
    assert_eq!(file["#Bytes read"], 64);
    assert_eq!(file["#Bytes write"], 256);
    assert_eq!(file["Nr accesses from different locations"], 5);

    // 4 contiguous writes followed by a read back at offset 0: the merged
    // stream classifies as one contiguous run and a trailing partial run.
    let sizes = &file["I/O sizes per Access Pattern"];
    assert_eq!(sizes["CONTIGUOUS"], 256);
    assert_eq!(sizes["NONE"], 0);
    let ticks = &file["Ticks spent per Access Pattern"];
    let total: u64 = ["NONE", "CONTIGUOUS", "STRIDED", "RANDOM"]
        .iter()
        .map(|label| ticks[*label].as_u64().unwrap())
        .sum();
    assert_eq!(total, 4 * 4 + 3);

    // I/O was issued inside main.
    assert!(json["Regions"]["main:1-80"]["#Bytes write"].as_u64().unwrap() > 0);
}

#[test]
fn output_prefix_is_respected() {
    let dir = TempDir::new().unwrap();
    let trace = dir.path().join("bench.otf2");
    synthetic_trace().finish(&trace).unwrap();

    let prefix = dir.path().join("custom-profile");
    let written = otf_profiler::run(&trace, Some(&prefix)).unwrap();
    assert_eq!(written, dir.path().join("custom-profile.json"));
    assert!(written.exists());
}

#[test]
fn unsupported_inputs_fail_the_run() {
    let dir = TempDir::new().unwrap();
    for name in ["legacy.otf", "old.json", "trace.bin"] {
        let path = dir.path().join(name);
        std::fs::write(&path, b"whatever").unwrap();
        assert!(otf_profiler::run(&path, None).is_err());
    }
}
