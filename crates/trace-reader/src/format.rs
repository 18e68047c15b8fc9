//! On-disk layout constants shared by the reader and the writer.

use zerocopy::byteorder::little_endian::{U32, U64};
use zerocopy_derive::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

pub const MAGIC: [u8; 8] = *b"OTF2TRC\0";
pub const VERSION: u32 = 1;

/// Fixed archive header; everything after it is the record stream.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct ArchiveHeader {
    pub magic: [u8; 8],
    pub version: U32,
    pub reserved: U32,
    pub trace_id: U64,
    pub timer_resolution: U64,
    pub record_count: U64,
}

const_assert_eq!(std::mem::size_of::<ArchiveHeader>(), 40);

/// Record tags. Definitions and events share the stream; events start at
/// 16 so the two ranges stay visually apart in hexdumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
    DefSystemTreeNode = 1,
    DefParadigm = 2,
    DefIoParadigm = 3,
    DefRegion = 4,
    DefMetric = 5,
    DefIoHandle = 6,

    Enter = 16,
    Leave = 17,
    MetricSample = 18,
    MpiSend = 19,
    MpiRecv = 20,
    MpiCollective = 21,
    IoCreateHandle = 22,
    IoDestroyHandle = 23,
    IoSeek = 24,
    IoOperationBegin = 25,
    IoOperationComplete = 26,
}

impl Tag {
    pub fn from_u8(tag: u8) -> Option<Tag> {
        Some(match tag {
            1 => Tag::DefSystemTreeNode,
            2 => Tag::DefParadigm,
            3 => Tag::DefIoParadigm,
            4 => Tag::DefRegion,
            5 => Tag::DefMetric,
            6 => Tag::DefIoHandle,
            16 => Tag::Enter,
            17 => Tag::Leave,
            18 => Tag::MetricSample,
            19 => Tag::MpiSend,
            20 => Tag::MpiRecv,
            21 => Tag::MpiCollective,
            22 => Tag::IoCreateHandle,
            23 => Tag::IoDestroyHandle,
            24 => Tag::IoSeek,
            25 => Tag::IoOperationBegin,
            26 => Tag::IoOperationComplete,
            _ => return None,
        })
    }
}

/// Direction of a transfer operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoMode {
    Read,
    Write,
}

impl IoMode {
    pub fn as_byte(self) -> u8 {
        match self {
            IoMode::Read => b'R',
            IoMode::Write => b'W',
        }
    }

    pub fn from_byte(byte: u8) -> Option<IoMode> {
        match byte {
            b'R' => Some(IoMode::Read),
            b'W' => Some(IoMode::Write),
            _ => None,
        }
    }

    /// The mode string stored on handles and emitted in `AccessModes`.
    pub fn as_str(self) -> &'static str {
        match self {
            IoMode::Read => "R",
            IoMode::Write => "W",
        }
    }
}

/// System-tree node classes on the wire.
pub const CLASS_NODE: u8 = 1;
pub const CLASS_LOCATION_GROUP: u8 = 2;
pub const CLASS_LOCATION: u8 = 3;
pub const CLASS_OTHER: u8 = 0;

/// Metric kinds on the wire.
pub const METRIC_UINT64: u8 = 0;
pub const METRIC_INT64: u8 = 1;
pub const METRIC_DOUBLE: u8 = 2;
