//! Additive aggregate types. Each is a plain product of counters with a
//! `+=` that sums componentwise, so partial results can be folded in any
//! order.

use std::ops::AddAssign;

/// Call counts and times of one region within one call path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FunctionData {
    pub count: u64,
    pub incl_time: u64,
    pub excl_time: u64,
}

impl AddAssign for FunctionData {
    fn add_assign(&mut self, rhs: FunctionData) {
        self.count += rhs.count;
        self.incl_time += rhs.incl_time;
        self.excl_time += rhs.excl_time;
    }
}

/// Point-to-point message traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageData {
    pub count_send: u64,
    pub count_recv: u64,
    pub bytes_send: u64,
    pub bytes_recv: u64,
}

impl AddAssign for MessageData {
    fn add_assign(&mut self, rhs: MessageData) {
        self.count_send += rhs.count_send;
        self.count_recv += rhs.count_recv;
        self.bytes_send += rhs.bytes_send;
        self.bytes_recv += rhs.bytes_recv;
    }
}

/// Collective operation traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollopData {
    pub count_send: u64,
    pub count_recv: u64,
    pub bytes_send: u64,
    pub bytes_recv: u64,
}

impl AddAssign for CollopData {
    fn add_assign(&mut self, rhs: CollopData) {
        self.count_send += rhs.count_send;
        self.count_recv += rhs.count_recv;
        self.bytes_send += rhs.bytes_send;
        self.bytes_recv += rhs.bytes_recv;
    }
}

/// I/O volume and timing for one paradigm, file, or region.
///
/// `transfer_time` is time during which bytes moved; `nontransfer_time` is
/// time spent in I/O with no bytes moving (meta operations).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoData {
    pub num_operations: u64,
    pub num_bytes: u64,
    pub transfer_time: u64,
    pub nontransfer_time: u64,
}

impl IoData {
    pub fn record_transfer(&mut self, bytes: u64, ticks: u64) {
        self.num_operations += 1;
        self.num_bytes += bytes;
        self.transfer_time += ticks;
    }

    pub fn record_meta(&mut self, ticks: u64) {
        self.num_operations += 1;
        self.nontransfer_time += ticks;
    }
}

impl AddAssign for IoData {
    fn add_assign(&mut self, rhs: IoData) {
        self.num_operations += rhs.num_operations;
        self.num_bytes += rhs.num_bytes;
        self.transfer_time += rhs.transfer_time;
        self.nontransfer_time += rhs.nontransfer_time;
    }
}

/// Per-file and per-region I/O is kept split by direction so the emitter
/// can report read and write bytes separately; metadata operations have no
/// direction and get their own bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerModeIo {
    pub read: IoData,
    pub write: IoData,
    pub meta: IoData,
}

impl PerModeIo {
    pub fn ticks_spent(&self) -> u64 {
        [self.read, self.write, self.meta]
            .iter()
            .map(|io| io.transfer_time + io.nontransfer_time)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_data_accumulates_by_kind() {
        let mut io = IoData::default();
        io.record_transfer(100, 5);
        io.record_transfer(50, 2);
        io.record_meta(9);

        assert_eq!(io.num_operations, 3);
        assert_eq!(io.num_bytes, 150);
        assert_eq!(io.transfer_time, 7);
        assert_eq!(io.nontransfer_time, 9);
    }

    #[test]
    fn aggregates_fold_componentwise() {
        let mut a = FunctionData {
            count: 1,
            incl_time: 10,
            excl_time: 4,
        };
        a += FunctionData {
            count: 2,
            incl_time: 20,
            excl_time: 6,
        };
        assert_eq!(
            a,
            FunctionData {
                count: 3,
                incl_time: 30,
                excl_time: 10
            }
        );
    }

    #[test]
    fn per_mode_ticks_cover_all_buckets() {
        let mut io = PerModeIo::default();
        io.read.record_transfer(10, 3);
        io.write.record_transfer(20, 4);
        io.meta.record_meta(2);
        assert_eq!(io.ticks_spent(), 9);
    }
}
