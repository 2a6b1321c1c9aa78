//! Partition tables for `part` entities.
//!
//! A `part` entity names a partition by number; configuration resolves it to
//! an LBA range through a [`PartitionTableReader`]. [`DiskManager`] is the
//! stock reader: it keeps one [`PartitionTable`] per device, filled either by
//! hand or by [`scan_partitions`] reading the disk's GPT.

pub mod manager;
pub mod partition;
pub mod scan;

pub use manager::DiskManager;
pub use partition::{PartitionInfo, PartitionTable, PartitionType};
pub use scan::scan_partitions;

use crate::device::DeviceId;

/// Location of a partition on its device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionDescriptor {
    /// First LBA of the partition.
    pub start: u64,
    /// Partition length in blocks.
    pub size: u64,
    /// Block size the LBAs are expressed in.
    pub block_size: u32,
}

/// Looks up partitions by (device, partition number).
pub trait PartitionTableReader {
    /// Returns `None` when the device has no such partition.
    fn lookup(&mut self, device: DeviceId, partition: u32) -> Option<PartitionDescriptor>;
}
