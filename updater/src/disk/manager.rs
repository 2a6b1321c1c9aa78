// Disk manager - partition tables per registered device

use alloc::collections::BTreeMap;

use gpt_disk_io::BlockIo;

use super::partition::PartitionTable;
use super::scan::scan_partitions;
use super::{PartitionDescriptor, PartitionTableReader};
use crate::device::DeviceId;
use crate::error::BlockError;

/// Holds the partition table of every known disk.
#[derive(Default)]
pub struct DiskManager {
    tables: BTreeMap<DeviceId, PartitionTable>,
}

impl DiskManager {
    pub const fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
        }
    }

    /// Register a partition table, replacing any previous one for `device`.
    pub fn add_table(&mut self, device: DeviceId, table: PartitionTable) {
        self.tables.insert(device, table);
    }

    /// Read the GPT of `block_io` and register it for `device`.
    ///
    /// Returns the number of partitions found. A disk without a GPT is
    /// registered with an empty table.
    pub fn scan_disk<B: BlockIo>(
        &mut self,
        device: DeviceId,
        block_io: B,
    ) -> Result<usize, BlockError> {
        let table = scan_partitions(block_io)?;
        let count = table.count();
        tracing::debug!(device, partitions = count, gpt = table.has_gpt, "scanned disk");
        self.tables.insert(device, table);
        Ok(count)
    }
}

impl PartitionTableReader for DiskManager {
    fn lookup(&mut self, device: DeviceId, partition: u32) -> Option<PartitionDescriptor> {
        self.tables.get(&device)?.descriptor(partition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::partition::{PartitionInfo, PartitionType};

    #[test]
    fn test_lookup_per_device() {
        let mut table = PartitionTable::new(4096);
        table
            .add_partition(PartitionInfo {
                number: 2,
                partition_type: PartitionType::LinuxFilesystem,
                start_lba: 256,
                end_lba: 511,
            })
            .unwrap();

        let mut manager = DiskManager::new();
        manager.add_table(1, table);

        let desc = manager.lookup(1, 2).unwrap();
        assert_eq!(desc.start, 256);
        assert_eq!(desc.size, 256);
        assert_eq!(desc.block_size, 4096);

        assert!(manager.lookup(0, 2).is_none());
        assert!(manager.lookup(1, 1).is_none());
    }
}
