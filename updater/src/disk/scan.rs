// GPT scanning using gpt-disk-rs

use alloc::vec;

use gpt_disk_io::{BlockIo, Disk};

use super::partition::{PartitionInfo, PartitionTable, PartitionType};
use crate::error::BlockError;

/// Scan disk for GPT and build its partition table.
///
/// A missing or unreadable GPT header is not an error: the table comes back
/// empty with `has_gpt == false`. Only a failure while reading the entry
/// array of a valid header is reported.
pub fn scan_partitions<B: BlockIo>(block_io: B) -> Result<PartitionTable, BlockError> {
    let block_size = block_io.block_size();
    let mut table = PartitionTable::new(block_size.to_u32());

    let mut disk = match Disk::new(block_io) {
        Ok(d) => d,
        Err(_) => return Ok(table),
    };

    let mut block_buf = vec![0u8; block_size.to_u32() as usize];

    let header = match disk.read_primary_gpt_header(&mut block_buf) {
        Ok(h) => h,
        Err(_) => return Ok(table),
    };

    let layout = match header.get_partition_entry_array_layout() {
        Ok(l) => l,
        Err(_) => return Ok(table),
    };

    let iter = match disk.gpt_partition_entry_array_iter(layout, &mut block_buf) {
        Ok(it) => it,
        Err(_) => return Ok(table),
    };

    table.has_gpt = true;

    for (index, entry_result) in iter.enumerate() {
        let entry = entry_result.map_err(|_| BlockError::IoError)?;

        if !entry.is_used() {
            continue;
        }

        // Copy the guid to avoid unaligned reference
        let guid = entry.partition_type_guid;
        let info = PartitionInfo {
            number: index as u32 + 1,
            partition_type: PartitionType::from_gpt_guid(&guid),
            start_lba: entry.starting_lba.to_u64(),
            end_lba: entry.ending_lba.to_u64(),
        };

        tracing::debug!(
            number = info.number,
            kind = info.type_name(),
            start = info.start_lba,
            end = info.end_lba,
            "gpt partition"
        );

        if table.add_partition(info).is_err() {
            tracing::warn!(number = info.number, "partition table full, ignoring remaining entries");
            break;
        }
    }

    Ok(table)
}
