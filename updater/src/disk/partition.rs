// Partition information for a single disk

use gpt_disk_types::{guid, GptPartitionType};

use super::PartitionDescriptor;

/// Maximum partitions tracked per disk.
pub const MAX_PARTITIONS: usize = 16;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PartitionInfo {
    /// 1-based partition number (GPT entry index + 1).
    pub number: u32,
    pub partition_type: PartitionType,
    pub start_lba: u64,
    /// Inclusive.
    pub end_lba: u64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PartitionType {
    EfiSystem,
    LinuxFilesystem,
    BasicData,
    Unknown,
}

impl PartitionInfo {
    pub fn size_lba(&self) -> u64 {
        self.end_lba - self.start_lba + 1
    }

    pub fn type_name(&self) -> &'static str {
        match self.partition_type {
            PartitionType::EfiSystem => "EFI System",
            PartitionType::LinuxFilesystem => "Linux FS",
            PartitionType::BasicData => "Basic Data",
            PartitionType::Unknown => "Unknown",
        }
    }
}

impl PartitionType {
    /// Convert from gpt_disk_types GUID to PartitionType
    pub fn from_gpt_guid(guid: &GptPartitionType) -> Self {
        let linux_fs = GptPartitionType(guid!("0fc63daf-8483-4772-8e79-3d69d8477de4"));

        if guid == &GptPartitionType::EFI_SYSTEM {
            PartitionType::EfiSystem
        } else if guid == &GptPartitionType::BASIC_DATA {
            PartitionType::BasicData
        } else if guid == &linux_fs {
            PartitionType::LinuxFilesystem
        } else {
            PartitionType::Unknown
        }
    }
}

/// Partition table for one disk
#[derive(Clone, Debug)]
pub struct PartitionTable {
    partitions: [Option<PartitionInfo>; MAX_PARTITIONS],
    count: usize,
    block_size: u32,
    pub has_gpt: bool,
}

impl PartitionTable {
    pub const fn new(block_size: u32) -> Self {
        Self {
            partitions: [None; MAX_PARTITIONS],
            count: 0,
            block_size,
            has_gpt: false,
        }
    }

    /// Add a partition. Hands the entry back if the table is full.
    pub fn add_partition(&mut self, info: PartitionInfo) -> Result<(), PartitionInfo> {
        if self.count >= MAX_PARTITIONS {
            return Err(info);
        }

        self.partitions[self.count] = Some(info);
        self.count += 1;
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Find a partition by its 1-based number.
    pub fn find(&self, number: u32) -> Option<&PartitionInfo> {
        self.iter().find(|p| p.number == number)
    }

    pub fn descriptor(&self, number: u32) -> Option<PartitionDescriptor> {
        self.find(number).map(|p| PartitionDescriptor {
            start: p.start_lba,
            size: p.size_lba(),
            block_size: self.block_size,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &PartitionInfo> {
        self.partitions[..self.count]
            .iter()
            .filter_map(|p| p.as_ref())
    }
}
