//! Common test utilities: in-memory block devices and filesystem
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::io;
use std::rc::Rc;

use gpt_disk_io::{BlockIo, Disk};
use gpt_disk_types::{
    guid, BlockSize, GptHeader, GptPartitionEntryArray, GptPartitionType, Lba, LbaLe, U32Le,
};
use morpheus_updater::{
    BackendConfig, BlockDevice, BlockError, DiskManager, FsError, FsExecutor, FsTarget,
    UpdateBackend,
};

pub const BLOCK_SIZE: usize = 512;

/// In-memory eMMC-like device with several hardware partitions.
///
/// Every hardware partition has the same number of blocks. Faults are
/// injected per field; all transfers and partition switches are recorded.
#[derive(Debug, Clone)]
pub struct MemoryDevice {
    pub partitions: Vec<Vec<u8>>,
    pub active: u32,
    /// Switching *to* any of these partitions fails.
    pub fail_switch: BTreeSet<u32>,
    /// Transfers report this many blocks fewer than requested.
    pub short_by: u64,
    pub fail_io: bool,
    pub fail_init: bool,
    pub init_calls: usize,
    /// (hw partition, start, count) of every read
    pub reads: Vec<(u32, u64, u64)>,
    /// (hw partition, start, count) of every write
    pub writes: Vec<(u32, u64, u64)>,
    pub switch_log: Vec<u32>,
}

impl MemoryDevice {
    pub fn new(hw_partitions: usize, blocks: usize) -> Self {
        Self {
            partitions: vec![vec![0u8; blocks * BLOCK_SIZE]; hw_partitions],
            active: 0,
            fail_switch: BTreeSet::new(),
            short_by: 0,
            fail_io: false,
            fail_init: false,
            init_calls: 0,
            reads: Vec::new(),
            writes: Vec::new(),
            switch_log: Vec::new(),
        }
    }

    /// Bytes of block `lba` on hardware partition `hw`.
    pub fn block(&self, hw: u32, lba: u64) -> &[u8] {
        let offset = lba as usize * BLOCK_SIZE;
        &self.partitions[hw as usize][offset..offset + BLOCK_SIZE]
    }

    pub fn transfers(&self) -> usize {
        self.reads.len() + self.writes.len()
    }

    fn range(&self, start: Lba, count: u64, len: usize) -> Result<std::ops::Range<usize>, BlockError> {
        assert_eq!(len, count as usize * BLOCK_SIZE, "buffer must match block count");
        let offset = start.0 as usize * BLOCK_SIZE;
        if offset + len > self.partitions[self.active as usize].len() {
            return Err(BlockError::InvalidSector);
        }
        Ok(offset..offset + len)
    }
}

impl BlockDevice for MemoryDevice {
    fn block_size(&self) -> BlockSize {
        BlockSize::BS_512
    }

    fn init(&mut self) -> Result<(), BlockError> {
        self.init_calls += 1;
        if self.fail_init {
            return Err(BlockError::DeviceNotReady);
        }
        Ok(())
    }

    fn active_partition(&self) -> u32 {
        self.active
    }

    fn switch_partition(&mut self, partition: u32) -> Result<(), BlockError> {
        self.switch_log.push(partition);
        if self.fail_switch.contains(&partition) || partition as usize >= self.partitions.len() {
            return Err(BlockError::NoSuchPartition(partition));
        }
        self.active = partition;
        Ok(())
    }

    fn read_blocks(&mut self, start: Lba, count: u64, dst: &mut [u8]) -> Result<u64, BlockError> {
        self.reads.push((self.active, start.0, count));
        if self.fail_io {
            return Err(BlockError::IoError);
        }
        let range = self.range(start, count, dst.len())?;
        dst.copy_from_slice(&self.partitions[self.active as usize][range]);
        Ok(count.saturating_sub(self.short_by))
    }

    fn write_blocks(&mut self, start: Lba, count: u64, src: &[u8]) -> Result<u64, BlockError> {
        self.writes.push((self.active, start.0, count));
        if self.fail_io {
            return Err(BlockError::IoError);
        }
        let range = self.range(start, count, src.len())?;
        self.partitions[self.active as usize][range].copy_from_slice(src);
        Ok(count.saturating_sub(self.short_by))
    }
}

/// In-memory `gpt_disk_io` block device. Clones share storage.
#[derive(Debug, Clone)]
pub struct MemoryDisk {
    pub data: Rc<RefCell<Vec<u8>>>,
}

impl MemoryDisk {
    pub fn new(blocks: usize) -> Self {
        Self {
            data: Rc::new(RefCell::new(vec![0u8; blocks * BLOCK_SIZE])),
        }
    }

    /// Create a disk with a primary GPT holding `partitions`.
    ///
    /// Each entry is `(slot, type, first lba, last lba)` with a 1-based slot.
    pub fn with_gpt(blocks: usize, partitions: &[(u32, GptPartitionType, u64, u64)]) -> Self {
        let disk = Self::new(blocks);
        let num_blocks = blocks as u64;

        let mut gpt = Disk::new(disk.clone()).expect("disk");
        let mut header = GptHeader {
            my_lba: LbaLe::from_u64(1),
            alternate_lba: LbaLe::from_u64(num_blocks - 1),
            first_usable_lba: LbaLe::from_u64(34),
            last_usable_lba: LbaLe::from_u64(num_blocks - 34),
            disk_guid: guid!("6f1c5b2e-3a8d-4c1e-9b7f-2d4e8a0c1f35"),
            partition_entry_lba: LbaLe::from_u64(2),
            number_of_partition_entries: U32Le::from_u32(128),
            ..Default::default()
        };

        let mut buf = [0u8; BLOCK_SIZE];
        gpt.write_protective_mbr(&mut buf).expect("mbr");

        let layout = header.get_partition_entry_array_layout().expect("layout");
        let mut entry_buf = [0u8; 16384];
        let mut entries =
            GptPartitionEntryArray::new(layout, BlockSize::BS_512, &mut entry_buf).expect("entries");

        for &(slot, partition_type, start, end) in partitions {
            let entry = entries
                .get_partition_entry_mut((slot - 1).try_into().unwrap())
                .expect("slot");
            entry.partition_type_guid = partition_type;
            entry.unique_partition_guid = guid!("0b6a2c4e-8f13-4d5a-a7c9-1e3f5b7d9a2c");
            entry.starting_lba = LbaLe::from_u64(start);
            entry.ending_lba = LbaLe::from_u64(end);
        }

        header.partition_entry_array_crc32 = entries.calculate_crc32();
        header.update_header_crc32();

        gpt.write_primary_gpt_header(&header, &mut buf).expect("header");
        gpt.write_gpt_partition_entry_array(&entries).expect("entry array");
        gpt.flush().expect("flush");

        disk
    }
}

impl BlockIo for MemoryDisk {
    type Error = io::Error;

    fn block_size(&self) -> BlockSize {
        BlockSize::BS_512
    }

    fn num_blocks(&mut self) -> Result<u64, Self::Error> {
        Ok((self.data.borrow().len() / BLOCK_SIZE) as u64)
    }

    fn read_blocks(&mut self, start_lba: Lba, dst: &mut [u8]) -> Result<(), Self::Error> {
        let data = self.data.borrow();
        let offset = start_lba.0 as usize * BLOCK_SIZE;
        if offset + dst.len() > data.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "read beyond end of device",
            ));
        }
        dst.copy_from_slice(&data[offset..offset + dst.len()]);
        Ok(())
    }

    fn write_blocks(&mut self, start_lba: Lba, src: &[u8]) -> Result<(), Self::Error> {
        let mut data = self.data.borrow_mut();
        let offset = start_lba.0 as usize * BLOCK_SIZE;
        if offset + src.len() > data.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "write beyond end of device",
            ));
        }
        data[offset..offset + src.len()].copy_from_slice(src);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

type FileKey = (u32, u32, String);

/// In-memory filesystem executor keyed by (device, partition, path).
#[derive(Debug, Default)]
pub struct MemoryFs {
    pub files: HashMap<FileKey, Vec<u8>>,
    pub last_size: Option<u64>,
    /// Skip the size report after a load.
    pub no_size_report: bool,
    pub fail_write: Option<FsError>,
    pub write_calls: usize,
}

impl MemoryFs {
    pub fn insert(&mut self, device: u32, partition: u32, path: &str, contents: &[u8]) {
        self.files
            .insert((device, partition, path.to_string()), contents.to_vec());
    }

    pub fn file(&self, device: u32, partition: u32, path: &str) -> Option<&Vec<u8>> {
        self.files.get(&(device, partition, path.to_string()))
    }

    fn key(target: &FsTarget) -> FileKey {
        (target.device, target.partition, target.path.clone())
    }
}

impl FsExecutor for MemoryFs {
    fn load(&mut self, target: &FsTarget, dst: &mut Vec<u8>) -> Result<(), FsError> {
        self.last_size = None;
        let contents = self.files.get(&Self::key(target)).ok_or(FsError::NotFound)?;
        dst.extend_from_slice(contents);
        if !self.no_size_report {
            self.last_size = Some(contents.len() as u64);
        }
        Ok(())
    }

    fn write(&mut self, target: &FsTarget, data: &[u8]) -> Result<(), FsError> {
        self.write_calls += 1;
        if let Some(err) = self.fail_write.clone() {
            return Err(err);
        }
        self.files.insert(Self::key(target), data.to_vec());
        Ok(())
    }

    fn size(&mut self, target: &FsTarget) -> Result<u64, FsError> {
        self.files
            .get(&Self::key(target))
            .map(|f| f.len() as u64)
            .ok_or(FsError::NotFound)
    }

    fn last_file_size(&self) -> Option<u64> {
        self.last_size
    }
}

/// Backend with `device` registered as device 0.
pub fn backend_with(device: MemoryDevice) -> UpdateBackend<MemoryDevice, MemoryFs> {
    backend_with_config(device, BackendConfig::default())
}

pub fn backend_with_config(
    device: MemoryDevice,
    config: BackendConfig,
) -> UpdateBackend<MemoryDevice, MemoryFs> {
    let mut backend =
        UpdateBackend::new(config, MemoryFs::default(), DiskManager::new()).expect("backend");
    backend.add_device(0, device);
    backend
}

/// Deterministic test pattern.
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}
