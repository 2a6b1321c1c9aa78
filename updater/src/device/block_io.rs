//! `BlockDevice` adapter for `gpt_disk_io::BlockIo` implementations.
//!
//! Lets any device that already speaks `gpt_disk_io::BlockIo` (UEFI block
//! protocol adapters, VirtIO-blk, AHCI, in-memory images) be used as an
//! update target. Such devices expose a single hardware partition, the user
//! area, so only raw and filesystem entities without `mmcpart` work on them.
//!
//! ```ignore
//! let disk = BlockIoDevice::new(UefiBlockIoAdapter::new(protocol)?);
//! backend.add_device(0, disk);
//! ```

use gpt_disk_io::BlockIo;
use gpt_disk_types::{BlockSize, Lba};

use super::{BlockDevice, USER_PARTITION};
use crate::error::BlockError;

/// Wraps a `gpt_disk_io::BlockIo` as a single-partition [`BlockDevice`].
pub struct BlockIoDevice<B> {
    inner: B,
}

impl<B: BlockIo> BlockIoDevice<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }
}

impl<B: BlockIo> BlockDevice for BlockIoDevice<B> {
    fn block_size(&self) -> BlockSize {
        self.inner.block_size()
    }

    fn init(&mut self) -> Result<(), BlockError> {
        // A device that cannot report its size is not usable.
        self.inner
            .num_blocks()
            .map_err(|_| BlockError::DeviceNotReady)?;
        Ok(())
    }

    fn active_partition(&self) -> u32 {
        USER_PARTITION
    }

    fn switch_partition(&mut self, partition: u32) -> Result<(), BlockError> {
        if partition == USER_PARTITION {
            Ok(())
        } else {
            Err(BlockError::NoSuchPartition(partition))
        }
    }

    fn read_blocks(&mut self, start: Lba, count: u64, dst: &mut [u8]) -> Result<u64, BlockError> {
        self.inner.read_blocks(start, dst).map_err(|err| {
            tracing::debug!(lba = start.0, error = ?err, "block_io read failed");
            BlockError::IoError
        })?;
        Ok(count)
    }

    fn write_blocks(&mut self, start: Lba, count: u64, src: &[u8]) -> Result<u64, BlockError> {
        self.inner.write_blocks(start, src).map_err(|err| {
            tracing::debug!(lba = start.0, error = ?err, "block_io write failed");
            BlockError::IoError
        })?;
        self.inner.flush().map_err(|_| BlockError::IoError)?;
        Ok(count)
    }
}
