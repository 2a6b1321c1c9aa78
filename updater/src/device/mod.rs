//! Block device interface.
//!
//! The backend never talks to hardware directly. Every storage device it
//! writes to is reached through [`BlockDevice`], which combines the raw
//! sector transfer of a block driver with hardware partition selection
//! (eMMC boot/RPMB areas and the like).

mod block_io;

pub use block_io::BlockIoDevice;

use gpt_disk_types::{BlockSize, Lba};

use crate::error::BlockError;

/// Identifier of a block device registered with the backend.
pub type DeviceId = u32;

/// Hardware partition selected after reset (eMMC user data area).
pub const USER_PARTITION: u32 = 0;

/// Core block device interface.
///
/// Transfers are synchronous. `read_blocks`/`write_blocks` are always called
/// with a buffer of exactly `count * block_size` bytes and return how many
/// blocks were actually transferred. The backend treats any count other than
/// `count` as a failed transfer.
pub trait BlockDevice {
    /// Native logical block size.
    fn block_size(&self) -> BlockSize;

    /// Bring the device up. Called every time an entity is configured on it,
    /// so it must be cheap once the device is running.
    fn init(&mut self) -> Result<(), BlockError> {
        Ok(())
    }

    /// Hardware partition currently selected.
    fn active_partition(&self) -> u32;

    /// Select a hardware partition. On success `active_partition` must
    /// return `partition`; on failure it must be left unchanged.
    fn switch_partition(&mut self, partition: u32) -> Result<(), BlockError>;

    /// Read `count` blocks starting at `start` into `dst`.
    fn read_blocks(&mut self, start: Lba, count: u64, dst: &mut [u8]) -> Result<u64, BlockError>;

    /// Write `count` blocks starting at `start` from `src`.
    fn write_blocks(&mut self, start: Lba, count: u64, src: &[u8]) -> Result<u64, BlockError>;
}
