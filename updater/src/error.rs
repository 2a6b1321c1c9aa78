//! Error types for update storage operations
//!
//! `UpdateError` is what every backend operation returns. Configuration
//! problems are split out into `ConfigError` so that `configure` can return
//! them on their own, and the collaborator-facing errors (`BlockError`,
//! `FsError`) are kept as sources rather than flattened into strings.

use alloc::string::String;
use thiserror::Error;

use crate::block::Direction;
use crate::device::DeviceId;
use crate::entity::Layout;
use crate::fs::FsOp;

/// Result type for update storage operations
pub type Result<T> = core::result::Result<T, UpdateError>;

/// Errors reported by a block device driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BlockError {
    /// Device not present or not initialized.
    #[error("device not ready")]
    DeviceNotReady,
    /// I/O error from device.
    #[error("I/O error from device")]
    IoError,
    /// Sector number beyond the end of the device.
    #[error("invalid sector number")]
    InvalidSector,
    /// Hardware partition selector not provided by the device.
    #[error("hardware partition {0} not available")]
    NoSuchPartition(u32),
}

/// Errors reported by a filesystem executor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsError {
    /// The named file does not exist.
    #[error("file not found")]
    NotFound,
    /// Not enough free space for the write.
    #[error("no space left on filesystem")]
    NoSpace,
}

/// Entity configuration errors. No partial entity is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid number of arguments: expected 3, found {found}")]
    MissingArguments { found: usize },
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("`mmcpart` requires a hardware partition number")]
    MissingHwPartition,
    #[error("memory layout `{0}` not supported")]
    UnknownLayout(String),
    #[error("layout `{0}` is not a filesystem layout")]
    NotFilesystem(Layout),
    #[error("raw range of {lba_count} blocks at {lba_start} does not fit the address space")]
    RangeOverflow { lba_start: u64, lba_count: u64 },
    #[error("invalid block size {0}")]
    InvalidBlockSize(u32),
    #[error("couldn't find part #{partition} on device #{device}")]
    PartitionNotFound { device: DeviceId, partition: u32 },
    #[error("couldn't find device no. {0}")]
    DeviceNotFound(DeviceId),
    #[error("couldn't init device no. {device}")]
    DeviceInit {
        device: DeviceId,
        #[source]
        source: BlockError,
    },
    #[error("staging buffer capacity must be non-zero")]
    ZeroStagingCapacity,
}

/// Errors returned by backend operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Requested blocks fall outside the entity's LBA range. Nothing was transferred.
    #[error("request would exceed designated area: blocks {start}+{count} past end {end}")]
    OutOfRange { start: u64, count: u64, end: u64 },

    /// Staging buffer would exceed its capacity. Buffered data was discarded.
    #[error("staging buffer overflow: {requested} bytes exceed capacity {capacity}")]
    Overflow { requested: usize, capacity: usize },

    #[error("block {direction} transferred {transferred} of {expected} blocks")]
    ShortTransfer {
        direction: Direction,
        expected: u64,
        transferred: u64,
    },

    #[error("block {direction} failed")]
    Device {
        direction: Direction,
        #[source]
        source: BlockError,
    },

    #[error("filesystem {op} failed")]
    Filesystem {
        op: FsOp,
        #[source]
        source: FsError,
    },

    /// Executor completed a load without reporting the file size.
    #[error("filesystem reported no file size")]
    MissingFileSize,

    /// Switching into the target hardware partition failed; the body never ran.
    #[error("cannot switch to hardware partition {partition}")]
    PartitionSwitch {
        partition: u32,
        #[source]
        source: BlockError,
    },

    /// The body succeeded but switching back to the saved partition failed.
    #[error("cannot restore hardware partition {partition}")]
    PartitionRestore {
        partition: u32,
        #[source]
        source: BlockError,
    },

    #[error("unknown device {0}")]
    UnknownDevice(DeviceId),
}

/// Coarse error classification used by callers deciding on retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Range,
    Overflow,
    Io,
    PartitionSwitch,
}

impl UpdateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::UnknownDevice(_) => ErrorKind::Config,
            Self::OutOfRange { .. } => ErrorKind::Range,
            Self::Overflow { .. } => ErrorKind::Overflow,
            Self::ShortTransfer { .. }
            | Self::Device { .. }
            | Self::Filesystem { .. }
            | Self::MissingFileSize => ErrorKind::Io,
            Self::PartitionSwitch { .. } | Self::PartitionRestore { .. } => {
                ErrorKind::PartitionSwitch
            }
        }
    }
}
