//! MorpheusX Update Storage Backend
//!
//! Maps a logical firmware update stream (offset + bytes) for a named entity
//! onto the storage layout that entity lives in: a raw LBA range, a disk
//! partition, or a file on a FAT/ext4 filesystem.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        UpdateBackend                            │
//! │    configure(name, device, "raw 0x100 0x10 mmcpart 2")          │
//! │    write / read / flush / size                                  │
//! └───────────────┬───────────────────────────────┬─────────────────┘
//!                 │ Medium::Raw                   │ Medium::File
//!                 ▼                               ▼
//!   ┌──────────────────────────┐    ┌──────────────────────────────┐
//!   │   block::block_op        │    │  StagingBuffer (bounded)     │
//!   │   align + bounds check   │    │        │ flush               │
//!   └────────────┬─────────────┘    │        ▼                     │
//!                ▼                  │  FsBridge → FsExecutor       │
//!   ┌──────────────────────────┐    └──────────────────────────────┘
//!   │  guard::with_partition   │
//!   │  switch / run / restore  │
//!   └────────────┬─────────────┘
//!                ▼
//!   ┌──────────────────────────┐
//!   │  BlockDevice (driver)    │
//!   └──────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use morpheus_updater::{BackendConfig, DiskManager, UpdateBackend};
//!
//! let mut backend = UpdateBackend::new(BackendConfig::default(), fs_executor, DiskManager::new())?;
//! backend.add_device(0, emmc);
//!
//! let mut boot = backend.configure("u-boot.bin", 0, "raw 0x100 0x800 mmcpart 1")?;
//! backend.write(&mut boot, 0, &image)?;
//! backend.flush(&boot)?;
//! ```
//!
//! Everything runs synchronously on the caller's thread. The backend owns the
//! staging buffer and the per-device partition state, so exclusive access is
//! enforced by `&mut` borrows rather than by locking.

#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod backend;
pub mod block;
pub mod config;
pub mod device;
pub mod disk;
pub mod entity;
pub mod error;
pub mod fs;
pub mod guard;
pub mod staging;

pub use backend::UpdateBackend;
pub use block::{block_op, BlockBuf, BlockSpan, Direction, RawRange};
pub use config::{BackendConfig, DEFAULT_MAX_FILE_SIZE};
pub use device::{BlockDevice, BlockIoDevice, DeviceId, USER_PARTITION};
pub use disk::{
    scan_partitions, DiskManager, PartitionDescriptor, PartitionInfo, PartitionTable,
    PartitionTableReader, PartitionType,
};
pub use entity::{parse_number, Entity, EntitySpec, Layout, Medium};
pub use error::{BlockError, ConfigError, ErrorKind, FsError, Result, UpdateError};
pub use fs::{FsBridge, FsExecutor, FsKind, FsOp, FsTarget};
pub use guard::with_partition;
pub use staging::StagingBuffer;
