//! Update backend.
//!
//! Owns the registered block devices, the partition table reader, the
//! filesystem bridge and the staging buffer, and dispatches entity
//! operations to the right one.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::block::{block_op, BlockBuf, RawRange};
use crate::config::BackendConfig;
use crate::device::{BlockDevice, DeviceId};
use crate::disk::{DiskManager, PartitionTableReader};
use crate::entity::{Entity, EntitySpec, Medium};
use crate::error::{ConfigError, Result, UpdateError};
use crate::fs::{FsBridge, FsExecutor, FsTarget};
use crate::staging::StagingBuffer;

/// Storage backend for firmware update entities.
///
/// Entities are driven one at a time: the staging buffer is shared by every
/// filesystem entity and each device's hardware partition by every raw
/// entity on it.
pub struct UpdateBackend<D, F, P = DiskManager> {
    config: BackendConfig,
    devices: BTreeMap<DeviceId, D>,
    partitions: P,
    fs: FsBridge<F>,
    staging: StagingBuffer,
}

impl<D, F, P> UpdateBackend<D, F, P>
where
    D: BlockDevice,
    F: FsExecutor,
    P: PartitionTableReader,
{
    pub fn new(config: BackendConfig, executor: F, partitions: P) -> core::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            devices: BTreeMap::new(),
            partitions,
            fs: FsBridge::new(executor),
            staging: StagingBuffer::new(config.max_file_size),
        })
    }

    /// Register a block device. Returns the device previously registered
    /// under `id`, if any.
    pub fn add_device(&mut self, id: DeviceId, device: D) -> Option<D> {
        self.devices.insert(id, device)
    }

    pub fn device(&self, id: DeviceId) -> Option<&D> {
        self.devices.get(&id)
    }

    pub fn device_mut(&mut self, id: DeviceId) -> Option<&mut D> {
        self.devices.get_mut(&id)
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn staging(&self) -> &StagingBuffer {
        &self.staging
    }

    pub fn executor(&self) -> &F {
        self.fs.executor()
    }

    pub fn executor_mut(&mut self) -> &mut F {
        self.fs.executor_mut()
    }

    /// Create an entity from a layout description.
    ///
    /// `name` doubles as the file path for filesystem layouts. The device
    /// must be registered and is initialized before anything else happens.
    pub fn configure(
        &mut self,
        name: &str,
        device_id: DeviceId,
        description: &str,
    ) -> core::result::Result<Entity, ConfigError> {
        let device = self
            .devices
            .get_mut(&device_id)
            .ok_or(ConfigError::DeviceNotFound(device_id))?;
        device.init().map_err(|source| {
            tracing::error!(device = device_id, error = %source, "couldn't init device");
            ConfigError::DeviceInit {
                device: device_id,
                source,
            }
        })?;
        let block_size = device.block_size().to_u32();

        let spec: EntitySpec = description.parse().inspect_err(|err| {
            tracing::error!(entity = name, error = %err, "invalid layout description");
        })?;

        let medium = match spec {
            EntitySpec::Raw {
                lba_start,
                lba_count,
                hw_partition,
            } => Medium::Raw(RawRange::new(lba_start, lba_count, block_size, hw_partition)?),
            EntitySpec::Part { device, partition } => {
                tracing::debug!(entity = name, device, partition, "resolving partition");
                let desc = self
                    .partitions
                    .lookup(device_id, partition)
                    .ok_or_else(|| {
                        tracing::error!(device = device_id, partition, "couldn't find partition");
                        ConfigError::PartitionNotFound {
                            device: device_id,
                            partition,
                        }
                    })?;
                Medium::Raw(RawRange::new(desc.start, desc.size, desc.block_size, None)?)
            }
            EntitySpec::Fs {
                kind,
                device,
                partition,
            } => Medium::File(FsTarget {
                kind,
                device,
                partition,
                path: String::from(name),
            }),
        };

        let entity = Entity::new(String::from(name), device_id, medium);
        tracing::debug!(
            entity = name,
            device = device_id,
            layout = %entity.layout(),
            "configured entity"
        );
        Ok(entity)
    }

    /// Write `data` for `entity` at byte `offset`.
    ///
    /// Raw entities are written through immediately and the block-aligned
    /// length is returned. Filesystem entities only stage the payload (the
    /// offset is not used, payloads are appended in call order) until
    /// [`flush`](Self::flush).
    pub fn write(&mut self, entity: &mut Entity, offset: u64, data: &[u8]) -> Result<usize> {
        let written = match entity.medium() {
            Medium::Raw(range) => {
                let device = device_for(&mut self.devices, entity.device_id())?;
                block_op(device, range, offset, BlockBuf::Write(data))?
            }
            Medium::File(_) => self.staging.append(data)?,
        };
        entity.mark_initialized();
        Ok(written)
    }

    /// Read into `buf` from byte `offset` of `entity`.
    ///
    /// Returns the number of bytes copied into `buf` for every layout. Raw
    /// entities read whole blocks from the device and keep only the first
    /// `buf.len()` bytes. Filesystem entities load the whole file and copy
    /// out what lies past `offset`.
    pub fn read(&mut self, entity: &Entity, offset: u64, buf: &mut [u8]) -> Result<usize> {
        match entity.medium() {
            Medium::Raw(range) => {
                let device = device_for(&mut self.devices, entity.device_id())?;
                block_op(device, range, offset, BlockBuf::Read(buf))
            }
            Medium::File(target) => {
                let mut contents = Vec::new();
                let len = self.fs.load(target, &mut contents)?;
                let Some(tail) = usize::try_from(offset)
                    .ok()
                    .filter(|&start| start < len)
                    .map(|start| &contents[start..])
                else {
                    return Ok(0);
                };
                let n = tail.len().min(buf.len());
                buf[..n].copy_from_slice(&tail[..n]);
                Ok(n)
            }
        }
    }

    /// Commit staged data. A no-op for raw entities.
    ///
    /// The staging buffer is emptied whether or not the filesystem write
    /// succeeds.
    pub fn flush(&mut self, entity: &Entity) -> Result<()> {
        match entity.medium() {
            Medium::Raw(_) => Ok(()),
            Medium::File(target) => {
                let fs = &mut self.fs;
                let len = self
                    .staging
                    .flush(|data| fs.write(target, data).map(|_| ()))?;
                tracing::debug!(entity = entity.name(), len, "flushed staged file");
                Ok(())
            }
        }
    }

    /// Size of the entity's storage: the designated area for raw entities,
    /// the stored file length for filesystem entities.
    pub fn size(&mut self, entity: &Entity) -> Result<u64> {
        match entity.medium() {
            Medium::Raw(range) => Ok(range.size()),
            Medium::File(target) => self.fs.size(target),
        }
    }
}

fn device_for<D>(devices: &mut BTreeMap<DeviceId, D>, id: DeviceId) -> Result<&mut D> {
    devices.get_mut(&id).ok_or_else(|| {
        tracing::error!(device = id, "entity refers to unregistered device");
        UpdateError::UnknownDevice(id)
    })
}
