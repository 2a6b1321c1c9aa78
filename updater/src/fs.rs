//! Filesystem bridge.
//!
//! Whole-file load/write/size against a FAT or ext4 filesystem, delegated to
//! an [`FsExecutor`] supplied by the platform. The bridge adds the parts the
//! executor leaves to its caller: error context, logging, and interpreting
//! the executor's "last file size" report after a load.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::entity::Layout;
use crate::error::{ConfigError, FsError, Result, UpdateError};

/// Filesystem flavour of a file entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsKind {
    Fat,
    Ext4,
}

impl FsKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fat => "fat",
            Self::Ext4 => "ext4",
        }
    }
}

impl TryFrom<Layout> for FsKind {
    type Error = ConfigError;

    fn try_from(layout: Layout) -> core::result::Result<Self, ConfigError> {
        match layout {
            Layout::FatFile => Ok(Self::Fat),
            Layout::Ext4File => Ok(Self::Ext4),
            other => Err(ConfigError::NotFilesystem(other)),
        }
    }
}

/// Filesystem operation, for error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsOp {
    Load,
    Write,
    Size,
}

impl fmt::Display for FsOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => write!(f, "load"),
            Self::Write => write!(f, "write"),
            Self::Size => write!(f, "size"),
        }
    }
}

/// A file on a filesystem partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsTarget {
    pub kind: FsKind,
    pub device: u32,
    pub partition: u32,
    pub path: String,
}

impl fmt::Display for FsTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{} {}", self.kind.name(), self.device, self.partition, self.path)
    }
}

/// Platform filesystem commands.
///
/// All operations are whole-file. After `load` the executor must report how
/// many bytes it actually read through `last_file_size`.
pub trait FsExecutor {
    /// Read the whole file into `dst`, growing it as needed.
    fn load(&mut self, target: &FsTarget, dst: &mut Vec<u8>) -> core::result::Result<(), FsError>;

    /// Replace the file's contents with `data`.
    fn write(&mut self, target: &FsTarget, data: &[u8]) -> core::result::Result<(), FsError>;

    /// Stored length of the file.
    fn size(&mut self, target: &FsTarget) -> core::result::Result<u64, FsError>;

    /// Size of the file read by the most recent `load`.
    fn last_file_size(&self) -> Option<u64>;
}

pub struct FsBridge<F> {
    executor: F,
}

impl<F: FsExecutor> FsBridge<F> {
    pub fn new(executor: F) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &F {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut F {
        &mut self.executor
    }

    /// Load the whole file into `dst` and return its length.
    ///
    /// `dst` is cleared first and ends up exactly as long as the size the
    /// executor reported.
    pub fn load(&mut self, target: &FsTarget, dst: &mut Vec<u8>) -> Result<usize> {
        tracing::debug!(%target, "fs load");
        dst.clear();
        self.executor
            .load(target, dst)
            .map_err(|source| fs_error(FsOp::Load, target, source))?;

        let Some(size) = self.executor.last_file_size() else {
            tracing::error!(%target, "wrong file size");
            return Err(UpdateError::MissingFileSize);
        };
        let size = usize::try_from(size).map_err(|_| UpdateError::MissingFileSize)?;
        dst.resize(size, 0);
        Ok(size)
    }

    /// Write `data` as the complete contents of the file.
    pub fn write(&mut self, target: &FsTarget, data: &[u8]) -> Result<usize> {
        tracing::debug!(%target, len = data.len(), "fs write");
        self.executor
            .write(target, data)
            .map_err(|source| fs_error(FsOp::Write, target, source))?;
        Ok(data.len())
    }

    pub fn size(&mut self, target: &FsTarget) -> Result<u64> {
        tracing::debug!(%target, "fs size");
        self.executor
            .size(target)
            .map_err(|source| fs_error(FsOp::Size, target, source))
    }
}

fn fs_error(op: FsOp, target: &FsTarget, source: FsError) -> UpdateError {
    tracing::error!(%op, %target, error = %source, "filesystem operation failed");
    UpdateError::Filesystem { op, source }
}
