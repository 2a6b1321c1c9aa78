//! Block I/O adapter for raw LBA ranges.
//!
//! Turns a byte offset/length inside an entity into an absolute block span,
//! refuses anything that would leave the entity's designated area, and runs
//! the transfer (inside the partition guard when the entity lives on a
//! hardware partition).
//!
//! Lengths are rounded up to whole blocks. When the caller's buffer is not a
//! multiple of the block size the transfer goes through a zero-padded bounce
//! buffer, so the device still sees one request of `count` blocks and the
//! caller's slice is never over-read or over-written.

use alloc::vec;
use core::fmt;

use gpt_disk_types::Lba;

use crate::device::BlockDevice;
use crate::error::{ConfigError, Result, UpdateError};
use crate::guard::with_partition;

/// Transfer direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Caller buffer for a block transfer.
pub enum BlockBuf<'a> {
    Read(&'a mut [u8]),
    Write(&'a [u8]),
}

impl BlockBuf<'_> {
    pub fn direction(&self) -> Direction {
        match self {
            Self::Read(_) => Direction::Read,
            Self::Write(_) => Direction::Write,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Read(buf) => buf.len(),
            Self::Write(buf) => buf.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Absolute block span of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    pub start: u64,
    pub count: u64,
}

/// A contiguous LBA range on one device, optionally on a hardware partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRange {
    lba_start: u64,
    lba_count: u64,
    block_size: u32,
    hw_partition: Option<u32>,
}

impl RawRange {
    pub fn new(
        lba_start: u64,
        lba_count: u64,
        block_size: u32,
        hw_partition: Option<u32>,
    ) -> core::result::Result<Self, ConfigError> {
        if block_size == 0 {
            return Err(ConfigError::InvalidBlockSize(block_size));
        }
        let fits = lba_start.checked_add(lba_count).is_some()
            && lba_count.checked_mul(u64::from(block_size)).is_some();
        if !fits {
            return Err(ConfigError::RangeOverflow {
                lba_start,
                lba_count,
            });
        }
        Ok(Self {
            lba_start,
            lba_count,
            block_size,
            hw_partition,
        })
    }

    pub fn lba_start(&self) -> u64 {
        self.lba_start
    }

    pub fn lba_count(&self) -> u64 {
        self.lba_count
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Hardware partition to switch to, `None` for "stay where you are".
    pub fn hw_partition(&self) -> Option<u32> {
        self.hw_partition
    }

    /// Size of the designated area in bytes.
    pub fn size(&self) -> u64 {
        self.lba_count * u64::from(self.block_size)
    }

    /// First block past the designated area.
    pub fn end(&self) -> u64 {
        self.lba_start + self.lba_count
    }

    /// Compute the block span for `len` bytes at `offset`, rejecting spans that
    /// do not fit inside the range. No clamping.
    pub fn span(&self, offset: u64, len: usize) -> Result<BlockSpan> {
        let block_size = u64::from(self.block_size);
        let count = (len as u64).div_ceil(block_size);
        let start = self.lba_start.saturating_add(offset / block_size);
        let end = self.end();

        match self
            .lba_start
            .checked_add(offset / block_size)
            .and_then(|s| s.checked_add(count))
        {
            Some(last) if last <= end => Ok(BlockSpan { start, count }),
            _ => {
                tracing::error!(start, count, end, "request would exceed designated area");
                Err(UpdateError::OutOfRange { start, count, end })
            }
        }
    }
}

/// Read or write `buf` at byte `offset` inside `range`.
///
/// A write returns the block-aligned number of bytes sent to the device, a
/// read returns the number of bytes copied into `buf`. Out-of-range
/// requests fail before the device (or the partition guard) is touched. A transfer that moves fewer blocks than requested fails with
/// [`UpdateError::ShortTransfer`]; the previous hardware partition is
/// restored either way.
pub fn block_op<D>(device: &mut D, range: &RawRange, offset: u64, buf: BlockBuf<'_>) -> Result<usize>
where
    D: BlockDevice + ?Sized,
{
    let span = range.span(offset, buf.len())?;
    if span.count == 0 {
        return Ok(0);
    }

    let aligned = (span.count * u64::from(range.block_size)) as usize;

    match range.hw_partition {
        Some(partition) => with_partition(device, partition, |dev| transfer(dev, span, aligned, buf)),
        None => transfer(device, span, aligned, buf),
    }
}

fn transfer<D>(device: &mut D, span: BlockSpan, aligned: usize, buf: BlockBuf<'_>) -> Result<usize>
where
    D: BlockDevice + ?Sized,
{
    let direction = buf.direction();
    let requested = buf.len();
    tracing::debug!(%direction, start = span.start, count = span.count, "block transfer");

    let lba = Lba(span.start);
    let transferred = match buf {
        BlockBuf::Read(dst) if dst.len() == aligned => device.read_blocks(lba, span.count, dst),
        BlockBuf::Read(dst) => {
            let mut bounce = vec![0u8; aligned];
            let result = device.read_blocks(lba, span.count, &mut bounce);
            if matches!(result, Ok(n) if n == span.count) {
                dst.copy_from_slice(&bounce[..dst.len()]);
            }
            result
        }
        BlockBuf::Write(src) if src.len() == aligned => device.write_blocks(lba, span.count, src),
        BlockBuf::Write(src) => {
            let mut bounce = vec![0u8; aligned];
            bounce[..src.len()].copy_from_slice(src);
            device.write_blocks(lba, span.count, &bounce)
        }
    }
    .map_err(|source| {
        tracing::error!(%direction, start = span.start, error = %source, "block operation failed");
        UpdateError::Device { direction, source }
    })?;

    if transferred != span.count {
        tracing::error!(
            %direction,
            expected = span.count,
            transferred,
            "block operation failed"
        );
        return Err(UpdateError::ShortTransfer {
            direction,
            expected: span.count,
            transferred,
        });
    }

    match direction {
        Direction::Read => Ok(requested),
        Direction::Write => Ok(aligned),
    }
}
