//! Bounded staging buffer for filesystem entities.
//!
//! Filesystem writes are whole-file operations, so incoming payloads are
//! accumulated here and handed to the filesystem in one piece on flush.
//! Overflow is lossy: whatever was buffered is dropped and the caller has to
//! restart the file from the beginning.

use alloc::vec::Vec;

use crate::error::{Result, UpdateError};

pub struct StagingBuffer {
    data: Vec<u8>,
    capacity: usize,
}

impl StagingBuffer {
    /// Capacity is allocated lazily as data arrives.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: Vec::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently buffered.
    pub fn fill_level(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn reset(&mut self) {
        self.data.clear();
    }

    /// Append `payload` to the buffered data.
    ///
    /// If the result would exceed the capacity the buffer is reset, all
    /// previously buffered bytes are lost, and [`UpdateError::Overflow`] is
    /// returned. Nothing of `payload` is kept in that case.
    pub fn append(&mut self, payload: &[u8]) -> Result<usize> {
        let requested = self.data.len().checked_add(payload.len());
        match requested {
            Some(total) if total <= self.capacity => {
                self.data.extend_from_slice(payload);
                Ok(payload.len())
            }
            _ => {
                let requested = requested.unwrap_or(usize::MAX);
                tracing::error!(
                    requested,
                    capacity = self.capacity,
                    discarded = self.data.len(),
                    "file size exceeds staging capacity"
                );
                self.reset();
                Err(UpdateError::Overflow {
                    requested,
                    capacity: self.capacity,
                })
            }
        }
    }

    /// Hand the buffered bytes to `write` and reset, whatever `write` returns.
    ///
    /// Returns the number of bytes handed over.
    pub fn flush<F>(&mut self, write: F) -> Result<usize>
    where
        F: FnOnce(&[u8]) -> Result<()>,
    {
        let len = self.data.len();
        let result = write(&self.data);
        self.reset();
        result.map(|()| len)
    }
}
