//! Backend configuration.

use crate::error::ConfigError;

/// Default staging capacity for filesystem entities (8 MiB).
pub const DEFAULT_MAX_FILE_SIZE: usize = 8 * 1024 * 1024;

/// Update backend configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendConfig {
    /// Largest file that can be staged for one filesystem flush, in bytes.
    pub max_file_size: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl BackendConfig {
    /// Create config with a specific staging capacity.
    pub fn with_max_file_size(max_file_size: usize) -> Self {
        Self { max_file_size }
    }

    /// Set staging capacity.
    pub fn max_file_size(mut self, bytes: usize) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_file_size == 0 {
            return Err(ConfigError::ZeroStagingCapacity);
        }
        Ok(())
    }
}
