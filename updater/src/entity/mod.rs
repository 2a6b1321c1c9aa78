//! Update entities.
//!
//! An [`Entity`] is one named update target, created from a layout
//! description such as `raw 0x100 0x800 mmcpart 1` or `fat 0 1`. The layout
//! is resolved once at configuration into a [`Medium`], which is what the
//! backend dispatches on afterwards.

mod parse;

pub use parse::{parse_number, EntitySpec};

use alloc::string::String;
use core::fmt;

use crate::block::RawRange;
use crate::device::DeviceId;
use crate::fs::{FsKind, FsTarget};

/// Addressing scheme named by the first token of a layout description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    RawRange,
    Partition,
    FatFile,
    Ext4File,
}

impl Layout {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "raw" => Some(Self::RawRange),
            "part" => Some(Self::Partition),
            "fat" => Some(Self::FatFile),
            "ext4" => Some(Self::Ext4File),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::RawRange => "raw",
            Self::Partition => "part",
            Self::FatFile => "fat",
            Self::Ext4File => "ext4",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where an entity's bytes actually go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Medium {
    /// Block range on the entity's device. `part` entities end up here too.
    Raw(RawRange),
    /// Whole file on a filesystem, staged until flush.
    File(FsTarget),
}

/// A configured update target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    name: String,
    device_id: DeviceId,
    medium: Medium,
    initialized: bool,
}

impl Entity {
    pub(crate) fn new(name: String, device_id: DeviceId, medium: Medium) -> Self {
        Self {
            name,
            device_id,
            medium,
            initialized: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    /// Effective layout. A resolved `part` entity reports [`Layout::RawRange`].
    pub fn layout(&self) -> Layout {
        match &self.medium {
            Medium::Raw(_) => Layout::RawRange,
            Medium::File(target) => match target.kind {
                FsKind::Fat => Layout::FatFile,
                FsKind::Ext4 => Layout::Ext4File,
            },
        }
    }

    pub fn medium(&self) -> &Medium {
        &self.medium
    }

    pub fn raw_range(&self) -> Option<&RawRange> {
        match &self.medium {
            Medium::Raw(range) => Some(range),
            Medium::File(_) => None,
        }
    }

    pub fn fs_target(&self) -> Option<&FsTarget> {
        match &self.medium {
            Medium::File(target) => Some(target),
            Medium::Raw(_) => None,
        }
    }

    pub fn hw_partition(&self) -> Option<u32> {
        self.raw_range().and_then(RawRange::hw_partition)
    }

    /// True once a write has been accepted for this entity.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn mark_initialized(&mut self) {
        self.initialized = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_layout_tokens() {
        for layout in [
            Layout::RawRange,
            Layout::Partition,
            Layout::FatFile,
            Layout::Ext4File,
        ] {
            assert_eq!(Layout::from_token(layout.name()), Some(layout));
        }
        assert_eq!(Layout::from_token("RAW"), None);
        assert_eq!(Layout::from_token("ubi"), None);
    }

    #[test]
    fn test_entity_views() {
        let range = RawRange::new(0x100, 0x10, 512, Some(2)).unwrap();
        let raw = Entity::new("spl".to_string(), 0, Medium::Raw(range));
        assert_eq!(raw.layout(), Layout::RawRange);
        assert_eq!(raw.hw_partition(), Some(2));
        assert!(raw.fs_target().is_none());
        assert!(!raw.is_initialized());

        let mut file = Entity::new(
            "zImage".to_string(),
            1,
            Medium::File(FsTarget {
                kind: FsKind::Ext4,
                device: 1,
                partition: 2,
                path: "zImage".to_string(),
            }),
        );
        assert_eq!(file.layout(), Layout::Ext4File);
        assert_eq!(file.hw_partition(), None);
        file.mark_initialized();
        assert!(file.is_initialized());
    }
}
