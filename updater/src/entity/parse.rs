// Layout description parsing

use alloc::string::ToString;
use core::str::FromStr;

use super::Layout;
use crate::error::ConfigError;
use crate::fs::FsKind;

/// A parsed layout description, before it is bound to a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitySpec {
    /// `raw <lba_start> <lba_count> [mmcpart <n>]`
    Raw {
        lba_start: u64,
        lba_count: u64,
        hw_partition: Option<u32>,
    },
    /// `part <device> <partition>`
    Part { device: u32, partition: u32 },
    /// `fat|ext4 <device> <partition>`
    Fs {
        kind: FsKind,
        device: u32,
        partition: u32,
    },
}

impl EntitySpec {
    pub fn layout(&self) -> Layout {
        match self {
            Self::Raw { .. } => Layout::RawRange,
            Self::Part { .. } => Layout::Partition,
            Self::Fs { kind: FsKind::Fat, .. } => Layout::FatFile,
            Self::Fs { kind: FsKind::Ext4, .. } => Layout::Ext4File,
        }
    }
}

impl FromStr for EntitySpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        let mut tokens = s.split_whitespace();
        let (Some(kind), Some(arg2), Some(arg3)) = (tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(ConfigError::MissingArguments {
                found: s.split_whitespace().count(),
            });
        };

        let layout =
            Layout::from_token(kind).ok_or_else(|| ConfigError::UnknownLayout(kind.to_string()))?;

        match layout {
            Layout::RawRange => {
                let lba_start = parse_number(arg2)?;
                let lba_count = parse_number(arg3)?;
                let hw_partition = match tokens.next() {
                    Some("mmcpart") => {
                        let value = tokens.next().ok_or(ConfigError::MissingHwPartition)?;
                        Some(parse_u32(value)?)
                    }
                    Some(other) => {
                        tracing::warn!(token = other, "ignoring unknown raw layout option");
                        None
                    }
                    None => None,
                };
                Ok(Self::Raw {
                    lba_start,
                    lba_count,
                    hw_partition,
                })
            }
            Layout::Partition => Ok(Self::Part {
                device: parse_u32(arg2)?,
                partition: parse_u32(arg3)?,
            }),
            Layout::FatFile | Layout::Ext4File => Ok(Self::Fs {
                kind: FsKind::try_from(layout)?,
                device: parse_u32(arg2)?,
                partition: parse_u32(arg3)?,
            }),
        }
    }
}

/// Parse an unsigned number with C-style base detection.
///
/// `0x`/`0X` selects hex, a leading `0` selects octal, anything else is
/// decimal. The whole token must be consumed.
pub fn parse_number(token: &str) -> Result<u64, ConfigError> {
    let invalid = || ConfigError::InvalidNumber(token.to_string());

    let (digits, radix) = if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        (hex, 16)
    } else if token.len() > 1 && token.starts_with('0') {
        (&token[1..], 8)
    } else {
        (token, 10)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid());
    }
    u64::from_str_radix(digits, radix).map_err(|_| invalid())
}

fn parse_u32(token: &str) -> Result<u32, ConfigError> {
    u32::try_from(parse_number(token)?).map_err(|_| ConfigError::InvalidNumber(token.to_string()))
}
