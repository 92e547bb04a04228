//! Boot source detection
//!
//! Senses the physical medium the container was booted from. The strap
//! report register answers directly on normal boots; when the recovery
//! configuration is strapped, the encoded source is fetched indirectly
//! from an external configuration EEPROM. Either way the answer is
//! computed at most once per boot: boot-mode hardware state cannot
//! change mid-boot, so failure is cached as hard as success.

use crate::{log_error, log_notice};

/// Recovery-configuration strap: the source must be discovered
/// indirectly via the configuration EEPROM.
pub const BOOT_STATUS_RECOVERY: u32 = 1 << 8;

/// Boot-source field within the strap report register.
pub const BOOT_SOURCE_MASK: u32 = 0xE0;
pub const BOOT_SOURCE_SHIFT: u32 = 5;

// Legal source codes, as strapped or as stored in the top bits of the
// EEPROM boot-config byte.
const SOURCE_CODE_FLASH: u8 = 0x1;
const SOURCE_CODE_CARD: u8 = 0x2;
const SOURCE_CODE_EMMC: u8 = 0x3;

/// Minimum aligned read unit of the block-oriented media.
pub const DEVICE_BLOCK_SIZE: u64 = 512;

/// Physical medium the container was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootSource {
    /// Byte-addressable flash/ROM, read at computed addresses.
    AddressableFlash,
    /// Removable card.
    RemovableCard,
    /// Soldered-down block device.
    EmbeddedBlockDevice,
    /// Terminal value: detection failed and will not be retried.
    Invalid,
}

impl BootSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AddressableFlash => "addressable-flash",
            Self::RemovableCard => "removable-card",
            Self::EmbeddedBlockDevice => "embedded-block-device",
            Self::Invalid => "invalid",
        }
    }

    /// Block-oriented media need length rounding and a block backend.
    pub const fn is_block_oriented(&self) -> bool {
        matches!(self, Self::RemovableCard | Self::EmbeddedBlockDevice)
    }

    /// Minimum aligned read unit; `None` for byte-addressable media.
    pub const fn block_granularity(&self) -> Option<u64> {
        if self.is_block_oriented() {
            Some(DEVICE_BLOCK_SIZE)
        } else {
            None
        }
    }

    /// Decode a strapped/EEPROM source code. Anything outside the legal
    /// set is `Invalid`.
    pub const fn from_code(code: u8) -> Self {
        match code {
            SOURCE_CODE_FLASH => Self::AddressableFlash,
            SOURCE_CODE_CARD => Self::RemovableCard,
            SOURCE_CODE_EMMC => Self::EmbeddedBlockDevice,
            _ => Self::Invalid,
        }
    }
}

/// Failure of the indirect (EEPROM) discovery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenseError {
    /// Firmware configuration data missing or unreadable.
    ConfigUnavailable,
    /// Configuration data carries no alias for the EEPROM bus.
    MissingBusAlias,
    /// Bus driver registration failed.
    BusRegistration,
    /// The EEPROM transfer itself failed.
    TransferFailed,
}

impl SenseError {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigUnavailable => "firmware configuration data unavailable",
            Self::MissingBusAlias => "no EEPROM bus alias in configuration data",
            Self::BusRegistration => "EEPROM bus registration failed",
            Self::TransferFailed => "EEPROM boot-config read failed",
        }
    }
}

/// Hardware consulted by boot-source discovery.
pub trait BootSense {
    /// Raw strap report register value.
    fn strap_register(&self) -> u32;

    /// Boot-config byte from the external EEPROM (recovery path). The
    /// source code sits in the byte's top bits.
    fn recovery_boot_config(&mut self) -> Result<u8, SenseError>;
}

/// Memoizing boot-source detector.
///
/// Owns its hardware seam and a cached answer; constructed once at
/// stage entry and carried in the boot context for the rest of the
/// stage's lifetime.
pub struct BootSourceDetector<S: BootSense> {
    sense: S,
    cached: Option<BootSource>,
}

impl<S: BootSense> BootSourceDetector<S> {
    pub const fn new(sense: S) -> Self {
        Self {
            sense,
            cached: None,
        }
    }

    /// Determine the boot source.
    ///
    /// Computed from hardware at most once; every later call returns
    /// the cached value, including a terminal `Invalid` (retrying a
    /// strap read cannot change its outcome).
    pub fn determine(&mut self) -> BootSource {
        if let Some(source) = self.cached {
            return source;
        }

        let status = self.sense.strap_register();
        let source = if status & BOOT_STATUS_RECOVERY != 0 {
            match self.sense.recovery_boot_config() {
                Ok(byte) => BootSource::from_code(byte >> BOOT_SOURCE_SHIFT),
                Err(err) => {
                    log_notice!(err.as_str());
                    BootSource::Invalid
                }
            }
        } else {
            BootSource::from_code(((status & BOOT_SOURCE_MASK) >> BOOT_SOURCE_SHIFT) as u8)
        };

        if source == BootSource::Invalid {
            log_error!("boot source: could not identify the boot medium");
        }

        self.cached = Some(source);
        source
    }

    /// Cached value, if a determination has happened. `None` means
    /// undetermined, which is distinct from a terminal `Invalid`.
    pub fn cached(&self) -> Option<BootSource> {
        self.cached
    }
}
