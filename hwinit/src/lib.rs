//! Hardware access layer for the Cinder boot stage
//!
//! Everything that touches registers or devices lives here: the boot
//! status straps, the configuration-EEPROM bus, the firmware handoff
//! description, and the two storage backends the resolver can hand to
//! the loader.
//!
//! # What This Crate Does
//!
//! - Boot status register access (MMIO)
//! - Minimal polling I2C master for the configuration EEPROM
//! - Firmware handoff configuration (register addresses, bus aliases)
//! - Addressable-flash and block-device storage backends
//! - Fatal storage bring-up (`storage_init`)
//!
//! # What This Crate Does NOT Do
//!
//! - Clock-tree or DDR bring-up
//! - Block-device driver internals (the card/eMMC driver is supplied
//!   externally as a `gpt_disk_io::BlockIo` implementation)
//! - Container header parsing or image loading

#![no_std]
#![allow(clippy::new_without_default)]

pub mod blockdev;
pub mod config;
pub mod i2c;
pub mod memmap;
pub mod mmio;
pub mod platform;
pub mod sense;

pub use blockdev::{BlockDevBackend, BlockDevVariant};
pub use config::{BusAlias, HandoffConfig, MAX_BUS_ALIASES};
pub use i2c::{I2cBus, I2cError, I2cRegistry};
pub use memmap::MemmapBackend;
pub use platform::storage_init;
pub use sense::HardwareSense;
