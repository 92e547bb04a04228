//! Boot-stage configuration
//!
//! Build- and handoff-provided layout of the container: where its
//! header is staged for parsing, and where the container itself starts
//! on each medium this build can boot from. Container headers describe
//! relative, medium-agnostic offsets; these bases are what re-anchor
//! them into real backend coordinates.

use crate::source::BootSource;

/// Container/header layout for this boot target.
///
/// A zero base means "this build is not laid out for that medium".
#[derive(Debug, Clone, Copy)]
pub struct BootConfig {
    /// Address where the container header is staged for parsing.
    pub header_base: u64,
    /// Fixed maximum size of the container header.
    pub header_max_size: u64,
    /// Container base when booting from addressable flash.
    pub flash_offset: u64,
    /// Container base on a removable card.
    pub card_offset: u64,
    /// Container base on the embedded block device.
    pub emmc_offset: u64,
    /// Container base for a plain in-memory copy.
    pub mem_offset: u64,
}

impl BootConfig {
    /// True when this build is laid out for a block-oriented medium.
    pub const fn is_block_boot(&self) -> bool {
        self.card_offset != 0 || self.emmc_offset != 0
    }

    /// Absolute base of the container on the medium actually booted
    /// from. Falls back to the flash base, then the in-memory copy,
    /// when no medium-specific base applies.
    pub const fn container_offset(&self, source: BootSource) -> u64 {
        match source {
            BootSource::RemovableCard if self.card_offset != 0 => self.card_offset,
            BootSource::EmbeddedBlockDevice if self.emmc_offset != 0 => self.emmc_offset,
            _ => {
                if self.flash_offset != 0 {
                    self.flash_offset
                } else {
                    self.mem_offset
                }
            }
        }
    }
}
