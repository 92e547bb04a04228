//! Storage bring-up
//!
//! Registers the storage backends this boot needs and fixes the boot
//! source. Any failure here is terminal: once a boot medium is
//! committed there is nothing to fall back to, so this path halts
//! instead of returning an error.

use cinder_core::config::BootConfig;
use cinder_core::resolver::{resolve_boot_source, BootContext};
use cinder_core::source::{BootSource, BootSourceDetector};
use cinder_core::{log_error, log_info};
use gpt_disk_io::BlockIo;

use crate::blockdev::{BlockDevBackend, BlockDevVariant};
use crate::config::HandoffConfig;
use crate::memmap::MemmapBackend;
use crate::sense::HardwareSense;

/// Bring up storage for this boot stage.
///
/// The flash backend participates unconditionally: the container header
/// must be readable before any block driver exists. A block backend is
/// added only when the configuration designates a block medium, with
/// the exact variant settled by the boot-source detector when the build
/// itself could not.
///
/// `bring_up` registers the external block driver for the chosen
/// variant and hands back its device; `None` means registration failed.
///
/// Halts (panics) on any failure. There is no return path: a boot that
/// cannot reach its own container has nothing left to do.
pub fn storage_init<B, F>(
    boot: BootConfig,
    handoff: HandoffConfig,
    flash: MemmapBackend,
    mut bring_up: F,
) -> BootContext<HardwareSense, MemmapBackend, BlockDevBackend<B>>
where
    B: BlockIo,
    F: FnMut(BlockDevVariant) -> Option<B>,
{
    let mut detector = BootSourceDetector::new(HardwareSense::new(handoff));

    let source = match resolve_boot_source(&boot, &mut detector) {
        Ok(source) => source,
        Err(err) => {
            log_error!(err.as_str());
            panic!("storage bring-up failed");
        }
    };
    log_info!(source.as_str());

    let block = if boot.is_block_boot() {
        let variant = match source {
            BootSource::EmbeddedBlockDevice => BlockDevVariant::Emmc,
            _ => BlockDevVariant::Sd,
        };
        log_info!(variant.as_str());

        let Some(dev) = bring_up(variant) else {
            log_error!("storage: block device registration failed");
            panic!("storage bring-up failed");
        };
        match BlockDevBackend::new(dev, variant) {
            Ok(backend) => Some(backend),
            Err(err) => {
                log_error!(err.as_str());
                panic!("storage bring-up failed");
            }
        }
    } else {
        None
    };

    BootContext::new(boot, detector, source, flash, block)
}
