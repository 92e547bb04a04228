//! Block-device storage backend
//!
//! Wraps the externally supplied card/eMMC driver behind the uniform
//! open/close capability. The driver arrives as a
//! `gpt_disk_io::BlockIo` implementation; this backend only validates
//! ranges and enforces the single-handle rule — reading the payload
//! bytes is the loader's business, through [`device_mut`].
//!
//! [`device_mut`]: BlockDevBackend::device_mut

use cinder_core::backend::{BackendError, BackendKind, ProbeHandle, StorageBackend};
use cinder_core::image::StorageSpec;
use cinder_core::source::BootSource;
use gpt_disk_io::BlockIo;

/// Exact device variant behind the block backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockDevVariant {
    Sd,
    Emmc,
}

impl BlockDevVariant {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sd => "sd-card",
            Self::Emmc => "emmc",
        }
    }

    /// Boot source this variant serves.
    pub const fn source(&self) -> BootSource {
        match self {
            Self::Sd => BootSource::RemovableCard,
            Self::Emmc => BootSource::EmbeddedBlockDevice,
        }
    }
}

pub struct BlockDevBackend<B: BlockIo> {
    dev: B,
    variant: BlockDevVariant,
    capacity: u64,
    granularity: u64,
    slot: Option<ProbeHandle>,
    next_token: u32,
}

impl<B: BlockIo> BlockDevBackend<B> {
    /// Wrap a freshly registered device.
    ///
    /// Probes the device once so a dead card fails here, during
    /// bring-up, rather than at the first image load.
    pub fn new(mut dev: B, variant: BlockDevVariant) -> Result<Self, BackendError> {
        let granularity = dev.block_size().to_u64();
        let blocks = dev.num_blocks().map_err(|_| BackendError::DeviceFault)?;
        Ok(Self {
            dev,
            variant,
            capacity: blocks * granularity,
            granularity,
            slot: None,
            next_token: 1,
        })
    }

    pub fn variant(&self) -> BlockDevVariant {
        self.variant
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// The wrapped driver, for the loader's actual reads.
    pub fn device_mut(&mut self) -> &mut B {
        &mut self.dev
    }
}

impl<B: BlockIo> StorageBackend for BlockDevBackend<B> {
    fn kind(&self) -> BackendKind {
        BackendKind::BlockDevice
    }

    fn name(&self) -> &'static str {
        self.variant.as_str()
    }

    fn block_granularity(&self) -> Option<u64> {
        Some(self.granularity)
    }

    fn open(&mut self, spec: &StorageSpec) -> Result<ProbeHandle, BackendError> {
        if self.slot.is_some() {
            return Err(BackendError::AlreadyOpen);
        }
        if spec.length == 0 {
            return Err(BackendError::EmptyRange);
        }
        match spec.end() {
            Some(end) if end <= self.capacity => {}
            _ => return Err(BackendError::OutOfRange),
        }
        let handle = ProbeHandle(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        self.slot = Some(handle);
        Ok(handle)
    }

    fn close(&mut self, handle: ProbeHandle) {
        if self.slot == Some(handle) {
            self.slot = None;
        }
    }

    fn is_open(&self) -> bool {
        self.slot.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt;
    use gpt_disk_types::{BlockSize, Lba};

    #[derive(Debug, Clone, Copy)]
    struct RamBlockIoError;

    impl fmt::Display for RamBlockIoError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "RAM block device error")
        }
    }

    /// In-memory stand-in for the external card driver.
    struct RamBlockIo {
        blocks: u64,
        dead: bool,
    }

    impl RamBlockIo {
        fn new(blocks: u64) -> Self {
            Self {
                blocks,
                dead: false,
            }
        }

        fn dead() -> Self {
            Self {
                blocks: 0,
                dead: true,
            }
        }
    }

    impl BlockIo for RamBlockIo {
        type Error = RamBlockIoError;

        fn block_size(&self) -> BlockSize {
            BlockSize::BS_512
        }

        fn num_blocks(&mut self) -> Result<u64, Self::Error> {
            if self.dead {
                return Err(RamBlockIoError);
            }
            Ok(self.blocks)
        }

        fn read_blocks(&mut self, _start_lba: Lba, _dst: &mut [u8]) -> Result<(), Self::Error> {
            if self.dead {
                return Err(RamBlockIoError);
            }
            Ok(())
        }

        fn write_blocks(&mut self, _start_lba: Lba, _src: &[u8]) -> Result<(), Self::Error> {
            if self.dead {
                return Err(RamBlockIoError);
            }
            Ok(())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn test_variant_sources() {
        assert_eq!(BlockDevVariant::Sd.source(), BootSource::RemovableCard);
        assert_eq!(
            BlockDevVariant::Emmc.source(),
            BootSource::EmbeddedBlockDevice
        );
    }

    #[test]
    fn test_new_probes_capacity() {
        let backend = BlockDevBackend::new(RamBlockIo::new(2048), BlockDevVariant::Sd).unwrap();
        assert_eq!(backend.capacity(), 2048 * 512);
        assert_eq!(backend.block_granularity(), Some(512));
        assert_eq!(backend.name(), "sd-card");
    }

    #[test]
    fn test_dead_device_fails_bring_up() {
        assert!(matches!(
            BlockDevBackend::new(RamBlockIo::dead(), BlockDevVariant::Emmc),
            Err(BackendError::DeviceFault)
        ));
    }

    #[test]
    fn test_open_within_capacity() {
        let mut backend =
            BlockDevBackend::new(RamBlockIo::new(2048), BlockDevVariant::Emmc).unwrap();
        let handle = backend.open(&StorageSpec::new(0x8000, 0x400)).unwrap();
        assert!(backend.is_open());
        backend.close(handle);
        assert!(!backend.is_open());
    }

    #[test]
    fn test_open_past_capacity_rejected() {
        let mut backend =
            BlockDevBackend::new(RamBlockIo::new(16), BlockDevVariant::Sd).unwrap();
        // 16 blocks = 8 KiB of device.
        assert_eq!(
            backend.open(&StorageSpec::new(0x1F00, 0x400)),
            Err(BackendError::OutOfRange)
        );
    }

    #[test]
    fn test_single_handle_enforced() {
        let mut backend =
            BlockDevBackend::new(RamBlockIo::new(2048), BlockDevVariant::Sd).unwrap();
        let spec = StorageSpec::new(0, 0x200);
        let handle = backend.open(&spec).unwrap();
        assert_eq!(backend.open(&spec), Err(BackendError::AlreadyOpen));
        backend.close(handle);
        assert!(backend.open(&spec).is_ok());
    }

    #[test]
    fn test_loader_reads_through_device() {
        let mut backend =
            BlockDevBackend::new(RamBlockIo::new(2048), BlockDevVariant::Sd).unwrap();
        let mut buf = [0u8; 512];
        assert!(backend.device_mut().read_blocks(Lba(0), &mut buf).is_ok());
    }
}
