//! Address-mapped storage backend
//!
//! A flash/ROM window read directly at computed addresses. Specs use
//! absolute addresses, so opening only checks that the range stays
//! inside the window.

use cinder_core::backend::{BackendError, BackendKind, ProbeHandle, StorageBackend};
use cinder_core::image::StorageSpec;

pub struct MemmapBackend {
    base: u64,
    size: u64,
    slot: Option<ProbeHandle>,
    next_token: u32,
}

impl MemmapBackend {
    pub const fn new(base: u64, size: u64) -> Self {
        Self {
            base,
            size,
            slot: None,
            next_token: 1,
        }
    }

    pub const fn base(&self) -> u64 {
        self.base
    }

    pub const fn size(&self) -> u64 {
        self.size
    }

    fn contains(&self, spec: &StorageSpec) -> bool {
        let Some(end) = spec.end() else {
            return false;
        };
        spec.offset >= self.base && end <= self.base + self.size
    }
}

impl StorageBackend for MemmapBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::AddressableFlash
    }

    fn name(&self) -> &'static str {
        "memmap"
    }

    fn block_granularity(&self) -> Option<u64> {
        None
    }

    fn open(&mut self, spec: &StorageSpec) -> Result<ProbeHandle, BackendError> {
        if self.slot.is_some() {
            return Err(BackendError::AlreadyOpen);
        }
        if spec.length == 0 {
            return Err(BackendError::EmptyRange);
        }
        if !self.contains(spec) {
            return Err(BackendError::OutOfRange);
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
