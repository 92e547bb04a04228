//! Device policy row and backend health check
//!
//! A policy row is ephemeral, derived data: which backend and which
//! range for one image, recomputed every time the resolver is asked.
//! The health check is the enforcement of the single-handle rule: probe
//! the backend, then release it before the loader's own open follows.

use crate::backend::{BackendError, StorageBackend};
use crate::image::StorageSpec;

/// Backend choice for one image. Never cached; cheap to recompute.
pub struct PolicyRow<'a> {
    pub backend: &'a mut dyn StorageBackend,
    pub spec: StorageSpec,
}

/// Probe `spec` on `backend` and release it immediately.
///
/// The handle must not survive this call on any path: the loader
/// performs its own open next, and the backend admits only one handle
/// at a time.
pub fn health_check(
    backend: &mut dyn StorageBackend,
    spec: &StorageSpec,
) -> Result<(), BackendError> {
    let handle = backend.open(spec)?;
    backend.close(handle);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendKind, ProbeHandle};

    struct ProbeCounter {
        opens: usize,
        closes: usize,
        fail_open: bool,
        slot: Option<ProbeHandle>,
    }

    impl ProbeCounter {
        fn new(fail_open: bool) -> Self {
            Self {
                opens: 0,
                closes: 0,
                fail_open,
                slot: None,
            }
        }
    }

    impl StorageBackend for ProbeCounter {
        fn kind(&self) -> BackendKind {
            BackendKind::AddressableFlash
        }

        fn name(&self) -> &'static str {
            "probe-counter"
        }

        fn block_granularity(&self) -> Option<u64> {
            None
        }

        fn open(&mut self, spec: &StorageSpec) -> Result<ProbeHandle, BackendError> {
            self.opens += 1;
            if self.fail_open {
                return Err(BackendError::DeviceFault);
            }
            if self.slot.is_some() {
                return Err(BackendError::AlreadyOpen);
            }
            if spec.length == 0 {
                return Err(BackendError::EmptyRange);
            }
            let handle = ProbeHandle(self.opens as u32);
            self.slot = Some(handle);
            Ok(handle)
        }

        fn close(&mut self, handle: ProbeHandle) {
            if self.slot == Some(handle) {
                self.slot = None;
                self.closes += 1;
            }
        }

        fn is_open(&self) -> bool {
            self.slot.is_some()
        }
    }

    #[test]
    fn test_probe_released_on_success() {
        let mut backend = ProbeCounter::new(false);
        let spec = StorageSpec::new(0x1000, 0x200);
        assert!(health_check(&mut backend, &spec).is_ok());
        assert_eq!(backend.opens, 1);
        assert_eq!(backend.closes, 1);
        assert!(!backend.is_open());
    }

    #[test]
    fn test_no_handle_left_on_failure() {
        let mut backend = ProbeCounter::new(true);
        let spec = StorageSpec::new(0x1000, 0x200);
        assert_eq!(
            health_check(&mut backend, &spec),
            Err(BackendError::DeviceFault)
        );
        assert!(!backend.is_open());
    }

    #[test]
    fn test_zero_length_range_rejected() {
        let mut backend = ProbeCounter::new(false);
        let spec = StorageSpec::default();
        assert_eq!(
            health_check(&mut backend, &spec),
            Err(BackendError::EmptyRange)
        );
        assert!(!backend.is_open());
    }

    #[test]
    fn test_repeated_checks_reuse_backend() {
        let mut backend = ProbeCounter::new(false);
        let spec = StorageSpec::new(0x1000, 0x200);
        assert!(health_check(&mut backend, &spec).is_ok());
        assert!(health_check(&mut backend, &spec).is_ok());
        assert_eq!(backend.opens, 2);
        assert_eq!(backend.closes, 2);
    }
}
