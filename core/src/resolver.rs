//! Resolver entry point
//!
//! Owns the catalog, configuration, detector, and registered backends,
//! and answers the one question the generic loader asks: which backend
//! and which byte range for this image. Also hosts the container offset
//! patcher, the loader's callback for re-anchoring header entries.

use crate::backend::{BackendError, StorageBackend};
use crate::catalog::ImageCatalog;
use crate::config::BootConfig;
use crate::image::{ContentId, ImageId, StorageSpec};
use crate::log_error;
use crate::policy::{health_check, PolicyRow};
use crate::source::{BootSense, BootSource, BootSourceDetector};

/// Resolution failure. Halting on it is the caller's decision; the
/// wider boot stage always does, but that policy is not hard-coded
/// here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    /// A boot source was required but is terminally undetermined.
    SourceUndetermined,
    /// Policy selected the block backend but none is registered.
    NoBlockBackend,
    /// The health-check probe failed.
    ProbeFailed(BackendError),
}

impl ResolveError {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SourceUndetermined => "boot source could not be determined",
            Self::NoBlockBackend => "no block backend registered",
            Self::ProbeFailed(err) => err.as_str(),
        }
    }
}

/// Ready-to-open answer handed to the generic loader.
pub struct ImageSource<'a> {
    pub backend: &'a mut dyn StorageBackend,
    pub spec: StorageSpec,
}

/// Fix the boot source for this boot.
///
/// Flash unless the configuration designates a block medium. When it
/// does, a configured embedded-device base wins outright; otherwise the
/// detector breaks the card/embedded tie (the build knew it boots from
/// a card-shaped medium but not which one).
pub fn resolve_boot_source<S: BootSense>(
    config: &BootConfig,
    detector: &mut BootSourceDetector<S>,
) -> Result<BootSource, ResolveError> {
    if !config.is_block_boot() {
        return Ok(BootSource::AddressableFlash);
    }
    if config.emmc_offset != 0 {
        return Ok(BootSource::EmbeddedBlockDevice);
    }
    match detector.determine() {
        BootSource::Invalid => Err(ResolveError::SourceUndetermined),
        BootSource::EmbeddedBlockDevice => Ok(BootSource::EmbeddedBlockDevice),
        _ => Ok(BootSource::RemovableCard),
    }
}

/// Boot-stage resolver state: one per boot, constructed at stage entry
/// after backend bring-up, read for the rest of the stage's lifetime.
pub struct BootContext<S: BootSense, F: StorageBackend, D: StorageBackend> {
    detector: BootSourceDetector<S>,
    catalog: ImageCatalog,
    config: BootConfig,
    source: BootSource,
    flash: F,
    block: Option<D>,
}

impl<S: BootSense, F: StorageBackend, D: StorageBackend> BootContext<S, F, D> {
    /// Assemble a context after backend bring-up. `source` is the
    /// resolved boot source, fixed for the rest of this boot.
    pub fn new(
        config: BootConfig,
        detector: BootSourceDetector<S>,
        source: BootSource,
        flash: F,
        block: Option<D>,
    ) -> Self {
        Self {
            detector,
            catalog: ImageCatalog::new(),
            config,
            source,
            flash,
            block,
        }
    }

    pub fn boot_source(&self) -> BootSource {
        self.source
    }

    pub fn catalog(&self) -> &ImageCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &BootConfig {
        &self.config
    }

    pub fn detector_mut(&mut self) -> &mut BootSourceDetector<S> {
        &mut self.detector
    }

    /// Apply one container-header entry: re-anchor the header's
    /// relative offset into backend coordinates and round the length to
    /// the medium's block granularity when one exists.
    ///
    /// Called by the loader once per header entry after it has parsed
    /// and validated the container header. A content id no catalog slot
    /// expects is deliberately ignored.
    pub fn patch_spec(&mut self, content_id: &ContentId, size: u64, relative_offset: u64) {
        if self.catalog.find(ImageId::Container).is_none() {
            // Can only happen from a broken table edit, never at runtime.
            log_error!("patch: image catalog has no container entry");
            panic!("image catalog built without a container entry");
        }

        let offset = self.config.container_offset(self.source) + relative_offset;
        let length = match self.source.block_granularity() {
            Some(unit) => ((size + unit - 1) / unit) * unit,
            None => size,
        };
        self.catalog
            .finalize_by_content(content_id, StorageSpec::new(offset, length));
    }

    /// Choose the backend for an image.
    ///
    /// The container always reads from addressable flash: its header is
    /// what reveals which payloads exist, before any block driver is
    /// even initialized. Everything else follows the boot source.
    fn resolve_policy(&mut self, image_id: ImageId) -> Result<PolicyRow<'_>, ResolveError> {
        let spec = match self.catalog.spec_for(image_id, &self.config) {
            Some(spec) => spec,
            None => {
                log_error!("resolver: image id not present in the catalog");
                panic!("image id not present in the catalog");
            }
        };

        let backend: &mut dyn StorageBackend =
            if image_id != ImageId::Container && self.source.is_block_oriented() {
                match self.block.as_mut() {
                    Some(block) => block,
                    None => return Err(ResolveError::NoBlockBackend),
                }
            } else {
                &mut self.flash
            };

        Ok(PolicyRow { backend, spec })
    }

    /// Resolve an image to a ready-to-open (backend, range) pair.
    ///
    /// Runs the health check before answering so a dead backend fails
    /// here, loudly, instead of at the loader's own open.
    pub fn get_image_source(
        &mut self,
        image_id: ImageId,
    ) -> Result<ImageSource<'_>, ResolveError> {
        let row = self.resolve_policy(image_id)?;
        let spec = row.spec;
        health_check(&mut *row.backend, &spec).map_err(ResolveError::ProbeFailed)?;
        Ok(ImageSource {
            backend: row.backend,
            spec,
        })
    }
}
