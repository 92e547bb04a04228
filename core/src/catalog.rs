//! Image catalog
//!
//! Fixed table mapping image roles to their storage ranges, the single
//! source of truth for "where is this image". The container's own range
//! is a pure function of the build-time header location and is computed
//! on lookup, never stored. Payload ranges start unset and are
//! finalized exactly once, after the external loader has parsed the
//! container header.

use crate::config::BootConfig;
use crate::image::{self, ContentId, ImageId, StorageSpec};
use crate::log_error;

/// Maximum number of catalog slots.
pub const MAX_IMAGES: usize = 5;

/// Patch state of a payload's storage range.
///
/// An entry is either unset or final; nothing ever goes back from
/// final to unset within a boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecState {
    /// The container header has not been applied yet.
    Unset,
    /// Known, and immutable for the rest of this boot.
    Final(StorageSpec),
}

/// One loadable image known to this boot target.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub image_id: ImageId,
    /// Header tag for this role; `None` for the container itself.
    pub content_id: Option<ContentId>,
    pub spec: SpecState,
}

/// The catalog. Small, fixed, boot-time-only; linear scans are all it
/// needs.
pub struct ImageCatalog {
    entries: [Option<CatalogEntry>; MAX_IMAGES],
    count: usize,
}

impl ImageCatalog {
    /// Build the table for this boot target. The set of slots is fixed
    /// here and never changes afterwards.
    pub fn new() -> Self {
        let mut catalog = Self {
            entries: [None; MAX_IMAGES],
            count: 0,
        };
        catalog.push(ImageId::Container, None);
        catalog.push(ImageId::RuntimeFirmware, Some(image::RUNTIME_FIRMWARE_ID));
        #[cfg(feature = "trusted-os")]
        {
            catalog.push(ImageId::SecurePayload, Some(image::SECURE_PAYLOAD_ID));
            catalog.push(
                ImageId::SecurePayloadExtra,
                Some(image::SECURE_PAYLOAD_EXTRA_ID),
            );
        }
        catalog.push(ImageId::NonSecurePayload, Some(image::NON_SECURE_PAYLOAD_ID));
        catalog
    }

    fn push(&mut self, image_id: ImageId, content_id: Option<ContentId>) {
        self.entries[self.count] = Some(CatalogEntry {
            image_id,
            content_id,
            spec: SpecState::Unset,
        });
        self.count += 1;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Linear scan by image role.
    pub fn find(&self, image_id: ImageId) -> Option<&CatalogEntry> {
        self.entries[..self.count]
            .iter()
            .flatten()
            .find(|entry| entry.image_id == image_id)
    }

    /// Linear scan by header content identifier. Never matches the
    /// container (it carries none).
    pub fn find_by_content(&self, content_id: &ContentId) -> Option<&CatalogEntry> {
        self.entries[..self.count]
            .iter()
            .flatten()
            .find(|entry| entry.content_id.as_ref() == Some(content_id))
    }

    /// Storage range for an image.
    ///
    /// The container's range lives at a fixed spot of fixed maximum
    /// size, so it is computed from the configuration on every call;
    /// the stored state is never consulted for it. An unset payload
    /// reads as a zeroed range.
    pub fn spec_for(&self, image_id: ImageId, config: &BootConfig) -> Option<StorageSpec> {
        let entry = self.find(image_id)?;
        if entry.image_id == ImageId::Container {
            return Some(StorageSpec::new(config.header_base, config.header_max_size));
        }
        Some(match entry.spec {
            SpecState::Final(spec) => spec,
            SpecState::Unset => StorageSpec::default(),
        })
    }

    /// Finalize the range of whichever slot expects `content_id`.
    ///
    /// No slot expecting it is a deliberate don't-care: containers may
    /// carry payloads irrelevant to this target. Re-finalizing with the
    /// identical range is a no-op; a conflicting range is refused, the
    /// first answer stands.
    pub fn finalize_by_content(&mut self, content_id: &ContentId, spec: StorageSpec) {
        for entry in self.entries[..self.count].iter_mut().flatten() {
            if entry.content_id.as_ref() != Some(content_id) {
                continue;
            }
            match entry.spec {
                SpecState::Unset => entry.spec = SpecState::Final(spec),
                SpecState::Final(existing) if existing == spec => {}
                SpecState::Final(_) => {
                    log_error!("catalog: refusing to re-patch a finalized image range");
                }
            }
            return;
        }
    }
}
