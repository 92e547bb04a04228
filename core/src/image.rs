//! Image identities and storage ranges.
//!
//! An [`ImageId`] names a loadable role for the whole boot session; a
//! [`ContentId`] is the 128-bit value a container header uses to tag a
//! payload with that role. The two meet in the image catalog.

use uguid::{guid, Guid};

/// 128-bit content identifier matched against container header entries.
pub type ContentId = Guid;

/// Roles this boot target can load.
///
/// `SecurePayload` and its companion only exist when the stage is built
/// with a trusted OS dispatcher (`trusted-os` feature).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageId {
    /// The outer container package itself (header plus payloads).
    Container,
    /// Second-stage runtime firmware.
    RuntimeFirmware,
    /// Secure-world payload.
    #[cfg(feature = "trusted-os")]
    SecurePayload,
    /// Companion image to the secure-world payload.
    #[cfg(feature = "trusted-os")]
    SecurePayloadExtra,
    /// Non-secure world payload (the next bootloader or OS).
    NonSecurePayload,
}

impl ImageId {
    /// Display name for diagnostics.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::RuntimeFirmware => "runtime-firmware",
            #[cfg(feature = "trusted-os")]
            Self::SecurePayload => "secure-payload",
            #[cfg(feature = "trusted-os")]
            Self::SecurePayloadExtra => "secure-payload-extra",
            Self::NonSecurePayload => "non-secure-payload",
        }
    }
}

/// Content identifiers as they appear in container headers.
///
/// The container's own catalog entry carries no content identifier; it
/// is never a patch target.
pub const RUNTIME_FIRMWARE_ID: ContentId = guid!("6d3a4d7e-02d0-4b62-b2f2-4c0d8f2e5a91");
#[cfg(feature = "trusted-os")]
pub const SECURE_PAYLOAD_ID: ContentId = guid!("3b2f8a11-5c4e-49a8-9f6b-d02e3a7c815d");
#[cfg(feature = "trusted-os")]
pub const SECURE_PAYLOAD_EXTRA_ID: ContentId = guid!("9c6d21f3-7e8b-4f02-8a3d-50c1b9e47a26");
pub const NON_SECURE_PAYLOAD_ID: ContentId = guid!("f41a7b02-8e35-4d96-bd20-7a913c5e8f4d");

/// Byte range within a storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StorageSpec {
    pub offset: u64,
    pub length: u64,
}

impl StorageSpec {
    pub const fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// End of the range, if it does not wrap.
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.length)
    }
}
