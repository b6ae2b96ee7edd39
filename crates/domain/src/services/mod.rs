//! Domain services for the clinic site.
//!
//! Services contain business logic that operates on domain models through
//! the storage and provider traits.

pub mod audit;
pub mod auth;
pub mod content;
pub mod geocoding;
pub mod subscription;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

pub use audit::{diff_changes, AuditRecorder};
pub use auth::{AuthError, AuthService, IdentityError, IdentityVerifier};
pub use content::{Actor, ContentError, ContentService};
pub use geocoding::{GeocodeError, GeocodeMatch, Geocoder, GeocodingProvider};
pub use subscription::{
    CollectionState, CollectionSubscription, DocumentState, DocumentSubscription,
};
pub use upload::{ImageUploader, ObjectStorage, UploadError};
