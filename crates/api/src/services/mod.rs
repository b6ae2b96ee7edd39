//! External service integrations.

pub mod google_identity;
pub mod links;
pub mod local_storage;
pub mod nominatim;

pub use google_identity::GoogleIdentityVerifier;
pub use links::SiteLinks;
pub use local_storage::LocalObjectStorage;
pub use nominatim::NominatimClient;
