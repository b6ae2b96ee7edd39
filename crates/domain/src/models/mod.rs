//! Domain models for the clinic site.

pub mod audit_log;
pub mod document;
pub mod gallery;
pub mod geocode;
pub mod service;
pub mod settings;
pub mod testimonial;
pub mod upload;
pub mod user;

pub use audit_log::{
    AuditAction, AuditChanges, AuditEntry, FieldChange, ListAuditLogsQuery, NewAuditEntry,
};
pub use document::{
    sort_by_order, to_document_data, ChangeEvent, ChangeKind, Collection, Document, DocumentData,
    ListFilter, ORDER_FIELD, PUBLISHED_FIELD,
};
pub use gallery::{CreateGalleryImageRequest, GalleryImage, UpdateGalleryImageRequest};
pub use geocode::{GeoPoint, GeocodeQuery, GeocodeResult, GeocodeSource};
pub use service::{
    CreateServiceRequest, Service, ServiceAnimation, ServiceFlag, ToggleServiceRequest,
    UpdateServiceRequest,
};
pub use settings::{
    ContactSettings, DoctorSettings, LocationSettings, SettingsPayloadError, SettingsType,
};
pub use testimonial::{CreateTestimonialRequest, Testimonial, UpdateTestimonialRequest};
pub use upload::{
    DeleteImageRequest, ImageFolder, ImageUpload, ObjectMetadata, UploadedImage,
};
pub use user::{
    FederatedIdentity, Role, SignInRequest, SignInResponse, UpdateRoleRequest, UserProfile,
};
