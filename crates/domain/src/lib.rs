//! Domain layer for the clinic site backend.
//!
//! This crate contains:
//! - Domain models (documents, services, testimonials, settings, users, audit entries)
//! - Storage, identity, object storage and geocoding traits
//! - Business logic services

pub mod models;
pub mod services;
pub mod store;
