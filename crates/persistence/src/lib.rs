//! Persistence layer for the clinic site backend.
//!
//! This crate contains:
//! - Database connection management and migrations
//! - Entity definitions (database row mappings)
//! - PostgreSQL repositories implementing the domain storage traits
//! - An in-memory store implementing the same traits

pub mod changes;
pub mod db;
pub mod entities;
pub mod memory;
pub mod metrics;
pub mod repositories;

pub use memory::InMemoryStore;
