//! Shared utilities and common types for the clinic site backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Session token issuing and validation
//! - Common validation logic

pub mod jwt;
pub mod validation;
