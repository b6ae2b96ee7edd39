//! HTTP route handlers.

pub mod audit_logs;
pub mod auth;
pub mod content;
pub mod gallery;
pub mod geocode;
pub mod health;
pub mod services;
pub mod settings;
pub mod site;
pub mod testimonials;
pub mod uploads;
pub mod users;
