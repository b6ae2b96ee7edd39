//! HTTP API for the clinic site: public content, live updates and the
//! admin console backend.

pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod services;
