//! Infrastructure layer module
//!
//! - Configuration management (figment)
//! - Logging infrastructure (tracing)
//! - Setup: project initialization and wiring `Config` into services

pub mod config;
pub mod logging;
pub mod setup;
