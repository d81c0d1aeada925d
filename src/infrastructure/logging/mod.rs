//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - pretty or JSON console output on stderr
//! - JSON file output with rotation and retention

pub mod logger;

pub use logger::LoggerImpl;
