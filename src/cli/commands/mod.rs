//! CLI command implementations.

pub mod ask;
pub mod history;
pub mod ingest;
pub mod init;
pub mod retry;
