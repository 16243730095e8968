//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod export;
pub mod init;
pub mod validate;

/// Exit code for a successful run
pub const EXIT_OK: i32 = 0;
/// Exit code for an invalid or unreadable configuration
pub const EXIT_CONFIGURATION: i32 = 2;
/// Exit code when the source server cannot be reached or rejects the request
pub const EXIT_SOURCE: i32 = 4;
/// Exit code for any other failure
pub const EXIT_FATAL: i32 = 5;
/// Exit code for a run stopped by SIGINT or SIGTERM
pub const EXIT_INTERRUPTED: i32 = 130;
