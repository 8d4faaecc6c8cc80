//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - layer selections, parameters or dependencies rejected
pub const VALIDATION_ERROR: i32 = 2;

/// Template error - input expansion or chart rendering failed
pub const TEMPLATE_ERROR: i32 = 3;

/// Spec error - invalid application spec or missing version/flavor
pub const SPEC_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;
