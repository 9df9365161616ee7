//! Process exit codes, one per failure class
//!
//! Usage errors use 64 (`EX_USAGE`) so scripts can tell a bad invocation
//! apart from a cluster failure.

/// Anything not covered by a more specific code
pub const ERROR: i32 = 1;

/// Configuration or schema validation failed
pub const VALIDATION_ERROR: i32 = 2;

/// A GET, PATCH or DELETE failed, or a wait timed out
pub const CLUSTER_ERROR: i32 = 3;

/// Provider configuration or kubeconfig unusable, or offline mode
pub const CONFIG_ERROR: i32 = 4;

/// A local file could not be read or written
pub const IO_ERROR: i32 = 5;

/// Unknown type name or malformed argument
pub const USAGE_ERROR: i32 = 64;
