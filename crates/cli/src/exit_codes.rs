//! Structured exit codes for machine-readable error handling.
//!
//! Scripts can tell an expired login from a typo'd product name from a
//! failing query without parsing messages.

/// Success (standard convention)
#[allow(dead_code)]
pub const SUCCESS: i32 = 0;

/// General error (fallback for unknown errors)
pub const GENERAL_ERROR: i32 = 1;

/// CLI usage error (invalid arguments, unsupported output format)
pub const USAGE_ERROR: i32 = 2;

/// Configuration error (YAML parse failure, invalid field)
pub const CONFIG_ERROR: i32 = 3;

/// Catalog unreachable or enumeration failed
pub const CONNECTION_ERROR: i32 = 4;

/// Product name malformed, unknown, or not a data product
pub const NOT_FOUND_ERROR: i32 = 5;

/// Engine setup, registration or SQL failure
pub const QUERY_ERROR: i32 = 6;

/// No usable credentials, expired SSO login, or role assumption refused
pub const CREDENTIAL_ERROR: i32 = 7;
