//! Process exit codes.
//!
//! Failures of the expense service map through `ServiceError::exit_code` and
//! `MutationError::exit_code`; the constants here cover the rest.

pub const SUCCESS: i32 = 0;
pub const FATAL: i32 = 1; // Setup failed before any request was made
