//! Exit code constants for the ralph CLI.
//!
//! - 0: Success (including "nothing to do")
//! - 1: User error (bad args, invalid configuration values)
//! - 2: Tracker unreachable or returned unusable output
//! - 3: Agent configuration store missing

/// Successful execution, including runs that found no candidates.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or invalid configuration values.
pub const USER_ERROR: i32 = 1;

/// The tracker could not be reached.
pub const TRACKER_FAILURE: i32 = 2;

/// The agent configuration store is missing.
pub const CONFIG_FAILURE: i32 = 3;
