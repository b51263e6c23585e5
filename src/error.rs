//! Error taxonomy for the collector and viewer.
//!
//! Error codes follow the pattern: CCT-{CATEGORY}-{3-digit number}
//!
//! Categories:
//! - IO: transient filesystem/measurement failures (§7 transient-io)
//! - STORE: store write/open failures, transient and fatal (§7 transient-store / fatal-store)
//! - CFG: configuration load failures (§7 config)
//! - LOCK: contention on the process marker (§7 contention)
//!
//! Each error code is stable and should not be reused.

use thiserror::Error;

pub const CCT_IO_001_MEASUREMENT_FAILED: &str = "CCT-IO-001";
pub const CCT_IO_002_STAT_FAILED: &str = "CCT-IO-002";

pub const CCT_STORE_001_BUSY: &str = "CCT-STORE-001";
pub const CCT_STORE_002_SCHEMA_MISMATCH: &str = "CCT-STORE-002";
pub const CCT_STORE_003_CORRUPT: &str = "CCT-STORE-003";
pub const CCT_STORE_004_FOREIGN_KEY: &str = "CCT-STORE-004";

pub const CCT_CFG_001_MISSING: &str = "CCT-CFG-001";
pub const CCT_CFG_002_INVALID: &str = "CCT-CFG-002";

pub const CCT_LOCK_001_CONTENDED: &str = "CCT-LOCK-001";

/// Errors that can terminate the collector outright.
///
/// Everything else (transient-io, transient-store, config, viewer user-errors)
/// is handled in place and logged; only [`FatalError::Store`] escapes to end the
/// process, per §7's propagation rule.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("[{code}] database schema mismatch or corruption: {message}", code = CCT_STORE_002_SCHEMA_MISMATCH)]
    SchemaMismatch { message: String },

    #[error("[{code}] database corrupt: {message}", code = CCT_STORE_003_CORRUPT)]
    Corrupt { message: String },

    #[error("[{code}] foreign key violation, schema is corrupted: {message}", code = CCT_STORE_004_FOREIGN_KEY)]
    ForeignKeyViolation { message: String },
}

/// Contention error: another collector is already live for this working directory.
#[derive(Debug, Error)]
#[error("[{code}] collector already running with pid {pid}", code = CCT_LOCK_001_CONTENDED)]
pub struct ContentionError {
    pub pid: u32,
}
