//! Error types for the check substrate.
//!
//! Two payload-carrying records describe what a check observed:
//! - [`ConsistencyViolation`] - the system under test is inconsistent (terminal)
//! - [`StaleSnapshotError`] - the chosen read timestamp is below the floor (retry)
//!
//! Everything a plugin round can fail with is folded into [`CheckError`],
//! which is also what the scheduler hands back to its caller.

use crate::core::time::Timestamp;
use thiserror::Error;

/// One account observed by a consistency check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountBalance {
    /// Account identifier.
    pub id: String,
    /// Balance read at the check's timestamp.
    pub balance: i64,
}

impl AccountBalance {
    pub fn new(id: impl Into<String>, balance: i64) -> Self {
        Self {
            id: id.into(),
            balance,
        }
    }
}

/// A failed invariant check.
///
/// The rendered message is the diagnostic payload operators rely on: every
/// account and balance, then a summary line with the read timestamp, the
/// expected sum and the actual sum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyViolation {
    /// Timestamp the accounts were read at.
    pub ts: Timestamp,
    /// Accounts in the order they were read.
    pub accounts: Vec<AccountBalance>,
    /// Sum of the observed balances.
    pub sum: i64,
    /// Sum the check expected.
    pub expect: i64,
}

impl ConsistencyViolation {
    /// Build a violation, computing `sum` from the accounts.
    pub fn from_accounts(ts: Timestamp, accounts: Vec<AccountBalance>, expect: i64) -> Self {
        let sum = accounts.iter().map(|a| a.balance).sum();
        Self {
            ts,
            accounts,
            sum,
            expect,
        }
    }
}

impl std::fmt::Display for ConsistencyViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Inconsistency Detected!")?;
        for account in &self.accounts {
            writeln!(f, "{}: {}", account.id, account.balance)?;
        }
        write!(
            f,
            "Read with ts: {}, expect: {}, actual: {}",
            self.ts, self.expect, self.sum
        )
    }
}

impl std::error::Error for ConsistencyViolation {}

/// A read timestamp that fell at or below the snapshot lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Snapshot too old: {ts}")]
pub struct StaleSnapshotError {
    /// The rejected timestamp.
    pub ts: Timestamp,
}

/// Failures talking to a timestamp oracle.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Request could not be sent or the body could not be read.
    #[error("oracle transport failure ({url}): {message}")]
    Transport { url: String, message: String },

    /// Authority answered with a non-success status.
    #[error("oracle returned status {status} ({url})")]
    Status { url: String, status: u16 },

    /// Body was not a decimal timestamp.
    #[error("oracle response is not a timestamp ({url}): {body:?}: {reason}")]
    Decode {
        url: String,
        body: String,
        reason: String,
    },

    /// The physical component no longer fits the encoding.
    #[error("timestamp space exhausted at physical {physical_ms}ms")]
    Exhausted { physical_ms: u64 },
}

impl OracleError {
    /// Whether retrying against the same oracle may succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Status { .. })
    }
}

/// Result type using OracleError.
pub type OracleResult<T> = Result<T, OracleError>;

/// Everything a check round can end with.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The system under test is inconsistent.
    #[error(transparent)]
    Violation(#[from] ConsistencyViolation),

    /// The read timestamp was below the floor; pick a fresher one.
    #[error(transparent)]
    StaleSnapshot(#[from] StaleSnapshotError),

    /// An oracle handed out a timestamp that did not advance.
    #[error("non-monotonic timestamp: previous {previous}, observed {observed}")]
    NonMonotonic {
        previous: Timestamp,
        observed: Timestamp,
    },

    /// The timestamp oracle failed.
    #[error("timestamp oracle: {0}")]
    Oracle(#[from] OracleError),

    /// A round was recorded against a key nobody registered.
    #[error("metrics key not registered: {key}")]
    UnregisteredMetric { key: String },

    /// An external collaborator (database, network) failed.
    #[error("collaborator failure: {message}")]
    Collaborator { message: String },

    /// The run was cancelled.
    #[error("cancelled")]
    Cancelled,

    /// Internal error.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl CheckError {
    /// Create a Collaborator error.
    pub fn collaborator(message: impl Into<String>) -> Self {
        Self::Collaborator {
            message: message.into(),
        }
    }

    /// Create an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this error is the cancellation outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if the round that produced this error may be retried.
    ///
    /// The scheduler never retries; plugins that want to absorb a retriable
    /// condition do so before returning.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::StaleSnapshot(_) => true,
            Self::Oracle(err) => err.is_retriable(),
            _ => false,
        }
    }

    /// Check if this error reports an actual inconsistency.
    pub fn is_violation(&self) -> bool {
        matches!(self, Self::Violation(_) | Self::NonMonotonic { .. })
    }
}

/// Result type using CheckError.
pub type CheckResult<T> = Result<T, CheckError>;
