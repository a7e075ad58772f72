//! Error types for MeterPay settlement.
//!
//! All errors use the `MP_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Contract errors
//! - 2xx: Claim errors
//! - 3xx: Balance errors
//! - 4xx: Settlement errors
//! - 5xx: Cache errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{AccountId, Amount, ContractId};

/// Central error enum for all MeterPay operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeterpayError {
    // =================================================================
    // Contract Errors (1xx)
    // =================================================================
    /// The claim references a contract the store does not know.
    #[error("MP_ERR_100: Contract not found: {0}")]
    ContractNotFound(ContractId),

    /// The contract's settlement window has elapsed, or it was closed explicitly.
    #[error("MP_ERR_101: Contract {id} is closed at height {height}")]
    ContractClosed { id: ContractId, height: i64 },

    /// The contract record is structurally invalid.
    #[error("MP_ERR_102: Invalid contract: {reason}")]
    InvalidContract { reason: String },

    // =================================================================
    // Claim Errors (2xx)
    // =================================================================
    /// The claim signature did not verify against the client key.
    #[error("MP_ERR_200: Claim signature verification failed for contract {0}")]
    InvalidSignature(ContractId),

    // =================================================================
    // Balance Errors (3xx)
    // =================================================================
    /// A transfer source had less than the requested amount.
    #[error("MP_ERR_300: Insufficient funds in {account}: need {needed}, have {available}")]
    InsufficientFunds {
        account: AccountId,
        needed: Amount,
        available: Amount,
    },

    /// The escrow pool cannot cover a capped entitlement. Deposit
    /// accounting has drifted: this is a consistency bug, never a user error.
    #[error("MP_ERR_301: Insufficient pooled funds: need {needed}, have {available}")]
    InsufficientPooledFunds { needed: Amount, available: Amount },

    /// A credit would overflow the destination balance.
    #[error("MP_ERR_302: Balance overflow in {0}")]
    BalanceOverflow(AccountId),

    // =================================================================
    // Settlement Errors (4xx)
    // =================================================================
    /// Per-contract conservation no longer holds.
    #[error("MP_ERR_400: Conservation violation: {reason}")]
    ConservationViolation { reason: String },

    // =================================================================
    // Cache Errors (5xx)
    // =================================================================
    /// Remote lookup for a cache miss failed.
    #[error("MP_ERR_500: Contract fetch failed for {key}: {reason}")]
    FetchFailed { key: String, reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("MP_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("MP_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, out-of-range values, etc.).
    #[error("MP_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl MeterpayError {
    /// Deterministic claim rejections. Every replica must reject the same
    /// claim with the same variant, and nothing is mutated.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::ContractNotFound(_) | Self::ContractClosed { .. } | Self::InvalidSignature(_)
        )
    }

    /// Consistency bugs that should halt the state machine rather than be
    /// reported back to a submitter.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InsufficientPooledFunds { .. }
                | Self::ConservationViolation { .. }
                | Self::Internal(_)
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, MeterpayError>;

impl From<serde_json::Error> for MeterpayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
