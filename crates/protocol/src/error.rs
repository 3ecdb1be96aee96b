//! Ledger protocol errors

use thiserror::Error;

/// Broad failure classes for callers deciding how to react.
///
/// Ordering conflicts never surface as errors: a stale commitment is applied
/// as a successful no-op by the reconciliation engine. Transient network
/// failures are a caller-side concern and have no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Wrong signer or malformed input; rejected synchronously, never retried.
    Validation,
    /// Operation attempted in the wrong lifecycle state; inspect the current
    /// status before resubmitting.
    State,
    /// Commitment proof failed authenticity checks; fatal, surfaced to caller.
    Proof,
}

/// Ledger protocol errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerError {
    #[error("account not found")]
    AccountNotFound,

    #[error("account already exists")]
    AccountAlreadyExists,

    #[error("account is already delegated")]
    AlreadyDelegated,

    #[error("account is not delegated")]
    NotDelegated,

    #[error("requester is not the account authority")]
    Unauthorized,

    #[error("final commitment not yet reconciled")]
    CommitPending,

    #[error("delegation is closing, no further ephemeral updates accepted")]
    DelegationClosing,

    #[error("invalid commitment proof")]
    InvalidProof,

    #[error("account is not mirrored on the ephemeral layer")]
    NotMirrored,

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("malformed account record")]
    InvalidRecordData,
}

impl LedgerError {
    /// Failure class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            LedgerError::Unauthorized
            | LedgerError::ArithmeticOverflow
            | LedgerError::InvalidRecordData => ErrorClass::Validation,
            LedgerError::InvalidProof => ErrorClass::Proof,
            LedgerError::AccountNotFound
            | LedgerError::AccountAlreadyExists
            | LedgerError::AlreadyDelegated
            | LedgerError::NotDelegated
            | LedgerError::CommitPending
            | LedgerError::DelegationClosing
            | LedgerError::NotMirrored => ErrorClass::State,
        }
    }
}
