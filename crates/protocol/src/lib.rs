//! Shared data model for the two-layer delegated account ledger
//!
//! This crate defines the types both layers agree on:
//! - Account records and delegation bookkeeping
//! - Commitment proofs carrying ephemeral state back to the base layer
//! - The deterministic operation set applied on either layer
//! - The error taxonomy

pub mod account;
pub mod error;
pub mod operation;
pub mod proof;

pub use account::{AccountRecord, AccountStatus, DelegationRecord, LedgerAccount, OwnerAuthority};
pub use error::{ErrorClass, LedgerError};
pub use operation::{apply_operation, Operation};
pub use proof::CommitmentProof;
