//! Account data model
//!
//! Canonical base-layer account state and delegation bookkeeping.
//! The persisted record is a fixed-size binary layout; the in-memory
//! account additionally tracks the client authority and lifecycle status.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::error::LedgerError;

/// Delegation lifecycle state of an account. Exactly one holds at any
/// instant; transitions are owned by the delegation authority.
#[derive(
    BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq,
)]
pub enum AccountStatus {
    /// Base layer mutates the account directly.
    Undelegated,
    /// Write authority is held by the ephemeral validator.
    Delegated,
    /// Undelegation started; waiting for the final commitment to reconcile.
    Undelegating,
}

/// Logical program owning the account record.
#[derive(
    BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq,
)]
pub enum OwnerAuthority {
    /// Owned by the application program; mutated on the base layer.
    BaseProgram,
    /// Handed to the delegation program while ephemeral control lasts.
    DelegationProgram,
}

impl OwnerAuthority {
    /// Tag byte used in the persisted record.
    pub const fn tag(&self) -> u8 {
        match self {
            OwnerAuthority::BaseProgram => 0,
            OwnerAuthority::DelegationProgram => 1,
        }
    }

    /// Parse a record tag byte.
    pub fn from_tag(tag: u8) -> Result<Self, LedgerError> {
        match tag {
            0 => Ok(OwnerAuthority::BaseProgram),
            1 => Ok(OwnerAuthority::DelegationProgram),
            _ => Err(LedgerError::InvalidRecordData),
        }
    }
}

/// Canonical base-layer view of a tracked account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerAccount {
    /// Account address
    pub id: Pubkey,
    /// Client authority allowed to update, delegate, and close the account
    pub authority: Pubkey,
    /// Logical program owner
    pub owner_authority: OwnerAuthority,
    /// Opaque application payload
    pub payload: u64,
    /// Monotonic mutation counter, bumped on every accepted mutation
    /// regardless of layer
    pub sequence: u64,
    /// Delegation lifecycle state
    pub status: AccountStatus,
}

impl LedgerAccount {
    /// Create a fresh account at sequence 0.
    pub fn new(id: Pubkey, authority: Pubkey) -> Self {
        Self {
            id,
            authority,
            owner_authority: OwnerAuthority::BaseProgram,
            payload: 0,
            sequence: 0,
            status: AccountStatus::Undelegated,
        }
    }

    /// Persisted form of this account.
    pub fn record(&self) -> AccountRecord {
        AccountRecord {
            owner_authority: self.owner_authority,
            payload: self.payload,
            sequence: self.sequence,
        }
    }
}

/// Fixed-size persisted account record:
/// `{discriminator, owner_authority_tag, payload, sequence}`.
///
/// Status is not persisted; it is implied by the owner tag together with the
/// presence of a delegation record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountRecord {
    /// Logical program owner
    pub owner_authority: OwnerAuthority,
    /// Application payload
    pub payload: u64,
    /// Mutation counter
    pub sequence: u64,
}

impl AccountRecord {
    /// 8-byte record discriminator
    pub const DISCRIMINATOR: [u8; 8] = *b"dlgacct\0";

    /// Serialized size: discriminator + owner tag + payload + sequence
    pub const LEN: usize = 8 + 1 + 8 + 8;

    /// Encode to the fixed little-endian layout.
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut data = [0u8; Self::LEN];
        data[..8].copy_from_slice(&Self::DISCRIMINATOR);
        data[8] = self.owner_authority.tag();
        data[9..17].copy_from_slice(&self.payload.to_le_bytes());
        data[17..25].copy_from_slice(&self.sequence.to_le_bytes());
        data
    }

    /// Decode from the fixed layout; rejects wrong sizes and discriminators.
    pub fn try_from_bytes(data: &[u8]) -> Result<Self, LedgerError> {
        if data.len() != Self::LEN {
            return Err(LedgerError::InvalidRecordData);
        }
        if data[..8] != Self::DISCRIMINATOR {
            return Err(LedgerError::InvalidRecordData);
        }
        let owner_authority = OwnerAuthority::from_tag(data[8])?;

        let mut buf = [0u8; 8];
        buf.copy_from_slice(&data[9..17]);
        let payload = u64::from_le_bytes(buf);
        buf.copy_from_slice(&data[17..25]);
        let sequence = u64::from_le_bytes(buf);

        Ok(Self {
            owner_authority,
            payload,
            sequence,
        })
    }
}

/// Base-layer record of an active delegation.
///
/// Created when `delegate` succeeds, destroyed when undelegation finalizes.
/// The delegation authority owns it; the reconciliation engine reads it to
/// resolve the validator identity a proof must be signed by.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct DelegationRecord {
    /// Delegated account
    pub account_id: Pubkey,
    /// Validator operating the ephemeral layer
    pub validator_id: Pubkey,
    /// Base-layer slot at which the delegation was created
    pub delegated_at_slot: u64,
    /// Executor sequence pinned at begin-undelegate; finalization requires
    /// the reconciled sequence to reach it
    pub final_sequence: Option<u64>,
}
