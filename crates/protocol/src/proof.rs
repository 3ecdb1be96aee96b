//! Commitment proofs
//!
//! A commitment proof is a signed snapshot of an account's ephemeral state,
//! submitted back to the base layer by the relayer. The signature binds
//! `(account_id, payload, sequence)` to the validator the account was
//! delegated to.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
};

use crate::error::LedgerError;

/// Signed snapshot of an account's ephemeral `{payload, sequence}`.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct CommitmentProof {
    /// Account the snapshot belongs to
    pub account_id: Pubkey,
    /// Executor-side sequence at snapshot time
    pub claimed_sequence: u64,
    /// Executor-side payload at snapshot time
    pub new_payload: u64,
    /// Validator signature over the binding hash (64 bytes)
    pub signature: Vec<u8>,
}

impl CommitmentProof {
    /// Build and sign a proof with the validator keypair.
    pub fn sign(
        account_id: Pubkey,
        claimed_sequence: u64,
        new_payload: u64,
        validator: &Keypair,
    ) -> Self {
        let hash = Self::binding_hash(&account_id, claimed_sequence, new_payload);
        let signature = validator.sign_message(&hash).as_ref().to_vec();
        Self {
            account_id,
            claimed_sequence,
            new_payload,
            signature,
        }
    }

    /// Verify the signature against the expected validator identity.
    pub fn verify(&self, validator_id: &Pubkey) -> Result<(), LedgerError> {
        let signature = Signature::try_from(self.signature.as_slice())
            .map_err(|_| LedgerError::InvalidProof)?;
        let hash = Self::binding_hash(&self.account_id, self.claimed_sequence, self.new_payload);
        if signature.verify(validator_id.as_ref(), &hash) {
            Ok(())
        } else {
            Err(LedgerError::InvalidProof)
        }
    }

    /// Compute the hash binding the proof fields (for signing).
    fn binding_hash(account_id: &Pubkey, claimed_sequence: u64, new_payload: u64) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(account_id.as_ref());
        hasher.update(&claimed_sequence.to_le_bytes());
        hasher.update(&new_payload.to_le_bytes());
        *hasher.finalize().as_bytes()
    }

    /// Serialize for network transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).expect("CommitmentProof serialization should not fail")
    }

    /// Deserialize from network
    pub fn from_bytes(data: &[u8]) -> Result<Self, borsh::io::Error> {
        borsh::from_slice(data)
    }
}
