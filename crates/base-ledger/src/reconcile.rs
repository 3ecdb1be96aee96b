//! Reconciliation Engine - applies commitment proofs to the base ledger
//!
//! Proof application is idempotent: a proof whose claimed sequence does not
//! exceed the reconciled sequence is a successful no-op, so relayer retries
//! and reordered deliveries are safe. A proof claiming a higher sequence
//! adopts the snapshot wholesale; the relayer is trusted to deliver the
//! latest snapshot rather than every intermediate one.

use delegation_protocol::{CommitmentProof, LedgerError};

use crate::BaseLedger;

/// Result of applying a commitment proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The snapshot advanced the account to the claimed sequence.
    Applied { payload: u64, sequence: u64 },
    /// The proof was stale or a duplicate; account state unchanged.
    AlreadyApplied,
}

impl BaseLedger {
    /// Validate and apply a commitment proof.
    ///
    /// Never changes the account's delegation status; status transitions
    /// belong to the delegation authority.
    pub fn apply_commitment(
        &self,
        proof: &CommitmentProof,
    ) -> Result<CommitOutcome, LedgerError> {
        let mut account = self
            .account(&proof.account_id)
            .ok_or(LedgerError::AccountNotFound)?;

        // Stale or duplicate snapshot: succeed without mutation. This check
        // runs before any authenticity check so that blind resubmission of
        // an old proof stays harmless even after undelegation completed.
        if proof.claimed_sequence <= account.sequence {
            tracing::debug!(
                "stale commitment for {} (claimed {}, reconciled {})",
                proof.account_id,
                proof.claimed_sequence,
                account.sequence
            );
            return Ok(CommitOutcome::AlreadyApplied);
        }

        // A proof that would advance state must come from the validator the
        // account is delegated to.
        let record = self
            .delegation_record(&proof.account_id)
            .ok_or(LedgerError::InvalidProof)?;
        proof.verify(&record.validator_id)?;

        account.payload = proof.new_payload;
        account.sequence = proof.claimed_sequence;
        self.store().store_account(account, self.current_slot());

        tracing::debug!(
            "reconciled {} to sequence {}",
            proof.account_id,
            proof.claimed_sequence
        );
        Ok(CommitOutcome::Applied {
            payload: proof.new_payload,
            sequence: proof.claimed_sequence,
        })
    }
}
