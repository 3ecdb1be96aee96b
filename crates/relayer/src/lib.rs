//! Commitment Relayer - carries ephemeral snapshots back to the base layer
//!
//! Packages executor-side state into signed commitment proofs and submits
//! them to the reconciliation engine. The relayer runs asynchronously
//! relative to both layers; submissions may be retried freely because the
//! engine applies stale proofs as successful no-ops.

pub mod confirmation;

pub use confirmation::{wait_until, ConfirmationError, RetryPolicy};

use base_ledger::{BaseLedger, CommitOutcome};
use delegation_protocol::{AccountStatus, CommitmentProof, LedgerError};
use ephemeral_executor::EphemeralExecutor;
use solana_sdk::{pubkey::Pubkey, signature::Keypair, signer::Signer};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Submission mode for a commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// Periodic checkpoint; the account stays delegated.
    Checkpoint,
    /// Final commitment of the undelegate flow.
    Final,
}

/// Signs and submits commitment proofs for one ephemeral validator.
pub struct CommitmentRelayer {
    /// Validator keypair for signing commitments
    validator_keypair: Arc<Keypair>,
    /// Checkpoint interval in base-layer slots
    commit_interval_slots: u64,
    /// Last slot a checkpoint pass ran at
    last_commit_slot: RwLock<u64>,
}

impl CommitmentRelayer {
    /// Create a relayer signing with the given validator keypair
    pub fn new(validator_keypair: Keypair) -> Self {
        Self {
            validator_keypair: Arc::new(validator_keypair),
            commit_interval_slots: 100,
            last_commit_slot: RwLock::new(0),
        }
    }

    /// Set the checkpoint interval
    pub fn with_commit_interval(mut self, slots: u64) -> Self {
        self.commit_interval_slots = slots;
        self
    }

    /// Get validator public key
    pub fn validator_pubkey(&self) -> Pubkey {
        self.validator_keypair.pubkey()
    }

    /// Read the executor's current state for an account and sign a proof
    /// binding it.
    pub fn snapshot(
        &self,
        executor: &EphemeralExecutor,
        account_id: &Pubkey,
    ) -> Result<CommitmentProof, LedgerError> {
        let state = executor.mirror_state(account_id)?;
        Ok(CommitmentProof::sign(
            *account_id,
            state.sequence,
            state.payload,
            &self.validator_keypair,
        ))
    }

    /// Submit a proof to the reconciliation engine.
    ///
    /// Applying the proof never changes delegation status; a `Final`
    /// submission merely precedes the caller's finalize step.
    pub async fn submit(
        &self,
        base: &BaseLedger,
        proof: &CommitmentProof,
        mode: CommitMode,
    ) -> Result<CommitOutcome, LedgerError> {
        let outcome = base.apply_commitment(proof)?;

        if mode == CommitMode::Final {
            if let Some(account) = base.account(&proof.account_id) {
                if account.status != AccountStatus::Undelegating {
                    tracing::warn!(
                        "final commitment for {} while status is {:?}",
                        proof.account_id,
                        account.status
                    );
                }
            }
        }

        tracing::debug!(
            "submitted {:?} commitment for {} at sequence {}",
            mode,
            proof.account_id,
            proof.claimed_sequence
        );
        Ok(outcome)
    }

    /// Check if a checkpoint pass is due at the current slot
    pub async fn should_commit(&self, current_slot: u64) -> bool {
        let last_slot = *self.last_commit_slot.read().await;
        current_slot.saturating_sub(last_slot) >= self.commit_interval_slots
    }

    /// Snapshot and submit a checkpoint for every mirrored account.
    ///
    /// Returns the number of accounts committed.
    pub async fn checkpoint_all(
        &self,
        base: &BaseLedger,
        executor: &EphemeralExecutor,
        current_slot: u64,
    ) -> Result<usize, LedgerError> {
        let mut committed = 0;
        for account_id in executor.mirrored_accounts() {
            let proof = self.snapshot(executor, &account_id)?;
            self.submit(base, &proof, CommitMode::Checkpoint).await?;
            committed += 1;
        }

        *self.last_commit_slot.write().await = current_slot;
        Ok(committed)
    }

    /// Get last checkpoint slot
    pub async fn last_commit_slot(&self) -> u64 {
        *self.last_commit_slot.read().await
    }
}
