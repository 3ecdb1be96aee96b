//! Delegation Node
//!
//! Client-facing surface of the two-layer protocol. A node wires the
//! base-layer context, the rollup context, and the commitment relayer
//! together, routes client operations to whichever layer currently owns
//! write authority, and drives the delegate/commit/undelegate lifecycle.

pub mod config;

#[cfg(test)]
mod tests;

pub use config::NodeConfig;

use base_ledger::{BaseLedger, CommitOutcome};
use commitment_relayer::{CommitMode, CommitmentRelayer};
use delegation_protocol::{
    AccountStatus, CommitmentProof, LedgerAccount, LedgerError, Operation,
};
use ephemeral_executor::EphemeralExecutor;
use solana_sdk::{pubkey::Pubkey, signature::Keypair};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

/// One node hosting both layer contexts and the relayer between them.
pub struct DelegationNode {
    base: BaseLedger,
    executor: EphemeralExecutor,
    relayer: Arc<CommitmentRelayer>,
    config: NodeConfig,
    /// Checkpoint loop running flag
    running: Arc<AtomicBool>,
}

impl DelegationNode {
    /// Create a node whose relayer signs with the given validator keypair
    pub fn new(validator_keypair: Keypair, config: NodeConfig) -> Self {
        let relayer = Arc::new(
            CommitmentRelayer::new(validator_keypair)
                .with_commit_interval(config.checkpoint_interval_slots),
        );
        Self {
            base: BaseLedger::new(),
            executor: EphemeralExecutor::new(),
            relayer,
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Base-layer context
    pub fn base(&self) -> &BaseLedger {
        &self.base
    }

    /// Rollup context
    pub fn executor(&self) -> &EphemeralExecutor {
        &self.executor
    }

    /// Commitment relayer
    pub fn relayer(&self) -> &CommitmentRelayer {
        &self.relayer
    }

    /// Validator identity this node's relayer signs with
    pub fn validator_pubkey(&self) -> Pubkey {
        self.relayer.validator_pubkey()
    }

    /// Create a tracked account at sequence 0, undelegated.
    pub fn initialize(
        &self,
        account_id: Pubkey,
        authority: Pubkey,
    ) -> Result<LedgerAccount, LedgerError> {
        self.base.initialize(account_id, authority)
    }

    /// Mutate an account, routed by its current delegation status.
    ///
    /// Returns the new payload as seen by the layer that applied the
    /// operation: the base store for undelegated accounts, the executor
    /// mirror for delegated ones.
    pub fn update(
        &self,
        account_id: &Pubkey,
        requester: &Pubkey,
        op: &Operation,
    ) -> Result<u64, LedgerError> {
        let account = self
            .base
            .account(account_id)
            .ok_or(LedgerError::AccountNotFound)?;

        match account.status {
            AccountStatus::Undelegated => {
                Ok(self.base.apply_local(account_id, requester, op)?.payload)
            }
            AccountStatus::Delegated => {
                if account.authority != *requester {
                    return Err(LedgerError::Unauthorized);
                }
                Ok(self.executor.apply(account_id, op)?.payload)
            }
            AccountStatus::Undelegating => Err(LedgerError::DelegationClosing),
        }
    }

    /// Delegate an account to a validator and start mirroring it.
    pub fn delegate(
        &self,
        account_id: &Pubkey,
        validator_id: &Pubkey,
        requester: &Pubkey,
    ) -> Result<(), LedgerError> {
        let record = self.base.delegate(account_id, validator_id, requester)?;
        let account = self
            .base
            .account(account_id)
            .ok_or(LedgerError::AccountNotFound)?;
        self.executor
            .mirror_account(record.account_id, account.payload, account.sequence)?;
        Ok(())
    }

    /// Stop ephemeral mutation and pin the executor's final sequence.
    ///
    /// Returns the sequence the final commitment must reach before
    /// `finalize_undelegate` will succeed.
    pub fn begin_undelegate(&self, account_id: &Pubkey) -> Result<u64, LedgerError> {
        let final_sequence = self.executor.begin_close(account_id)?;
        self.base.begin_undelegate(account_id, final_sequence)?;
        Ok(final_sequence)
    }

    /// Finalize undelegation and drop the executor mirror.
    pub fn finalize_undelegate(
        &self,
        account_id: &Pubkey,
    ) -> Result<LedgerAccount, LedgerError> {
        let account = self.base.finalize_undelegate(account_id)?;
        self.executor.drop_mirror(account_id);
        Ok(account)
    }

    /// Submit a commitment proof on a caller's behalf.
    ///
    /// `keep_delegated` selects periodic checkpointing versus the final
    /// commitment of an undelegate flow; either way the proof application
    /// itself is idempotent and safe to resubmit blindly.
    pub async fn submit_commitment(
        &self,
        proof: &CommitmentProof,
        keep_delegated: bool,
    ) -> Result<CommitOutcome, LedgerError> {
        let mode = if keep_delegated {
            CommitMode::Checkpoint
        } else {
            CommitMode::Final
        };
        self.relayer.submit(&self.base, proof, mode).await
    }

    /// Close an undelegated account.
    pub fn close(&self, account_id: &Pubkey, requester: &Pubkey) -> Result<(), LedgerError> {
        self.base.close(account_id, requester)
    }

    /// Check if the checkpoint loop is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the checkpoint loop
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Drive base-layer slots and periodic commit-without-undelegate passes
    /// over every mirrored account.
    pub async fn run_checkpoint_loop(&self) {
        self.running.store(true, Ordering::SeqCst);

        let slot_duration = Duration::from_millis(self.config.slot_time_ms);
        let mut interval = tokio::time::interval(slot_duration);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        tracing::info!(
            "checkpoint loop started ({}ms slots, every {} slots)",
            self.config.slot_time_ms,
            self.config.checkpoint_interval_slots
        );

        while self.running.load(Ordering::SeqCst) {
            interval.tick().await;
            let slot = self.base.advance_slot();

            if self.relayer.should_commit(slot).await {
                match self
                    .relayer
                    .checkpoint_all(&self.base, &self.executor, slot)
                    .await
                {
                    Ok(0) => {}
                    Ok(count) => {
                        tracing::debug!("checkpointed {} accounts at slot {}", count, slot)
                    }
                    Err(e) => tracing::error!("checkpoint pass failed: {}", e),
                }
            }
        }

        tracing::info!(
            "checkpoint loop stopped at slot {}",
            self.base.current_slot()
        );
    }
}
