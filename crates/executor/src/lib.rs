//! Ephemeral Executor - low-latency mirror of delegated accounts
//!
//! Mirrors delegated accounts and applies operations against the mirror,
//! advancing a per-account sequence counter. Operations on one account are
//! applied strictly in arrival order (single active mutator per account);
//! operations on distinct accounts run concurrently. The executor never
//! contacts the base layer: the commitment relayer reads mirror state and
//! carries it back.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use delegation_protocol::{apply_operation, LedgerError, Operation};
use parking_lot::Mutex;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

/// Executor-side `{payload, sequence}` for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorState {
    pub payload: u64,
    pub sequence: u64,
}

/// Mirror of one delegated account.
#[derive(Debug)]
struct AccountMirror {
    payload: u64,
    sequence: u64,
    /// Set when undelegation begins; further applies are refused.
    closing: bool,
}

/// Rollup-layer execution context.
///
/// One mutex per account enforces the single-writer rule; the surrounding
/// map allows concurrent access across accounts.
#[derive(Clone)]
pub struct EphemeralExecutor {
    mirrors: Arc<DashMap<Pubkey, Mutex<AccountMirror>>>,
}

impl EphemeralExecutor {
    /// Create an executor with no mirrored accounts
    pub fn new() -> Self {
        Self {
            mirrors: Arc::new(DashMap::new()),
        }
    }

    /// Start mirroring a delegated account from its base-layer state.
    pub fn mirror_account(
        &self,
        account_id: Pubkey,
        payload: u64,
        sequence: u64,
    ) -> Result<(), LedgerError> {
        match self.mirrors.entry(account_id) {
            Entry::Occupied(_) => Err(LedgerError::AlreadyDelegated),
            Entry::Vacant(entry) => {
                entry.insert(Mutex::new(AccountMirror {
                    payload,
                    sequence,
                    closing: false,
                }));
                tracing::debug!("mirroring account {} at sequence {}", account_id, sequence);
                Ok(())
            }
        }
    }

    /// Apply an operation to a mirrored account.
    ///
    /// Advances the sequence by exactly one per accepted mutation; a failed
    /// transition leaves both payload and sequence untouched.
    pub fn apply(
        &self,
        account_id: &Pubkey,
        op: &Operation,
    ) -> Result<MirrorState, LedgerError> {
        let entry = self
            .mirrors
            .get(account_id)
            .ok_or(LedgerError::NotMirrored)?;
        let mut mirror = entry.lock();

        if mirror.closing {
            return Err(LedgerError::DelegationClosing);
        }

        mirror.payload = apply_operation(mirror.payload, mirror.sequence, op)?;
        mirror.sequence += 1;
        Ok(MirrorState {
            payload: mirror.payload,
            sequence: mirror.sequence,
        })
    }

    /// Current mirror state, as read by the commitment relayer.
    pub fn mirror_state(&self, account_id: &Pubkey) -> Result<MirrorState, LedgerError> {
        let entry = self
            .mirrors
            .get(account_id)
            .ok_or(LedgerError::NotMirrored)?;
        let mirror = entry.lock();
        Ok(MirrorState {
            payload: mirror.payload,
            sequence: mirror.sequence,
        })
    }

    /// Stop accepting operations for an account and report its final
    /// sequence, which the delegation authority pins for finalization.
    pub fn begin_close(&self, account_id: &Pubkey) -> Result<u64, LedgerError> {
        let entry = self
            .mirrors
            .get(account_id)
            .ok_or(LedgerError::NotMirrored)?;
        let mut mirror = entry.lock();

        if mirror.closing {
            return Err(LedgerError::DelegationClosing);
        }
        mirror.closing = true;
        tracing::debug!(
            "account {} closing at sequence {}",
            account_id,
            mirror.sequence
        );
        Ok(mirror.sequence)
    }

    /// Drop the mirror once undelegation finalizes.
    pub fn drop_mirror(&self, account_id: &Pubkey) {
        if self.mirrors.remove(account_id).is_some() {
            tracing::debug!("dropped mirror for {}", account_id);
        }
    }

    /// All currently mirrored accounts, closing ones included
    pub fn mirrored_accounts(&self) -> Vec<Pubkey> {
        self.mirrors.iter().map(|r| *r.key()).collect()
    }

    /// Number of mirrored accounts
    pub fn len(&self) -> usize {
        self.mirrors.len()
    }

    /// Check if nothing is mirrored
    pub fn is_empty(&self) -> bool {
        self.mirrors.is_empty()
    }
}

impl Default for EphemeralExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_advances_mirror() {
        let executor = EphemeralExecutor::new();
        let account_id = Pubkey::new_unique();
        executor.mirror_account(account_id, 42, 1).unwrap();

        let state = executor.apply(&account_id, &Operation::Increment).unwrap();
        assert_eq!(state.payload, 43);
        assert_eq!(state.sequence, 2);
    }

    #[test]
    fn test_apply_requires_mirror() {
        let executor = EphemeralExecutor::new();
        assert_eq!(
            executor.apply(&Pubkey::new_unique(), &Operation::Increment),
            Err(LedgerError::NotMirrored)
        );
    }

    #[test]
    fn test_mirror_twice_fails() {
        let executor = EphemeralExecutor::new();
        let account_id = Pubkey::new_unique();
        executor.mirror_account(account_id, 0, 0).unwrap();
        assert_eq!(
            executor.mirror_account(account_id, 0, 0),
            Err(LedgerError::AlreadyDelegated)
        );
    }

    #[test]
    fn test_closing_refuses_applies() {
        let executor = EphemeralExecutor::new();
        let account_id = Pubkey::new_unique();
        executor.mirror_account(account_id, 10, 5).unwrap();

        let final_sequence = executor.begin_close(&account_id).unwrap();
        assert_eq!(final_sequence, 5);

        assert_eq!(
            executor.apply(&account_id, &Operation::Increment),
            Err(LedgerError::DelegationClosing)
        );

        // Snapshot reads stay available for the relayer.
        let state = executor.mirror_state(&account_id).unwrap();
        assert_eq!((state.payload, state.sequence), (10, 5));
    }

    #[test]
    fn test_failed_operation_does_not_advance_sequence() {
        let executor = EphemeralExecutor::new();
        let account_id = Pubkey::new_unique();
        executor.mirror_account(account_id, 0, 0).unwrap();

        assert_eq!(
            executor.apply(&account_id, &Operation::Decrement),
            Err(LedgerError::ArithmeticOverflow)
        );
        assert_eq!(executor.mirror_state(&account_id).unwrap().sequence, 0);
    }

    #[test]
    fn test_same_account_applies_are_serialized() {
        let executor = Arc::new(EphemeralExecutor::new());
        let account_id = Pubkey::new_unique();
        executor.mirror_account(account_id, 0, 0).unwrap();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let executor = executor.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..250 {
                    executor.apply(&account_id, &Operation::Increment).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let state = executor.mirror_state(&account_id).unwrap();
        assert_eq!(state.payload, 1000);
        assert_eq!(state.sequence, 1000);
    }

    #[test]
    fn test_distinct_accounts_apply_concurrently() {
        let executor = Arc::new(EphemeralExecutor::new());
        let accounts: Vec<Pubkey> = (0..8).map(|_| Pubkey::new_unique()).collect();
        for id in &accounts {
            executor.mirror_account(*id, 0, 0).unwrap();
        }

        let mut handles = Vec::new();
        for id in accounts.clone() {
            let executor = executor.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    executor.apply(&id, &Operation::Increment).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        for id in &accounts {
            assert_eq!(executor.mirror_state(id).unwrap().sequence, 100);
        }
    }
}
