//! Base Ledger - canonical account state and delegation lifecycle
//!
//! This crate provides the base-layer side of the two-layer protocol:
//! - In-memory account storage
//! - Direct mutation of undelegated accounts
//! - The delegation authority (status transitions)
//! - The reconciliation engine (commitment proof application)

pub mod delegation;
pub mod reconcile;
pub mod store;

pub use reconcile::CommitOutcome;
pub use store::AccountStore;

use dashmap::DashMap;
use delegation_protocol::{
    apply_operation, AccountRecord, AccountStatus, DelegationRecord, LedgerAccount, LedgerError,
    Operation,
};
use solana_sdk::pubkey::Pubkey;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Base-layer execution context.
///
/// Every core operation takes this context explicitly; there is no ambient
/// global ledger. Operations model transactions serialized by the base
/// ledger's single-writer-per-slot ordering: one logical transaction in
/// flight per account at a time, enforced by the ledger rather than by
/// internal locking.
#[derive(Clone)]
pub struct BaseLedger {
    /// Canonical account records
    store: Arc<AccountStore>,
    /// Active delegations, keyed by account
    delegations: Arc<DashMap<Pubkey, DelegationRecord>>,
    /// Current base-layer slot
    slot: Arc<AtomicU64>,
}

impl BaseLedger {
    /// Create an empty base ledger at slot 0
    pub fn new() -> Self {
        Self {
            store: Arc::new(AccountStore::new()),
            delegations: Arc::new(DashMap::new()),
            slot: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a tracked account at sequence 0, undelegated.
    pub fn initialize(
        &self,
        account_id: Pubkey,
        authority: Pubkey,
    ) -> Result<LedgerAccount, LedgerError> {
        if self.store.account_exists(&account_id) {
            return Err(LedgerError::AccountAlreadyExists);
        }

        let account = LedgerAccount::new(account_id, authority);
        self.store.store_account(account.clone(), self.current_slot());
        tracing::debug!("initialized account {}", account_id);
        Ok(account)
    }

    /// Mutate an undelegated account directly on the base layer.
    ///
    /// Fails if the account is delegated; callers route those operations to
    /// the ephemeral executor instead.
    pub fn apply_local(
        &self,
        account_id: &Pubkey,
        requester: &Pubkey,
        op: &Operation,
    ) -> Result<LedgerAccount, LedgerError> {
        let mut account = self
            .store
            .get_account(account_id)
            .ok_or(LedgerError::AccountNotFound)?;

        if account.authority != *requester {
            return Err(LedgerError::Unauthorized);
        }
        match account.status {
            AccountStatus::Undelegated => {}
            AccountStatus::Delegated => return Err(LedgerError::AlreadyDelegated),
            AccountStatus::Undelegating => return Err(LedgerError::DelegationClosing),
        }

        account.payload = apply_operation(account.payload, account.sequence, op)?;
        account.sequence += 1;
        self.store.store_account(account.clone(), self.current_slot());
        Ok(account)
    }

    /// Remove an account; only permitted while undelegated.
    pub fn close(&self, account_id: &Pubkey, requester: &Pubkey) -> Result<(), LedgerError> {
        let account = self
            .store
            .get_account(account_id)
            .ok_or(LedgerError::AccountNotFound)?;

        if account.authority != *requester {
            return Err(LedgerError::Unauthorized);
        }
        if account.status != AccountStatus::Undelegated {
            return Err(LedgerError::AlreadyDelegated);
        }

        self.store.remove_account(account_id);
        tracing::debug!("closed account {}", account_id);
        Ok(())
    }

    /// Get an account by id
    pub fn account(&self, account_id: &Pubkey) -> Option<LedgerAccount> {
        self.store.get_account(account_id)
    }

    /// Get the delegation record for an account, if delegated
    pub fn delegation_record(&self, account_id: &Pubkey) -> Option<DelegationRecord> {
        self.delegations.get(account_id).map(|r| r.value().clone())
    }

    /// Persisted binary form of an account record
    pub fn account_record_bytes(
        &self,
        account_id: &Pubkey,
    ) -> Option<[u8; AccountRecord::LEN]> {
        self.store
            .get_account(account_id)
            .map(|a| a.record().to_bytes())
    }

    /// Reference to the underlying account store
    pub fn store(&self) -> &AccountStore {
        &self.store
    }

    /// Advance to the next slot and return it
    pub fn advance_slot(&self) -> u64 {
        self.slot.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Current base-layer slot
    pub fn current_slot(&self) -> u64 {
        self.slot.load(Ordering::SeqCst)
    }

    pub(crate) fn insert_delegation(&self, record: DelegationRecord) {
        self.delegations.insert(record.account_id, record);
    }

    pub(crate) fn with_delegation_mut<T>(
        &self,
        account_id: &Pubkey,
        f: impl FnOnce(&mut DelegationRecord) -> T,
    ) -> Option<T> {
        self.delegations.get_mut(account_id).map(|mut r| f(&mut r))
    }

    pub(crate) fn remove_delegation(&self, account_id: &Pubkey) -> Option<DelegationRecord> {
        self.delegations.remove(account_id).map(|(_, v)| v)
    }
}

impl Default for BaseLedger {
    fn default() -> Self {
        Self::new()
    }
}
