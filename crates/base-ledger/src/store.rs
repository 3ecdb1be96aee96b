//! In-memory account storage using DashMap for concurrent access

use dashmap::DashMap;
use delegation_protocol::{AccountStatus, LedgerAccount};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

/// Thread-safe in-memory account storage
///
/// Uses DashMap for lock-free concurrent reads and fine-grained write locks.
/// Base-layer transactions are serialized per account by the ledger itself,
/// so no additional locking is layered on top.
#[derive(Clone)]
pub struct AccountStore {
    /// Main account storage
    accounts: Arc<DashMap<Pubkey, LedgerAccount>>,
    /// Track which slot each account was last modified
    account_slots: Arc<DashMap<Pubkey, u64>>,
}

impl AccountStore {
    /// Create a new empty account store
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(DashMap::new()),
            account_slots: Arc::new(DashMap::new()),
        }
    }

    /// Get an account by id
    pub fn get_account(&self, id: &Pubkey) -> Option<LedgerAccount> {
        self.accounts.get(id).map(|r| r.value().clone())
    }

    /// Get an account with the slot it was last modified
    pub fn get_account_with_slot(&self, id: &Pubkey) -> Option<(LedgerAccount, u64)> {
        let account = self.accounts.get(id)?;
        let slot = self.account_slots.get(id).map(|s| *s).unwrap_or(0);
        Some((account.value().clone(), slot))
    }

    /// Store an account
    pub fn store_account(&self, account: LedgerAccount, slot: u64) {
        self.account_slots.insert(account.id, slot);
        self.accounts.insert(account.id, account);
    }

    /// Check if an account exists
    pub fn account_exists(&self, id: &Pubkey) -> bool {
        self.accounts.contains_key(id)
    }

    /// Remove an account
    pub fn remove_account(&self, id: &Pubkey) -> Option<LedgerAccount> {
        self.account_slots.remove(id);
        self.accounts.remove(id).map(|(_, v)| v)
    }

    /// Get account count
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Check if store is empty
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Get all accounts currently in a given lifecycle state
    pub fn accounts_with_status(&self, status: AccountStatus) -> Vec<LedgerAccount> {
        self.accounts
            .iter()
            .filter(|r| r.value().status == status)
            .map(|r| r.value().clone())
            .collect()
    }

    /// Clear all accounts (for testing)
    pub fn clear(&self) {
        self.accounts.clear();
        self.account_slots.clear();
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}
