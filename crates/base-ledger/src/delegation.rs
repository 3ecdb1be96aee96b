//! Delegation Authority - grants and revokes ephemeral write authority
//!
//! Status transitions live here and nowhere else. Applying a commitment
//! proof never changes status by itself; the authority consults the
//! reconciled sequence before finalizing an undelegation.

use delegation_protocol::{
    AccountStatus, DelegationRecord, LedgerAccount, LedgerError, OwnerAuthority,
};
use solana_sdk::pubkey::Pubkey;

use crate::BaseLedger;

impl BaseLedger {
    /// Hand write authority over an account to an ephemeral validator.
    ///
    /// Requires the account to be undelegated and the requester to be its
    /// authority. Creates the delegation record and flips the record owner
    /// to the delegation program.
    pub fn delegate(
        &self,
        account_id: &Pubkey,
        validator_id: &Pubkey,
        requester: &Pubkey,
    ) -> Result<DelegationRecord, LedgerError> {
        let mut account = self
            .account(account_id)
            .ok_or(LedgerError::AccountNotFound)?;

        if account.status != AccountStatus::Undelegated {
            return Err(LedgerError::AlreadyDelegated);
        }
        if account.authority != *requester {
            return Err(LedgerError::Unauthorized);
        }

        let record = DelegationRecord {
            account_id: *account_id,
            validator_id: *validator_id,
            delegated_at_slot: self.current_slot(),
            final_sequence: None,
        };

        account.status = AccountStatus::Delegated;
        account.owner_authority = OwnerAuthority::DelegationProgram;
        self.store().store_account(account, self.current_slot());
        self.insert_delegation(record.clone());

        tracing::info!(
            "account {} delegated to validator {}",
            account_id,
            validator_id
        );
        Ok(record)
    }

    /// Start undelegation, pinning the executor's last reported sequence.
    ///
    /// The payload is untouched; the account stops accepting ephemeral
    /// updates and waits for the final commitment to reconcile.
    pub fn begin_undelegate(
        &self,
        account_id: &Pubkey,
        executor_sequence: u64,
    ) -> Result<(), LedgerError> {
        let mut account = self
            .account(account_id)
            .ok_or(LedgerError::AccountNotFound)?;

        if account.status != AccountStatus::Delegated {
            return Err(LedgerError::NotDelegated);
        }
        self.with_delegation_mut(account_id, |record| {
            record.final_sequence = Some(executor_sequence);
        })
        .ok_or(LedgerError::NotDelegated)?;

        account.status = AccountStatus::Undelegating;
        self.store().store_account(account, self.current_slot());

        tracing::info!(
            "account {} undelegating, final sequence {}",
            account_id,
            executor_sequence
        );
        Ok(())
    }

    /// Finalize undelegation once the final commitment has been reconciled.
    ///
    /// Removes the delegation record and returns write authority to the
    /// base layer. Fails with `CommitPending` while the reconciled sequence
    /// trails the pinned final sequence.
    pub fn finalize_undelegate(
        &self,
        account_id: &Pubkey,
    ) -> Result<LedgerAccount, LedgerError> {
        let mut account = self
            .account(account_id)
            .ok_or(LedgerError::AccountNotFound)?;

        if account.status != AccountStatus::Undelegating {
            return Err(LedgerError::NotDelegated);
        }

        let record = self
            .delegation_record(account_id)
            .ok_or(LedgerError::NotDelegated)?;
        let final_sequence = record.final_sequence.ok_or(LedgerError::CommitPending)?;
        if account.sequence < final_sequence {
            return Err(LedgerError::CommitPending);
        }

        self.remove_delegation(account_id);
        account.status = AccountStatus::Undelegated;
        account.owner_authority = OwnerAuthority::BaseProgram;
        self.store().store_account(account.clone(), self.current_slot());

        tracing::info!("account {} undelegated at sequence {}", account_id, account.sequence);
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delegation_protocol::Operation;

    fn setup() -> (BaseLedger, Pubkey, Pubkey, Pubkey) {
        let ledger = BaseLedger::new();
        let account_id = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let validator = Pubkey::new_unique();
        ledger.initialize(account_id, authority).unwrap();
        (ledger, account_id, authority, validator)
    }

    #[test]
    fn test_delegate() {
        let (ledger, account_id, authority, validator) = setup();

        let record = ledger.delegate(&account_id, &validator, &authority).unwrap();
        assert_eq!(record.validator_id, validator);
        assert_eq!(record.final_sequence, None);

        let account = ledger.account(&account_id).unwrap();
        assert_eq!(account.status, AccountStatus::Delegated);
        assert_eq!(account.owner_authority, OwnerAuthority::DelegationProgram);
    }

    #[test]
    fn test_delegate_requires_undelegated() {
        let (ledger, account_id, authority, validator) = setup();

        ledger.delegate(&account_id, &validator, &authority).unwrap();
        assert_eq!(
            ledger.delegate(&account_id, &validator, &authority),
            Err(LedgerError::AlreadyDelegated)
        );
    }

    #[test]
    fn test_delegate_requires_authority() {
        let (ledger, account_id, _, validator) = setup();

        let intruder = Pubkey::new_unique();
        assert_eq!(
            ledger.delegate(&account_id, &validator, &intruder),
            Err(LedgerError::Unauthorized)
        );
    }

    #[test]
    fn test_begin_undelegate_requires_delegated() {
        let (ledger, account_id, _, _) = setup();

        assert_eq!(
            ledger.begin_undelegate(&account_id, 0),
            Err(LedgerError::NotDelegated)
        );
    }

    #[test]
    fn test_local_update_refused_while_delegated() {
        let (ledger, account_id, authority, validator) = setup();
        ledger.delegate(&account_id, &validator, &authority).unwrap();

        assert_eq!(
            ledger.apply_local(&account_id, &authority, &Operation::Increment),
            Err(LedgerError::AlreadyDelegated)
        );

        ledger.begin_undelegate(&account_id, 0).unwrap();
        assert_eq!(
            ledger.apply_local(&account_id, &authority, &Operation::Increment),
            Err(LedgerError::DelegationClosing)
        );
    }

    #[test]
    fn test_finalize_requires_reconciled_sequence() {
        let (ledger, account_id, authority, validator) = setup();
        ledger.delegate(&account_id, &validator, &authority).unwrap();

        // Executor reportedly reached sequence 2, but nothing reconciled yet.
        ledger.begin_undelegate(&account_id, 2).unwrap();
        assert_eq!(
            ledger.finalize_undelegate(&account_id),
            Err(LedgerError::CommitPending)
        );
    }

    #[test]
    fn test_finalize_with_no_pending_commits() {
        let (ledger, account_id, authority, validator) = setup();
        ledger.delegate(&account_id, &validator, &authority).unwrap();

        // Final sequence equals the reconciled sequence: nothing to wait for.
        ledger.begin_undelegate(&account_id, 0).unwrap();
        let account = ledger.finalize_undelegate(&account_id).unwrap();
        assert_eq!(account.status, AccountStatus::Undelegated);
        assert_eq!(account.owner_authority, OwnerAuthority::BaseProgram);
        assert!(ledger.delegation_record(&account_id).is_none());

        // Lifecycle is closed; a second finalize has nothing to act on.
        assert_eq!(
            ledger.finalize_undelegate(&account_id),
            Err(LedgerError::NotDelegated)
        );
    }

    #[test]
    fn test_close_refused_while_delegation_active() {
        let (ledger, account_id, authority, validator) = setup();
        ledger.delegate(&account_id, &validator, &authority).unwrap();

        assert_eq!(
            ledger.close(&account_id, &authority),
            Err(LedgerError::AlreadyDelegated)
        );

        ledger.begin_undelegate(&account_id, 0).unwrap();
        assert_eq!(
            ledger.close(&account_id, &authority),
            Err(LedgerError::AlreadyDelegated)
        );
    }
}
