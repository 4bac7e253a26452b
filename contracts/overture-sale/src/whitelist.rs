use concordium_std::*;
use overture_commons::{ContractResult, CustomContractError};

use crate::allocation::Draw;
use crate::phase::{checked_allowance, AllocationQueue, QueueCursor};

/// Presale allowance of one address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, SchemaType)]
pub struct WhitelistEntry {
    pub allowance: u32,
    pub minted: u32,
}

impl WhitelistEntry {
    fn unminted(&self) -> u32 {
        self.allowance.saturating_sub(self.minted)
    }
}

/// Presale allowances and the registry of distinct contributors, in first-contribution order.
/// Entries are never removed.
#[derive(Serial, DeserialWithState)]
#[concordium(state_parameter = "S")]
pub struct WhitelistLedger<S: HasStateApi> {
    pub enabled: bool,
    entries: StateMap<AccountAddress, WhitelistEntry, S>,
    registry: StateMap<u32, AccountAddress, S>,
    len: u32,
    /// Sum of unminted allowances.
    unminted: u32,
    cursor: QueueCursor,
}

impl<S: HasStateApi> WhitelistLedger<S> {
    pub fn new(state_builder: &mut StateBuilder<S>) -> Self {
        Self {
            enabled: true,
            entries: state_builder.new_map(),
            registry: state_builder.new_map(),
            len: 0,
            unminted: 0,
            cursor: QueueCursor::default(),
        }
    }

    pub fn entry(&self, account: &AccountAddress) -> WhitelistEntry {
        self.entries
            .get(account)
            .map(|entry| *entry)
            .unwrap_or_default()
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn has_unminted(&self) -> bool {
        self.unminted > 0
    }

    /// Adds `count` units to the allowance of `account`. Nothing changes unless
    /// whitelisting is enabled, the cap holds and `supply_left` covers the units.
    pub fn credit(
        &mut self,
        account: AccountAddress,
        count: u32,
        cap: u32,
        supply_left: u32,
    ) -> ContractResult<u32> {
        ensure!(self.enabled, CustomContractError::WhitelistingDisabled);
        let existing = self.entries.get(&account).map(|entry| *entry);
        let current = existing.unwrap_or_default();
        let allowance = checked_allowance(current.allowance, count, cap)?;
        ensure!(count <= supply_left, CustomContractError::AboveMaximum);
        let unminted = self
            .unminted
            .checked_add(count)
            .ok_or(CustomContractError::Overflow)?;

        // Update the ledger after all checks
        if existing.is_none() {
            self.registry.insert(self.len, account);
            self.len += 1;
        }
        self.entries.insert(
            account,
            WhitelistEntry {
                allowance,
                minted: current.minted,
            },
        );
        self.unminted = unminted;

        Ok(allowance)
    }

    /// Starts a new pass over the registry for a fresh seed.
    pub fn restart(&mut self) {
        self.cursor = QueueCursor::default();
    }
}

impl<S: HasStateApi> AllocationQueue for WhitelistLedger<S> {
    fn cursor(&self) -> QueueCursor {
        self.cursor
    }

    fn set_cursor(&mut self, cursor: QueueCursor) {
        self.cursor = cursor;
    }

    fn outstanding(&self, index: u32) -> Draw<AccountAddress> {
        match self.registry.get(&index).map(|account| *account) {
            Some(account) => Draw {
                beneficiary: account,
                count: self.entry(&account).unminted(),
            },
            None => Draw {
                beneficiary: AccountAddress([0; 32]),
                count: 0,
            },
        }
    }

    fn settle(&mut self, index: u32) {
        let account = match self.registry.get(&index).map(|account| *account) {
            Some(account) => account,
            None => return,
        };
        let mut entry = self.entry(&account);
        self.unminted = self.unminted.saturating_sub(entry.unminted());
        entry.minted = entry.allowance;
        self.entries.insert(account, entry);
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use concordium_std::test_infrastructure::*;

    const USER_1: AccountAddress = AccountAddress([16; 32]);
    const USER_2: AccountAddress = AccountAddress([17; 32]);

    fn ledger() -> WhitelistLedger<TestStateApi> {
        let mut state_builder = TestStateBuilder::new();
        WhitelistLedger::new(&mut state_builder)
    }

    #[concordium_test]
    fn test_credit_and_registry() {
        let mut ledger = ledger();

        claim_eq!(ledger.credit(USER_1, 1, 25, 1_000), Ok(1));
        claim_eq!(ledger.credit(USER_2, 3, 25, 999), Ok(3));
        claim_eq!(ledger.credit(USER_1, 4, 25, 996), Ok(5));

        claim_eq!(ledger.len(), 2);
        claim_eq!(ledger.outstanding(0), Draw {
            beneficiary: USER_1,
            count: 5
        });
        claim_eq!(ledger.outstanding(1), Draw {
            beneficiary: USER_2,
            count: 3
        });
        claim_eq!(ledger.outstanding(2).count, 0);
    }

    #[concordium_test]
    fn test_rejected_credit_keeps_ledger() {
        let mut ledger = ledger();

        claim_eq!(
            ledger.credit(USER_1, 30, 25, 1_000),
            Err(CustomContractError::AboveMaximum)
        );
        claim_eq!(ledger.entry(&USER_1), WhitelistEntry::default());
        claim_eq!(ledger.len(), 0);

        claim_eq!(ledger.credit(USER_1, 25, 25, 1_000), Ok(25));
        claim_eq!(
            ledger.credit(USER_1, 1, 25, 1_000),
            Err(CustomContractError::AlreadyTooMuch)
        );
        claim_eq!(
            ledger.credit(USER_2, 3, 25, 2),
            Err(CustomContractError::AboveMaximum)
        );
        claim_eq!(ledger.len(), 1);
    }

    #[concordium_test]
    fn test_disabled_whitelist() {
        let mut ledger = ledger();
        ledger.enabled = false;

        claim_eq!(
            ledger.credit(USER_1, 1, 25, 1_000),
            Err(CustomContractError::WhitelistingDisabled)
        );
        claim!(!ledger.has_unminted());
    }

    #[concordium_test]
    fn test_settle_keeps_entry() {
        let mut ledger = ledger();
        claim_eq!(ledger.credit(USER_1, 2, 25, 1_000), Ok(2));
        claim!(ledger.has_unminted());

        ledger.settle(0);
        claim!(!ledger.has_unminted());
        claim_eq!(ledger.outstanding(0).count, 0);
        claim_eq!(ledger.entry(&USER_1), WhitelistEntry {
            allowance: 2,
            minted: 2
        });

        // Later contributions only owe the new units.
        claim_eq!(ledger.credit(USER_1, 3, 25, 1_000), Ok(5));
        claim_eq!(ledger.outstanding(0).count, 3);
        claim_eq!(ledger.len(), 1);
    }
}
