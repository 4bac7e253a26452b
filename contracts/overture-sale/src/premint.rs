use concordium_std::*;
use overture_commons::{ContractResult, CustomContractError};

use crate::allocation::Draw;
use crate::phase::{checked_allowance, AllocationQueue, QueueCursor};

/// Beneficiaries of paid premints waiting for ids.
///
/// An address is queued once while it has an unminted allowance. Minting
/// consumes the allowance, so the per-address cap applies per slot.
#[derive(Serial, DeserialWithState)]
#[concordium(state_parameter = "S")]
pub struct PendingQueue<S: HasStateApi> {
    allowances: StateMap<AccountAddress, u32, S>,
    entries: StateMap<u32, AccountAddress, S>,
    tail: u32,
    cursor: QueueCursor,
}

impl<S: HasStateApi> PendingQueue<S> {
    pub fn new(state_builder: &mut StateBuilder<S>) -> Self {
        Self {
            allowances: state_builder.new_map(),
            entries: state_builder.new_map(),
            tail: 0,
            cursor: QueueCursor::default(),
        }
    }

    pub fn allowance(&self, account: &AccountAddress) -> u32 {
        self.allowances
            .get(account)
            .map(|allowance| *allowance)
            .unwrap_or(0)
    }

    pub fn tail(&self) -> u32 {
        self.tail
    }

    pub fn has_pending(&self) -> bool {
        self.cursor.entry < self.tail
    }

    /// Raises the allowance of `beneficiary` by `count`, queueing it if it has none.
    pub fn enqueue(
        &mut self,
        beneficiary: AccountAddress,
        count: u32,
        cap: u32,
        supply_left: u32,
    ) -> ContractResult<u32> {
        let existing = self.allowance(&beneficiary);
        let allowance = checked_allowance(existing, count, cap)?;
        ensure!(count <= supply_left, CustomContractError::AboveMaximum);

        if existing == 0 {
            self.entries.insert(self.tail, beneficiary);
            self.tail += 1;
        }
        self.allowances.insert(beneficiary, allowance);

        Ok(allowance)
    }
}

impl<S: HasStateApi> AllocationQueue for PendingQueue<S> {
    fn cursor(&self) -> QueueCursor {
        self.cursor
    }

    fn set_cursor(&mut self, cursor: QueueCursor) {
        self.cursor = cursor;
    }

    fn outstanding(&self, index: u32) -> Draw<AccountAddress> {
        match self.entries.get(&index).map(|account| *account) {
            Some(account) => Draw {
                beneficiary: account,
                count: self.allowance(&account),
            },
            None => Draw {
                beneficiary: AccountAddress([0; 32]),
                count: 0,
            },
        }
    }

    fn settle(&mut self, index: u32) {
        if let Some(account) = self.entries.get(&index).map(|account| *account) {
            self.allowances.remove(&account);
            self.entries.remove(&index);
        }
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use concordium_std::test_infrastructure::*;

    const USER_1: AccountAddress = AccountAddress([16; 32]);
    const USER_2: AccountAddress = AccountAddress([17; 32]);

    fn queue() -> PendingQueue<TestStateApi> {
        let mut state_builder = TestStateBuilder::new();
        PendingQueue::new(&mut state_builder)
    }

    #[concordium_test]
    fn test_address_is_queued_once() {
        let mut queue = queue();

        claim_eq!(queue.enqueue(USER_1, 2, 25, 1_000), Ok(2));
        claim_eq!(queue.enqueue(USER_2, 1, 25, 998), Ok(1));
        claim_eq!(queue.enqueue(USER_1, 3, 25, 997), Ok(5));

        claim_eq!(queue.tail(), 2);
        claim_eq!(queue.outstanding(0), Draw {
            beneficiary: USER_1,
            count: 5
        });
        claim_eq!(queue.outstanding(1), Draw {
            beneficiary: USER_2,
            count: 1
        });
    }

    #[concordium_test]
    fn test_cap_per_slot() {
        let mut queue = queue();

        claim_eq!(queue.enqueue(USER_1, 25, 25, 1_000), Ok(25));
        claim_eq!(
            queue.enqueue(USER_1, 1, 25, 975),
            Err(CustomContractError::AlreadyTooMuch)
        );

        // Minting consumes the allowance and frees the cap.
        queue.settle(0);
        claim_eq!(queue.allowance(&USER_1), 0);
        claim_eq!(queue.enqueue(USER_1, 4, 25, 975), Ok(4));
        claim_eq!(queue.tail(), 2);
        claim_eq!(queue.outstanding(0).count, 0);
        claim_eq!(queue.outstanding(1).count, 4);
    }

    #[concordium_test]
    fn test_supply_bound() {
        let mut queue = queue();

        claim_eq!(
            queue.enqueue(USER_1, 5, 25, 4),
            Err(CustomContractError::AboveMaximum)
        );
        claim_eq!(queue.allowance(&USER_1), 0);
        claim_eq!(queue.tail(), 0);
        claim!(!queue.has_pending());
    }
}
