use concordium_std::*;
use overture_commons::{Authority, BasisPoints, ContractResult, CustomContractError, TokenId};

use crate::allocation::{allocate, Draw, PoolBounds, RandomValue, SeedState, TokenPool};
use crate::auction::{AuctionState, AuctionStatus};
use crate::external::{InitParams, InitiateAuctionParams, RoyaltyInfo, SupplyView};
use crate::oracle::{OracleRequest, RandomnessContext, RandomnessOracle};
use crate::phase::{
    units_for, AllocationQueue, Phase, QueueCursor, SupplyCounters, SupplySchedule,
};
use crate::premint::PendingQueue;
use crate::whitelist::WhitelistLedger;

const ZERO_ACCOUNT: AccountAddress = AccountAddress([0; 32]);

/// Values the sale operates with. Updated through `updateInternalValue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub struct SaleConfig {
    pub ledger: ContractAddress,
    pub wallet: AccountAddress,
    pub oracle_account: AccountAddress,
    pub presale_price: Amount,
    pub premint_price: Amount,
    pub allowance_cap: u32,
    pub max_units_per_call: u32,
    pub royalty: BasisPoints,
}

/// Ids assigned by one drain call. Each id still has to be recorded on the ledger.
#[must_use]
pub struct BatchOutcome {
    pub assigned: Vec<(AccountAddress, TokenId)>,
    /// Queue entry the next call resumes at.
    pub next_entry: u32,
    /// Every entry covered by the current seed is processed.
    pub drained: bool,
    /// Slot opened because the previous one was exhausted.
    pub opened: Option<PoolBounds>,
}

/// Accepted auction purchase. The id is drawn when the buyer's random value arrives.
#[must_use]
pub struct Purchase {
    pub index: u32,
    pub price: Amount,
    pub request: OracleRequest,
}

#[must_use]
pub enum Fulfillment {
    /// Batch seed stored; the queue can be drained.
    Seeded,
    /// Auction buyer received an id.
    Assigned {
        owner: AccountAddress,
        token_id: TokenId,
        opened: Option<PoolBounds>,
    },
}

#[derive(Serial, DeserialWithState)]
#[concordium(state_parameter = "S")]
pub struct State<S: HasStateApi> {
    pub authority: Authority<S>,
    pub config: SaleConfig,
    pub schedule: SupplySchedule,
    pub counters: SupplyCounters,
    /// Active slot.
    pub pool: PoolBounds,
    slots: StateMap<u32, u32, S>,
    /// Seed of the current batch, cleared once its queue is drained or the slot is exhausted.
    pub seed: Option<SeedState>,
    pub whitelist: WhitelistLedger<S>,
    pub premints: PendingQueue<S>,
    pub oracle: RandomnessOracle<S>,
    auctions: StateMap<u32, AuctionState, S>,
    pub auction_count: u32,
}

impl<S: HasStateApi> State<S> {
    pub fn new(
        state_builder: &mut StateBuilder<S>,
        params: InitParams,
        origin: AccountAddress,
    ) -> ContractResult<Self> {
        ensure!(
            params.schedule.is_valid()
                && params.presale_price.micro_ccd > 0
                && params.premint_price.micro_ccd > 0
                && params.allowance_cap > 0
                && params.max_units_per_call > 0
                && params.royalty.is_valid(),
            CustomContractError::InvalidConfig
        );
        let pool = params
            .schedule
            .slot_after(0)
            .ok_or(CustomContractError::InvalidConfig)?;

        Ok(Self {
            authority: Authority::new(
                state_builder,
                Address::Account(origin),
                Address::Account(params.oracle),
            ),
            config: SaleConfig {
                ledger: params.ledger,
                wallet: params.wallet,
                oracle_account: params.oracle,
                presale_price: params.presale_price,
                premint_price: params.premint_price,
                allowance_cap: params.allowance_cap,
                max_units_per_call: params.max_units_per_call,
                royalty: params.royalty,
            },
            schedule: params.schedule,
            counters: SupplyCounters {
                total_supply: 0,
                supply_left: pool.size(),
            },
            pool,
            slots: state_builder.new_map(),
            seed: None,
            whitelist: WhitelistLedger::new(state_builder),
            premints: PendingQueue::new(state_builder),
            oracle: RandomnessOracle::new(state_builder, params.oracle_fee),
            auctions: state_builder.new_map(),
            auction_count: 0,
        })
    }

    pub fn phase(&self) -> Phase {
        self.schedule.phase_of(self.counters.total_supply)
    }

    fn ensure_phase(&self, expected: Phase) -> ContractResult<()> {
        let phase = self.phase();
        if phase == expected {
            return Ok(());
        }
        Err(match phase {
            Phase::PresaleOpen => CustomContractError::PresaleNotCompleted,
            Phase::AuctionOnly => CustomContractError::OnlyThroughAuction,
            Phase::DirectMintOpen | Phase::SoldOut => CustomContractError::PhaseNotEligible,
        })
    }

    /// Buys presale allowance with `payment`. Returns the units bought and the new allowance.
    pub fn contribute(
        &mut self,
        account: AccountAddress,
        payment: Amount,
    ) -> ContractResult<(u32, u32)> {
        self.ensure_phase(Phase::PresaleOpen)?;
        ensure!(
            self.whitelist.enabled,
            CustomContractError::WhitelistingDisabled
        );
        let count = units_for(payment, self.config.presale_price)?;
        let allowance = self.credit_whitelist(account, count)?;
        Ok((count, allowance))
    }

    /// Grants presale allowance without payment.
    pub fn assign(&mut self, account: AccountAddress, count: u32) -> ContractResult<u32> {
        self.ensure_phase(Phase::PresaleOpen)?;
        ensure!(account != ZERO_ACCOUNT, CustomContractError::InvalidAddress);
        // Zero units, same as a payment below the unit price.
        ensure!(count > 0, CustomContractError::InsufficientPayment);
        self.credit_whitelist(account, count)
    }

    fn credit_whitelist(&mut self, account: AccountAddress, count: u32) -> ContractResult<u32> {
        let allowance = self.whitelist.credit(
            account,
            count,
            self.config.allowance_cap,
            self.counters.supply_left,
        )?;
        self.counters.reserve(count)?;
        Ok(allowance)
    }

    /// Whitelisting can only be reopened while no presale seed is requested or in use.
    pub fn set_whitelisting(&mut self, enabled: bool) -> ContractResult<()> {
        if enabled {
            self.ensure_phase(Phase::PresaleOpen)?;
            ensure!(
                self.seed.is_none() && !self.oracle.is_pending(&RandomnessContext::Batch),
                CustomContractError::PhaseNotEligible
            );
        }
        self.whitelist.enabled = enabled;
        Ok(())
    }

    /// Queues a paid premint for `beneficiary`. Returns the units bought and the new allowance.
    pub fn premint(
        &mut self,
        beneficiary: AccountAddress,
        payment: Amount,
    ) -> ContractResult<(u32, u32)> {
        self.ensure_phase(Phase::DirectMintOpen)?;
        ensure!(
            beneficiary != ZERO_ACCOUNT,
            CustomContractError::InvalidAddress
        );
        let count = units_for(payment, self.config.premint_price)?;
        let allowance = self.premints.enqueue(
            beneficiary,
            count,
            self.config.allowance_cap,
            self.counters.supply_left,
        )?;
        self.counters.reserve(count)?;
        Ok((count, allowance))
    }

    /// Requests the seed that drains the active queue.
    pub fn request_batch_randomness(&mut self) -> ContractResult<OracleRequest> {
        match self.phase() {
            Phase::PresaleOpen => {
                // Presale draws run over a closed whitelist.
                ensure!(
                    !self.whitelist.enabled,
                    CustomContractError::PhaseNotEligible
                );
                ensure!(
                    self.whitelist.has_unminted(),
                    CustomContractError::NothingPending
                );
            }
            Phase::DirectMintOpen => {
                ensure!(
                    self.premints.has_pending(),
                    CustomContractError::NothingPending
                );
            }
            Phase::AuctionOnly => bail!(CustomContractError::OnlyThroughAuction),
            Phase::SoldOut => bail!(CustomContractError::PhaseNotEligible),
        }
        ensure!(
            self.seed.is_none(),
            CustomContractError::RequestAlreadyPending
        );
        self.oracle.request(RandomnessContext::Batch)
    }

    /// Routes a delivered random value to the context it was requested for.
    pub fn fulfill(
        &mut self,
        request_id: u64,
        value: RandomValue,
    ) -> ContractResult<(RandomnessContext, Fulfillment)> {
        let context = self.oracle.context_of(request_id)?;
        if let RandomnessContext::Buyer(_) = context {
            ensure!(
                !self.pool.is_exhausted(),
                CustomContractError::ExhaustedPool
            );
        }
        self.oracle.complete(request_id)?;

        let fulfillment = match context {
            RandomnessContext::Batch => {
                let queue_end = if self.phase() == Phase::PresaleOpen {
                    self.whitelist.restart();
                    self.whitelist.len()
                } else {
                    self.premints.tail()
                };
                self.seed = Some(SeedState::new(value, self.pool.size(), queue_end));
                Fulfillment::Seeded
            }
            RandomnessContext::Buyer(owner) => {
                let token_id =
                    TokenPool::new(&mut self.pool, &mut self.slots).draw_single(&value)?;
                self.counters.record_assigned(1)?;
                Fulfillment::Assigned {
                    owner,
                    token_id,
                    opened: self.roll_over(),
                }
            }
        };

        Ok((context, fulfillment))
    }

    /// Assigns ids to whitelisted addresses, processing at most `max_entries` of them.
    pub fn presale_mint(&mut self, max_entries: u32) -> ContractResult<BatchOutcome> {
        self.ensure_phase(Phase::PresaleOpen)?;
        let (assigned, next) = drain_queue(
            &mut self.whitelist,
            &mut self.pool,
            &mut self.slots,
            &mut self.seed,
            max_entries,
            self.config.max_units_per_call,
        )?;
        self.finish_batch(assigned, next)
    }

    /// Assigns ids to queued premint beneficiaries, processing at most `max_entries` of them.
    pub fn batch_mint(&mut self, max_entries: u32) -> ContractResult<BatchOutcome> {
        self.ensure_phase(Phase::DirectMintOpen)?;
        let (assigned, next) = drain_queue(
            &mut self.premints,
            &mut self.pool,
            &mut self.slots,
            &mut self.seed,
            max_entries,
            self.config.max_units_per_call,
        )?;
        self.finish_batch(assigned, next)
    }

    fn finish_batch(
        &mut self,
        assigned: Vec<(AccountAddress, TokenId)>,
        next: QueueCursor,
    ) -> ContractResult<BatchOutcome> {
        self.counters.record_assigned(assigned.len() as u32)?;
        let drained = self
            .seed
            .map_or(true, |seed| next.entry >= seed.queue_end);
        if drained {
            self.seed = None;
        }
        let opened = self.roll_over();

        Ok(BatchOutcome {
            assigned,
            next_entry: next.entry,
            drained,
            opened,
        })
    }

    /// Opens the next slot once the active one is exhausted.
    fn roll_over(&mut self) -> Option<PoolBounds> {
        if !self.pool.is_exhausted() {
            return None;
        }
        self.seed = None;
        match self.schedule.slot_after(self.counters.total_supply) {
            Some(next) => {
                self.pool = next;
                self.counters.supply_left = next.size();
                Some(next)
            }
            None => {
                self.counters.supply_left = 0;
                None
            }
        }
    }

    pub fn auction(&self, index: u32) -> Option<AuctionState> {
        self.auctions.get(&index).map(|auction| *auction)
    }

    pub fn current_auction(&self) -> Option<(u32, AuctionState)> {
        let index = self.auction_count.checked_sub(1)?;
        self.auction(index).map(|auction| (index, auction))
    }

    /// Starts an auction over the unsold units of the current slot.
    pub fn initiate_auction(
        &mut self,
        params: &InitiateAuctionParams,
        slot_time: Timestamp,
    ) -> ContractResult<(u32, AuctionState)> {
        self.ensure_phase(Phase::AuctionOnly)?;
        if let Some((_, current)) = self.current_auction() {
            ensure!(
                current.status(slot_time) != AuctionStatus::Active,
                CustomContractError::AuctionStillActive
            );
        }
        ensure!(
            self.oracle.buyers_in_flight() == 0,
            CustomContractError::RequestAlreadyPending
        );
        ensure!(
            self.counters.supply_left > 0,
            CustomContractError::ExhaustedPool
        );

        let auction = AuctionState::new(params, slot_time, self.counters.supply_left)?;
        let index = self.auction_count;
        self.auctions.insert(index, auction);
        self.auction_count += 1;

        Ok((index, auction))
    }

    /// Sells one unit of the current auction to `buyer` and requests its random value.
    pub fn buy(
        &mut self,
        buyer: AccountAddress,
        payment: Amount,
        slot_time: Timestamp,
    ) -> ContractResult<Purchase> {
        let (index, mut auction) = self
            .current_auction()
            .ok_or(CustomContractError::AuctionNotActive)?;
        let price = auction.quote(payment, slot_time)?;
        let context = RandomnessContext::Buyer(buyer);
        self.oracle.check_request(&context)?;
        ensure!(
            self.counters.supply_left > 0,
            CustomContractError::AuctionNotActive
        );

        // Update the sale after all checks
        auction.record_sale()?;
        self.counters.reserve(1)?;
        let request = self.oracle.request(context)?;
        self.auctions.insert(index, auction);

        Ok(Purchase {
            index,
            price,
            request,
        })
    }

    /// Balance that can leave the contract without touching the fee reserve.
    pub fn withdrawable(&self, balance: Amount) -> Amount {
        Amount::from_micro_ccd(
            balance
                .micro_ccd
                .saturating_sub(self.oracle.fee_reserve.micro_ccd),
        )
    }

    pub fn royalty_info(&self, sale_amount: Amount) -> RoyaltyInfo {
        RoyaltyInfo {
            receiver: self.config.wallet,
            amount: self.config.royalty * sale_amount,
        }
    }

    pub fn supply_view(&self) -> SupplyView {
        SupplyView {
            phase: self.phase(),
            total_supply: self.counters.total_supply,
            supply_left: self.counters.supply_left,
            pool: self.pool,
            seed_ready: self.seed.is_some(),
            auction_count: self.auction_count,
        }
    }
}

/// Runs one bounded allocation over `queue` and moves its cursor.
/// Returns the assignments and the new cursor.
fn drain_queue<Q: AllocationQueue, S: HasStateApi>(
    queue: &mut Q,
    bounds: &mut PoolBounds,
    slots: &mut StateMap<u32, u32, S>,
    seed: &mut Option<SeedState>,
    max_entries: u32,
    max_units: u32,
) -> ContractResult<(Vec<(AccountAddress, TokenId)>, QueueCursor)> {
    let seed = seed
        .as_mut()
        .ok_or(CustomContractError::RandomnessNotReady)?;
    let cursor = queue.cursor();
    let end = seed
        .queue_end
        .min(cursor.entry.saturating_add(max_entries));
    let draws: Vec<Draw<AccountAddress>> = (cursor.entry..end)
        .map(|index| queue.outstanding(index))
        .collect();

    let mut pool = TokenPool::new(bounds, slots);
    let allocation = allocate(&mut pool, Some(&mut *seed), &draws, cursor.unit, max_units)?;

    let mut next = QueueCursor {
        entry: cursor.entry,
        unit: allocation.next_index,
    };
    for draw in draws.iter() {
        if next.unit < draw.count {
            break;
        }
        queue.settle(next.entry);
        next.unit -= draw.count;
        next.entry += 1;
    }
    queue.set_cursor(next);

    Ok((allocation.assigned, next))
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use concordium_std::test_infrastructure::*;
    use overture_commons::DEFAULT_ALLOWANCE_CAP;
    use std::collections::BTreeSet;

    const ADMIN: AccountAddress = AccountAddress([1; 32]);
    const WALLET: AccountAddress = AccountAddress([4; 32]);
    const ORACLE: AccountAddress = AccountAddress([3; 32]);
    const LEDGER: ContractAddress = ContractAddress {
        index: 10,
        subindex: 0,
    };
    const USER_1: AccountAddress = AccountAddress([16; 32]);
    const USER_2: AccountAddress = AccountAddress([17; 32]);

    fn params(schedule: SupplySchedule) -> InitParams {
        InitParams {
            ledger: LEDGER,
            wallet: WALLET,
            oracle: ORACLE,
            oracle_fee: Amount::zero(),
            presale_price: Amount::from_micro_ccd(100_000),
            premint_price: Amount::from_micro_ccd(200_000),
            allowance_cap: DEFAULT_ALLOWANCE_CAP,
            max_units_per_call: 1_000,
            royalty: BasisPoints::new(500).expect_report("Valid rate"),
            schedule,
        }
    }

    fn new_state(schedule: SupplySchedule) -> State<TestStateApi> {
        let mut state_builder = TestStateBuilder::new();
        State::new(&mut state_builder, params(schedule), ADMIN).expect_report("Invalid state")
    }

    fn account(n: u32) -> AccountAddress {
        let mut bytes = [0u8; 32];
        bytes[..4].copy_from_slice(&n.to_be_bytes());
        bytes[31] = 1;
        AccountAddress(bytes)
    }

    /// Moves the sale to the slot starting at `total_supply`.
    fn skip_to(state: &mut State<TestStateApi>, total_supply: u32) {
        let pool = state
            .schedule
            .slot_after(total_supply)
            .expect_report("Slot exists");
        state.counters = SupplyCounters {
            total_supply,
            supply_left: pool.size(),
        };
        state.pool = pool;
    }

    fn seed_batch(state: &mut State<TestStateApi>, value: u128) {
        let request = state
            .request_batch_randomness()
            .expect_report("Batch request failed");
        let (context, fulfillment) = state
            .fulfill(request.request_id, RandomValue::from_u128(value))
            .expect_report("Fulfillment failed");
        claim_eq!(context, RandomnessContext::Batch);
        claim!(matches!(fulfillment, Fulfillment::Seeded));
    }

    #[concordium_test]
    fn test_init_opens_presale_slot() {
        let state = new_state(SupplySchedule::default());
        claim_eq!(state.phase(), Phase::PresaleOpen);
        claim_eq!(state.pool, PoolBounds::new(0, 1_000));
        claim_eq!(state.counters.supply_left, 1_000);
        claim!(state.whitelist.enabled);
    }

    #[concordium_test]
    fn test_init_rejects_inconsistent_values() {
        let mut state_builder = TestStateBuilder::new();
        let mut invalid = params(SupplySchedule::default());
        invalid.presale_price = Amount::zero();
        claim!(State::new(&mut state_builder, invalid, ADMIN).is_err());

        let mut invalid = params(SupplySchedule::default());
        invalid.schedule.auction_threshold = 500;
        claim!(State::new(&mut state_builder, invalid, ADMIN).is_err());
    }

    #[concordium_test]
    fn test_contribution_buys_allowance() {
        let mut state = new_state(SupplySchedule::default());

        claim_eq!(
            state.contribute(USER_1, Amount::from_micro_ccd(100_000)),
            Ok((1, 1))
        );
        claim_eq!(state.whitelist.entry(&USER_1).allowance, 1);
        claim_eq!(state.counters.supply_left, 999);

        claim_eq!(
            state.contribute(USER_2, Amount::from_ccd(3)),
            Err(CustomContractError::AboveMaximum)
        );
        claim_eq!(state.whitelist.entry(&USER_2).allowance, 0);
        claim_eq!(state.counters.supply_left, 999);

        claim_eq!(
            state.contribute(USER_2, Amount::from_micro_ccd(99_999)),
            Err(CustomContractError::InsufficientPayment)
        );
    }

    #[concordium_test]
    fn test_assignment_respects_toggle_and_cap() {
        let mut state = new_state(SupplySchedule::default());

        claim_eq!(state.assign(USER_1, 25), Ok(25));
        claim_eq!(
            state.assign(USER_1, 1),
            Err(CustomContractError::AlreadyTooMuch)
        );
        claim_eq!(
            state.assign(ZERO_ACCOUNT, 1),
            Err(CustomContractError::InvalidAddress)
        );

        claim_eq!(state.set_whitelisting(false), Ok(()));
        claim_eq!(
            state.assign(USER_2, 1),
            Err(CustomContractError::WhitelistingDisabled)
        );
        claim_eq!(
            state.contribute(USER_2, Amount::from_ccd(1)),
            Err(CustomContractError::WhitelistingDisabled)
        );
    }

    #[concordium_test]
    fn test_premint_is_phase_gated() {
        let mut state = new_state(SupplySchedule::default());
        claim_eq!(
            state.premint(USER_1, Amount::from_ccd(1)),
            Err(CustomContractError::PresaleNotCompleted)
        );

        skip_to(&mut state, 1_000);
        claim_eq!(state.premint(USER_1, Amount::from_ccd(1)), Ok((5, 5)));
        claim_eq!(
            state.premint(ZERO_ACCOUNT, Amount::from_ccd(1)),
            Err(CustomContractError::InvalidAddress)
        );
        claim_eq!(
            state.contribute(USER_2, Amount::from_ccd(1)),
            Err(CustomContractError::PhaseNotEligible)
        );

        skip_to(&mut state, 8_000);
        claim_eq!(
            state.premint(USER_1, Amount::from_ccd(1)),
            Err(CustomContractError::OnlyThroughAuction)
        );
    }

    #[concordium_test]
    fn test_premint_cap() {
        let mut state = new_state(SupplySchedule::default());
        skip_to(&mut state, 1_000);

        claim_eq!(state.premint(USER_1, Amount::from_ccd(4)), Ok((20, 20)));
        claim_eq!(
            state.premint(USER_1, Amount::from_ccd(2)),
            Err(CustomContractError::AboveMaximum)
        );
        claim_eq!(state.premint(USER_1, Amount::from_ccd(1)), Ok((5, 25)));
        claim_eq!(
            state.premint(USER_1, Amount::from_micro_ccd(200_000)),
            Err(CustomContractError::AlreadyTooMuch)
        );
        claim_eq!(state.counters.supply_left, 975);
    }

    #[concordium_test]
    fn test_batch_requires_seed() {
        let mut state = new_state(SupplySchedule::default());
        skip_to(&mut state, 1_000);
        claim_eq!(
            state.request_batch_randomness().map(|r| r.request_id),
            Err(CustomContractError::NothingPending)
        );
        claim_eq!(state.premint(USER_1, Amount::from_ccd(1)), Ok((5, 5)));

        claim!(matches!(
            state.batch_mint(10),
            Err(CustomContractError::RandomnessNotReady)
        ));

        let request = state
            .request_batch_randomness()
            .expect_report("Batch request failed");
        claim_eq!(
            state.request_batch_randomness().map(|r| r.request_id),
            Err(CustomContractError::RequestAlreadyPending)
        );
        claim!(matches!(
            state.batch_mint(10),
            Err(CustomContractError::RandomnessNotReady)
        ));

        let result = state.fulfill(request.request_id, RandomValue::from_u128(42));
        claim!(result.is_ok());
        claim!(state.seed.is_some());
    }

    #[concordium_test]
    fn test_presale_drain_needs_closed_whitelist() {
        let mut state = new_state(SupplySchedule::default());
        claim_eq!(state.assign(USER_1, 3), Ok(3));
        claim_eq!(
            state.request_batch_randomness().map(|r| r.request_id),
            Err(CustomContractError::PhaseNotEligible)
        );

        claim_eq!(state.set_whitelisting(false), Ok(()));
        seed_batch(&mut state, 42);
        claim_eq!(
            state.set_whitelisting(true),
            Err(CustomContractError::PhaseNotEligible)
        );

        let outcome = state.presale_mint(10).expect_report("Presale mint failed");
        claim!(outcome.drained);
        claim_eq!(outcome.assigned.len(), 3);
        claim!(outcome.assigned.iter().all(|(owner, _)| *owner == USER_1));
        // Seed 42 on the presale slot starts at id 43.
        claim_eq!(outcome.assigned[0].1, TokenId(43));
        claim!(state.seed.is_none());
        claim_eq!(state.counters.total_supply, 3);

        // The presale can continue with a reopened whitelist.
        claim_eq!(state.set_whitelisting(true), Ok(()));
        claim_eq!(state.assign(USER_1, 2), Ok(5));
        claim_eq!(state.assign(USER_2, 1), Ok(1));
        claim_eq!(state.set_whitelisting(false), Ok(()));
        seed_batch(&mut state, 7);
        let outcome = state.presale_mint(10).expect_report("Presale mint failed");
        claim_eq!(outcome.assigned.len(), 3);
        claim_eq!(
            outcome
                .assigned
                .iter()
                .filter(|(owner, _)| *owner == USER_1)
                .count(),
            2
        );
    }

    #[concordium_test]
    fn test_drain_respects_entry_and_unit_limits() {
        let mut state = new_state(SupplySchedule::default());
        state.config.max_units_per_call = 4;
        skip_to(&mut state, 1_000);
        for n in 0..3 {
            claim_eq!(state.premint(account(n), Amount::from_ccd(1)), Ok((5, 5)));
        }
        seed_batch(&mut state, 1_234_567);

        // Unit limit stops inside the first entry.
        let outcome = state.batch_mint(3).expect_report("Batch failed");
        claim_eq!(outcome.assigned.len(), 4);
        claim!(!outcome.drained);
        claim_eq!(state.premints.allowance(&account(0)), 5);

        // Entry limit of one finishes the first entry only.
        let outcome = state.batch_mint(1).expect_report("Batch failed");
        claim_eq!(outcome.assigned.len(), 1);
        claim_eq!(state.premints.allowance(&account(0)), 0);

        let mut total = 5;
        while state.seed.is_some() {
            let outcome = state.batch_mint(3).expect_report("Batch failed");
            total += outcome.assigned.len();
        }
        claim_eq!(total, 15);
        claim_eq!(state.counters.total_supply, 1_015);
        claim_eq!(state.counters.supply_left, 985);
        claim_eq!(state.pool.remaining, 985);
    }

    #[concordium_test]
    fn test_premints_after_seed_wait_for_next_seed() {
        let mut state = new_state(SupplySchedule::default());
        skip_to(&mut state, 1_000);
        claim_eq!(state.premint(USER_1, Amount::from_ccd(1)), Ok((5, 5)));
        seed_batch(&mut state, 99);
        claim_eq!(state.premint(USER_2, Amount::from_ccd(1)), Ok((5, 5)));

        let outcome = state.batch_mint(10).expect_report("Batch failed");
        claim!(outcome.drained);
        claim_eq!(outcome.assigned.len(), 5);
        claim_eq!(state.premints.allowance(&USER_2), 5);

        seed_batch(&mut state, 100);
        let outcome = state.batch_mint(10).expect_report("Batch failed");
        claim!(outcome.assigned.iter().all(|(owner, _)| *owner == USER_2));
        claim_eq!(outcome.assigned.len(), 5);
    }

    #[concordium_test]
    fn test_drain_across_slot_boundary_into_auctions() {
        let mut state = new_state(SupplySchedule::default());
        state.config.max_units_per_call = 50;
        skip_to(&mut state, 7_000);
        claim_eq!(state.phase(), Phase::DirectMintOpen);

        for n in 0..40 {
            claim_eq!(state.premint(account(n), Amount::from_ccd(5)), Ok((25, 25)));
        }
        claim_eq!(state.counters.supply_left, 0);
        claim_eq!(
            state.premint(USER_1, Amount::from_ccd(1)),
            Err(CustomContractError::AboveMaximum)
        );

        seed_batch(&mut state, 0xfeed_f00d);
        let mut ids = BTreeSet::new();
        let mut opened = None;
        while state.phase() == Phase::DirectMintOpen {
            let outcome = state.batch_mint(2).expect_report("Batch failed");
            for (_, token_id) in outcome.assigned.iter() {
                claim!(ids.insert(token_id.0));
            }
            if outcome.opened.is_some() {
                opened = outcome.opened;
            }
        }

        claim_eq!(ids.len(), 1_000);
        claim!(ids.iter().all(|id| *id > 7_000 && *id <= 8_000));
        claim_eq!(state.counters.total_supply, 8_000);
        claim_eq!(state.counters.supply_left, 200);
        claim_eq!(state.phase(), Phase::AuctionOnly);
        claim_eq!(opened, Some(PoolBounds::new(8_000, 8_200)));
        claim!(state.seed.is_none());
        claim!(state.slots.iter().next().is_none());
    }

    #[concordium_test]
    fn test_chunked_batches_match_single_batch() {
        let assignments = |entries_per_call: u32| {
            let mut state = new_state(SupplySchedule::default());
            skip_to(&mut state, 2_000);
            for n in 0..8 {
                claim!(state.premint(account(n), Amount::from_ccd(1)).is_ok());
            }
            seed_batch(&mut state, 31_337);
            let mut result = Vec::new();
            while state.seed.is_some() {
                let outcome = state
                    .batch_mint(entries_per_call)
                    .expect_report("Batch failed");
                result.extend(outcome.assigned);
            }
            result
        };

        let whole = assignments(8);
        claim_eq!(whole.len(), 40);
        claim_eq!(whole, assignments(3));
        claim_eq!(whole, assignments(1));
    }

    #[concordium_test]
    fn test_auction_flow() {
        let mut state = new_state(SupplySchedule::default());
        let params = InitiateAuctionParams {
            duration_seconds: 60,
            deduction_rate: Amount::from_micro_ccd(100_000),
            starting_price: Amount::from_ccd(2),
            reserve_price: Amount::from_ccd(1),
        };
        let start = Timestamp::from_timestamp_millis(1_000_000);
        claim!(matches!(
            state.initiate_auction(&params, start),
            Err(CustomContractError::PresaleNotCompleted)
        ));
        claim!(matches!(
            state.buy(USER_1, Amount::from_ccd(2), start),
            Err(CustomContractError::AuctionNotActive)
        ));

        skip_to(&mut state, 8_000);
        let (index, auction) = state
            .initiate_auction(&params, start)
            .expect_report("Auction start failed");
        claim_eq!(index, 0);
        claim_eq!(auction.tokens_left, 200);
        claim!(matches!(
            state.initiate_auction(&params, start),
            Err(CustomContractError::AuctionStillActive)
        ));

        let at = |seconds: u64| Timestamp::from_timestamp_millis(1_000_000 + seconds * 1000);
        claim!(matches!(
            state.buy(USER_1, Amount::from_micro_ccd(1_850_000), at(1)),
            Err(CustomContractError::InsufficientPayment)
        ));
        let purchase = state
            .buy(USER_1, Amount::from_micro_ccd(1_700_000), at(3))
            .expect_report("Purchase failed");
        claim_eq!(purchase.price, Amount::from_micro_ccd(1_700_000));
        claim_eq!(state.counters.supply_left, 199);
        claim_eq!(state.auction(0).map(|a| a.tokens_left), Some(199));

        // One purchase per buyer until its id is drawn.
        claim!(matches!(
            state.buy(USER_1, Amount::from_ccd(2), at(4)),
            Err(CustomContractError::RequestAlreadyPending)
        ));

        let (context, fulfillment) = state
            .fulfill(purchase.request.request_id, RandomValue::from_u128(20_049))
            .expect_report("Fulfillment failed");
        claim_eq!(context, RandomnessContext::Buyer(USER_1));
        match fulfillment {
            Fulfillment::Assigned {
                owner,
                token_id,
                opened,
            } => {
                claim_eq!(owner, USER_1);
                // 20049 mod 200 = 49
                claim_eq!(token_id, TokenId(8_050));
                claim_eq!(opened, None);
            }
            Fulfillment::Seeded => fail!("Buyer request must assign an id"),
        }
        claim_eq!(state.counters.total_supply, 8_001);

        claim!(matches!(
            state.buy(USER_2, Amount::from_ccd(5), at(60)),
            Err(CustomContractError::AuctionExpired)
        ));
    }

    #[concordium_test]
    fn test_last_auction_sale_sells_out() {
        let mut state = new_state(SupplySchedule::default());
        state.counters = SupplyCounters {
            total_supply: 9_999,
            supply_left: 1,
        };
        state.pool = PoolBounds::new(9_999, 10_000);

        let params = InitiateAuctionParams {
            duration_seconds: 60,
            deduction_rate: Amount::zero(),
            starting_price: Amount::from_ccd(1),
            reserve_price: Amount::from_ccd(1),
        };
        let start = Timestamp::from_timestamp_millis(0);
        let (_, auction) = state
            .initiate_auction(&params, start)
            .expect_report("Auction start failed");
        claim_eq!(auction.tokens_left, 1);

        let purchase = state
            .buy(USER_1, Amount::from_ccd(1), start)
            .expect_report("Purchase failed");
        claim!(matches!(
            state.buy(USER_2, Amount::from_ccd(1), start),
            Err(CustomContractError::AuctionNotActive)
        ));
        let result = state.fulfill(purchase.request.request_id, RandomValue::from_u128(5));
        claim!(result.is_ok());
        claim_eq!(state.phase(), Phase::SoldOut);
        claim_eq!(state.counters.supply_left, 0);
        claim!(matches!(
            state.initiate_auction(&params, start),
            Err(CustomContractError::PhaseNotEligible)
        ));
    }

    #[concordium_test]
    fn test_unknown_fulfillment() {
        let mut state = new_state(SupplySchedule::default());
        claim!(matches!(
            state.fulfill(3, RandomValue::from_u128(1)),
            Err(CustomContractError::UnknownRequest)
        ));
    }

    #[concordium_test]
    fn test_withdrawable_keeps_fee_reserve() {
        let mut state = new_state(SupplySchedule::default());
        claim_eq!(state.oracle.deposit(Amount::from_ccd(4)), Ok(()));
        claim_eq!(state.withdrawable(Amount::from_ccd(10)), Amount::from_ccd(6));
        claim_eq!(state.withdrawable(Amount::from_ccd(3)), Amount::zero());
    }

    #[concordium_test]
    fn test_royalty_info() {
        let state = new_state(SupplySchedule::default());
        claim_eq!(
            state.royalty_info(Amount::from_ccd(10)),
            RoyaltyInfo {
                receiver: WALLET,
                amount: Amount::from_micro_ccd(500_000),
            }
        );
    }
}
