use concordium_std::*;
use overture_commons::{
    AuthorityUpdateParams, AuthorityViewParams, CustomContractError, HostLedgerExt, TokenId,
};

use crate::allocation::PoolBounds;
use crate::auction::AuctionState;
use crate::events::*;
use crate::external::*;
use crate::oracle::{OracleRequest, RandomnessContext};
use crate::state::{Fulfillment, State};

/// Initialize the sale with the first presale slot open.
/// The init origin becomes admin and the oracle account a trusted oracle.
///
///  It rejects if:
///  - Fails to parse `InitParams` parameters.
///  - The supply schedule is inconsistent, a price or a limit is zero, or the royalty exceeds 100%.
#[init(contract = "OvertureSale", parameter = "InitParams")]
fn contract_init<S: HasStateApi>(
    ctx: &impl HasInitContext,
    state_builder: &mut StateBuilder<S>,
) -> InitResult<State<S>> {
    let params = InitParams::deserial(&mut ctx.parameter_cursor())?;
    Ok(State::new(state_builder, params, ctx.init_origin())?)
}

/// Buy presale allowance. Every full presale price in the payment is one unit.
///
///  It rejects if:
///  - Sender is not an account.
///  - The presale is over or whitelisting is disabled.
///  - Payment is below the presale price.
///  - The allowance would exceed the cap or the units left in the presale.
#[receive(
    mutable,
    payable,
    contract = "OvertureSale",
    name = "contribute",
    enable_logger
)]
fn contract_contribute<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    amount: Amount,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let account = sender_account(ctx)?;
    let (count, allowance) = host.state_mut().contribute(account, amount)?;
    logger.log(&SaleEvents::contribution(&account, count, allowance))?;
    Ok(())
}

/// Grant presale allowance without payment.
///
///  It rejects if:
///  - Fails to parse `AssignParams` parameters.
///  - Sender is neither one of the admins nor one of the maintainers.
///  - The same conditions as `contribute`, apart from payment.
#[receive(
    mutable,
    contract = "OvertureSale",
    name = "assign",
    parameter = "AssignParams",
    enable_logger
)]
fn contract_assign<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    ensure_maintainer(ctx, host)?;
    let params = AssignParams::deserial(&mut ctx.parameter_cursor())?;
    let allowance = host.state_mut().assign(params.address, params.count)?;
    logger.log(&SaleEvents::contribution(
        &params.address,
        params.count,
        allowance,
    ))?;
    Ok(())
}

/// Open or close the whitelist. Closing it is required before presale randomness can be requested.
#[receive(
    mutable,
    contract = "OvertureSale",
    name = "setWhitelisting",
    parameter = "bool",
    enable_logger
)]
fn contract_set_whitelisting<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    ensure_maintainer(ctx, host)?;
    let enabled = bool::deserial(&mut ctx.parameter_cursor())?;
    host.state_mut().set_whitelisting(enabled)?;
    logger.log(&SaleEvents::WhitelistToggled(WhitelistToggleEvent {
        enabled,
    }))?;
    Ok(())
}

/// Pay for direct mints of the current slot, for the sender or a named beneficiary.
/// Ids are assigned later by `batchMint`.
///
///  It rejects if:
///  - Fails to parse `PremintParams` parameters.
///  - Sender is not an account.
///  - The presale is not completed, or only auctions are left.
///  - Beneficiary is the zero account.
///  - Payment is below the premint price.
///  - The allowance would exceed the cap or the units left in the slot.
#[receive(
    mutable,
    payable,
    contract = "OvertureSale",
    name = "preMint",
    parameter = "PremintParams",
    enable_logger
)]
fn contract_premint<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    amount: Amount,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let payer = sender_account(ctx)?;
    let params = PremintParams::deserial(&mut ctx.parameter_cursor())?;
    let beneficiary = params.beneficiary.unwrap_or(payer);

    let (count, allowance) = host.state_mut().premint(beneficiary, amount)?;
    logger.log(&SaleEvents::premint(&payer, &beneficiary, count, allowance))?;
    Ok(())
}

/// Request the random seed for draining the active queue.
///
///  It rejects if:
///  - Sender is neither one of the admins nor one of the maintainers.
///  - Whitelisting is still enabled during the presale.
///  - Nothing is waiting for ids.
///  - A seed is already requested or active.
///  - The fee reserve cannot cover the oracle fee.
#[receive(
    mutable,
    contract = "OvertureSale",
    name = "requestBatchRandomness",
    enable_logger
)]
fn contract_request_batch_randomness<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    ensure_maintainer(ctx, host)?;
    let request = host.state_mut().request_batch_randomness()?;
    logger.log(&SaleEvents::requested(
        request.request_id,
        &RandomnessContext::Batch,
    ))?;
    pay_oracle(host, &request)
}

/// Deliver a requested random value. A batch value seeds the queue drain, a buyer value
/// assigns the buyer's id right away.
///
///  It rejects if:
///  - Fails to parse `FulfillParams` parameters.
///  - Sender is not a trusted oracle.
///  - The request id is unknown or already fulfilled.
///  - The ledger rejects the minted id.
#[receive(
    mutable,
    contract = "OvertureSale",
    name = "fulfillRandomness",
    parameter = "FulfillParams",
    enable_logger
)]
fn contract_fulfill_randomness<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    ensure!(
        host.state().authority.is_trusted_oracle(&ctx.sender()),
        CustomContractError::Unauthorized.into()
    );
    let params = FulfillParams::deserial(&mut ctx.parameter_cursor())?;

    let (context, fulfillment) = host
        .state_mut()
        .fulfill(params.request_id, params.value)?;
    logger.log(&SaleEvents::fulfilled(params.request_id, &context))?;

    if let Fulfillment::Assigned {
        owner,
        token_id,
        opened,
    } = fulfillment
    {
        record_mints(host, &[(owner, token_id)])?;
        logger.log(&SaleEvents::assigned(&owner, token_id))?;
        log_opened_slot(logger, opened)?;
    }

    Ok(())
}

/// Assign ids to whitelisted addresses, processing at most `max_addresses` entries.
///
///  It rejects if:
///  - Fails to parse `BatchParams` parameters.
///  - Sender is neither one of the admins nor one of the maintainers.
///  - The presale is over.
///  - No seed is active.
///  - The ledger rejects a minted id.
#[receive(
    mutable,
    contract = "OvertureSale",
    name = "presaleMint",
    parameter = "BatchParams",
    enable_logger
)]
fn contract_presale_mint<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    ensure_maintainer(ctx, host)?;
    let params = BatchParams::deserial(&mut ctx.parameter_cursor())?;
    let outcome = host.state_mut().presale_mint(params.max_addresses)?;

    record_mints(host, &outcome.assigned)?;
    logger.log(&SaleEvents::BatchAssigned(BatchAssignedEvent {
        count: outcome.assigned.len() as u32,
        next_entry: outcome.next_entry,
        drained: outcome.drained,
    }))?;
    log_opened_slot(logger, outcome.opened)
}

/// Assign ids to queued premint beneficiaries, processing at most `max_addresses` entries.
///
///  It rejects if:
///  - Fails to parse `BatchParams` parameters.
///  - Sender is neither one of the admins nor one of the maintainers.
///  - Direct minting is not open.
///  - No seed is active.
///  - The ledger rejects a minted id.
#[receive(
    mutable,
    contract = "OvertureSale",
    name = "batchMint",
    parameter = "BatchParams",
    enable_logger
)]
fn contract_batch_mint<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    ensure_maintainer(ctx, host)?;
    let params = BatchParams::deserial(&mut ctx.parameter_cursor())?;
    let outcome = host.state_mut().batch_mint(params.max_addresses)?;

    record_mints(host, &outcome.assigned)?;
    logger.log(&SaleEvents::BatchAssigned(BatchAssignedEvent {
        count: outcome.assigned.len() as u32,
        next_entry: outcome.next_entry,
        drained: outcome.drained,
    }))?;
    log_opened_slot(logger, outcome.opened)
}

/// Start a Dutch auction over the units left in the current slot.
///
///  It rejects if:
///  - Fails to parse `InitiateAuctionParams` parameters.
///  - Sender is neither one of the admins nor one of the maintainers.
///  - The sale is not in the auction phase.
///  - The previous auction is still active or has buyers waiting for their ids.
///  - Duration is zero or the reserve price is above the starting price.
#[receive(
    mutable,
    contract = "OvertureSale",
    name = "initiateAuction",
    parameter = "InitiateAuctionParams",
    enable_logger
)]
fn contract_initiate_auction<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    ensure_maintainer(ctx, host)?;
    let params = InitiateAuctionParams::deserial(&mut ctx.parameter_cursor())?;
    let (index, auction) = host
        .state_mut()
        .initiate_auction(&params, ctx.metadata().slot_time())?;
    logger.log(&SaleEvents::auction_initiated(index, &auction))?;
    Ok(())
}

/// Buy one unit of the current auction at its current price. The id is assigned when
/// the buyer's random value is delivered. Overpayment is kept.
///
///  It rejects if:
///  - Sender is not an account.
///  - There is no active auction or it has expired.
///  - Payment is below the current price.
///  - The buyer is still waiting for an id from an earlier purchase.
///  - The fee reserve cannot cover the oracle fee.
#[receive(
    mutable,
    payable,
    contract = "OvertureSale",
    name = "buy",
    enable_logger
)]
fn contract_buy<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    amount: Amount,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let buyer = sender_account(ctx)?;
    let purchase = host
        .state_mut()
        .buy(buyer, amount, ctx.metadata().slot_time())?;

    logger.log(&SaleEvents::auction_purchase(
        purchase.index,
        &buyer,
        purchase.price,
        purchase.request.request_id,
    ))?;
    logger.log(&SaleEvents::requested(
        purchase.request.request_id,
        &RandomnessContext::Buyer(buyer),
    ))?;
    pay_oracle(host, &purchase.request)
}

/// Fund the reserve that pays for oracle requests.
#[receive(
    mutable,
    payable,
    contract = "OvertureSale",
    name = "depositOracleFee",
    enable_logger
)]
fn contract_deposit_oracle_fee<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    amount: Amount,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let oracle = &mut host.state_mut().oracle;
    oracle.deposit(amount)?;
    logger.log(&SaleEvents::FeeDeposited(FeeDepositEvent {
        amount,
        reserve: oracle.fee_reserve,
    }))?;
    Ok(())
}

/// Transfer the sale proceeds to the custody wallet. The oracle fee reserve stays.
///
///  It rejects if:
///  - Sender is neither one of the admins nor the wallet.
#[receive(
    mutable,
    contract = "OvertureSale",
    name = "retrieveFunds",
    enable_logger
)]
fn contract_retrieve_funds<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let sender = ctx.sender();
    let wallet = host.state().config.wallet;
    ensure!(
        host.state().authority.has_admin_rights(&sender) || sender == Address::Account(wallet),
        CustomContractError::Unauthorized.into()
    );

    let amount = host.state().withdrawable(host.self_balance());
    if amount > Amount::zero() {
        host.invoke_transfer(&wallet, amount)?;
    }
    logger.log(&SaleEvents::FundsRetrieved(FundsRetrievedEvent {
        wallet: &wallet,
        amount,
    }))?;
    Ok(())
}

/// Royalty receiver and amount for a secondary sale of `sale_amount`.
#[receive(
    contract = "OvertureSale",
    name = "royaltyInfo",
    parameter = "RoyaltyParams",
    return_value = "RoyaltyInfo"
)]
fn contract_royalty_info<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<RoyaltyInfo> {
    let params = RoyaltyParams::deserial(&mut ctx.parameter_cursor())?;
    Ok(host.state().royalty_info(params.sale_amount))
}

#[receive(contract = "OvertureSale", name = "viewSupply", return_value = "SupplyView")]
fn contract_view_supply<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<SupplyView> {
    Ok(host.state().supply_view())
}

#[receive(
    contract = "OvertureSale",
    name = "viewAllowance",
    parameter = "AccountAddress",
    return_value = "AllowanceView"
)]
fn contract_view_allowance<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<AllowanceView> {
    let account = AccountAddress::deserial(&mut ctx.parameter_cursor())?;
    let state = host.state();
    Ok(AllowanceView {
        presale: state.whitelist.entry(&account),
        premint: state.premints.allowance(&account),
    })
}

#[receive(
    contract = "OvertureSale",
    name = "viewAuction",
    parameter = "u32",
    return_value = "Option<AuctionState>"
)]
fn contract_view_auction<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<Option<AuctionState>> {
    let index = u32::deserial(&mut ctx.parameter_cursor())?;
    Ok(host.state().auction(index))
}

/// Price of the latest auction at the current slot time.
#[receive(
    contract = "OvertureSale",
    name = "viewCurrentPrice",
    return_value = "Option<PriceView>"
)]
fn contract_view_current_price<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<Option<PriceView>> {
    let now = ctx.metadata().slot_time();
    Ok(host
        .state()
        .current_auction()
        .map(|(index, auction)| PriceView {
            index,
            status: auction.status(now),
            price: auction.price_at(now),
            tokens_left: auction.tokens_left,
        }))
}

#[receive(
    contract = "OvertureSale",
    name = "hasPendingRequest",
    parameter = "RandomnessContext",
    return_value = "bool"
)]
fn contract_has_pending_request<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<bool> {
    let context = RandomnessContext::deserial(&mut ctx.parameter_cursor())?;
    Ok(host.state().oracle.is_pending(&context))
}

/// Function to manage addresses that are allowed to maintain the sale or deliver randomness.
///
///  It rejects if:
///  - Fails to parse `AuthorityUpdateParams` parameters.
///  - If sender is neither one of the admins nor one of the maintainers.
#[receive(
    mutable,
    contract = "OvertureSale",
    name = "updateAuthority",
    parameter = "AuthorityUpdateParams"
)]
fn update_authority<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<()> {
    let params = AuthorityUpdateParams::deserial(&mut ctx.parameter_cursor())?;
    let sender = ctx.sender();
    host.state_mut().authority.handle_update(sender, params)?;
    Ok(())
}

/// Function to view addresses that are allowed to maintain the sale or deliver randomness.
#[receive(
    contract = "OvertureSale",
    name = "viewAuthority",
    parameter = "AuthorityViewParams",
    return_value = "Vec<Address>"
)]
fn view_authority<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<Vec<Address>> {
    let params = AuthorityViewParams::deserial(&mut ctx.parameter_cursor())?;
    Ok(host.state().authority.handle_view(params))
}

/// Function to update values required for internal contract functionality. This includes:
/// - Wallet. Account receiving the sale proceeds and royalties.
/// - Ledger. Contract recording minted ids.
/// - Oracle account and fee. Every randomness request pays the fee to the oracle account.
/// - Presale and premint prices.
/// - Allowance cap and the number of ids a single batch call may assign.
/// - Royalty rate in basis points.
///
///  It rejects if:
///  - Fails to parse `InternalValue` parameters.
///  - If sender is neither one of the admins nor one of the maintainers.
///  - A price or a limit is zero, or the royalty exceeds 100%.
#[receive(
    mutable,
    contract = "OvertureSale",
    name = "updateInternalValue",
    parameter = "InternalValue"
)]
fn update_internal_value<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<()> {
    ensure_maintainer(ctx, host)?;

    let state = host.state_mut();
    let params = InternalValue::deserial(&mut ctx.parameter_cursor())?;

    match params {
        InternalValue::Wallet(account) => state.config.wallet = account,
        InternalValue::Ledger(contract) => state.config.ledger = contract,
        InternalValue::OracleAccount(account) => state.config.oracle_account = account,
        InternalValue::OracleFee(fee) => state.oracle.fee = fee,
        InternalValue::PresalePrice(price) => {
            ensure!(price.micro_ccd > 0, CustomContractError::InvalidConfig.into());
            state.config.presale_price = price;
        }
        InternalValue::PremintPrice(price) => {
            ensure!(price.micro_ccd > 0, CustomContractError::InvalidConfig.into());
            state.config.premint_price = price;
        }
        InternalValue::AllowanceCap(cap) => {
            ensure!(cap > 0, CustomContractError::InvalidConfig.into());
            state.config.allowance_cap = cap;
        }
        InternalValue::MaxUnitsPerCall(units) => {
            ensure!(units > 0, CustomContractError::InvalidConfig.into());
            state.config.max_units_per_call = units;
        }
        InternalValue::Royalty(royalty) => {
            ensure!(royalty.is_valid(), CustomContractError::InvalidConfig.into());
            state.config.royalty = royalty;
        }
    }

    Ok(())
}

/// Function to view values required for internal contract functionality.
///
///  It rejects if:
///  - Fails to parse `ViewInternalValueParams` parameters.
#[receive(
    contract = "OvertureSale",
    name = "viewInternalValue",
    parameter = "ViewInternalValueParams",
    return_value = "InternalValue"
)]
fn view_internal_value<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<InternalValue> {
    let state = host.state();
    let params = ViewInternalValueParams::deserial(&mut ctx.parameter_cursor())?;

    let value = match params {
        ViewInternalValueParams::Wallet => InternalValue::Wallet(state.config.wallet),
        ViewInternalValueParams::Ledger => InternalValue::Ledger(state.config.ledger),
        ViewInternalValueParams::OracleAccount => {
            InternalValue::OracleAccount(state.config.oracle_account)
        }
        ViewInternalValueParams::OracleFee => InternalValue::OracleFee(state.oracle.fee),
        ViewInternalValueParams::PresalePrice => {
            InternalValue::PresalePrice(state.config.presale_price)
        }
        ViewInternalValueParams::PremintPrice => {
            InternalValue::PremintPrice(state.config.premint_price)
        }
        ViewInternalValueParams::AllowanceCap => {
            InternalValue::AllowanceCap(state.config.allowance_cap)
        }
        ViewInternalValueParams::MaxUnitsPerCall => {
            InternalValue::MaxUnitsPerCall(state.config.max_units_per_call)
        }
        ViewInternalValueParams::Royalty => InternalValue::Royalty(state.config.royalty),
    };

    Ok(value)
}

fn sender_account(ctx: &impl HasReceiveContext) -> ReceiveResult<AccountAddress> {
    if let Address::Account(account) = ctx.sender() {
        Ok(account)
    } else {
        bail!(CustomContractError::OnlyAccountAddress.into())
    }
}

fn ensure_maintainer<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<()> {
    ensure!(
        host.state().authority.has_maintainer_rights(&ctx.sender()),
        CustomContractError::Unauthorized.into()
    );
    Ok(())
}

// Move the request fee to the oracle account.
fn pay_oracle<S: HasStateApi>(
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    request: &OracleRequest,
) -> ReceiveResult<()> {
    if request.fee > Amount::zero() {
        let oracle = host.state().config.oracle_account;
        host.invoke_transfer(&oracle, request.fee)?;
    }
    Ok(())
}

fn record_mints<S: HasStateApi>(
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    assigned: &[(AccountAddress, TokenId)],
) -> ReceiveResult<()> {
    let ledger = host.state().config.ledger;
    for (owner, token_id) in assigned.iter() {
        host.ledger_record_mint(&ledger, Address::Account(*owner), *token_id)
            .map_err(CustomContractError::from)?;
    }
    Ok(())
}

fn log_opened_slot(logger: &mut impl HasLogger, opened: Option<PoolBounds>) -> ReceiveResult<()> {
    if let Some(pool) = opened {
        logger.log(&SaleEvents::slot_opened(&pool))?;
    }
    Ok(())
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use crate::allocation::RandomValue;
    use crate::phase::{Phase, SupplySchedule};
    use concordium_std::test_infrastructure::*;
    use overture_commons::test::*;
    use overture_commons::{
        AuthorityField, AuthorityUpdateKind, BasisPoints, RecordMintParams, DEFAULT_ALLOWANCE_CAP,
    };
    use std::{cell::RefCell, collections::BTreeSet, rc::Rc};

    const LEDGER: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };

    const ADMIN: AccountAddress = AccountAddress([1; 32]);
    const MAINTAINER: AccountAddress = AccountAddress([2; 32]);
    const ORACLE: AccountAddress = AccountAddress([3; 32]);
    const WALLET: AccountAddress = AccountAddress([4; 32]);

    const USER_1: AccountAddress = AccountAddress([16; 32]);
    const USER_2: AccountAddress = AccountAddress([17; 32]);

    const ORACLE_FEE: Amount = Amount::from_ccd(1);

    fn test_slot_time() -> Timestamp {
        Timestamp::from_timestamp_millis(1_000_000)
    }

    /// Two-slot presale, one direct slot and two auction slots of two ids.
    fn small_schedule() -> SupplySchedule {
        SupplySchedule {
            max_supply: 12,
            presale_cap: 4,
            auction_threshold: 8,
            batch_slot_size: 4,
            auction_slot_size: 2,
        }
    }

    fn init_params(schedule: SupplySchedule) -> InitParams {
        InitParams {
            ledger: LEDGER,
            wallet: WALLET,
            oracle: ORACLE,
            oracle_fee: ORACLE_FEE,
            presale_price: Amount::from_micro_ccd(100_000),
            premint_price: Amount::from_micro_ccd(200_000),
            allowance_cap: DEFAULT_ALLOWANCE_CAP,
            max_units_per_call: 100,
            royalty: BasisPoints::new(750).expect_report("Valid rate"),
            schedule,
        }
    }

    fn new_host(schedule: SupplySchedule) -> TestHost<State<TestStateApi>> {
        let mut ctx = TestInitContext::empty();
        // admin is initialized to `ctx.origin()`
        let bytes = to_bytes(&init_params(schedule));
        ctx.set_init_origin(ADMIN).set_parameter(&bytes);
        let mut state_builder = TestStateBuilder::new();

        // Call the init method.
        let state = contract_init(&ctx, &mut state_builder)
            .expect_report("Failed during init_OvertureSale");

        let mut host = TestHost::new(state, state_builder);

        let params = AuthorityUpdateParams {
            field: AuthorityField::Maintainer,
            kind: AuthorityUpdateKind::Add,
            address: Address::Account(MAINTAINER),
        };
        let bytes = to_bytes(&params);
        let ctx = receive_ctx(ADMIN, &bytes);
        let result = update_authority(&ctx, &mut host);
        claim_eq!(result, Ok(()));

        host
    }

    fn default_host() -> TestHost<State<TestStateApi>> {
        new_host(small_schedule())
    }

    fn receive_ctx(sender: AccountAddress, parameter: &[u8]) -> TestReceiveContext {
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(sender))
            .set_invoker(sender)
            .set_parameter(parameter)
            .set_metadata_slot_time(test_slot_time());
        ctx
    }

    fn record_ledger_calls(
        host: &mut TestHost<State<TestStateApi>>,
    ) -> Rc<RefCell<Vec<RecordMintParams>>> {
        let calls = Rc::new(RefCell::new(Vec::new()));
        host.setup_mock_entrypoint(
            LEDGER,
            OwnedEntrypointName::new_unchecked(String::from("mint")),
            recording_mock::<RecordMintParams, _>(calls.clone()),
        );
        calls
    }

    fn deposit_fee(host: &mut TestHost<State<TestStateApi>>, amount: Amount) {
        let ctx = receive_ctx(ADMIN, &[]);
        let mut logger = TestLogger::init();
        let result = contract_deposit_oracle_fee(&ctx, host, amount, &mut logger);
        claim_eq!(result, Ok(()));
    }

    fn set_whitelisting(host: &mut TestHost<State<TestStateApi>>, enabled: bool) {
        let bytes = to_bytes(&enabled);
        let ctx = receive_ctx(MAINTAINER, &bytes);
        let mut logger = TestLogger::init();
        let result = contract_set_whitelisting(&ctx, host, &mut logger);
        claim_eq!(result, Ok(()));
    }

    fn request_batch(host: &mut TestHost<State<TestStateApi>>) -> ReceiveResult<()> {
        let ctx = receive_ctx(MAINTAINER, &[]);
        let mut logger = TestLogger::init();
        contract_request_batch_randomness(&ctx, host, &mut logger)
    }

    fn fulfill(
        host: &mut TestHost<State<TestStateApi>>,
        request_id: u64,
        value: u128,
    ) -> ReceiveResult<()> {
        let bytes = to_bytes(&FulfillParams {
            request_id,
            value: RandomValue::from_u128(value),
        });
        let ctx = receive_ctx(ORACLE, &bytes);
        let mut logger = TestLogger::init();
        contract_fulfill_randomness(&ctx, host, &mut logger)
    }

    fn premint(
        host: &mut TestHost<State<TestStateApi>>,
        payer: AccountAddress,
        beneficiary: Option<AccountAddress>,
        amount: Amount,
    ) -> ReceiveResult<()> {
        let bytes = to_bytes(&PremintParams { beneficiary });
        let ctx = receive_ctx(payer, &bytes);
        let mut logger = TestLogger::init();
        contract_premint(&ctx, host, amount, &mut logger)
    }

    fn batch(
        host: &mut TestHost<State<TestStateApi>>,
        presale: bool,
        max_addresses: u32,
    ) -> ReceiveResult<()> {
        let bytes = to_bytes(&BatchParams { max_addresses });
        let ctx = receive_ctx(MAINTAINER, &bytes);
        let mut logger = TestLogger::init();
        if presale {
            contract_presale_mint(&ctx, host, &mut logger)
        } else {
            contract_batch_mint(&ctx, host, &mut logger)
        }
    }

    fn initiate_auction(host: &mut TestHost<State<TestStateApi>>) -> ReceiveResult<()> {
        let bytes = to_bytes(&InitiateAuctionParams {
            duration_seconds: 100,
            deduction_rate: Amount::zero(),
            starting_price: Amount::from_ccd(1),
            reserve_price: Amount::from_ccd(1),
        });
        let ctx = receive_ctx(MAINTAINER, &bytes);
        let mut logger = TestLogger::init();
        contract_initiate_auction(&ctx, host, &mut logger)
    }

    fn buy(host: &mut TestHost<State<TestStateApi>>, buyer: AccountAddress) -> ReceiveResult<()> {
        let ctx = receive_ctx(buyer, &[]);
        let mut logger = TestLogger::init();
        contract_buy(&ctx, host, Amount::from_ccd(1), &mut logger)
    }

    fn supply(host: &TestHost<State<TestStateApi>>) -> SupplyView {
        let ctx = receive_ctx(USER_1, &[]);
        contract_view_supply(&ctx, host).expect_report("Supply view failed")
    }

    #[concordium_test]
    fn test_init() {
        let host = default_host();
        let state = host.state();

        claim_eq!(state.config.ledger, LEDGER);
        claim_eq!(state.config.wallet, WALLET);
        claim_eq!(state.oracle.fee, ORACLE_FEE);
        claim_eq!(state.phase(), Phase::PresaleOpen);
        claim_eq!(state.counters.supply_left, 4);

        claim!(state.authority.has_admin_rights(&Address::Account(ADMIN)));
        claim!(state
            .authority
            .has_maintainer_rights(&Address::Account(MAINTAINER)));
        claim!(!state
            .authority
            .has_admin_rights(&Address::Account(MAINTAINER)));
        claim!(state.authority.is_trusted_oracle(&Address::Account(ORACLE)));
        claim!(!state.authority.is_trusted_oracle(&Address::Account(ADMIN)));
    }

    #[concordium_test]
    fn test_init_rejects_invalid_config() {
        let mut params = init_params(small_schedule());
        params.premint_price = Amount::zero();
        let bytes = to_bytes(&params);
        let mut ctx = TestInitContext::empty();
        ctx.set_init_origin(ADMIN).set_parameter(&bytes);
        let mut state_builder = TestStateBuilder::new();

        let result = contract_init(&ctx, &mut state_builder).map(|_| ());
        claim_eq!(result, Err(CustomContractError::InvalidConfig.into()));
    }

    #[concordium_test]
    fn test_contribute() {
        let mut host = new_host(SupplySchedule::default());

        let ctx = receive_ctx(USER_1, &[]);
        let mut logger = TestLogger::init();
        let result =
            contract_contribute(&ctx, &mut host, Amount::from_micro_ccd(100_000), &mut logger);
        claim_eq!(result, Ok(()));
        claim_eq!(host.state().whitelist.entry(&USER_1).allowance, 1);
        claim_eq!(host.state().counters.supply_left, 999);
        claim_eq!(
            logger.logs,
            vec![to_bytes(&SaleEvents::contribution(&USER_1, 1, 1))]
        );

        // 30 units would pass the cap of 25.
        let ctx = receive_ctx(USER_2, &[]);
        let result = contract_contribute(&ctx, &mut host, Amount::from_ccd(3), &mut logger);
        claim_eq!(result, Err(CustomContractError::AboveMaximum.into()));
        claim_eq!(host.state().whitelist.entry(&USER_2).allowance, 0);
        claim_eq!(host.state().counters.supply_left, 999);
    }

    #[concordium_test]
    fn test_contribute_only_from_accounts() {
        let mut host = default_host();

        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Contract(LEDGER));
        let mut logger = TestLogger::init();
        let result = contract_contribute(&ctx, &mut host, Amount::from_ccd(1), &mut logger);
        claim_eq!(result, Err(CustomContractError::OnlyAccountAddress.into()));
    }

    #[concordium_test]
    fn test_maintainer_only_entrypoints() {
        let mut host = default_host();
        let mut logger = TestLogger::init();

        let bytes = to_bytes(&AssignParams {
            address: USER_1,
            count: 1,
        });
        let ctx = receive_ctx(USER_1, &bytes);
        let result = contract_assign(&ctx, &mut host, &mut logger);
        claim_eq!(result, Err(CustomContractError::Unauthorized.into()));

        let ctx = receive_ctx(USER_1, &[]);
        let result = contract_request_batch_randomness(&ctx, &mut host, &mut logger);
        claim_eq!(result, Err(CustomContractError::Unauthorized.into()));

        let ctx = receive_ctx(MAINTAINER, &bytes);
        let result = contract_assign(&ctx, &mut host, &mut logger);
        claim_eq!(result, Ok(()));
        claim_eq!(host.state().whitelist.entry(&USER_1).allowance, 1);
    }

    #[concordium_test]
    fn test_premint_before_presale_completion() {
        let mut host = default_host();
        let result = premint(&mut host, USER_1, None, Amount::from_ccd(1));
        claim_eq!(result, Err(CustomContractError::PresaleNotCompleted.into()));
    }

    #[concordium_test]
    fn test_fulfillment_requires_trusted_oracle() {
        let mut host = default_host();
        let bytes = to_bytes(&FulfillParams {
            request_id: 0,
            value: RandomValue::from_u128(42),
        });
        let ctx = receive_ctx(USER_1, &bytes);
        let mut logger = TestLogger::init();
        let result = contract_fulfill_randomness(&ctx, &mut host, &mut logger);
        claim_eq!(result, Err(CustomContractError::Unauthorized.into()));

        let result = fulfill(&mut host, 0, 42);
        claim_eq!(result, Err(CustomContractError::UnknownRequest.into()));
    }

    #[concordium_test]
    fn test_request_needs_fee_reserve() {
        let mut host = default_host();
        host.set_self_balance(Amount::from_ccd(10));

        let bytes = to_bytes(&AssignParams {
            address: USER_1,
            count: 2,
        });
        let ctx = receive_ctx(MAINTAINER, &bytes);
        let mut logger = TestLogger::init();
        claim_eq!(contract_assign(&ctx, &mut host, &mut logger), Ok(()));

        // Randomness is requested over a closed whitelist only.
        claim_eq!(
            request_batch(&mut host),
            Err(CustomContractError::PhaseNotEligible.into())
        );
        set_whitelisting(&mut host, false);

        claim_eq!(
            request_batch(&mut host),
            Err(CustomContractError::InsufficientFee.into())
        );

        deposit_fee(&mut host, Amount::from_ccd(1));
        claim_eq!(request_batch(&mut host), Ok(()));
        claim!(host.transfer_occurred(&ORACLE, ORACLE_FEE));
        claim_eq!(host.state().oracle.fee_reserve, Amount::zero());

        let bytes = to_bytes(&RandomnessContext::Batch);
        let ctx = receive_ctx(USER_1, &bytes);
        claim_eq!(contract_has_pending_request(&ctx, &host), Ok(true));
        claim_eq!(
            request_batch(&mut host),
            Err(CustomContractError::RequestAlreadyPending.into())
        );
    }

    #[concordium_test]
    fn test_full_sale() {
        let mut host = default_host();
        host.set_self_balance(Amount::from_ccd(100));
        let ledger_calls = record_ledger_calls(&mut host);
        deposit_fee(&mut host, ORACLE_FEE * 6);

        // Presale: two units bought, two assigned
        let ctx = receive_ctx(USER_1, &[]);
        let mut logger = TestLogger::init();
        let result =
            contract_contribute(&ctx, &mut host, Amount::from_micro_ccd(200_000), &mut logger);
        claim_eq!(result, Ok(()));
        let bytes = to_bytes(&AssignParams {
            address: USER_2,
            count: 2,
        });
        let ctx = receive_ctx(MAINTAINER, &bytes);
        claim_eq!(contract_assign(&ctx, &mut host, &mut logger), Ok(()));
        claim_eq!(supply(&host).supply_left, 0);

        set_whitelisting(&mut host, false);
        claim_eq!(
            batch(&mut host, true, 10),
            Err(CustomContractError::RandomnessNotReady.into())
        );
        claim_eq!(request_batch(&mut host), Ok(()));
        claim_eq!(fulfill(&mut host, 0, 42), Ok(()));
        claim_eq!(fulfill(&mut host, 0, 42), Err(CustomContractError::UnknownRequest.into()));
        claim_eq!(batch(&mut host, true, 10), Ok(()));

        let view = supply(&host);
        claim_eq!(view.phase, Phase::DirectMintOpen);
        claim_eq!(view.total_supply, 4);
        claim_eq!(view.supply_left, 4);
        claim_eq!(view.pool, PoolBounds::new(4, 8));
        claim!(!view.seed_ready);

        // Direct mint: one premint for another account, one for the sender
        claim_eq!(
            premint(&mut host, USER_1, Some(USER_2), Amount::from_micro_ccd(400_000)),
            Ok(())
        );
        claim_eq!(
            premint(&mut host, USER_1, None, Amount::from_micro_ccd(400_000)),
            Ok(())
        );
        claim_eq!(
            premint(&mut host, USER_2, None, Amount::from_micro_ccd(200_000)),
            Err(CustomContractError::AboveMaximum.into())
        );
        claim_eq!(request_batch(&mut host), Ok(()));
        claim_eq!(fulfill(&mut host, 1, 7_777), Ok(()));
        claim_eq!(batch(&mut host, false, 1), Ok(()));
        claim_eq!(supply(&host).total_supply, 6);
        claim_eq!(batch(&mut host, false, 1), Ok(()));

        let view = supply(&host);
        claim_eq!(view.phase, Phase::AuctionOnly);
        claim_eq!(view.pool, PoolBounds::new(8, 10));
        claim_eq!(
            premint(&mut host, USER_1, None, Amount::from_micro_ccd(200_000)),
            Err(CustomContractError::OnlyThroughAuction.into())
        );

        // Two auction slots of two ids each
        let mut request_id = 2;
        for _ in 0..2 {
            claim_eq!(initiate_auction(&mut host), Ok(()));
            claim_eq!(buy(&mut host, USER_1), Ok(()));
            claim_eq!(buy(&mut host, USER_2), Ok(()));
            claim_eq!(
                buy(&mut host, USER_1),
                Err(CustomContractError::AuctionNotActive.into())
            );
            claim_eq!(fulfill(&mut host, request_id, 1_000 + request_id as u128), Ok(()));
            claim_eq!(fulfill(&mut host, request_id + 1, 5), Ok(()));
            request_id += 2;
        }

        let view = supply(&host);
        claim_eq!(view.phase, Phase::SoldOut);
        claim_eq!(view.total_supply, 12);
        claim_eq!(view.supply_left, 0);
        claim_eq!(view.auction_count, 2);
        claim_eq!(
            initiate_auction(&mut host),
            Err(CustomContractError::PhaseNotEligible.into())
        );

        // Every id was recorded exactly once.
        let calls = ledger_calls.borrow();
        let ids: BTreeSet<u32> = calls.iter().map(|call| call.token_id.0).collect();
        claim_eq!(calls.len(), 12);
        claim_eq!(ids, (1..=12).collect::<BTreeSet<u32>>());
        let owned_by = |account: AccountAddress| {
            calls
                .iter()
                .filter(|call| call.owner == Address::Account(account))
                .count()
        };
        claim_eq!(owned_by(USER_1), 6);
        claim_eq!(owned_by(USER_2), 6);

        // Two batch requests and four purchases paid the oracle.
        claim_eq!(host.state().oracle.fee_reserve, Amount::zero());
    }

    #[concordium_test]
    fn test_buyer_fulfillment_records_mint() {
        let mut host = new_host(SupplySchedule::default());
        host.set_self_balance(Amount::from_ccd(10));
        host.state_mut().counters.total_supply = 8_000;
        host.state_mut().counters.supply_left = 200;
        host.state_mut().pool = PoolBounds::new(8_000, 8_200);
        deposit_fee(&mut host, ORACLE_FEE);
        host.setup_mock_entrypoint(
            LEDGER,
            OwnedEntrypointName::new_unchecked(String::from("mint")),
            parse_and_check_mock::<RecordMintParams, _>(
                |params| {
                    params.owner == Address::Account(USER_1) && params.token_id == TokenId(8_050)
                },
                (),
            ),
        );

        claim_eq!(initiate_auction(&mut host), Ok(()));
        claim_eq!(buy(&mut host, USER_1), Ok(()));
        claim!(host.transfer_occurred(&ORACLE, ORACLE_FEE));

        let bytes = to_bytes(&FulfillParams {
            request_id: 0,
            value: RandomValue::from_u128(20_049),
        });
        let ctx = receive_ctx(ORACLE, &bytes);
        let mut logger = TestLogger::init();
        let result = contract_fulfill_randomness(&ctx, &mut host, &mut logger);
        claim_eq!(result, Ok(()));
        claim_eq!(
            logger.logs,
            vec![
                to_bytes(&SaleEvents::fulfilled(0, &RandomnessContext::Buyer(USER_1))),
                to_bytes(&SaleEvents::assigned(&USER_1, TokenId(8_050))),
            ]
        );
        claim_eq!(host.state().counters.total_supply, 8_001);
        claim_eq!(host.state().counters.supply_left, 199);
    }

    #[concordium_test]
    fn test_auction_views() {
        let mut host = new_host(SupplySchedule::default());
        host.state_mut().counters.total_supply = 8_000;
        host.state_mut().counters.supply_left = 200;
        host.state_mut().pool = PoolBounds::new(8_000, 8_200);

        let ctx = receive_ctx(USER_1, &[]);
        claim_eq!(contract_view_current_price(&ctx, &host), Ok(None));

        let bytes = to_bytes(&InitiateAuctionParams {
            duration_seconds: 60,
            deduction_rate: Amount::from_micro_ccd(100_000),
            starting_price: Amount::from_ccd(2),
            reserve_price: Amount::from_ccd(1),
        });
        let ctx = receive_ctx(MAINTAINER, &bytes);
        let mut logger = TestLogger::init();
        claim_eq!(contract_initiate_auction(&ctx, &mut host, &mut logger), Ok(()));

        let mut ctx = receive_ctx(USER_1, &[]);
        ctx.set_metadata_slot_time(Timestamp::from_timestamp_millis(1_003_000));
        claim_eq!(
            contract_view_current_price(&ctx, &host),
            Ok(Some(PriceView {
                index: 0,
                status: crate::auction::AuctionStatus::Active,
                price: Amount::from_micro_ccd(1_700_000),
                tokens_left: 200,
            }))
        );

        let bytes = to_bytes(&0u32);
        let ctx = receive_ctx(USER_1, &bytes);
        let auction = contract_view_auction(&ctx, &host).expect_report("Auction view failed");
        claim_eq!(auction.map(|a| a.tokens_left), Some(200));
    }

    #[concordium_test]
    fn test_retrieve_funds() {
        let mut host = default_host();
        host.set_self_balance(Amount::from_ccd(10));
        deposit_fee(&mut host, Amount::from_ccd(2));

        let ctx = receive_ctx(USER_1, &[]);
        let mut logger = TestLogger::init();
        let result = contract_retrieve_funds(&ctx, &mut host, &mut logger);
        claim_eq!(result, Err(CustomContractError::Unauthorized.into()));

        let ctx = receive_ctx(WALLET, &[]);
        let result = contract_retrieve_funds(&ctx, &mut host, &mut logger);
        claim_eq!(result, Ok(()));
        claim!(host.transfer_occurred(&WALLET, Amount::from_ccd(8)));
        claim_eq!(
            logger.logs,
            vec![to_bytes(&SaleEvents::FundsRetrieved(FundsRetrievedEvent {
                wallet: &WALLET,
                amount: Amount::from_ccd(8),
            }))]
        );
    }

    #[concordium_test]
    fn test_royalty_info() {
        let host = default_host();
        let bytes = to_bytes(&RoyaltyParams {
            sale_amount: Amount::from_ccd(10),
        });
        let ctx = receive_ctx(USER_1, &bytes);
        claim_eq!(
            contract_royalty_info(&ctx, &host),
            Ok(RoyaltyInfo {
                receiver: WALLET,
                amount: Amount::from_micro_ccd(750_000),
            })
        );
    }

    #[concordium_test]
    fn test_update_internal_value() {
        let mut host = default_host();

        let bytes = to_bytes(&InternalValue::PresalePrice(Amount::from_ccd(1)));
        let ctx = receive_ctx(USER_1, &bytes);
        let result = update_internal_value(&ctx, &mut host);
        claim_eq!(result, Err(CustomContractError::Unauthorized.into()));

        let ctx = receive_ctx(MAINTAINER, &bytes);
        claim_eq!(update_internal_value(&ctx, &mut host), Ok(()));

        let bytes = to_bytes(&ViewInternalValueParams::PresalePrice);
        let ctx = receive_ctx(USER_1, &bytes);
        claim_eq!(
            view_internal_value(&ctx, &host),
            Ok(InternalValue::PresalePrice(Amount::from_ccd(1)))
        );

        let bytes = to_bytes(&InternalValue::AllowanceCap(0));
        let ctx = receive_ctx(MAINTAINER, &bytes);
        let result = update_internal_value(&ctx, &mut host);
        claim_eq!(result, Err(CustomContractError::InvalidConfig.into()));
    }
}
