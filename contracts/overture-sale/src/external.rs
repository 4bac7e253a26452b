use concordium_std::*;
use overture_commons::BasisPoints;

use crate::allocation::{PoolBounds, RandomValue};
use crate::auction::AuctionStatus;
use crate::phase::{Phase, SupplySchedule};
use crate::whitelist::WhitelistEntry;

#[derive(Debug, Clone, SchemaType, Serialize)]
pub struct InitParams {
    /// Ownership ledger that records every minted id.
    pub ledger: ContractAddress,
    /// Custody account receiving sale proceeds.
    pub wallet: AccountAddress,
    /// Randomness provider. Receives request fees and is trusted to fulfil requests.
    pub oracle: AccountAddress,
    pub oracle_fee: Amount,
    pub presale_price: Amount,
    pub premint_price: Amount,
    /// Maximum allowance per address.
    pub allowance_cap: u32,
    /// Maximum ids assigned by one batch call.
    pub max_units_per_call: u32,
    pub royalty: BasisPoints,
    pub schedule: SupplySchedule,
}

#[derive(Debug, Clone, SchemaType, Serialize)]
pub struct AssignParams {
    pub address: AccountAddress,
    pub count: u32,
}

#[derive(Debug, Clone, SchemaType, Serialize)]
pub struct PremintParams {
    /// Account receiving the ids. The sender by default.
    pub beneficiary: Option<AccountAddress>,
}

#[derive(Debug, Clone, SchemaType, Serialize)]
pub struct BatchParams {
    /// Maximum queue entries processed by this call.
    pub max_addresses: u32,
}

#[derive(Debug, Clone, SchemaType, Serialize)]
pub struct FulfillParams {
    pub request_id: u64,
    pub value: RandomValue,
}

#[derive(Debug, Clone, SchemaType, Serialize)]
pub struct InitiateAuctionParams {
    pub duration_seconds: u64,
    /// Price drop per second.
    pub deduction_rate: Amount,
    pub starting_price: Amount,
    pub reserve_price: Amount,
}

#[derive(Debug, Clone, SchemaType, Serialize)]
pub struct RoyaltyParams {
    pub sale_amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, SchemaType, Serialize)]
pub struct RoyaltyInfo {
    pub receiver: AccountAddress,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, SchemaType, Serialize)]
pub struct SupplyView {
    pub phase: Phase,
    pub total_supply: u32,
    pub supply_left: u32,
    pub pool: PoolBounds,
    /// A batch seed is ready for draining.
    pub seed_ready: bool,
    pub auction_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, SchemaType, Serialize)]
pub struct AllowanceView {
    pub presale: WhitelistEntry,
    pub premint: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, SchemaType, Serialize)]
pub struct PriceView {
    pub index: u32,
    pub status: AuctionStatus,
    pub price: Amount,
    pub tokens_left: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, SchemaType, Serialize)]
pub enum InternalValue {
    Wallet(AccountAddress),
    Ledger(ContractAddress),
    OracleAccount(AccountAddress),
    OracleFee(Amount),
    PresalePrice(Amount),
    PremintPrice(Amount),
    AllowanceCap(u32),
    MaxUnitsPerCall(u32),
    Royalty(BasisPoints),
}

#[derive(Debug, Clone, SchemaType, Serialize)]
pub enum ViewInternalValueParams {
    Wallet,
    Ledger,
    OracleAccount,
    OracleFee,
    PresalePrice,
    PremintPrice,
    AllowanceCap,
    MaxUnitsPerCall,
    Royalty,
}
