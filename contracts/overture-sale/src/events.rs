use concordium_std::*;
use overture_commons::{
    TokenId, AUCTION_INITIATED_TAG, AUCTION_PURCHASE_TAG, BATCH_ASSIGNED_TAG, CONTRIBUTION_TAG,
    FEE_DEPOSIT_TAG, FUNDS_RETRIEVED_TAG, PREMINT_TAG, RANDOMNESS_FULFILL_TAG,
    RANDOMNESS_REQUEST_TAG, SLOT_OPENED_TAG, TOKEN_ASSIGNED_TAG, WHITELIST_TOGGLE_TAG,
};

use crate::allocation::PoolBounds;
use crate::auction::AuctionState;
use crate::oracle::RandomnessContext;

/// Whitelist contribution or manual assignment.
#[derive(Debug, Serial)]
pub struct ContributionEvent<'a> {
    pub account: &'a AccountAddress,
    pub count: u32,
    /// Allowance after the contribution.
    pub allowance: u32,
}

#[derive(Debug, Serial)]
pub struct PremintEvent<'a> {
    pub payer: &'a AccountAddress,
    pub beneficiary: &'a AccountAddress,
    pub count: u32,
    pub allowance: u32,
}

#[derive(Debug, Serial)]
pub struct RandomnessEvent<'a> {
    pub request_id: u64,
    pub context: &'a RandomnessContext,
}

/// One id recorded on the ownership ledger.
#[derive(Debug, Serial)]
pub struct TokenAssignedEvent<'a> {
    pub owner: &'a AccountAddress,
    pub token_id: TokenId,
}

/// Summary of one batch call. Per-id records are kept by the ledger.
#[derive(Debug, Serial)]
pub struct BatchAssignedEvent {
    pub count: u32,
    /// Queue position after the call.
    pub next_entry: u32,
    pub drained: bool,
}

#[derive(Debug, Serial)]
pub struct SlotOpenedEvent<'a> {
    pub pool: &'a PoolBounds,
}

#[derive(Debug, Serial)]
pub struct AuctionInitiatedEvent<'a> {
    pub index: u32,
    pub auction: &'a AuctionState,
}

#[derive(Debug, Serial)]
pub struct AuctionPurchaseEvent<'a> {
    pub index: u32,
    pub buyer: &'a AccountAddress,
    pub price: Amount,
    pub request_id: u64,
}

#[derive(Debug, Serial)]
pub struct FeeDepositEvent {
    pub amount: Amount,
    /// Fee reserve after the deposit.
    pub reserve: Amount,
}

#[derive(Debug, Serial)]
pub struct FundsRetrievedEvent<'a> {
    pub wallet: &'a AccountAddress,
    pub amount: Amount,
}

#[derive(Debug, Serial)]
pub struct WhitelistToggleEvent {
    pub enabled: bool,
}

/// Tagged sale event to be serialized for the event log.
#[derive(Debug)]
pub enum SaleEvents<'a> {
    Contribution(ContributionEvent<'a>),
    Premint(PremintEvent<'a>),
    RandomnessRequested(RandomnessEvent<'a>),
    RandomnessFulfilled(RandomnessEvent<'a>),
    TokenAssigned(TokenAssignedEvent<'a>),
    BatchAssigned(BatchAssignedEvent),
    SlotOpened(SlotOpenedEvent<'a>),
    AuctionInitiated(AuctionInitiatedEvent<'a>),
    AuctionPurchase(AuctionPurchaseEvent<'a>),
    FeeDeposited(FeeDepositEvent),
    FundsRetrieved(FundsRetrievedEvent<'a>),
    WhitelistToggled(WhitelistToggleEvent),
}

impl<'a> SaleEvents<'a> {
    pub fn contribution(account: &'a AccountAddress, count: u32, allowance: u32) -> Self {
        Self::Contribution(ContributionEvent {
            account,
            count,
            allowance,
        })
    }

    pub fn premint(
        payer: &'a AccountAddress,
        beneficiary: &'a AccountAddress,
        count: u32,
        allowance: u32,
    ) -> Self {
        Self::Premint(PremintEvent {
            payer,
            beneficiary,
            count,
            allowance,
        })
    }

    pub fn requested(request_id: u64, context: &'a RandomnessContext) -> Self {
        Self::RandomnessRequested(RandomnessEvent {
            request_id,
            context,
        })
    }

    pub fn fulfilled(request_id: u64, context: &'a RandomnessContext) -> Self {
        Self::RandomnessFulfilled(RandomnessEvent {
            request_id,
            context,
        })
    }

    pub fn assigned(owner: &'a AccountAddress, token_id: TokenId) -> Self {
        Self::TokenAssigned(TokenAssignedEvent { owner, token_id })
    }

    pub fn slot_opened(pool: &'a PoolBounds) -> Self {
        Self::SlotOpened(SlotOpenedEvent { pool })
    }

    pub fn auction_initiated(index: u32, auction: &'a AuctionState) -> Self {
        Self::AuctionInitiated(AuctionInitiatedEvent { index, auction })
    }

    pub fn auction_purchase(
        index: u32,
        buyer: &'a AccountAddress,
        price: Amount,
        request_id: u64,
    ) -> Self {
        Self::AuctionPurchase(AuctionPurchaseEvent {
            index,
            buyer,
            price,
            request_id,
        })
    }
}

impl<'a> Serial for SaleEvents<'a> {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        match self {
            SaleEvents::Contribution(event) => {
                out.write_u8(CONTRIBUTION_TAG)?;
                event.serial(out)
            }
            SaleEvents::Premint(event) => {
                out.write_u8(PREMINT_TAG)?;
                event.serial(out)
            }
            SaleEvents::RandomnessRequested(event) => {
                out.write_u8(RANDOMNESS_REQUEST_TAG)?;
                event.serial(out)
            }
            SaleEvents::RandomnessFulfilled(event) => {
                out.write_u8(RANDOMNESS_FULFILL_TAG)?;
                event.serial(out)
            }
            SaleEvents::TokenAssigned(event) => {
                out.write_u8(TOKEN_ASSIGNED_TAG)?;
                event.serial(out)
            }
            SaleEvents::BatchAssigned(event) => {
                out.write_u8(BATCH_ASSIGNED_TAG)?;
                event.serial(out)
            }
            SaleEvents::SlotOpened(event) => {
                out.write_u8(SLOT_OPENED_TAG)?;
                event.serial(out)
            }
            SaleEvents::AuctionInitiated(event) => {
                out.write_u8(AUCTION_INITIATED_TAG)?;
                event.serial(out)
            }
            SaleEvents::AuctionPurchase(event) => {
                out.write_u8(AUCTION_PURCHASE_TAG)?;
                event.serial(out)
            }
            SaleEvents::FeeDeposited(event) => {
                out.write_u8(FEE_DEPOSIT_TAG)?;
                event.serial(out)
            }
            SaleEvents::FundsRetrieved(event) => {
                out.write_u8(FUNDS_RETRIEVED_TAG)?;
                event.serial(out)
            }
            SaleEvents::WhitelistToggled(event) => {
                out.write_u8(WHITELIST_TOGGLE_TAG)?;
                event.serial(out)
            }
        }
    }
}
