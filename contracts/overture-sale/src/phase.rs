use concordium_std::*;
use core::convert::TryFrom;
use overture_commons::{
    ContractResult, CustomContractError, AUCTION_SLOT_SIZE, AUCTION_THRESHOLD, BATCH_SLOT_SIZE,
    MAX_SUPPLY, PRESALE_SUPPLY,
};

use crate::allocation::{Draw, PoolBounds};

/// Sale phase, always derived from the total supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub enum Phase {
    PresaleOpen,
    DirectMintOpen,
    AuctionOnly,
    SoldOut,
}

/// Supply layout of the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub struct SupplySchedule {
    pub max_supply: u32,
    /// Ids `1..=presale_cap` are sold through the whitelist.
    pub presale_cap: u32,
    /// From this supply on, ids are only sold through auctions.
    pub auction_threshold: u32,
    pub batch_slot_size: u32,
    pub auction_slot_size: u32,
}

impl Default for SupplySchedule {
    fn default() -> Self {
        Self {
            max_supply: MAX_SUPPLY,
            presale_cap: PRESALE_SUPPLY,
            auction_threshold: AUCTION_THRESHOLD,
            batch_slot_size: BATCH_SLOT_SIZE,
            auction_slot_size: AUCTION_SLOT_SIZE,
        }
    }
}

impl SupplySchedule {
    pub fn is_valid(&self) -> bool {
        self.max_supply > 0
            && self.presale_cap <= self.auction_threshold
            && self.auction_threshold <= self.max_supply
            && self.batch_slot_size > 0
            && self.auction_slot_size > 0
    }

    pub fn phase_of(&self, total_supply: u32) -> Phase {
        if total_supply >= self.max_supply {
            Phase::SoldOut
        } else if total_supply >= self.auction_threshold {
            Phase::AuctionOnly
        } else if total_supply >= self.presale_cap {
            Phase::DirectMintOpen
        } else {
            Phase::PresaleOpen
        }
    }

    /// Slot that starts right after `lower_bound`, clipped to the end of its phase.
    pub fn slot_after(&self, lower_bound: u32) -> Option<PoolBounds> {
        let upper_bound = match self.phase_of(lower_bound) {
            Phase::SoldOut => return None,
            Phase::PresaleOpen => self.presale_cap,
            Phase::DirectMintOpen => lower_bound
                .saturating_add(self.batch_slot_size)
                .min(self.auction_threshold),
            Phase::AuctionOnly => lower_bound
                .saturating_add(self.auction_slot_size)
                .min(self.max_supply),
        };
        Some(PoolBounds::new(lower_bound, upper_bound))
    }
}

/// Supply counters of the sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, SchemaType)]
pub struct SupplyCounters {
    /// Ids permanently assigned.
    pub total_supply: u32,
    /// Units of the current slot that can still be sold.
    pub supply_left: u32,
}

impl SupplyCounters {
    /// Reserves `count` units of the current slot.
    pub fn reserve(&mut self, count: u32) -> ContractResult<()> {
        self.supply_left = self
            .supply_left
            .checked_sub(count)
            .ok_or(CustomContractError::AboveMaximum)?;
        Ok(())
    }

    pub fn record_assigned(&mut self, count: u32) -> ContractResult<()> {
        self.total_supply = self
            .total_supply
            .checked_add(count)
            .ok_or(CustomContractError::Overflow)?;
        Ok(())
    }
}

/// Units bought with `payment` at `unit_price`.
pub fn units_for(payment: Amount, unit_price: Amount) -> ContractResult<u32> {
    ensure!(
        unit_price.micro_ccd > 0,
        CustomContractError::InvalidConfig
    );
    let count = payment.micro_ccd / unit_price.micro_ccd;
    ensure!(count > 0, CustomContractError::InsufficientPayment);
    Ok(u32::try_from(count).unwrap_or(u32::MAX))
}

/// New allowance after adding `count` to `existing`, bounded by `cap`.
pub fn checked_allowance(existing: u32, count: u32, cap: u32) -> ContractResult<u32> {
    ensure!(existing < cap, CustomContractError::AlreadyTooMuch);
    existing
        .checked_add(count)
        .filter(|allowance| *allowance <= cap)
        .ok_or(CustomContractError::AboveMaximum)
}

/// Resume point of a queue drain: entry index and units of that entry already assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, SchemaType)]
pub struct QueueCursor {
    pub entry: u32,
    pub unit: u32,
}

/// Ordered beneficiaries waiting for ids.
pub trait AllocationQueue {
    fn cursor(&self) -> QueueCursor;
    fn set_cursor(&mut self, cursor: QueueCursor);
    /// Units entry `index` is still owed. Missing entries owe nothing.
    fn outstanding(&self, index: u32) -> Draw<AccountAddress>;
    /// Marks entry `index` as fully assigned.
    fn settle(&mut self, index: u32);
}

#[concordium_cfg_test]
mod tests {
    use super::*;

    #[concordium_test]
    fn test_phase_of_default_schedule() {
        let schedule = SupplySchedule::default();
        claim_eq!(schedule.phase_of(0), Phase::PresaleOpen);
        claim_eq!(schedule.phase_of(999), Phase::PresaleOpen);
        claim_eq!(schedule.phase_of(1_000), Phase::DirectMintOpen);
        claim_eq!(schedule.phase_of(7_999), Phase::DirectMintOpen);
        claim_eq!(schedule.phase_of(8_000), Phase::AuctionOnly);
        claim_eq!(schedule.phase_of(9_999), Phase::AuctionOnly);
        claim_eq!(schedule.phase_of(10_000), Phase::SoldOut);
    }

    #[concordium_test]
    fn test_slots_follow_phase_sizes() {
        let schedule = SupplySchedule::default();
        claim_eq!(schedule.slot_after(0), Some(PoolBounds::new(0, 1_000)));
        claim_eq!(schedule.slot_after(1_000), Some(PoolBounds::new(1_000, 2_000)));
        claim_eq!(schedule.slot_after(7_000), Some(PoolBounds::new(7_000, 8_000)));
        claim_eq!(schedule.slot_after(8_000), Some(PoolBounds::new(8_000, 8_200)));
        claim_eq!(schedule.slot_after(9_800), Some(PoolBounds::new(9_800, 10_000)));
        claim_eq!(schedule.slot_after(10_000), None);
    }

    #[concordium_test]
    fn test_slots_are_clipped_to_phase_end() {
        let schedule = SupplySchedule {
            max_supply: 25,
            presale_cap: 4,
            auction_threshold: 11,
            batch_slot_size: 4,
            auction_slot_size: 6,
        };
        claim!(schedule.is_valid());
        claim_eq!(schedule.slot_after(8), Some(PoolBounds::new(8, 11)));
        claim_eq!(schedule.slot_after(23), Some(PoolBounds::new(23, 25)));
    }

    #[concordium_test]
    fn test_invalid_schedules() {
        let base = SupplySchedule::default();
        claim!(!SupplySchedule {
            presale_cap: 9_000,
            ..base
        }
        .is_valid());
        claim!(!SupplySchedule {
            auction_slot_size: 0,
            ..base
        }
        .is_valid());
        claim!(!SupplySchedule {
            auction_threshold: 10_001,
            ..base
        }
        .is_valid());
    }

    #[concordium_test]
    fn test_units_for_payment() {
        let price = Amount::from_micro_ccd(100_000);
        claim_eq!(units_for(Amount::from_micro_ccd(100_000), price), Ok(1));
        claim_eq!(units_for(Amount::from_micro_ccd(299_999), price), Ok(2));
        claim_eq!(units_for(Amount::from_ccd(3), price), Ok(30));
        claim_eq!(
            units_for(Amount::from_micro_ccd(99_999), price),
            Err(CustomContractError::InsufficientPayment)
        );
    }

    #[concordium_test]
    fn test_allowance_cap() {
        claim_eq!(checked_allowance(0, 25, 25), Ok(25));
        claim_eq!(checked_allowance(20, 5, 25), Ok(25));
        claim_eq!(
            checked_allowance(0, 30, 25),
            Err(CustomContractError::AboveMaximum)
        );
        claim_eq!(
            checked_allowance(20, 6, 25),
            Err(CustomContractError::AboveMaximum)
        );
        claim_eq!(
            checked_allowance(25, 1, 25),
            Err(CustomContractError::AlreadyTooMuch)
        );
    }

    #[concordium_test]
    fn test_reserve_supply() {
        let mut counters = SupplyCounters {
            total_supply: 0,
            supply_left: 3,
        };
        claim_eq!(counters.reserve(2), Ok(()));
        claim_eq!(counters.reserve(2), Err(CustomContractError::AboveMaximum));
        claim_eq!(counters.supply_left, 1);
    }
}
