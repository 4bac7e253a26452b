use concordium_std::*;
use overture_commons::{ContractResult, CustomContractError};

use crate::external::InitiateAuctionParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub enum AuctionStatus {
    NotStarted,
    Active,
    Expired,
    SoldOut,
}

/// One Dutch auction run. Records are kept after the run ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub struct AuctionState {
    pub starting_price: Amount,
    pub start_at: Timestamp,
    pub expires_at: Timestamp,
    /// Price drop per elapsed second.
    pub price_deduction_rate: Amount,
    pub tokens_left: u32,
    pub reserve_price: Amount,
}

impl AuctionState {
    pub fn new(
        params: &InitiateAuctionParams,
        slot_time: Timestamp,
        tokens: u32,
    ) -> ContractResult<Self> {
        ensure!(
            params.duration_seconds > 0 && params.reserve_price <= params.starting_price,
            CustomContractError::InvalidConfig
        );
        let expires_at = slot_time
            .checked_add(Duration::from_seconds(params.duration_seconds))
            .ok_or(CustomContractError::Overflow)?;

        Ok(Self {
            starting_price: params.starting_price,
            start_at: slot_time,
            expires_at,
            price_deduction_rate: params.deduction_rate,
            tokens_left: tokens,
            reserve_price: params.reserve_price,
        })
    }

    /// Get auction status at given slot_time
    pub fn status(&self, slot_time: Timestamp) -> AuctionStatus {
        if slot_time < self.start_at {
            AuctionStatus::NotStarted
        } else if slot_time >= self.expires_at {
            AuctionStatus::Expired
        } else if self.tokens_left == 0 {
            AuctionStatus::SoldOut
        } else {
            AuctionStatus::Active
        }
    }

    /// Linear price decay over whole elapsed seconds, floored at the reserve price.
    pub fn price_at(&self, slot_time: Timestamp) -> Amount {
        let elapsed_seconds = slot_time
            .timestamp_millis()
            .saturating_sub(self.start_at.timestamp_millis())
            / 1000;
        let deduction = self
            .price_deduction_rate
            .micro_ccd
            .saturating_mul(elapsed_seconds);
        Amount::from_micro_ccd(
            self.starting_price
                .micro_ccd
                .saturating_sub(deduction)
                .max(self.reserve_price.micro_ccd),
        )
    }

    /// Price a purchase with `payment` would be accepted at. Does not change the record.
    pub fn quote(&self, payment: Amount, slot_time: Timestamp) -> ContractResult<Amount> {
        match self.status(slot_time) {
            AuctionStatus::Active => {}
            AuctionStatus::Expired => bail!(CustomContractError::AuctionExpired),
            AuctionStatus::NotStarted | AuctionStatus::SoldOut => {
                bail!(CustomContractError::AuctionNotActive)
            }
        }
        let price = self.price_at(slot_time);
        ensure!(payment >= price, CustomContractError::InsufficientPayment);
        Ok(price)
    }

    pub fn record_sale(&mut self) -> ContractResult<()> {
        self.tokens_left = self
            .tokens_left
            .checked_sub(1)
            .ok_or(CustomContractError::AuctionNotActive)?;
        Ok(())
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;

    const START_MILLIS: u64 = 1_000_000;

    fn at(seconds: u64) -> Timestamp {
        Timestamp::from_timestamp_millis(START_MILLIS + seconds * 1000)
    }

    fn auction(tokens: u32) -> AuctionState {
        AuctionState::new(
            &InitiateAuctionParams {
                duration_seconds: 60,
                deduction_rate: Amount::from_micro_ccd(100_000),
                starting_price: Amount::from_ccd(2),
                reserve_price: Amount::from_ccd(1),
            },
            at(0),
            tokens,
        )
        .expect_report("Valid auction")
    }

    #[concordium_test]
    fn test_price_decays_linearly() {
        let auction = auction(200);
        claim_eq!(auction.price_at(at(0)), Amount::from_ccd(2));
        claim_eq!(auction.price_at(at(1)), Amount::from_micro_ccd(1_900_000));
        claim_eq!(auction.price_at(at(3)), Amount::from_micro_ccd(1_700_000));
        // Partial seconds do not count.
        claim_eq!(
            auction.price_at(Timestamp::from_timestamp_millis(START_MILLIS + 3_999)),
            Amount::from_micro_ccd(1_700_000)
        );
    }

    #[concordium_test]
    fn test_price_never_below_reserve() {
        let auction = auction(200);
        claim_eq!(auction.price_at(at(10)), Amount::from_ccd(1));
        claim_eq!(auction.price_at(at(59)), Amount::from_ccd(1));

        let mut previous = auction.price_at(at(0));
        for second in 1..60 {
            let price = auction.price_at(at(second));
            claim!(price <= previous);
            claim!(price >= auction.reserve_price);
            previous = price;
        }
    }

    #[concordium_test]
    fn test_quote() {
        let auction = auction(200);
        claim_eq!(
            auction.quote(Amount::from_micro_ccd(1_700_000), at(3)),
            Ok(Amount::from_micro_ccd(1_700_000))
        );
        claim_eq!(
            auction.quote(Amount::from_micro_ccd(1_850_000), at(1)),
            Err(CustomContractError::InsufficientPayment)
        );
        // Exactly the reserve once the linear price crosses it.
        claim_eq!(
            auction.quote(Amount::from_ccd(1), at(10)),
            Ok(Amount::from_ccd(1))
        );
        claim_eq!(
            auction.quote(Amount::from_ccd(5), at(60)),
            Err(CustomContractError::AuctionExpired)
        );
    }

    #[concordium_test]
    fn test_status_transitions() {
        let mut auction = auction(1);
        claim_eq!(
            auction.status(Timestamp::from_timestamp_millis(START_MILLIS - 1)),
            AuctionStatus::NotStarted
        );
        claim_eq!(auction.status(at(0)), AuctionStatus::Active);
        claim_eq!(auction.status(at(60)), AuctionStatus::Expired);

        claim_eq!(auction.record_sale(), Ok(()));
        claim_eq!(auction.status(at(1)), AuctionStatus::SoldOut);
        claim_eq!(
            auction.quote(Amount::from_ccd(2), at(1)),
            Err(CustomContractError::AuctionNotActive)
        );
        claim_eq!(auction.status(at(61)), AuctionStatus::Expired);
    }

    #[concordium_test]
    fn test_invalid_parameters() {
        let params = InitiateAuctionParams {
            duration_seconds: 60,
            deduction_rate: Amount::from_micro_ccd(100_000),
            starting_price: Amount::from_ccd(1),
            reserve_price: Amount::from_ccd(2),
        };
        claim_eq!(
            AuctionState::new(&params, at(0), 200),
            Err(CustomContractError::InvalidConfig)
        );

        let params = InitiateAuctionParams {
            duration_seconds: 0,
            reserve_price: Amount::from_ccd(1),
            ..params
        };
        claim_eq!(
            AuctionState::new(&params, at(0), 200),
            Err(CustomContractError::InvalidConfig)
        );
    }
}
