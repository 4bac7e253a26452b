use super::*;

use core::ops::Mul;

/// Rate expressed in hundredths of a percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, SchemaType)]
pub struct BasisPoints(u16);

impl BasisPoints {
    /// Returns `None` for rates above 100%.
    pub fn new(bps: u16) -> Option<Self> {
        if u64::from(bps) > BASIS_POINTS_SCALE {
            None
        } else {
            Some(Self(bps))
        }
    }

    pub fn is_valid(&self) -> bool {
        u64::from(self.0) <= BASIS_POINTS_SCALE
    }

    pub fn bps(&self) -> u16 {
        self.0
    }
}

impl Mul<Amount> for BasisPoints {
    type Output = Amount;

    fn mul(self, rhs: Amount) -> Self::Output {
        Amount::from_micro_ccd(
            (u128::from(rhs.micro_ccd) * u128::from(self.0) / u128::from(BASIS_POINTS_SCALE))
                as u64,
        )
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;

    #[concordium_test]
    fn test_royalty_share() {
        let rate = BasisPoints::new(750).expect_report("Valid rate");
        claim_eq!(rate * Amount::from_ccd(10), Amount::from_micro_ccd(750_000));
        claim_eq!(rate * Amount::zero(), Amount::zero());
    }

    #[concordium_test]
    fn test_rate_bounds() {
        claim!(BasisPoints::new(10_000).is_some());
        claim!(BasisPoints::new(10_001).is_none());
        claim_eq!(
            BasisPoints::new(10_000).expect_report("Valid rate") * Amount::from_ccd(3),
            Amount::from_ccd(3)
        );
    }
}
