use concordium_std::*;
use overture_commons::{ContractResult, CustomContractError};

/// What a random value is used for once it arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub enum RandomnessContext {
    /// Seed for draining the active allocation queue.
    Batch,
    /// Single id for an auction buyer.
    Buyer(AccountAddress),
}

/// An issued request and the fee it moves to the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct OracleRequest {
    pub request_id: u64,
    pub fee: Amount,
}

/// Book-keeping of randomness requests. At most one request per context is in flight.
#[derive(Serial, DeserialWithState)]
#[concordium(state_parameter = "S")]
pub struct RandomnessOracle<S: HasStateApi> {
    /// Fee paid to the oracle per request.
    pub fee: Amount,
    /// Funds set aside for oracle fees. Not withdrawable.
    pub fee_reserve: Amount,
    next_request_id: u64,
    requests: StateMap<u64, RandomnessContext, S>,
    in_flight: StateMap<RandomnessContext, u64, S>,
    buyers_in_flight: u32,
}

impl<S: HasStateApi> RandomnessOracle<S> {
    pub fn new(state_builder: &mut StateBuilder<S>, fee: Amount) -> Self {
        Self {
            fee,
            fee_reserve: Amount::zero(),
            next_request_id: 0,
            requests: state_builder.new_map(),
            in_flight: state_builder.new_map(),
            buyers_in_flight: 0,
        }
    }

    pub fn is_pending(&self, context: &RandomnessContext) -> bool {
        self.in_flight.get(context).is_some()
    }

    /// Auction purchases whose id has not been drawn yet.
    pub fn buyers_in_flight(&self) -> u32 {
        self.buyers_in_flight
    }

    /// Checks that a request for `context` can be issued now.
    pub fn check_request(&self, context: &RandomnessContext) -> ContractResult<()> {
        ensure!(
            !self.is_pending(context),
            CustomContractError::RequestAlreadyPending
        );
        ensure!(
            self.fee_reserve >= self.fee,
            CustomContractError::InsufficientFee
        );
        Ok(())
    }

    pub fn request(&mut self, context: RandomnessContext) -> ContractResult<OracleRequest> {
        self.check_request(&context)?;

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.fee_reserve = Amount::from_micro_ccd(self.fee_reserve.micro_ccd - self.fee.micro_ccd);
        self.requests.insert(request_id, context);
        self.in_flight.insert(context, request_id);
        if let RandomnessContext::Buyer(_) = context {
            self.buyers_in_flight += 1;
        }

        Ok(OracleRequest {
            request_id,
            fee: self.fee,
        })
    }

    pub fn context_of(&self, request_id: u64) -> ContractResult<RandomnessContext> {
        self.requests
            .get(&request_id)
            .map(|context| *context)
            .ok_or(CustomContractError::UnknownRequest)
    }

    /// Resolves a request. A request can only be resolved once.
    pub fn complete(&mut self, request_id: u64) -> ContractResult<RandomnessContext> {
        let context = self.context_of(request_id)?;
        self.requests.remove(&request_id);
        self.in_flight.remove(&context);
        if let RandomnessContext::Buyer(_) = context {
            self.buyers_in_flight = self.buyers_in_flight.saturating_sub(1);
        }
        Ok(context)
    }

    pub fn deposit(&mut self, amount: Amount) -> ContractResult<()> {
        self.fee_reserve = Amount::from_micro_ccd(
            self.fee_reserve
                .micro_ccd
                .checked_add(amount.micro_ccd)
                .ok_or(CustomContractError::Overflow)?,
        );
        Ok(())
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use concordium_std::test_infrastructure::*;

    const BUYER_1: AccountAddress = AccountAddress([16; 32]);
    const BUYER_2: AccountAddress = AccountAddress([17; 32]);

    fn oracle(fee: Amount, reserve: Amount) -> RandomnessOracle<TestStateApi> {
        let mut state_builder = TestStateBuilder::new();
        let mut oracle = RandomnessOracle::new(&mut state_builder, fee);
        claim_eq!(oracle.deposit(reserve), Ok(()));
        oracle
    }

    #[concordium_test]
    fn test_one_request_per_context() {
        let mut oracle = oracle(Amount::zero(), Amount::zero());

        let first = oracle
            .request(RandomnessContext::Batch)
            .expect_report("First request failed");
        claim_eq!(first.request_id, 0);
        claim_eq!(
            oracle.request(RandomnessContext::Batch),
            Err(CustomContractError::RequestAlreadyPending)
        );

        // Other contexts are independent.
        let buyer = oracle
            .request(RandomnessContext::Buyer(BUYER_1))
            .expect_report("Buyer request failed");
        let other = oracle
            .request(RandomnessContext::Buyer(BUYER_2))
            .expect_report("Buyer request failed");
        claim_eq!(buyer.request_id, 1);
        claim_eq!(other.request_id, 2);
        claim_eq!(oracle.buyers_in_flight(), 2);
        claim_eq!(
            oracle.request(RandomnessContext::Buyer(BUYER_1)),
            Err(CustomContractError::RequestAlreadyPending)
        );
    }

    #[concordium_test]
    fn test_completion_frees_context() {
        let mut oracle = oracle(Amount::zero(), Amount::zero());
        let request = oracle
            .request(RandomnessContext::Buyer(BUYER_1))
            .expect_report("Request failed");

        claim_eq!(
            oracle.complete(request.request_id),
            Ok(RandomnessContext::Buyer(BUYER_1))
        );
        claim!(!oracle.is_pending(&RandomnessContext::Buyer(BUYER_1)));
        claim_eq!(oracle.buyers_in_flight(), 0);
        claim_eq!(
            oracle.complete(request.request_id),
            Err(CustomContractError::UnknownRequest)
        );

        let again = oracle
            .request(RandomnessContext::Buyer(BUYER_1))
            .expect_report("Request failed");
        claim_eq!(again.request_id, 1);
    }

    #[concordium_test]
    fn test_fee_reserve() {
        let fee = Amount::from_ccd(2);
        let mut oracle = oracle(fee, Amount::from_ccd(3));

        let request = oracle
            .request(RandomnessContext::Batch)
            .expect_report("Request failed");
        claim_eq!(request.fee, fee);
        claim_eq!(oracle.fee_reserve, Amount::from_ccd(1));

        claim_eq!(
            oracle.request(RandomnessContext::Buyer(BUYER_1)),
            Err(CustomContractError::InsufficientFee)
        );
        claim!(!oracle.is_pending(&RandomnessContext::Buyer(BUYER_1)));
        claim_eq!(oracle.fee_reserve, Amount::from_ccd(1));
    }

    #[concordium_test]
    fn test_unknown_request() {
        let oracle = oracle(Amount::zero(), Amount::zero());
        claim_eq!(
            oracle.context_of(7),
            Err(CustomContractError::UnknownRequest)
        );
    }
}
