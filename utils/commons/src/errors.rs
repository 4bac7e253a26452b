use super::*;

/// The custom errors the sale contract can produce.
#[derive(Serialize, Debug, PartialEq, Eq, Reject, SchemaType)]
pub enum CustomContractError {
    /// Failed parsing the parameter (Error code: -1).
    #[from(ParseError)]
    ParseParams,
    /// Failed logging: Log is full (Error code: -2).
    LogFull,
    /// Failed logging: Log is malformed (Error code: -3).
    LogMalformed,
    /// Failed to invoke a contract (Error code: -4).
    InvokeContractError,
    /// Failed to invoke a transfer (Error code: -5).
    InvokeTransferError,
    /// Unauthorized (Error code: -6)
    Unauthorized,
    /// Only account addresses can perform this action (Error code: -7).
    OnlyAccountAddress,
    /// Zero account used as a beneficiary (Error code: -8).
    InvalidAddress,
    /// Payment does not cover a single unit or the current price (Error code: -9).
    InsufficientPayment,
    /// Allowance or requested count exceeds the permitted maximum (Error code: -10).
    AboveMaximum,
    /// Address already holds the maximum allowance (Error code: -11).
    AlreadyTooMuch,
    /// Operation is not available in the current sale phase (Error code: -12).
    PhaseNotEligible,
    /// Presale supply is not fully minted yet (Error code: -13).
    PresaleNotCompleted,
    /// Remaining supply can only be bought through auctions (Error code: -14).
    OnlyThroughAuction,
    /// A randomness request for this context is already in flight (Error code: -15).
    RequestAlreadyPending,
    /// Fulfilment for a request that is not in flight (Error code: -16).
    UnknownRequest,
    /// Oracle fee reserve is below the per-request fee (Error code: -17).
    InsufficientFee,
    /// Auction has passed its expiry (Error code: -18).
    AuctionExpired,
    /// No auction is accepting purchases (Error code: -19).
    AuctionNotActive,
    /// An auction is still running (Error code: -20).
    AuctionStillActive,
    /// No token ids left in the active pool (Error code: -21).
    ExhaustedPool,
    /// No random seed is available for allocation (Error code: -22).
    RandomnessNotReady,
    /// There are no pending allocations to process (Error code: -23).
    NothingPending,
    /// Whitelisting is switched off (Error code: -24).
    WhitelistingDisabled,
    /// Inconsistent configuration values (Error code: -25).
    InvalidConfig,
    /// Counter overflow (Error code: -26).
    Overflow,
}

/// Mapping the logging errors to CustomContractError.
impl From<LogError> for CustomContractError {
    fn from(le: LogError) -> Self {
        match le {
            LogError::Full => Self::LogFull,
            LogError::Malformed => Self::LogMalformed,
        }
    }
}

/// Mapping errors related to contract invocations to CustomContractError.
impl<T> From<CallContractError<T>> for CustomContractError {
    fn from(_cce: CallContractError<T>) -> Self {
        Self::InvokeContractError
    }
}

/// Mapping errors related to transfers to CustomContractError.
impl From<TransferError> for CustomContractError {
    fn from(_te: TransferError) -> Self {
        Self::InvokeTransferError
    }
}
