/// Tag for the Contribution event.
pub const CONTRIBUTION_TAG: u8 = u8::MAX;

/// Tag for the Premint event.
pub const PREMINT_TAG: u8 = u8::MAX - 1;

/// Tag for the RandomnessRequested event.
pub const RANDOMNESS_REQUEST_TAG: u8 = u8::MAX - 2;

/// Tag for the RandomnessFulfilled event.
pub const RANDOMNESS_FULFILL_TAG: u8 = u8::MAX - 3;

/// Tag for the TokenAssigned event.
pub const TOKEN_ASSIGNED_TAG: u8 = u8::MAX - 4;

/// Tag for the SlotOpened event.
pub const SLOT_OPENED_TAG: u8 = u8::MAX - 5;

/// Tag for the AuctionInitiated event.
pub const AUCTION_INITIATED_TAG: u8 = u8::MAX - 6;

/// Tag for the AuctionPurchase event.
pub const AUCTION_PURCHASE_TAG: u8 = u8::MAX - 7;

/// Tag for the FeeDeposited event.
pub const FEE_DEPOSIT_TAG: u8 = u8::MAX - 8;

/// Tag for the FundsRetrieved event.
pub const FUNDS_RETRIEVED_TAG: u8 = u8::MAX - 9;

/// Tag for the WhitelistToggled event.
pub const WHITELIST_TOGGLE_TAG: u8 = u8::MAX - 10;

/// Tag for the BatchAssigned event.
pub const BATCH_ASSIGNED_TAG: u8 = u8::MAX - 11;

/// Total number of tokens in the collection.
pub const MAX_SUPPLY: u32 = 10_000;

/// Number of tokens sold through the whitelist presale.
pub const PRESALE_SUPPLY: u32 = 1_000;

/// Supply level from which tokens can only be bought through auctions.
pub const AUCTION_THRESHOLD: u32 = 8_000;

/// Size of a batch-minted slot.
pub const BATCH_SLOT_SIZE: u32 = 1_000;

/// Size of an auctioned slot.
pub const AUCTION_SLOT_SIZE: u32 = 200;

/// Maximum number of units a single address may hold in one allowance.
pub const DEFAULT_ALLOWANCE_CAP: u32 = 25;

/// Denominator of basis-point rates.
pub const BASIS_POINTS_SCALE: u64 = 10_000;
