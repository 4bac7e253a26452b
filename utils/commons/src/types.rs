use super::*;

pub type ContractResult<A> = Result<A, CustomContractError>;

/// Collection token identifier. Identifiers start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, SchemaType)]
pub struct TokenId(pub u32);

/// Parameter of the ownership ledger `mint` entrypoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct RecordMintParams {
    pub owner: Address,
    pub token_id: TokenId,
}
