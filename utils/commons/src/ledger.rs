use concordium_std::*;

use crate::{RecordMintParams, TokenId};

/// Calls into the external ownership ledger that keeps token ownership.
pub trait HostLedgerExt<S>: HasHost<S> {
    /// Records `token_id` as minted to `owner`. The ledger rejects ids it has already seen.
    fn ledger_record_mint(
        &mut self,
        contract: &ContractAddress,
        owner: Address,
        token_id: TokenId,
    ) -> Result<(), CallContractError<Self::ReturnValueType>> {
        self.invoke_contract(
            contract,
            &RecordMintParams { owner, token_id },
            EntrypointName::new_unchecked("mint"),
            Amount::zero(),
        )?;

        Ok(())
    }
}

impl<S, H: HasHost<S>> HostLedgerExt<S> for H {}
