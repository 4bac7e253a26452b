use crate::{ContractResult, CustomContractError};
use concordium_std::*;

/// Role registry of a sale contract.
#[derive(Serial, DeserialWithState)]
#[concordium(state_parameter = "S")]
pub struct Authority<S: HasStateApi> {
    /// Trusted addresses that manage every role.
    admins: StateSet<Address, S>,
    /// Addresses that run the sale: batch processing, auctions, whitelist and oracle lists.
    maintainers: StateSet<Address, S>,
    /// Addresses allowed to deliver random values.
    oracles: StateSet<Address, S>,
}

impl<S: HasStateApi> Authority<S> {
    pub fn new(state_builder: &mut StateBuilder<S>, admin: Address, oracle: Address) -> Self {
        let mut admins = state_builder.new_set();
        admins.insert(admin);
        let mut oracles = state_builder.new_set();
        oracles.insert(oracle);
        Self {
            admins,
            maintainers: state_builder.new_set(),
            oracles,
        }
    }

    pub fn has_admin_rights(&self, address: &Address) -> bool {
        self.admins.contains(address)
    }

    pub fn has_maintainer_rights(&self, address: &Address) -> bool {
        self.maintainers.contains(address) || self.has_admin_rights(address)
    }

    /// Only listed oracles may fulfil requests; admins are not implicitly trusted.
    pub fn is_trusted_oracle(&self, address: &Address) -> bool {
        self.oracles.contains(address)
    }

    pub fn handle_update(
        &mut self,
        sender: Address,
        update: AuthorityUpdateParams,
    ) -> ContractResult<()> {
        let address_list = match update.field {
            AuthorityField::Admin => {
                ensure!(
                    self.has_admin_rights(&sender),
                    CustomContractError::Unauthorized
                );
                &mut self.admins
            }
            AuthorityField::Maintainer => {
                ensure!(
                    self.has_maintainer_rights(&sender),
                    CustomContractError::Unauthorized
                );
                &mut self.maintainers
            }
            AuthorityField::Oracle => {
                ensure!(
                    self.has_maintainer_rights(&sender),
                    CustomContractError::Unauthorized
                );
                &mut self.oracles
            }
        };

        match update.kind {
            AuthorityUpdateKind::Remove => {
                address_list.remove(&update.address);
            }
            AuthorityUpdateKind::Add => {
                address_list.insert(update.address);
            }
        }

        Ok(())
    }

    pub fn handle_view(&self, view: AuthorityViewParams) -> Vec<Address> {
        let address_list = match view.field {
            AuthorityField::Admin => &self.admins,
            AuthorityField::Maintainer => &self.maintainers,
            AuthorityField::Oracle => &self.oracles,
        };

        address_list
            .iter()
            .skip(view.skip as usize)
            .take(view.show as usize)
            .map(|a| *a)
            .collect()
    }
}

#[derive(Debug, SchemaType, Serialize)]
pub enum AuthorityField {
    Admin,
    Maintainer,
    Oracle,
}

#[derive(Debug, SchemaType, Serialize)]
pub enum AuthorityUpdateKind {
    Remove,
    Add,
}

#[derive(Debug, SchemaType, Serialize)]
pub struct AuthorityUpdateParams {
    pub field: AuthorityField,
    pub kind: AuthorityUpdateKind,
    pub address: Address,
}

#[derive(Debug, SchemaType, Serialize)]
pub struct AuthorityViewParams {
    pub field: AuthorityField,
    pub skip: u32,
    pub show: u32,
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use concordium_std::test_infrastructure::*;

    const ADMIN: AccountAddress = AccountAddress([1; 32]);
    const MAINTAINER: AccountAddress = AccountAddress([2; 32]);
    const ORACLE: AccountAddress = AccountAddress([3; 32]);
    const ORACLE_CONTRACT: ContractAddress = ContractAddress {
        index: 3,
        subindex: 0,
    };
    const USER: AccountAddress = AccountAddress([16; 32]);

    fn default_authority() -> Authority<TestStateApi> {
        let mut state_builder = TestStateBuilder::new();
        let mut authority = Authority::new(
            &mut state_builder,
            Address::Account(ADMIN),
            Address::Account(ORACLE),
        );
        authority.maintainers.insert(Address::Account(MAINTAINER));
        authority
    }

    fn update(
        field: AuthorityField,
        kind: AuthorityUpdateKind,
        address: Address,
    ) -> AuthorityUpdateParams {
        AuthorityUpdateParams {
            field,
            kind,
            address,
        }
    }

    #[concordium_test]
    fn test_initial_roles() {
        let authority = default_authority();

        claim!(authority.has_admin_rights(&Address::Account(ADMIN)));
        claim!(authority.has_maintainer_rights(&Address::Account(ADMIN)));
        claim!(!authority.is_trusted_oracle(&Address::Account(ADMIN)));

        claim!(!authority.has_admin_rights(&Address::Account(MAINTAINER)));
        claim!(authority.has_maintainer_rights(&Address::Account(MAINTAINER)));

        claim!(authority.is_trusted_oracle(&Address::Account(ORACLE)));
        claim!(!authority.has_maintainer_rights(&Address::Account(ORACLE)));
    }

    #[concordium_test]
    fn test_maintainer_manages_oracles() {
        let mut authority = default_authority();

        let result = authority.handle_update(
            Address::Account(MAINTAINER),
            update(
                AuthorityField::Oracle,
                AuthorityUpdateKind::Add,
                Address::Contract(ORACLE_CONTRACT),
            ),
        );
        claim_eq!(result, Ok(()));
        claim!(authority.is_trusted_oracle(&Address::Contract(ORACLE_CONTRACT)));

        let result = authority.handle_update(
            Address::Account(MAINTAINER),
            update(
                AuthorityField::Oracle,
                AuthorityUpdateKind::Remove,
                Address::Account(ORACLE),
            ),
        );
        claim_eq!(result, Ok(()));
        claim!(!authority.is_trusted_oracle(&Address::Account(ORACLE)));
    }

    #[concordium_test]
    fn test_oracle_cannot_manage_roles() {
        let mut authority = default_authority();

        let result = authority.handle_update(
            Address::Account(ORACLE),
            update(
                AuthorityField::Oracle,
                AuthorityUpdateKind::Add,
                Address::Account(USER),
            ),
        );
        claim_eq!(result, Err(CustomContractError::Unauthorized));
        claim!(!authority.is_trusted_oracle(&Address::Account(USER)));

        let result = authority.handle_update(
            Address::Account(MAINTAINER),
            update(
                AuthorityField::Admin,
                AuthorityUpdateKind::Add,
                Address::Account(USER),
            ),
        );
        claim_eq!(result, Err(CustomContractError::Unauthorized));
        claim!(!authority.has_admin_rights(&Address::Account(USER)));
    }

    #[concordium_test]
    fn test_admin_adds_maintainer() {
        let mut authority = default_authority();

        let result = authority.handle_update(
            Address::Account(ADMIN),
            update(
                AuthorityField::Maintainer,
                AuthorityUpdateKind::Add,
                Address::Account(USER),
            ),
        );
        claim_eq!(result, Ok(()));
        claim!(authority.has_maintainer_rights(&Address::Account(USER)));
        claim!(!authority.has_admin_rights(&Address::Account(USER)));
    }

    #[concordium_test]
    fn test_view_paging() {
        let mut authority = default_authority();
        authority.oracles.insert(Address::Account(USER));

        let all = authority.handle_view(AuthorityViewParams {
            field: AuthorityField::Oracle,
            skip: 0,
            show: 10,
        });
        claim_eq!(all.len(), 2);

        let page = authority.handle_view(AuthorityViewParams {
            field: AuthorityField::Oracle,
            skip: 1,
            show: 10,
        });
        claim_eq!(page.len(), 1);
        claim_eq!(page[0], all[1]);
    }
}
