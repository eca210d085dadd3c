//! Business logic services

pub mod catalog;
pub mod ledger;
pub mod users;

use crate::{
    config::{AuthConfig, LoanPolicyConfig},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub ledger: ledger::LedgerService,
    pub users: users::UsersService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig, loan_policy: LoanPolicyConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            ledger: ledger::LedgerService::new(repository.clone(), loan_policy),
            users: users::UsersService::new(repository, auth_config),
        }
    }
}
