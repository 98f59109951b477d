//! CustomerAccountRepository port - Write-once customer to account links.

use async_trait::async_trait;

use super::{SaveResult, StoreError};
use crate::domain::billing::CustomerAccountMapping;
use crate::domain::foundation::{AccountId, CustomerId};

/// Port for customer to account mappings.
#[async_trait]
pub trait CustomerAccountRepository: Send + Sync {
    /// Inserts the mapping unless one already exists for the customer.
    ///
    /// The first writer wins; a later mapping for the same customer returns
    /// `SaveResult::AlreadyExists` even when it names a different account.
    async fn insert_if_absent(
        &self,
        mapping: &CustomerAccountMapping,
    ) -> Result<SaveResult, StoreError>;

    /// Looks up the account linked to a customer.
    async fn find_account(&self, customer: &CustomerId) -> Result<Option<AccountId>, StoreError>;

    /// Lists every customer linked to an account.
    async fn find_customers(&self, account: &AccountId) -> Result<Vec<CustomerId>, StoreError>;
}
