//! IdentityMapper - Establishes and resolves customer to account links.

use std::sync::Arc;

use crate::domain::billing::{CustomerAccountMapping, ReconcileError};
use crate::domain::foundation::{AccountId, CustomerId, EventId};
use crate::ports::{CustomerAccountRepository, SaveResult};

/// Result of an `establish` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EstablishResult {
    /// A new link was created.
    Established,
    /// The customer was already linked; the stored account is reported.
    AlreadyMapped { existing: Option<AccountId> },
}

/// Write-once customer to account mapping service.
pub struct IdentityMapper {
    repository: Arc<dyn CustomerAccountRepository>,
}

impl IdentityMapper {
    pub fn new(repository: Arc<dyn CustomerAccountRepository>) -> Self {
        Self { repository }
    }

    /// Links `customer` to `account` unless the customer is already linked.
    ///
    /// A differing `account` on an existing link is not an error; the first
    /// link stands.
    pub async fn establish(
        &self,
        customer: &CustomerId,
        account: &AccountId,
        establishing_event: &EventId,
    ) -> Result<EstablishResult, ReconcileError> {
        let mapping = CustomerAccountMapping {
            customer: customer.clone(),
            account: account.clone(),
            establishing_event: establishing_event.clone(),
        };

        match self.repository.insert_if_absent(&mapping).await? {
            SaveResult::Inserted => {
                tracing::info!(
                    customer_id = %customer,
                    account_id = %account,
                    event_id = %establishing_event,
                    "Recorded customer to account mapping"
                );
                Ok(EstablishResult::Established)
            }
            SaveResult::AlreadyExists => {
                let existing = self.repository.find_account(customer).await?;
                if existing.as_ref() != Some(account) {
                    tracing::warn!(
                        customer_id = %customer,
                        proposed_account_id = %account,
                        existing_account_id = ?existing.as_ref().map(AccountId::as_str),
                        "Ignoring conflicting customer mapping"
                    );
                }
                Ok(EstablishResult::AlreadyMapped { existing })
            }
        }
    }

    /// Resolves the account linked to `customer`.
    pub async fn resolve(&self, customer: &CustomerId) -> Result<AccountId, ReconcileError> {
        self.repository
            .find_account(customer)
            .await?
            .ok_or_else(|| ReconcileError::IdentityNotFound {
                customer: customer.clone(),
            })
    }

    /// Lists the customers linked to `account`.
    pub async fn customers_for(&self, account: &AccountId) -> Result<Vec<CustomerId>, ReconcileError> {
        Ok(self.repository.find_customers(account).await?)
    }
}
