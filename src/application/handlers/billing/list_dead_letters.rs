//! ListDeadLettersHandler - Operator view of failed reconciliations.

use std::sync::Arc;

use crate::domain::billing::{DeadLetter, ReconcileError};
use crate::ports::DeadLetterStore;

pub struct ListDeadLettersHandler {
    store: Arc<dyn DeadLetterStore>,
}

impl ListDeadLettersHandler {
    pub fn new(store: Arc<dyn DeadLetterStore>) -> Self {
        Self { store }
    }

    /// Lists dead letters, most recent first.
    pub async fn handle(&self) -> Result<Vec<DeadLetter>, ReconcileError> {
        Ok(self.store.list().await?)
    }
}
