//! ProductCatalog port - Product lookup on Stripe.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use super::UpstreamError;
use crate::domain::foundation::ProductId;

/// Product as returned by Stripe, reduced to the fields we read.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpstreamProduct {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub livemode: bool,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Port for product retrieval by id.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn retrieve_product(&self, product: &ProductId) -> Result<UpstreamProduct, UpstreamError>;
}
