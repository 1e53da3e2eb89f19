use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use farmxpress_database::{DbObject, DocumentStore};

use crate::error::PaymentError;
use crate::record::{fields, Order, Sale};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchedRecords {
    pub orders: Vec<Order>,
    pub sales: Vec<Sale>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    /// No order carries the identifier, as group code or as order code.
    NoMatch,
    Matched(MatchedRecords),
}

/// Resolves a payment identifier to the orders and sales it covers.
///
/// Group checkouts share one `groupOrderCode` across several orders, so the
/// group code is tried first and `orderCode` only when nothing matched it.
/// Orders and sales each go through the chain on their own fields.
#[derive(Clone)]
pub struct OrderMatcher {
    store: Arc<dyn DocumentStore>,
}

impl OrderMatcher {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, identifier: &str) -> Result<MatchResult, PaymentError> {
        let orders: Vec<Order> = self.lookup(identifier).await?;
        if orders.is_empty() {
            debug!("[OrderMatcher] no orders for {}", identifier);
            return Ok(MatchResult::NoMatch);
        }
        let sales: Vec<Sale> = self.lookup(identifier).await?;

        debug!(
            "[OrderMatcher] {} resolved to {} orders, {} sales",
            identifier,
            orders.len(),
            sales.len()
        );
        Ok(MatchResult::Matched(MatchedRecords { orders, sales }))
    }

    async fn lookup<D: DbObject>(&self, identifier: &str) -> Result<Vec<D>, PaymentError> {
        let mut docs = self
            .store
            .find_by_field(D::COLLECTION_NAME, fields::GROUP_ORDER_CODE, identifier)
            .await?;
        if docs.is_empty() {
            docs = self
                .store
                .find_by_field(D::COLLECTION_NAME, fields::ORDER_CODE, identifier)
                .await?;
        }

        let mut found = docs
            .into_iter()
            .map(D::from_stored)
            .collect::<Result<Vec<D>, _>>()?;

        let mut seen = HashSet::new();
        found.retain(|record| seen.insert(record.id().to_string()));
        Ok(found)
    }
}
