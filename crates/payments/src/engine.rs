use std::sync::Arc;

use tracing::{info, warn};

use farmxpress_database::{DbObject, DocumentStore, DocumentUpdate, WriteBatch};

use crate::actor::Actor;
use crate::error::PaymentError;
use crate::matcher::{MatchResult, MatchedRecords, OrderMatcher};
use crate::provider::{PaymentSession, ProviderMode};
use crate::record::{fields, STATUS_RESERVED};
use crate::status::{PaymentStatus, PaymentTrack};
use crate::webhook::WebhookPayload;

pub const DEFAULT_PAYMENT_CHANNEL: &str = "gcash";
pub const MANUAL_PAYMENT_CHANNEL: &str = "gcash_manual";

/// A provider status report, canonicalized and ready to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentEvent {
    pub external_id: String,
    pub status: PaymentStatus,
    pub paid_amount: Option<f64>,
    pub payment_channel: Option<String>,
    pub payment_method: Option<String>,
    pub track: PaymentTrack,
}

impl PaymentEvent {
    pub fn channel(&self) -> &str {
        [self.payment_channel.as_deref(), self.payment_method.as_deref()]
            .into_iter()
            .flatten()
            .find(|c| !c.is_empty())
            .unwrap_or(DEFAULT_PAYMENT_CHANNEL)
    }
}

impl TryFrom<WebhookPayload> for PaymentEvent {
    type Error = PaymentError;

    fn try_from(payload: WebhookPayload) -> Result<Self, Self::Error> {
        let external_id = payload
            .external_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| PaymentError::validation("Missing external_id"))?;
        let raw_status = payload
            .status
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| PaymentError::validation("Missing status"))?;

        let status = PaymentStatus::canonicalize(&raw_status);
        let paid_amount = payload.paid_amount.or(payload.amount);
        if status.is_paid() && paid_amount.is_none() {
            return Err(PaymentError::validation("Missing paid_amount"));
        }

        Ok(Self {
            external_id,
            status,
            paid_amount,
            payment_channel: payload.payment_channel,
            payment_method: payload.payment_method,
            track: PaymentTrack::from_metadata(payload.metadata.as_ref()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconciliationOutcome {
    /// Nothing carried the identifier; acknowledged without writes.
    NoMatch,
    Applied { orders: usize, sales: usize },
}

/// Applies payment state transitions to orders and their sale mirrors.
///
/// Every entry point resolves its targets through `OrderMatcher` and commits
/// all resulting writes as one batch.
#[derive(Clone)]
pub struct ReconciliationEngine {
    store: Arc<dyn DocumentStore>,
    matcher: OrderMatcher,
}

impl ReconciliationEngine {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let matcher = OrderMatcher::new(store.clone());
        Self { store, matcher }
    }

    pub fn matcher(&self) -> &OrderMatcher {
        &self.matcher
    }

    /// Computes the writes for one event. Pure: re-planning against the
    /// post-commit state yields the same field values, bar `paymentUpdatedAt`.
    pub fn plan(event: &PaymentEvent, matched: &MatchedRecords, actor: &Actor) -> WriteBatch {
        let mut batch = WriteBatch::new();
        let status = event.status.as_str();
        let paid = event.status.is_paid();

        for order in &matched.orders {
            let mut update = stamp_common(order.update_builder(), event.channel(), actor);

            match event.track {
                PaymentTrack::Deposit => {
                    update = update.set(fields::DEPOSIT_STATUS, status);
                    if paid {
                        update = update.set(fields::DEPOSIT_PAID_AMOUNT, event.paid_amount);
                        if !order.is_deposit_paid() {
                            update = update.server_timestamp(fields::DEPOSIT_PAID_AT);
                        }
                        if order.is_pre_order && !order.is_cancelled() {
                            update = update.set(fields::STATUS, STATUS_RESERVED);
                        }
                    }
                }
                PaymentTrack::Full => {
                    update = update.set(fields::PAYMENT_STATUS, status);
                    if paid {
                        update = update
                            .set(fields::PAY_STATUS, PaymentStatus::Paid.as_str())
                            .set(fields::PAID_AMOUNT, event.paid_amount);
                        if !order.is_paid() {
                            update = update.server_timestamp(fields::PAID_AT);
                        }
                    }
                }
            }
            batch.push(update);
        }

        for sale in &matched.sales {
            let status_field = match event.track {
                PaymentTrack::Deposit => fields::DEPOSIT_STATUS,
                PaymentTrack::Full => fields::PAYMENT_STATUS,
            };
            batch.push(
                stamp_common(sale.update_builder(), event.channel(), actor).set(status_field, status),
            );
        }

        batch
    }

    pub async fn apply_event(
        &self,
        event: &PaymentEvent,
        actor: &Actor,
    ) -> Result<ReconciliationOutcome, PaymentError> {
        match self.resolve_event_target(&event.external_id).await? {
            Some(matched) => self.apply_matched(event, matched, actor).await,
            None => Ok(ReconciliationOutcome::NoMatch),
        }
    }

    /// Resolves a provider callback before its payload is validated, so that
    /// callbacks for unknown identifiers are acknowledged whatever they carry.
    pub async fn apply_payload(
        &self,
        payload: WebhookPayload,
        actor: &Actor,
    ) -> Result<ReconciliationOutcome, PaymentError> {
        let external_id = payload
            .external_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| PaymentError::validation("Missing external_id"))?;

        let Some(matched) = self.resolve_event_target(external_id).await? else {
            return Ok(ReconciliationOutcome::NoMatch);
        };
        let event = PaymentEvent::try_from(payload)?;
        self.apply_matched(&event, matched, actor).await
    }

    async fn resolve_event_target(
        &self,
        external_id: &str,
    ) -> Result<Option<MatchedRecords>, PaymentError> {
        match self.matcher.resolve(external_id).await? {
            MatchResult::NoMatch => {
                info!("[ReconciliationEngine] no orders found for {}; acknowledged", external_id);
                Ok(None)
            }
            MatchResult::Matched(records) => Ok(Some(records)),
        }
    }

    async fn apply_matched(
        &self,
        event: &PaymentEvent,
        matched: MatchedRecords,
        actor: &Actor,
    ) -> Result<ReconciliationOutcome, PaymentError> {
        let batch = Self::plan(event, &matched, actor);
        self.store.commit(batch).await?;

        info!(
            "[ReconciliationEngine] {} -> {} ({:?} track) on {} orders, {} sales by {}",
            event.external_id,
            event.status,
            event.track,
            matched.orders.len(),
            matched.sales.len(),
            actor.audit_label()
        );
        Ok(ReconciliationOutcome::Applied {
            orders: matched.orders.len(),
            sales: matched.sales.len(),
        })
    }

    /// Records a freshly created provider session on the orders it pays for.
    /// Manual sessions take the offline path instead.
    pub async fn record_session(
        &self,
        identifier: &str,
        session: &PaymentSession,
        mode: ProviderMode,
        actor: &Actor,
    ) -> Result<ReconciliationOutcome, PaymentError> {
        if mode == ProviderMode::Manual {
            return self.mark_manual(identifier, actor).await;
        }

        let orders = match self.matcher.resolve(identifier).await? {
            MatchResult::NoMatch => {
                warn!("[ReconciliationEngine] session created for {} but no orders matched", identifier);
                return Ok(ReconciliationOutcome::NoMatch);
            }
            MatchResult::Matched(records) => records.orders,
        };

        let mut batch = WriteBatch::new();
        for order in &orders {
            let mut update = order
                .update_builder()
                .set(fields::PAYMENT_STATUS, PaymentStatus::Pending.as_str())
                .server_timestamp(fields::PAYMENT_CREATED_AT)
                .server_timestamp(fields::PAYMENT_UPDATED_AT)
                .set(fields::PAYMENT_UPDATED_BY, actor.audit_label());
            update = match &session.url {
                Some(url) => update.set(fields::PAYMENT_LINK, url.as_str()),
                None => update.clear(fields::PAYMENT_LINK),
            };
            update = match &session.id {
                Some(id) => update.set(fields::PAYMENT_ID, id.as_str()),
                None => update.clear(fields::PAYMENT_ID),
            };
            batch.push(update);
        }
        self.store.commit(batch).await?;

        info!("[ReconciliationEngine] {} orders pending for {}", orders.len(), identifier);
        Ok(ReconciliationOutcome::Applied {
            orders: orders.len(),
            sales: 0,
        })
    }

    /// Offline settlement: orders wait in `availing` with no provider link.
    pub async fn mark_manual(
        &self,
        identifier: &str,
        actor: &Actor,
    ) -> Result<ReconciliationOutcome, PaymentError> {
        let orders = match self.matcher.resolve(identifier).await? {
            MatchResult::NoMatch => {
                info!("[ReconciliationEngine] manual payment for {} matched no orders", identifier);
                return Ok(ReconciliationOutcome::NoMatch);
            }
            MatchResult::Matched(records) => records.orders,
        };

        let mut batch = WriteBatch::new();
        for order in &orders {
            batch.push(
                stamp_common(order.update_builder(), MANUAL_PAYMENT_CHANNEL, actor)
                    .set(fields::PAYMENT_STATUS, PaymentStatus::Availing.as_str())
                    .clear(fields::PAYMENT_LINK)
                    .clear(fields::PAYMENT_ID),
            );
        }
        self.store.commit(batch).await?;

        info!(
            "[ReconciliationEngine] {} orders availing manual payment for {} by {}",
            orders.len(),
            identifier,
            actor.audit_label()
        );
        Ok(ReconciliationOutcome::Applied {
            orders: orders.len(),
            sales: 0,
        })
    }
}

fn stamp_common(update: DocumentUpdate, channel: &str, actor: &Actor) -> DocumentUpdate {
    update
        .set(fields::PAYMENT_METHOD, channel)
        .server_timestamp(fields::PAYMENT_UPDATED_AT)
        .set(fields::PAYMENT_UPDATED_BY, actor.audit_label())
}
